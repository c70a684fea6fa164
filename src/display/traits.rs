/*
 *  display/traits.rs
 *
 *  yrpaper - forecast to e-paper
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display sink abstraction
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use crate::display::error::DisplayError;
use crate::raster::{Raster, Rotation};

/// Display capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,

    /// Human readable sink kind for logs
    pub name: &'static str,
}

/// Where finished frames go.
///
/// Frames arrive already turned into panel orientation; `rotation` tells
/// the sink what was applied so it can record or report it. Sinks never
/// rotate again.
pub trait DisplaySink {
    /// Returns the capabilities of this sink
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Reject frames that do not fit the panel.
    fn check_frame(&self, raster: &Raster) -> Result<(), DisplayError> {
        let expected = self.dimensions();
        let actual = (raster.width() as u32, raster.height() as u32);
        if expected != actual {
            return Err(DisplayError::BufferSizeMismatch { expected, actual });
        }
        Ok(())
    }

    /// Hand one frame to the panel.
    fn present(&mut self, raster: &Raster, rotation: Rotation) -> Result<(), DisplayError>;
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn capabilities(&self) -> &DisplayCapabilities {
        (**self).capabilities()
    }

    fn present(&mut self, raster: &Raster, rotation: Rotation) -> Result<(), DisplayError> {
        (**self).present(raster, rotation)
    }
}
