/*
 *  display/factory.rs
 *
 *  yrpaper - forecast to e-paper
 *  (c) 2020-26 Stuart Hunter
 *
 *  Sink selection from configuration
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

use crate::config::{Settings, SinkKind};
use crate::display::drivers::{PackedSink, PbmSink};
use crate::display::error::DisplayError;
use crate::display::traits::DisplaySink;
use log::info;

/// Type alias for boxed display sink trait objects
pub type BoxedSink = Box<dyn DisplaySink>;

/// Factory for creating display sinks from configuration
pub struct DisplaySinkFactory;

impl DisplaySinkFactory {
    /// Create the sink named by `settings.sink`, sized to the panel.
    pub fn create_from_settings(settings: &Settings) -> Result<BoxedSink, DisplayError> {
        info!("Creating {:?} sink, {}x{}", settings.sink, settings.width, settings.height);
        match settings.sink {
            SinkKind::Pbm => Ok(Box::new(PbmSink::new(&settings.output, settings.width, settings.height)?)),
            SinkKind::Packed => Ok(Box::new(PackedSink::new(&settings.output, settings.width, settings.height)?)),
        }
    }
}
