/*
 *  display/drivers/pbm.rs
 *
 *  yrpaper - forecast to e-paper
 *  (c) 2020-26 Stuart Hunter
 *
 *  Binary PBM file sink
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

use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, DisplaySink};
use crate::raster::{Raster, Rotation};

/// Writes each frame as a P4 image. The file is replaced atomically, a
/// reader never sees half a frame.
#[derive(Debug)]
pub struct PbmSink {
    path: PathBuf,
    capabilities: DisplayCapabilities,
    frames: u64,
}

impl PbmSink {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Result<Self, DisplayError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(DisplayError::InvalidConfiguration("pbm sink needs an output path".to_string()));
        }
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.is_dir() {
                return Err(DisplayError::InitializationFailed(format!(
                    "output directory {} does not exist",
                    dir.display()
                )));
            }
        }
        info!("PBM sink writing to {}", path.display());
        Ok(Self {
            path,
            capabilities: DisplayCapabilities { width, height, name: "pbm" },
            frames: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn write_atomically(&self, bytes: &[u8]) -> Result<(), DisplayError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl DisplaySink for PbmSink {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn present(&mut self, raster: &Raster, rotation: Rotation) -> Result<(), DisplayError> {
        self.check_frame(raster)?;
        self.write_atomically(&raster.to_pbm())?;
        self.frames += 1;
        debug!("Frame {} written to {} (rotated {})", self.frames, self.path.display(), rotation.degrees());
        Ok(())
    }
}
