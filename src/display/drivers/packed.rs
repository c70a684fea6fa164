/*
 *  display/drivers/packed.rs
 *
 *  yrpaper - forecast to e-paper
 *  (c) 2020-26 Stuart Hunter
 *
 *  Raw 1bpp frame sink for panel devices
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
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, DisplaySink};
use crate::raster::{Raster, Rotation};

/// Writes the packed frame (MSB first, 1 = ink, rows padded to bytes) to a
/// device node or plain file, the layout panel controllers take.
#[derive(Debug)]
pub struct PackedSink {
    path: PathBuf,
    capabilities: DisplayCapabilities,
    bytes_written: usize,
}

impl PackedSink {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Result<Self, DisplayError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(DisplayError::InvalidConfiguration("packed sink needs a device path".to_string()));
        }
        info!("Packed sink writing to {}", path.display());
        Ok(Self {
            path,
            capabilities: DisplayCapabilities { width, height, name: "packed" },
            bytes_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Size of one frame in bytes.
    pub fn frame_len(&self) -> usize {
        (self.capabilities.width as usize).div_ceil(8) * self.capabilities.height as usize
    }
}

impl DisplaySink for PackedSink {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn present(&mut self, raster: &Raster, rotation: Rotation) -> Result<(), DisplayError> {
        self.check_frame(raster)?;
        let buffer = raster.to_packed_bytes();
        let mut out = OpenOptions::new().write(true).create(true).truncate(true).open(&self.path)?;
        out.write_all(&buffer)?;
        out.flush()?;
        self.bytes_written += buffer.len();
        debug!("{} bytes to {} (rotated {})", buffer.len(), self.path.display(), rotation.degrees());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::BinaryColor;
    use embedded_graphics::prelude::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn test_packed_sink_writes_buffer() {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let path = std::env::temp_dir().join(format!("yrpaper-packed-{}.bin", nanos));
        let mut sink = PackedSink::new(&path, 176, 264).unwrap();
        assert_eq!(sink.frame_len(), 22 * 264);

        let mut raster = Raster::new(176, 264);
        Pixel(Point::new(0, 0), BinaryColor::On).draw(&mut raster).unwrap();
        sink.present(&raster, Rotation::Deg180).unwrap();
        sink.present(&raster, Rotation::Deg180).unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written.len(), 22 * 264);
        assert_eq!(written[0], 0x80);
        assert_eq!(sink.bytes_written(), 2 * 22 * 264);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_packed_sink_rejects_wrong_size() {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let path = std::env::temp_dir().join(format!("yrpaper-packed-size-{}.bin", nanos));
        let mut sink = PackedSink::new(&path, 176, 264).unwrap();
        let raster = Raster::new(264, 176);
        assert!(matches!(
            sink.present(&raster, Rotation::Deg180),
            Err(DisplayError::BufferSizeMismatch { .. })
        ));
        assert_eq!(sink.bytes_written(), 0);
        assert!(!path.exists());
    }
}
