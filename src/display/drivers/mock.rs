/*
 *  display/drivers/mock.rs
 *
 *  yrpaper - forecast to e-paper
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock display sink for testing without hardware
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

use embedded_graphics::pixelcolor::BinaryColor;

use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, DisplaySink};
use crate::raster::{Raster, Rotation};

use std::sync::{Arc, Mutex};

/// Mock display sink for testing
///
/// This sink simulates a panel without requiring hardware. It records every
/// presented frame and the rotation directive that came with it, and can be
/// told to fail.
#[derive(Debug, Clone)]
pub struct MockSink {
    /// Display capabilities
    capabilities: DisplayCapabilities,

    /// Shared state for testing
    state: Arc<Mutex<MockSinkState>>,
}

/// Internal state for the mock sink (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockSinkState {
    /// Number of successful presentations
    pub present_count: usize,

    /// Number of presentations refused by a simulated failure
    pub failed_count: usize,

    /// Last frame presented
    pub last_frame: Option<Raster>,

    /// Rotation directive of the last frame
    pub last_rotation: Option<Rotation>,

    /// Simulate failures (for error testing)
    pub simulate_failure: bool,
}

impl MockSink {
    /// Create a mock sink with specific dimensions
    pub fn new_with_size(width: u32, height: u32) -> Self {
        Self {
            capabilities: DisplayCapabilities { width, height, name: "mock" },
            state: Arc::new(Mutex::new(MockSinkState::default())),
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockSinkState>> {
        Arc::clone(&self.state)
    }

    /// Reset state counters (useful between tests)
    pub fn reset_state(&mut self) {
        let mut state = self.state.lock().unwrap();
        *state = MockSinkState::default();
    }

    pub fn set_failure(&self, fail: bool) {
        self.state.lock().unwrap().simulate_failure = fail;
    }

    pub fn present_count(&self) -> usize {
        self.state.lock().unwrap().present_count
    }

    /// Copy of the last frame presented
    pub fn last_frame(&self) -> Option<Raster> {
        self.state.lock().unwrap().last_frame.clone()
    }

    /// Get pixel of the last frame for testing
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        self.state.lock().unwrap().last_frame.as_ref().and_then(|f| f.pixel(x, y))
    }
}

impl DisplaySink for MockSink {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn present(&mut self, raster: &Raster, rotation: Rotation) -> Result<(), DisplayError> {
        self.check_frame(raster)?;
        let mut state = self.state.lock().unwrap();

        if state.simulate_failure {
            state.failed_count += 1;
            return Err(DisplayError::Other("Simulated present failure".to_string()));
        }

        state.present_count += 1;
        state.last_frame = Some(raster.clone());
        state.last_rotation = Some(rotation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::*;

    #[test]
    fn test_mock_sink_creation() {
        let sink = MockSink::new_with_size(176, 264);
        assert_eq!(sink.dimensions(), (176, 264));
        assert_eq!(sink.present_count(), 0);
        assert!(sink.last_frame().is_none());
    }

    #[test]
    fn test_mock_sink_records_frame() {
        let mut sink = MockSink::new_with_size(8, 8);
        let mut raster = Raster::new(8, 8);
        Pixel(Point::new(3, 4), BinaryColor::On).draw(&mut raster).unwrap();

        sink.present(&raster, Rotation::Deg180).unwrap();

        assert_eq!(sink.present_count(), 1);
        assert_eq!(sink.get_pixel(3, 4), Some(BinaryColor::On));
        assert_eq!(sink.state().lock().unwrap().last_rotation, Some(Rotation::Deg180));
    }

    #[test]
    fn test_mock_sink_simulated_failure() {
        let mut sink = MockSink::new_with_size(8, 8);
        let raster = Raster::new(8, 8);

        sink.set_failure(true);
        assert!(sink.present(&raster, Rotation::Deg180).is_err());
        assert_eq!(sink.state().lock().unwrap().failed_count, 1);

        sink.set_failure(false);
        assert!(sink.present(&raster, Rotation::Deg180).is_ok());

        sink.reset_state();
        assert_eq!(sink.present_count(), 0);
    }

    #[test]
    fn test_mock_sink_size_mismatch() {
        let mut sink = MockSink::new_with_size(176, 264);
        assert!(matches!(
            sink.present(&Raster::new(264, 176), Rotation::Deg0),
            Err(DisplayError::BufferSizeMismatch { expected: (176, 264), actual: (264, 176) })
        ));
    }
}
