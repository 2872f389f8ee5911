/*
 *  display/drivers/mock.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Headless matrix driver for tests and panel-less hosts
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

use std::sync::{Arc, Mutex};

use embedded_graphics::pixelcolor::Rgb888;

use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, MatrixDriver};

/// Mock matrix driver
///
/// Records every operation in a shared state so tests can inspect what the
/// rotation pushed to the panel. Also used at runtime when no panel is
/// available and emulation is off.
#[derive(Debug, Clone)]
pub struct MockDriver {
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Number of times init() was called
    pub init_count: usize,

    /// Number of frames written
    pub frame_count: usize,

    /// Number of times clear() was called
    pub clear_count: usize,

    /// Last brightness value set
    pub last_brightness: Option<u8>,

    /// Copy of the last frame written
    pub last_frame: Vec<Rgb888>,

    /// Simulate failures (for error testing)
    pub simulate_write_failure: bool,
}

impl MockDriver {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            capabilities: DisplayCapabilities {
                width,
                height,
                supports_brightness: true,
                name: "mock",
            },
            state: Arc::new(Mutex::new(MockDriverState::default())),
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockDriverState) -> R) -> Result<R, DisplayError> {
        let mut st = self.state.lock().map_err(|_| DisplayError::Poisoned)?;
        Ok(f(&mut st))
    }
}

impl MatrixDriver for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.with_state(|st| st.init_count += 1)
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError> {
        self.with_state(|st| st.last_brightness = Some(percent))
    }

    fn write_frame(&mut self, frame: &[Rgb888]) -> Result<(), DisplayError> {
        let expected = (self.capabilities.width * self.capabilities.height) as usize;
        if frame.len() != expected {
            return Err(DisplayError::BufferSizeMismatch { expected, actual: frame.len() });
        }
        self.with_state(|st| {
            if st.simulate_write_failure {
                return Err(DisplayError::Other("simulated write failure".into()));
            }
            st.frame_count += 1;
            st.last_frame = frame.to_vec();
            Ok(())
        })?
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.with_state(|st| {
            st.clear_count += 1;
            st.last_frame.clear();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_operations() {
        let mut d = MockDriver::new(2, 2);
        let state = d.state();
        d.init().unwrap();
        d.set_brightness(40).unwrap();
        d.write_frame(&[Rgb888::new(1, 2, 3); 4]).unwrap();
        d.clear().unwrap();

        let st = state.lock().unwrap();
        assert_eq!(st.init_count, 1);
        assert_eq!(st.frame_count, 1);
        assert_eq!(st.clear_count, 1);
        assert_eq!(st.last_brightness, Some(40));
    }

    #[test]
    fn test_mock_simulated_failure() {
        let mut d = MockDriver::new(1, 1);
        d.state().lock().unwrap().simulate_write_failure = true;
        assert!(d.write_frame(&[Rgb888::new(0, 0, 0)]).is_err());
        assert!(matches!(
            d.write_frame(&[]),
            Err(DisplayError::BufferSizeMismatch { expected: 1, actual: 0 })
        ));
    }
}
