/*
 *  display/traits.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for matrix driver abstraction
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

use embedded_graphics::pixelcolor::Rgb888;
use crate::display::error::DisplayError;

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Panel width in pixels
    pub width: u32,

    /// Panel height in pixels
    pub height: u32,

    /// Whether the panel supports brightness control
    pub supports_brightness: bool,

    /// Human readable driver name, used in the startup banner
    pub name: &'static str,
}

/// Minimal hardware abstraction - every matrix output must implement this trait
///
/// Boards never talk to a driver directly; they draw into the
/// [`Matrix`](crate::display::Matrix) framebuffer and the matrix pushes
/// whole frames here.
pub trait MatrixDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Prepare the output (open the panel, hide the cursor, ...)
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Set brightness in percent (0-100)
    ///
    /// Returns an error if the display doesn't support brightness control.
    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError> {
        let _ = percent;
        Err(DisplayError::UnsupportedOperation)
    }

    /// Push a full frame, row-major, `width * height` pixels
    fn write_frame(&mut self, frame: &[Rgb888]) -> Result<(), DisplayError>;

    /// Blank the output
    fn clear(&mut self) -> Result<(), DisplayError>;
}
