/*
 *  display/drivers/terminal.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Emulated matrix - truecolor half-block rendering in the terminal
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

use std::fmt::Write as _;
use std::io::{self, Write};

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, MatrixDriver};

const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";
const HOME: &str = "\x1b[H";
const CLEAR_SCREEN: &str = "\x1b[2J";
const RESET: &str = "\x1b[0m";

/// Renders two panel rows per terminal line using the upper half block
pub struct TerminalDriver {
    capabilities: DisplayCapabilities,
    brightness: u8,
    out: Box<dyn Write + Send>,
}

impl TerminalDriver {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_writer(width, height, Box::new(io::stdout()))
    }

    pub fn with_writer(width: u32, height: u32, out: Box<dyn Write + Send>) -> Self {
        Self {
            capabilities: DisplayCapabilities {
                width,
                height,
                supports_brightness: true,
                name: "terminal emulator",
            },
            brightness: 100,
            out,
        }
    }

    fn scale(&self, c: Rgb888) -> (u8, u8, u8) {
        let s = |v: u8| ((v as u16 * self.brightness as u16) / 100) as u8;
        (s(c.r()), s(c.g()), s(c.b()))
    }

    /// Build the escape sequence for one frame
    fn compose(&self, frame: &[Rgb888]) -> String {
        let w = self.capabilities.width as usize;
        let h = self.capabilities.height as usize;
        let mut s = String::with_capacity(w * h * 20);
        s.push_str(HOME);
        for y in (0..h).step_by(2) {
            for x in 0..w {
                let (tr, tg, tb) = self.scale(frame[y * w + x]);
                let (br, bg, bb) = if y + 1 < h {
                    self.scale(frame[(y + 1) * w + x])
                } else {
                    (0, 0, 0)
                };
                let _ = write!(s, "\x1b[38;2;{tr};{tg};{tb}m\x1b[48;2;{br};{bg};{bb}m\u{2580}");
            }
            s.push_str(RESET);
            s.push('\n');
        }
        s
    }
}

impl MatrixDriver for TerminalDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        write!(self.out, "{CLEAR_SCREEN}{HIDE_CURSOR}")?;
        self.out.flush()?;
        Ok(())
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError> {
        self.brightness = percent.min(100);
        Ok(())
    }

    fn write_frame(&mut self, frame: &[Rgb888]) -> Result<(), DisplayError> {
        let expected = (self.capabilities.width * self.capabilities.height) as usize;
        if frame.len() != expected {
            return Err(DisplayError::BufferSizeMismatch { expected, actual: frame.len() });
        }
        let s = self.compose(frame);
        self.out.write_all(s.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        write!(self.out, "{CLEAR_SCREEN}{HOME}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        let _ = write!(self.out, "{RESET}{SHOW_CURSOR}");
        let _ = self.out.flush();
    }
}
