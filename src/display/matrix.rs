/*
 *  display/matrix.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Rendering surface shared by every board
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

use std::sync::{Arc, Mutex, MutexGuard};

use embedded_graphics::mono_font::{
    ascii::{FONT_4X6, FONT_5X8, FONT_6X10},
    MonoFont, MonoTextStyle,
};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use crate::display::error::DisplayError;
use crate::display::framebuffer::FrameBuffer;
use crate::display::traits::MatrixDriver;

/// Matrix handle shared between the rotation, boards and early init
pub type SharedMatrix = Arc<Mutex<Matrix>>;

/// Text sizes available to boards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn font(&self) -> &'static MonoFont<'static> {
        match self {
            FontSize::Small => &FONT_4X6,
            FontSize::Medium => &FONT_5X8,
            FontSize::Large => &FONT_6X10,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "small" => FontSize::Small,
            "large" => FontSize::Large,
            _ => FontSize::Medium,
        }
    }
}

/// Resolve a layout colour name, falling back to white
pub fn named_color(name: &str) -> Rgb888 {
    match name.to_ascii_lowercase().as_str() {
        "red" => Rgb888::RED,
        "green" => Rgb888::GREEN,
        "blue" => Rgb888::BLUE,
        "yellow" => Rgb888::YELLOW,
        "cyan" => Rgb888::CYAN,
        "magenta" => Rgb888::MAGENTA,
        "black" => Rgb888::BLACK,
        "orange" => Rgb888::new(255, 140, 0),
        "grey" | "gray" => Rgb888::new(128, 128, 128),
        hex if hex.starts_with('#') && hex.len() == 7 && hex.is_ascii() => {
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(255);
            Rgb888::new(byte(1), byte(3), byte(5))
        }
        _ => Rgb888::WHITE,
    }
}

/// Framebuffer plus the driver it is flushed to
pub struct Matrix {
    fb: FrameBuffer,
    driver: Box<dyn MatrixDriver>,
    brightness: u8,
}

impl Matrix {
    pub fn new(mut driver: Box<dyn MatrixDriver>) -> Result<Self, DisplayError> {
        driver.init()?;
        let (w, h) = driver.dimensions();
        log::info!("Matrix {}x{} on {}", w, h, driver.capabilities().name);
        Ok(Self {
            fb: FrameBuffer::new(w, h),
            driver,
            brightness: 100,
        })
    }

    pub fn shared(self) -> SharedMatrix {
        Arc::new(Mutex::new(self))
    }

    pub fn width(&self) -> u32 { self.fb.width() as u32 }
    pub fn height(&self) -> u32 { self.fb.height() as u32 }
    pub fn brightness(&self) -> u8 { self.brightness }

    /// Draw target for boards that use embedded-graphics directly
    pub fn canvas_mut(&mut self) -> &mut FrameBuffer {
        &mut self.fb
    }

    pub fn canvas(&self) -> &FrameBuffer {
        &self.fb
    }

    pub fn clear(&mut self) {
        self.fb.clear_color(Rgb888::BLACK);
    }

    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, size: FontSize, color: Rgb888) {
        let style = MonoTextStyle::new(size.font(), color);
        // FrameBuffer::Error is Infallible
        let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(&mut self.fb);
    }

    /// Draw text horizontally centred on the panel
    pub fn draw_text_centered(&mut self, text: &str, y: i32, size: FontSize, color: Rgb888) {
        let x = (self.width() as i32 - Self::text_width(text, size) as i32) / 2;
        self.draw_text(text, x.max(0), y, size, color);
    }

    pub fn text_width(text: &str, size: FontSize) -> u32 {
        let font = size.font();
        let n = text.chars().count() as u32;
        if n == 0 {
            return 0;
        }
        n * font.character_size.width + (n - 1) * font.character_spacing
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgb888) {
        let _ = Rectangle::new(Point::new(x, y), Size::new(w, h))
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(&mut self.fb);
    }

    /// Copy a packed RGB buffer produced outside embedded-graphics
    pub fn blit_rgb(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        let expected = self.fb.width() * self.fb.height();
        if bytes.len() != expected * 3 {
            return Err(DisplayError::BufferSizeMismatch { expected, actual: bytes.len() / 3 });
        }
        self.fb.blit_rgb(bytes);
        Ok(())
    }

    /// Flush the framebuffer to the driver
    pub fn render(&mut self) -> Result<(), DisplayError> {
        self.driver.write_frame(self.fb.as_slice())
    }

    pub fn set_brightness(&mut self, percent: u8) -> Result<(), DisplayError> {
        let percent = percent.min(100);
        match self.driver.set_brightness(percent) {
            Ok(()) | Err(DisplayError::UnsupportedOperation) => {
                self.brightness = percent;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Lock the shared matrix, mapping poisoning to a display error
pub fn lock(matrix: &SharedMatrix) -> Result<MutexGuard<'_, Matrix>, DisplayError> {
    matrix.lock().map_err(|_| DisplayError::Poisoned)
}
