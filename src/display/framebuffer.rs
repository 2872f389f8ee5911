/*
 *  display/framebuffer.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime-sized RGB framebuffer for embedded-graphics
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Row-major RGB framebuffer sized at runtime from the panel geometry
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    buf: Vec<Rgb888>,
    w: usize,
    h: usize,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![Rgb888::BLACK; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    pub fn as_slice(&self) -> &[Rgb888] { &self.buf }

    pub fn clear_color(&mut self, color: Rgb888) {
        self.buf.fill(color);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb888> {
        if x < self.w && y < self.h {
            self.buf.get(y * self.w + x).copied()
        } else {
            None
        }
    }

    /// Count lit pixels (anything not black)
    pub fn lit_pixels(&self) -> usize {
        self.buf.iter().filter(|&&p| p != Rgb888::BLACK).count()
    }

    /// Copy a packed RGB888 byte buffer (3 bytes per pixel) into the frame
    ///
    /// Returns the number of pixels copied.
    pub fn blit_rgb(&mut self, bytes: &[u8]) -> usize {
        let mut n = 0;
        for (dst, px) in self.buf.iter_mut().zip(bytes.chunks_exact(3)) {
            *dst = Rgb888::new(px[0], px[1], px[2]);
            n += 1;
        }
        n
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_color(color);
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        // clip to the panel, then fill row slices
        let area = area.intersection(&self.bounding_box());
        let Size { width, height } = area.size;
        if width == 0 || height == 0 { return Ok(()); }
        let (x0, y0) = (area.top_left.x as usize, area.top_left.y as usize);
        for row in y0..y0 + height as usize {
            let base = row * self.w + x0;
            self.buf[base..base + width as usize].fill(color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn test_drawing_sets_pixels() {
        let mut fb = FrameBuffer::new(64, 32);
        Line::new(Point::new(0, 0), Point::new(10, 0))
            .into_styled(PrimitiveStyle::with_stroke(Rgb888::RED, 1))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.lit_pixels(), 11);
        assert_eq!(fb.pixel(0, 0), Some(Rgb888::RED));
        assert_eq!(fb.pixel(64, 0), None);
    }

    #[test]
    fn test_fill_solid_clips_to_panel() {
        let mut fb = FrameBuffer::new(8, 8);
        fb.fill_solid(&Rectangle::new(Point::new(6, 6), Size::new(10, 10)), Rgb888::WHITE)
            .unwrap();
        assert_eq!(fb.lit_pixels(), 4);
    }

    #[test]
    fn test_blit_rgb() {
        let mut fb = FrameBuffer::new(2, 1);
        let copied = fb.blit_rgb(&[255, 0, 0, 0, 0, 255, 9]);
        assert_eq!(copied, 2);
        assert_eq!(fb.pixel(0, 0), Some(Rgb888::RED));
        assert_eq!(fb.pixel(1, 0), Some(Rgb888::BLUE));
    }
}
