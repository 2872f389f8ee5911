/*
 *  boards/builtins/screensaver.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Dimmed idle board shown inside the screensaver window
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

use std::time::Duration;

use chrono::Local;
use embedded_graphics::pixelcolor::Rgb888;
use log::{debug, info};
use rand::Rng;

use crate::boards::{Board, BoardContext, BoardError, BoardInfo};
use crate::display::{matrix, FontSize, Matrix};
use crate::interrupts::Interrupt;

use super::paint;

pub fn create(ctx: BoardContext) -> Result<Box<dyn Board>, BoardError> {
    let brightness = ctx.config_u64("brightness", 5).min(100) as u8;
    Ok(Box::new(ScreensaverBoard {
        brightness,
        color: ctx.config_color("color", Rgb888::new(64, 64, 64)),
        tick: Duration::from_secs(ctx.config_u64("tick_seconds", 60).max(1)),
        ctx,
    }))
}

pub struct ScreensaverBoard {
    ctx: BoardContext,
    brightness: u8,
    color: Rgb888,
    tick: Duration,
}

impl ScreensaverBoard {
    /// True while nothing asks the screensaver to hand back
    fn should_stay(&self) -> bool {
        let ints = &self.ctx.app.interrupts;
        ints.is_set(Interrupt::Screensaver)
            && !ints.is_set(Interrupt::Manual)
            && !ints.is_set(Interrupt::External)
            && !ints.is_set(Interrupt::WeatherAlert)
            && !self.ctx.app.shutdown_requested()
    }

    fn set_brightness(&self, percent: u8) -> Result<(), BoardError> {
        matrix::lock(&self.ctx.matrix)?.set_brightness(percent)?;
        Ok(())
    }
}

/// Random top-left corner that keeps `text` fully on the panel
pub fn drift_origin(width: u32, height: u32, text: &str) -> (i32, i32) {
    let size = FontSize::Small;
    let max_x = width.saturating_sub(Matrix::text_width(text, size)) as i32;
    let max_y = height.saturating_sub(size.font().character_size.height) as i32;
    let mut rng = rand::rng();
    (rng.random_range(0..=max_x), rng.random_range(0..=max_y))
}

impl Board for ScreensaverBoard {
    fn info(&self) -> BoardInfo {
        BoardInfo::new("Screensaver", "1.0.0", "Dimmed clock for quiet hours")
    }

    fn render(&mut self) -> Result<(), BoardError> {
        let restore = matrix::lock(&self.ctx.matrix)?.brightness();
        info!("Screensaver on, dimming to {}%", self.brightness);
        self.set_brightness(self.brightness)?;

        let mut result = Ok(());
        while self.should_stay() {
            let now = Local::now().format("%H:%M").to_string();
            let color = self.color;
            if let Err(e) = paint(&self.ctx.matrix, |m| {
                // wander a little each tick to spread LED wear
                let (x, y) = drift_origin(m.width(), m.height(), &now);
                m.clear();
                m.draw_text(&now, x, y, FontSize::Small, color);
            }) {
                result = Err(e);
                break;
            }
            if self.ctx.sleep.wait(self.tick) {
                debug!("Screensaver woken");
                self.ctx.sleep.clear();
            }
        }

        info!("Screensaver off, restoring brightness {}%", restore);
        self.set_brightness(restore)?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drift_stays_on_panel() {
        for _ in 0..200 {
            let (x, y) = drift_origin(64, 32, "23:59");
            assert!((0..=44).contains(&x), "x = {}", x);
            assert!((0..=26).contains(&y), "y = {}", y);
        }
        // text wider than the panel pins to the left edge
        assert_eq!(drift_origin(8, 6, "23:59"), (0, 0));
    }
}
