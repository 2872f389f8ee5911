/*
 *  boards/builtins/wxalert.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Weather alert banner board
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

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

use crate::boards::{Board, BoardContext, BoardError, BoardInfo};
use crate::data::weather::WeatherAlert;
use crate::display::{FontSize, Matrix};

use super::{hold, paint};

pub fn create(ctx: BoardContext) -> Result<Box<dyn Board>, BoardError> {
    Ok(Box::new(WxAlertBoard {
        display_secs: ctx.config_u64("display_seconds", 10),
        banner: ctx.config_color("banner_color", Rgb888::RED),
        ctx,
    }))
}

pub struct WxAlertBoard {
    ctx: BoardContext,
    display_secs: u64,
    banner: Rgb888,
}

/// Split an alert event into lines that fit `width` pixels
pub fn wrap_event(event: &str, width: u32, size: FontSize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in event.split_whitespace() {
        let candidate = if line.is_empty() { word.to_string() } else { format!("{} {}", line, word) };
        if Matrix::text_width(&candidate, size) > width && !line.is_empty() {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

impl WxAlertBoard {
    fn draw(&self, m: &mut Matrix, alert: Option<&WeatherAlert>) {
        m.clear();
        let w = m.width();
        m.fill_rect(0, 0, w, 8, self.banner);
        m.draw_text_centered("WX ALERT", 1, FontSize::Small, Rgb888::WHITE);
        let event = alert.map(|a| a.event.to_uppercase()).unwrap_or_else(|| "NO DETAILS".into());
        for (i, line) in wrap_event(&event, w, FontSize::Small).iter().take(3).enumerate() {
            m.draw_text_centered(line, 10 + i as i32 * 7, FontSize::Small, Rgb888::YELLOW);
        }
    }
}

impl Board for WxAlertBoard {
    fn info(&self) -> BoardInfo {
        BoardInfo::new("Weather alert", "1.0.0", "Active weather alert banner")
    }

    fn render(&mut self) -> Result<(), BoardError> {
        let wx = self.ctx.app.weather();
        let alert = wx.as_ref().and_then(|w| w.alerts.first());
        paint(&self.ctx.matrix, |m| self.draw(m, alert))?;
        hold(&self.ctx.sleep, self.display_secs as f32);
        Ok(())
    }
}
