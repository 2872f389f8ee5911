/*
 *  boards/builtins/weather.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Current conditions board
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
use crate::data::weather::WeatherSnapshot;
use crate::display::{FontSize, Matrix};

use super::{hold, paint};

pub fn create(ctx: BoardContext) -> Result<Box<dyn Board>, BoardError> {
    Ok(Box::new(WeatherBoard {
        display_secs: ctx.config_u64("display_seconds", 10),
        ctx,
    }))
}

pub struct WeatherBoard {
    ctx: BoardContext,
    display_secs: u64,
}

fn draw(m: &mut Matrix, wx: Option<&WeatherSnapshot>) {
    m.clear();
    let Some(wx) = wx else {
        let y = m.height() as i32 / 2 - 4;
        m.draw_text_centered("NO WX DATA", y, FontSize::Medium, Rgb888::RED);
        return;
    };
    m.draw_text_centered(&wx.temp_label(), 1, FontSize::Large, Rgb888::WHITE);
    m.draw_text_centered(&wx.description.to_uppercase(), 13, FontSize::Small, Rgb888::CYAN);
    let feels = format!("FEELS {}", wx.feels_like_label());
    m.draw_text_centered(&feels, 20, FontSize::Small, Rgb888::new(255, 140, 0));
    m.draw_text_centered(&wx.wind_label(), 26, FontSize::Small, Rgb888::new(128, 128, 128));
}

impl Board for WeatherBoard {
    fn info(&self) -> BoardInfo {
        BoardInfo::new("Weather", "1.0.0", "Current temperature and conditions")
    }

    fn render(&mut self) -> Result<(), BoardError> {
        let wx = self.ctx.app.weather();
        paint(&self.ctx.matrix, |m| draw(m, wx.as_ref()))?;
        hold(&self.ctx.sleep, self.display_secs as f32);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::MockDriver;

    #[test]
    fn test_no_data_still_draws() {
        let mut m = Matrix::new(Box::new(MockDriver::new(64, 32))).unwrap();
        draw(&mut m, None);
        assert!(m.canvas().lit_pixels() > 0);
    }
}
