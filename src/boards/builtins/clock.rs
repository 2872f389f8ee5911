/*
 *  boards/builtins/clock.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Clock board
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

use chrono::{DateTime, Local, TimeZone};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

use crate::boards::layout::{Align, LayoutElement};
use crate::boards::{Board, BoardContext, BoardError, BoardInfo};
use crate::display::{FontSize, Matrix};

use super::{hold, paint};

pub fn create(ctx: BoardContext) -> Result<Box<dyn Board>, BoardError> {
    Ok(Box::new(ClockBoard::new(ctx)))
}

pub struct ClockBoard {
    ctx: BoardContext,
    display_secs: u64,
    hour24: bool,
    time_color: Rgb888,
    date_color: Rgb888,
}

impl ClockBoard {
    pub fn new(ctx: BoardContext) -> Self {
        Self {
            display_secs: ctx.config_u64("display_seconds", 10),
            hour24: ctx.config_bool("hour24", false),
            time_color: ctx.config_color("time_color", Rgb888::WHITE),
            date_color: ctx.config_color("date_color", Rgb888::new(255, 140, 0)),
            ctx,
        }
    }

    fn element(&self, name: &str, fallback: LayoutElement) -> LayoutElement {
        self.ctx
            .layout
            .as_ref()
            .and_then(|l| l.element("clock", name))
            .unwrap_or(fallback)
    }

    fn draw(&self, m: &mut Matrix, now: &DateTime<Local>) {
        let (time, date) = format_clock(now, self.hour24);
        let h = m.height() as i32;
        let time_el = self.element("time", LayoutElement::centered(h / 4 - 2));
        let date_el = self.element("date", LayoutElement::centered(h / 2 + 4));

        m.clear();
        for (el, text, size, color) in [
            (&time_el, time.as_str(), FontSize::Large, self.time_color),
            (&date_el, date.as_str(), FontSize::Small, self.date_color),
        ] {
            let size = if el.font.is_some() { el.font_size() } else { size };
            let color = el.color_or(color);
            match el.align {
                Align::Center => m.draw_text_centered(text, el.y, size, color),
                Align::Left => m.draw_text(text, el.x, el.y, size, color),
            }
        }
    }
}

/// ("7:05 PM", "MON OCT 19") or ("19:05", ...) in 24h mode
pub fn format_clock<Tz: TimeZone>(now: &DateTime<Tz>, hour24: bool) -> (String, String)
where
    Tz::Offset: std::fmt::Display,
{
    let time = if hour24 {
        now.format("%H:%M").to_string()
    } else {
        now.format("%-I:%M %p").to_string()
    };
    (time, now.format("%a %b %d").to_string().to_uppercase())
}

impl Board for ClockBoard {
    fn info(&self) -> BoardInfo {
        BoardInfo::new("Clock", "1.0.0", "Current time and date")
    }

    fn render(&mut self) -> Result<(), BoardError> {
        // redraw every second so the minute rolls over on time
        for _ in 0..self.display_secs.max(1) {
            let now = Local::now();
            paint(&self.ctx.matrix, |m| self.draw(m, &now))?;
            if hold(&self.ctx.sleep, 1.0) {
                break;
            }
        }
        Ok(())
    }
}
