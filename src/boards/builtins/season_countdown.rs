/*
 *  boards/builtins/season_countdown.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Days until the NHL regular season starts
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

use chrono::{Datelike, Local, NaiveDate};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use log::{info, warn};

use crate::boards::{Board, BoardContext, BoardError, BoardInfo};
use crate::display::{FontSize, Matrix};

use super::{hold, paint};

/// Opening night used when the board has no `season_start`
const DEFAULT_SEASON_START: &str = "2026-10-06";

pub fn create(ctx: BoardContext) -> Result<Box<dyn Board>, BoardError> {
    let raw = ctx.config_str("season_start", DEFAULT_SEASON_START);
    let season_start = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| BoardError::Config(format!("season_start '{}': {}", raw, e)))?;
    info!("Season countdown to {}", season_start);
    Ok(Box::new(SeasonCountdownBoard {
        season_start,
        text_color: ctx.config_color("text_color", Rgb888::WHITE),
        bg_color: ctx.config_color("season_bg_color", Rgb888::new(0, 0, 128)),
        until_text: ctx.config_str("until_text", "DAYS TIL"),
        display_secs: ctx.config_u64("display_seconds", 5),
        ctx,
    }))
}

pub struct SeasonCountdownBoard {
    ctx: BoardContext,
    season_start: NaiveDate,
    text_color: Rgb888,
    bg_color: Rgb888,
    until_text: String,
    display_secs: u64,
}

/// Whole days from `today` to `start`, negative once the season began
pub fn days_until(today: NaiveDate, start: NaiveDate) -> i64 {
    (start - today).num_days()
}

/// "NHL 26-27" for a season opening in 2026
pub fn season_label(start: NaiveDate) -> String {
    let y = start.year();
    format!("NHL {:02}-{:02}", y % 100, (y + 1) % 100)
}

impl SeasonCountdownBoard {
    fn banner(&self, m: &mut Matrix, label: &str) {
        m.clear();
        let w = m.width();
        m.fill_rect(0, 0, w, 9, self.bg_color);
        m.draw_text_centered(label, 1, FontSize::Small, self.text_color);
    }

    /// Opening-day sequence, stops early on an interrupted wait
    fn opening_day(&self, label: &str) -> Result<(), BoardError> {
        let steps: [(&str, f32); 3] = [("", 0.5), ("STARTS TODAY", 1.0), ("LETS GO", 1.0)];
        let mut shown = Vec::new();
        for (line, secs) in steps {
            if !line.is_empty() {
                shown.push(line);
            }
            paint(&self.ctx.matrix, |m| {
                self.banner(m, label);
                for (i, l) in shown.iter().enumerate() {
                    m.draw_text_centered(l, 12 + i as i32 * 9, FontSize::Medium, self.text_color);
                }
            })?;
            if hold(&self.ctx.sleep, secs) {
                return Ok(());
            }
        }
        hold(&self.ctx.sleep, self.display_secs as f32);
        Ok(())
    }

    fn countdown(&self, label: &str, days: i64) -> Result<(), BoardError> {
        let count = days.to_string();
        let steps: [(usize, f32); 3] = [(0, 0.5), (1, 1.0), (2, 1.0)];
        for (stage, secs) in steps {
            paint(&self.ctx.matrix, |m| {
                self.banner(m, label);
                if stage >= 1 {
                    m.draw_text_centered(&count, 11, FontSize::Large, Rgb888::YELLOW);
                }
                if stage >= 2 {
                    m.draw_text_centered(&self.until_text, 23, FontSize::Small, self.text_color);
                }
            })?;
            if hold(&self.ctx.sleep, secs) {
                return Ok(());
            }
        }
        hold(&self.ctx.sleep, self.display_secs as f32);
        Ok(())
    }
}

impl Board for SeasonCountdownBoard {
    fn info(&self) -> BoardInfo {
        BoardInfo::new("Season countdown", "1.1.0", "Days until the NHL season opener")
    }

    fn validate_config(&self) -> bool {
        self.display_secs > 0
    }

    fn render(&mut self) -> Result<(), BoardError> {
        let days = days_until(Local::now().date_naive(), self.season_start);
        let label = season_label(self.season_start);
        match days {
            0 => self.opening_day(&label),
            d if d > 0 => self.countdown(&label, d),
            _ => {
                warn!("Season started {} days ago, nothing to count down", -days);
                Ok(())
            }
        }
    }
}
