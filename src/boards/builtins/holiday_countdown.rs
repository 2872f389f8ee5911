/*
 *  boards/builtins/holiday_countdown.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Days until the next configured holiday
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

use std::collections::BTreeSet;

use chrono::{Datelike, Local, NaiveDate};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::boards::{Board, BoardContext, BoardError, BoardInfo};
use crate::display::{named_color, FontSize};

use super::{hold, paint};

/// Fixed-date holidays shown unless `include_defaults` is false
const DEFAULT_HOLIDAYS: &[(&str, &str)] = &[
    ("New Year's Day", "01-01"),
    ("Valentine's Day", "02-14"),
    ("St. Patrick's Day", "03-17"),
    ("Canada Day", "07-01"),
    ("Independence Day", "07-04"),
    ("Halloween", "10-31"),
    ("Christmas", "12-25"),
];

#[derive(Debug, Clone, Deserialize)]
struct HolidayEntry {
    name: String,
    date: String,
    #[serde(default)]
    fg: Option<String>,
}

/// One holiday inside the horizon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upcoming {
    pub date: NaiveDate,
    pub name: String,
    pub fg: Option<String>,
}

/// `YYYY-MM-DD`, or `MM-DD` meaning its next occurrence on or after `today`
pub fn parse_holiday_date(token: &str, today: NaiveDate) -> Option<NaiveDate> {
    let token = token.trim();
    if token.len() == 10 {
        return NaiveDate::parse_from_str(token, "%Y-%m-%d").ok();
    }
    let (mm, dd) = token.split_once('-')?;
    let (mm, dd): (u32, u32) = (mm.parse().ok()?, dd.parse().ok()?);
    // Feb 29 rolls forward until a leap year comes round
    (0..8)
        .filter_map(|add| NaiveDate::from_ymd_opt(today.year() + add, mm, dd))
        .find(|d| *d >= today)
}

fn normalize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

pub struct HolidayCountdownBoard {
    ctx: BoardContext,
    entries: Vec<HolidayEntry>,
    ignored: BTreeSet<String>,
    horizon_days: i64,
    hold_secs: u64,
}

pub fn create(ctx: BoardContext) -> Result<Box<dyn Board>, BoardError> {
    let mut entries: Vec<HolidayEntry> = match ctx.config.get("holidays") {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| BoardError::Config(format!("holidays: {}", e)))?,
        None => Vec::new(),
    };
    if ctx.config_bool("include_defaults", true) {
        entries.extend(DEFAULT_HOLIDAYS.iter().map(|(name, date)| HolidayEntry {
            name: (*name).into(),
            date: (*date).into(),
            fg: None,
        }));
    }
    let ignored = ctx
        .config
        .get("ignored")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).map(normalize).collect())
        .unwrap_or_default();

    Ok(Box::new(HolidayCountdownBoard {
        entries,
        ignored,
        horizon_days: ctx.config_u64("horizon_days", 30) as i64,
        hold_secs: ctx.config_u64("display_seconds", 7),
        ctx,
    }))
}

impl HolidayCountdownBoard {
    /// Holidays within the horizon, soonest first, ignored names removed
    pub fn upcoming(&self, today: NaiveDate) -> Vec<Upcoming> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for e in &self.entries {
            let key = normalize(&e.name);
            if self.ignored.contains(&key) {
                continue;
            }
            let Some(date) = parse_holiday_date(&e.date, today) else {
                warn!("Holiday '{}' has a bad date '{}'", e.name, e.date);
                continue;
            };
            let days = (date - today).num_days();
            // configured holidays come before the defaults, so they win a clash
            if (0..=self.horizon_days).contains(&days) && seen.insert((date, key)) {
                out.push(Upcoming { date, name: e.name.clone(), fg: e.fg.clone() });
            }
        }
        out.sort_by_key(|u| u.date);
        out
    }
}

impl Board for HolidayCountdownBoard {
    fn info(&self) -> BoardInfo {
        BoardInfo::new("Holiday countdown", "1.0.0", "Days until upcoming holidays")
    }

    fn render(&mut self) -> Result<(), BoardError> {
        let today = Local::now().date_naive();
        let upcoming = self.upcoming(today);
        debug!("{} holidays within {} days", upcoming.len(), self.horizon_days);

        for h in upcoming {
            let days = (h.date - today).num_days().to_string();
            let fg = h.fg.as_deref().map(named_color).unwrap_or(Rgb888::WHITE);
            let name = h.name.to_uppercase();
            for (stage, secs) in [(0, 1.0), (1, 1.0), (2, self.hold_secs as f32)] {
                paint(&self.ctx.matrix, |m| {
                    m.clear();
                    m.draw_text_centered(&days, 1, FontSize::Large, fg);
                    if stage >= 1 {
                        m.draw_text_centered("DAYS TIL", 13, FontSize::Small, fg);
                    }
                    if stage >= 2 {
                        m.draw_text_centered(&name, 22, FontSize::Small, Rgb888::YELLOW);
                    }
                })?;
                if hold(&self.ctx.sleep, secs) {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_holiday_date() {
        let today = date("2026-10-19");
        assert_eq!(parse_holiday_date("10-31", today), Some(date("2026-10-31")));
        assert_eq!(parse_holiday_date("10-19", today), Some(date("2026-10-19")));
        // already passed this year
        assert_eq!(parse_holiday_date("01-01", today), Some(date("2027-01-01")));
        assert_eq!(parse_holiday_date("02-29", today), Some(date("2028-02-29")));
        assert_eq!(parse_holiday_date("2027-03-17", today), Some(date("2027-03-17")));
        assert_eq!(parse_holiday_date("13-01", today), None);
        assert_eq!(parse_holiday_date("soon", today), None);
    }

    fn board(config: &str) -> HolidayCountdownBoard {
        use crate::boards::BoardRuntime;
        use crate::config::Config;
        use crate::display::drivers::mock::MockDriver;
        use crate::display::Matrix;
        use crate::{AppContext, SleepEvent};

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), config).unwrap();
        let matrix = Matrix::new(Box::new(MockDriver::new(64, 32))).unwrap().shared();
        let rt = BoardRuntime::new(AppContext::new(Config::default(), SleepEvent::new()), matrix);
        let ctx = BoardContext::load(&rt, dir.path());

        let entries = serde_json::from_value(ctx.config["holidays"].clone()).unwrap();
        let ignored = ctx.config["ignored"]
            .as_array()
            .map(|a| a.iter().filter_map(Value::as_str).map(normalize).collect())
            .unwrap_or_default();
        HolidayCountdownBoard { entries, ignored, horizon_days: 30, hold_secs: 1, ctx }
    }

    #[test]
    fn test_upcoming_dedups_and_filters() {
        let b = board(
            r#"{
                "holidays": [
                    {"name": "Halloween", "date": "10-31", "fg": "orange"},
                    {"name": "halloween ", "date": "10-31"},
                    {"name": "Home Opener", "date": "2026-10-25"},
                    {"name": "Canada Day", "date": "07-01"},
                    {"name": "Old Timers", "date": "11-05"}
                ],
                "ignored": ["old timers"]
            }"#,
        );
        let up = b.upcoming(date("2026-10-19"));
        let names: Vec<&str> = up.iter().map(|u| u.name.as_str()).collect();
        // Canada Day is outside the 30 day horizon
        assert_eq!(names, vec!["Home Opener", "Halloween"]);
        assert_eq!(up[1].fg.as_deref(), Some("orange"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  New   Year's Day "), "new year's day");
    }
}
