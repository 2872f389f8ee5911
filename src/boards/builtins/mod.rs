/*
 *  boards/builtins/mod.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Boards compiled into the application
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

use crate::display::{matrix, Matrix, SharedMatrix};
use crate::interrupts::SleepEvent;

use super::catalog::StaticClass;
use super::BoardError;

pub mod clock;
pub mod holiday_countdown;
pub mod pbdisplay;
pub mod screensaver;
pub mod season_countdown;
pub mod weather;
pub mod wxalert;

/// Catalog modules for the shipped boards
pub fn modules() -> Vec<(&'static str, Vec<StaticClass>)> {
    vec![
        ("clock", vec![StaticClass::new("ClockBoard", clock::create)]),
        ("weather", vec![StaticClass::new("WeatherBoard", weather::create)]),
        ("wxalert", vec![StaticClass::new("WxAlertBoard", wxalert::create)]),
        ("screensaver", vec![StaticClass::new("ScreensaverBoard", screensaver::create)]),
        (
            "season_countdown",
            vec![StaticClass::new("SeasonCountdownBoard", season_countdown::create).early_init()],
        ),
        ("holiday_countdown", vec![StaticClass::new("HolidayCountdownBoard", holiday_countdown::create)]),
        ("pbdisplay", vec![StaticClass::legacy("PbDisplay", pbdisplay::create)]),
    ]
}

/// Draw with the matrix locked, then flush it
pub(crate) fn paint<F>(m: &SharedMatrix, f: F) -> Result<(), BoardError>
where
    F: FnOnce(&mut Matrix),
{
    let mut guard = matrix::lock(m)?;
    f(&mut guard);
    guard.render()?;
    Ok(())
}

/// Wait, returning true when the wait was cut short by an interrupt
pub(crate) fn hold(sleep: &SleepEvent, secs: f32) -> bool {
    sleep.wait(Duration::from_secs_f32(secs))
}
