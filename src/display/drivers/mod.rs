/*
 *  display/drivers/mod.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Matrix driver implementations
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

use crate::config::DisplayConfig;
use crate::display::traits::MatrixDriver;

// Headless driver, also used by the test suites
pub mod mock;

// Terminal emulator for desktop runs
pub mod terminal;

/// Pick a driver for the configured display
pub fn create_driver(cfg: &DisplayConfig) -> Box<dyn MatrixDriver> {
    let (w, h) = cfg.size();
    if cfg.emulated.unwrap_or(false) {
        Box::new(terminal::TerminalDriver::new(w, h))
    } else {
        log::warn!("No panel driver compiled in, running headless");
        Box::new(mock::MockDriver::new(w, h))
    }
}
