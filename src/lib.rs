/*
 *  lib.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Library root - board orchestration, display surface and data feeds
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

pub mod config;
pub mod context;
pub mod interrupts;
pub mod mode_controller;
pub mod display;
pub mod boards;
pub mod data;
pub mod input;

pub use context::{AppContext, GameState};
pub use interrupts::{Interrupts, SleepEvent};
pub use mode_controller::{ModeController, RotationMode};

/// Application version, compared against manifest `requirements.app_version`
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
