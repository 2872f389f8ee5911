/*
 *  mode_controller.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Rotation mode controller - picks the board list for the current
 *  game state
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

use crate::config::BoardsConfig;
use crate::context::GameState;

/// One of the four rotation contexts, each with its own board list
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum RotationMode {
    Scheduled,
    OffDay,
    Intermission,
    PostGame,
}

impl RotationMode {
    pub fn name(&self) -> &'static str {
        match self {
            RotationMode::Scheduled => "scheduled",
            RotationMode::OffDay => "off_day",
            RotationMode::Intermission => "intermission",
            RotationMode::PostGame => "post_game",
        }
    }

    /// Live-game context must not be interrupted by the idle screen
    pub fn allows_screensaver(&self) -> bool {
        !matches!(self, RotationMode::Intermission)
    }

    /// Board list for this mode
    pub fn boards<'a>(&self, cfg: &'a BoardsConfig) -> &'a [String] {
        match self {
            RotationMode::Scheduled => &cfg.scheduled,
            RotationMode::OffDay => &cfg.off_day,
            RotationMode::Intermission => &cfg.intermission,
            RotationMode::PostGame => &cfg.post_game,
        }
    }
}

/// Mode controller - determines which rotation to run from the game state
pub struct ModeController {
    current_mode: RotationMode,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeController {
    pub fn new() -> Self {
        Self {
            current_mode: RotationMode::OffDay,
        }
    }

    pub fn current_mode(&self) -> RotationMode {
        self.current_mode
    }

    /// Determine and update the rotation mode from the game state
    /// Returns true if mode changed
    pub fn update_mode(&mut self, state: GameState) -> bool {
        let new_mode = Self::determine_mode(state);

        if new_mode != self.current_mode {
            log::info!("Rotation mode changed: {:?} -> {:?}", self.current_mode, new_mode);
            self.current_mode = new_mode;
            true
        } else {
            false
        }
    }

    fn determine_mode(state: GameState) -> RotationMode {
        match state {
            GameState::OffDay => RotationMode::OffDay,
            GameState::Scheduled => RotationMode::Scheduled,
            GameState::Intermission => RotationMode::Intermission,
            GameState::PostGame => RotationMode::PostGame,
        }
    }
}
