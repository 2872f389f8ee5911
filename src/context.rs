/*
 *  context.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Shared application context handed to every board and background job
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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::config::Config;
use crate::data::weather::WeatherSnapshot;
use crate::interrupts::{Interrupts, SleepEvent};

/// Game state as reported by the league data feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    /// No game for the preferred team today
    #[default]
    OffDay,
    /// Game today, not started yet
    Scheduled,
    /// Game in progress, between periods
    Intermission,
    /// Game over
    PostGame,
}

impl GameState {
    pub fn name(&self) -> &'static str {
        match self {
            GameState::OffDay => "off_day",
            GameState::Scheduled => "scheduled",
            GameState::Intermission => "intermission",
            GameState::PostGame => "post_game",
        }
    }

    /// `off_day`, `scheduled`, `intermission` or `post_game`; `-` may stand in for `_`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "off_day" => Some(GameState::OffDay),
            "scheduled" => Some(GameState::Scheduled),
            "intermission" => Some(GameState::Intermission),
            "post_game" => Some(GameState::PostGame),
            _ => None,
        }
    }
}

/// Which board is on screen and which one the screensaver displaced
#[derive(Debug, Clone, Default)]
pub struct BoardTrack {
    pub curr_board: Option<String>,
    pub prev_board: Option<String>,
}

/// Process-wide shared state
///
/// Producers (refresh jobs, input listeners) write through the setters;
/// the rotation and boards read. Every field is behind its own lock or
/// atomic, nothing needs a multi-field transaction.
#[derive(Debug)]
pub struct AppContext {
    config: RwLock<Config>,
    pub interrupts: Interrupts,
    game_state: Mutex<GameState>,
    weather: RwLock<Option<WeatherSnapshot>>,
    track: Mutex<BoardTrack>,
    shutdown: AtomicBool,
}

impl AppContext {
    pub fn new(config: Config, sleep: Arc<SleepEvent>) -> Arc<Self> {
        Arc::new(Self {
            config: RwLock::new(config),
            interrupts: Interrupts::new(sleep),
            game_state: Mutex::new(GameState::default()),
            weather: RwLock::new(None),
            track: Mutex::new(BoardTrack::default()),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> Config {
        self.config.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn game_state(&self) -> GameState {
        *self.game_state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn set_game_state(&self, state: GameState) {
        let mut current = self.game_state.lock().unwrap_or_else(|p| p.into_inner());
        if *current != state {
            log::info!("Game state {} -> {}", current.name(), state.name());
            *current = state;
        }
    }

    pub fn weather(&self) -> Option<WeatherSnapshot> {
        self.weather.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn set_weather(&self, snapshot: WeatherSnapshot) {
        *self.weather.write().unwrap_or_else(|p| p.into_inner()) = Some(snapshot);
    }

    pub fn board_track(&self) -> BoardTrack {
        self.track.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn set_curr_board(&self, id: &str) {
        self.track.lock().unwrap_or_else(|p| p.into_inner()).curr_board = Some(id.to_string());
    }

    pub fn set_prev_board(&self, id: &str) {
        self.track.lock().unwrap_or_else(|p| p.into_inner()).prev_board = Some(id.to_string());
    }

    pub fn sleep_event(&self) -> &Arc<SleepEvent> {
        self.interrupts.sleep_event()
    }

    /// Ask the main loop to stop after the current rotation
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.sleep_event().set();
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_track_updates() {
        let ctx = AppContext::new(Config::default(), SleepEvent::new());
        ctx.set_curr_board("clock");
        ctx.set_prev_board("standings");
        let track = ctx.board_track();
        assert_eq!(track.curr_board.as_deref(), Some("clock"));
        assert_eq!(track.prev_board.as_deref(), Some("standings"));
    }

    #[test]
    fn test_shutdown_wakes_sleepers() {
        let ctx = AppContext::new(Config::default(), SleepEvent::new());
        assert!(!ctx.shutdown_requested());
        ctx.request_shutdown();
        assert!(ctx.shutdown_requested());
        assert!(ctx.sleep_event().is_set());
    }

    #[test]
    fn test_game_state_default_off_day() {
        let ctx = AppContext::new(Config::default(), SleepEvent::new());
        assert_eq!(ctx.game_state(), GameState::OffDay);
        ctx.set_game_state(GameState::Intermission);
        assert_eq!(ctx.game_state(), GameState::Intermission);
    }

    #[test]
    fn test_game_state_names() {
        assert_eq!(GameState::from_name("post_game"), Some(GameState::PostGame));
        assert_eq!(GameState::from_name(" Off-Day "), Some(GameState::OffDay));
        assert_eq!(GameState::from_name("overtime"), None);
        assert_eq!(GameState::Intermission.name(), "intermission");
    }
}
