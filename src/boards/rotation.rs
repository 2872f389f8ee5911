/*
 *  boards/rotation.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Per-mode board rotation with interrupt redirects
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

use std::panic::{self, AssertUnwindSafe};

use log::{debug, error, info};

use crate::interrupts::Interrupt;
use crate::mode_controller::RotationMode;

use super::{BoardRuntime, InstanceCache, Registry};

/// Board shown while a weather alert is pending
pub const WX_ALERT_BOARD: &str = "wxalert";
/// Board shown inside the screensaver window
pub const SCREENSAVER_BOARD: &str = "screensaver";

/// How a rotation call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// Every slot of the mode's list was visited
    Done,
    /// Shutdown was requested mid-rotation
    Shutdown,
}

/// What one rotation call did, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationReport {
    pub outcome: RotationOutcome,
    /// Board ids whose render was attempted
    pub rendered: Vec<String>,
    /// Ids skipped because they were unknown or failed to build
    pub skipped: Vec<String>,
}

/// Board chosen for a pass
#[derive(Debug, PartialEq, Eq)]
struct Pass {
    board: String,
    redirected: bool,
    /// Trigger held through the pass and cleared after the render
    consume_after: Option<Interrupt>,
}

/// Registry plus instance cache, the entry points of the rotation
pub struct Boards {
    registry: Registry,
    cache: InstanceCache,
}

impl Boards {
    pub fn new(registry: Registry) -> Self {
        Self { registry, cache: InstanceCache::new() }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache(&self) -> &InstanceCache {
        &self.cache
    }

    pub fn initialize_early(&self, rt: &BoardRuntime) -> usize {
        super::early_init::initialize_flagged(&self.registry, &self.cache, rt)
    }

    pub fn scheduled(&self, rt: &BoardRuntime) -> RotationReport {
        self.run(RotationMode::Scheduled, rt)
    }

    pub fn off_day(&self, rt: &BoardRuntime) -> RotationReport {
        self.run(RotationMode::OffDay, rt)
    }

    pub fn intermission(&self, rt: &BoardRuntime) -> RotationReport {
        self.run(RotationMode::Intermission, rt)
    }

    pub fn post_game(&self, rt: &BoardRuntime) -> RotationReport {
        self.run(RotationMode::PostGame, rt)
    }

    /// One pass over the mode's board list
    ///
    /// Every pass renders exactly one board. A redirected pass shows the
    /// interrupt's board and retries the same slot; a normal pass shows
    /// the slot's board and advances.
    pub fn run(&self, mode: RotationMode, rt: &BoardRuntime) -> RotationReport {
        let cfg = rt.app.config();
        let ids: Vec<String> = mode.boards(&cfg.boards()).to_vec();
        let button_board = cfg.pushbutton().state_triggered1;
        let mut report = RotationReport {
            outcome: RotationOutcome::Done,
            rendered: Vec::new(),
            skipped: Vec::new(),
        };
        debug!("Starting {} rotation: {:?}", mode.name(), ids);

        let mut index = 0;
        while index < ids.len() {
            if rt.app.shutdown_requested() {
                report.outcome = RotationOutcome::Shutdown;
                return report;
            }

            let pass = next_pass(rt, mode, &ids[index], &button_board);
            if pass.redirected {
                info!("{} rotation: showing '{}' instead of '{}'", mode.name(), pass.board, ids[index]);
            }

            let shown = self.show(&pass.board, rt);
            if shown {
                report.rendered.push(pass.board.clone());
            } else {
                report.skipped.push(pass.board.clone());
            }

            if let Some(trigger) = pass.consume_after {
                rt.app.interrupts.clear(trigger);
            }
            // the screensaver flag stays up for the whole window, a missing
            // screensaver board must not pin the rotation to one slot
            let stuck = !shown && pass.board == SCREENSAVER_BOARD;
            if !pass.redirected || stuck {
                index += 1;
            }
        }
        report
    }

    /// Resolve, build and render one board; false if it could not be shown
    fn show(&self, id: &str, rt: &BoardRuntime) -> bool {
        let Some(desc) = self.registry.resolve(id) else {
            error!("Board '{}' not found, skipping", id);
            return false;
        };
        let Some(handle) = self.cache.get_or_create(desc, rt) else {
            return false;
        };

        rt.app.set_curr_board(id);
        rt.sleep.clear();

        let mut board = handle.lock().unwrap_or_else(|p| p.into_inner());
        match panic::catch_unwind(AssertUnwindSafe(|| board.render())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Board '{}' render failed: {}", id, e),
            Err(_) => error!("Board '{}' panicked while rendering", id),
        }
        true
    }
}

/// Pick the board for this pass in priority order
fn next_pass(rt: &BoardRuntime, mode: RotationMode, slot: &str, button_board: &str) -> Pass {
    let ints = &rt.app.interrupts;
    let screensaver_on = ints.is_set(Interrupt::Screensaver);

    // keep the trigger raised while the screensaver runs so it can see the wake request
    let hold_or_clear = |which: Interrupt| -> Option<Interrupt> {
        if screensaver_on {
            Some(which)
        } else {
            ints.clear(which);
            None
        }
    };

    if ints.is_set(Interrupt::Manual) {
        info!("Push button triggered, showing '{}'", button_board);
        return Pass {
            board: button_board.to_string(),
            redirected: true,
            consume_after: hold_or_clear(Interrupt::Manual),
        };
    }

    if ints.is_set(Interrupt::External) {
        match ints.external_board() {
            Some(board) => {
                info!("External trigger, showing '{}'", board);
                return Pass {
                    board,
                    redirected: true,
                    consume_after: hold_or_clear(Interrupt::External),
                };
            }
            None => ints.clear(Interrupt::External),
        }
    }

    if ints.take(Interrupt::WeatherAlert) {
        info!("Weather alert triggered, showing '{}'", WX_ALERT_BOARD);
        return Pass { board: WX_ALERT_BOARD.to_string(), redirected: true, consume_after: None };
    }

    if screensaver_on && mode.allows_screensaver() {
        rt.app.set_prev_board(slot);
        return Pass { board: SCREENSAVER_BOARD.to_string(), redirected: true, consume_after: None };
    }

    Pass { board: slot.to_string(), redirected: false, consume_after: None }
}
