/*
 *  input/pushbutton.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  GPIO push-button watcher
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

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::context::AppContext;

const DEBOUNCE: Duration = Duration::from_millis(50);
#[cfg(feature = "hardware")]
const POLL: Duration = Duration::from_millis(10);

/// Turns a bouncing pin level into clean press events
#[derive(Debug)]
pub struct Debouncer {
    stable: bool,
    candidate: bool,
    since: Instant,
    threshold: Duration,
}

impl Debouncer {
    pub fn new(threshold: Duration, now: Instant) -> Self {
        Self { stable: false, candidate: false, since: now, threshold }
    }

    /// Feed one sample; true exactly once per settled press
    pub fn update(&mut self, pressed: bool, now: Instant) -> bool {
        if pressed != self.candidate {
            self.candidate = pressed;
            self.since = now;
            return false;
        }
        if self.candidate != self.stable && now.duration_since(self.since) >= self.threshold {
            self.stable = self.candidate;
            return self.stable;
        }
        false
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE, Instant::now())
    }
}

/// Start the button watcher thread if the button is enabled
pub fn spawn(app: Arc<AppContext>) -> Option<JoinHandle<()>> {
    let cfg = app.config().pushbutton();
    if !cfg.enabled {
        return None;
    }
    watch(app, cfg.gpio_pin)
}

#[cfg(feature = "hardware")]
fn watch(app: Arc<AppContext>, gpio_pin: u8) -> Option<JoinHandle<()>> {
    use rppal::gpio::Gpio;

    let pin = match Gpio::new().and_then(|g| g.get(gpio_pin)) {
        Ok(p) => p.into_input_pullup(),
        Err(e) => {
            warn!("Push-button on GPIO {} unavailable: {}", gpio_pin, e);
            return None;
        }
    };
    info!("Watching push-button on GPIO {}", gpio_pin);

    let spawned = std::thread::Builder::new()
        .name("pushbutton".into())
        .spawn(move || {
            let mut debounce = Debouncer::default();
            while !app.shutdown_requested() {
                // pulled up, so pressed reads low
                if debounce.update(pin.is_low(), Instant::now()) {
                    info!("Push-button pressed");
                    app.interrupts.trigger_manual();
                }
                std::thread::sleep(POLL);
            }
        });
    match spawned {
        Ok(h) => Some(h),
        Err(e) => {
            warn!("Could not start push-button thread: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "hardware"))]
fn watch(_app: Arc<AppContext>, gpio_pin: u8) -> Option<JoinHandle<()>> {
    warn!("Push-button on GPIO {} configured but built without the 'hardware' feature", gpio_pin);
    info!("Use the control listener 'button' command instead");
    None
}
