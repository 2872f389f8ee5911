/*
 *  interrupts.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Interrupt flags and the cancellable wait shared by every board
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

//! Out-of-band signals that can redirect the board rotation.
//!
//! Each interrupt source owns exactly one flag. Producers (button thread,
//! control listener, weather alert job, screensaver job) raise flags from
//! any thread; the rotation scheduler is the only consumer that clears them.
//!
//! ## Memory ordering
//!
//! All flag loads and stores use `SeqCst`. The external trigger carries a
//! payload (the board id): the producer writes the id under its mutex
//! *before* raising the flag, and the consumer reads the id *after* observing
//! the flag, so a raised flag always has its id visible.
//!
//! A raise that lands between the scheduler's load and its clear is consumed
//! by that clear. The scheduler uses `swap(false)` where it consumes a flag,
//! which narrows this to a single atomic step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Interrupt sources in rotation priority order (highest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interrupt {
    /// Physical push-button
    Manual,
    /// External message (control socket)
    External,
    /// Weather alert issued by the alert feed
    WeatherAlert,
    /// Idle-screen window
    Screensaver,
}

impl Interrupt {
    pub fn name(&self) -> &'static str {
        match self {
            Interrupt::Manual => "pushbutton",
            Interrupt::External => "external",
            Interrupt::WeatherAlert => "weather alert",
            Interrupt::Screensaver => "screensaver",
        }
    }
}

/// Cancellable wait primitive (an event any thread can signal)
///
/// Boards pace themselves with [`SleepEvent::wait`]. Setting the event wakes
/// the current wait early; it does not abort drawing or network calls that
/// are already running inside a board.
#[derive(Debug, Default)]
pub struct SleepEvent {
    signalled: Mutex<bool>,
    cond: Condvar,
}

impl SleepEvent {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Signal the event, waking any current waiter
    pub fn set(&self) {
        let mut signalled = self.signalled.lock().unwrap_or_else(|p| p.into_inner());
        *signalled = true;
        self.cond.notify_all();
    }

    /// Reset the event so the next wait runs its full duration
    pub fn clear(&self) {
        let mut signalled = self.signalled.lock().unwrap_or_else(|p| p.into_inner());
        *signalled = false;
    }

    pub fn is_set(&self) -> bool {
        *self.signalled.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Block for up to `timeout`; returns true if the event was signalled
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signalled = self.signalled.lock().unwrap_or_else(|p| p.into_inner());
        while !*signalled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .cond
                .wait_timeout(signalled, deadline - now)
                .unwrap_or_else(|p| p.into_inner());
            signalled = guard;
        }
        true
    }
}

/// The four interrupt flags plus the external trigger payload
#[derive(Debug)]
pub struct Interrupts {
    manual: AtomicBool,
    external: AtomicBool,
    weather_alert: AtomicBool,
    screensaver: AtomicBool,
    external_board: Mutex<Option<String>>,
    sleep: Arc<SleepEvent>,
}

impl Interrupts {
    pub fn new(sleep: Arc<SleepEvent>) -> Self {
        Self {
            manual: AtomicBool::new(false),
            external: AtomicBool::new(false),
            weather_alert: AtomicBool::new(false),
            screensaver: AtomicBool::new(false),
            external_board: Mutex::new(None),
            sleep,
        }
    }

    fn flag(&self, which: Interrupt) -> &AtomicBool {
        match which {
            Interrupt::Manual => &self.manual,
            Interrupt::External => &self.external,
            Interrupt::WeatherAlert => &self.weather_alert,
            Interrupt::Screensaver => &self.screensaver,
        }
    }

    pub fn is_set(&self, which: Interrupt) -> bool {
        self.flag(which).load(Ordering::SeqCst)
    }

    /// Raise a flag without waking the current board
    pub fn raise_quiet(&self, which: Interrupt) {
        self.flag(which).store(true, Ordering::SeqCst);
    }

    /// Raise a flag and cut the current board's wait short
    pub fn raise(&self, which: Interrupt) {
        self.raise_quiet(which);
        self.sleep.set();
    }

    pub fn clear(&self, which: Interrupt) {
        self.flag(which).store(false, Ordering::SeqCst);
    }

    /// Atomically read and clear a flag
    pub fn take(&self, which: Interrupt) -> bool {
        self.flag(which).swap(false, Ordering::SeqCst)
    }

    pub fn any_set(&self) -> bool {
        [
            Interrupt::Manual,
            Interrupt::External,
            Interrupt::WeatherAlert,
            Interrupt::Screensaver,
        ]
        .iter()
        .any(|i| self.is_set(*i))
    }

    /// Push-button press
    pub fn trigger_manual(&self) {
        self.raise(Interrupt::Manual);
    }

    /// External request to show a specific board
    pub fn trigger_external(&self, board_id: &str) {
        {
            let mut slot = self.external_board.lock().unwrap_or_else(|p| p.into_inner());
            *slot = Some(board_id.to_string());
        }
        self.raise(Interrupt::External);
    }

    /// Board requested by the last external trigger
    pub fn external_board(&self) -> Option<String> {
        self.external_board
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn trigger_weather_alert(&self) {
        self.raise(Interrupt::WeatherAlert);
    }

    /// Enter or leave the screensaver window
    pub fn set_screensaver(&self, active: bool) {
        if active {
            self.raise(Interrupt::Screensaver);
        } else {
            self.clear(Interrupt::Screensaver);
            // wake the screensaver board so it can hand back to the rotation
            self.sleep.set();
        }
    }

    pub fn sleep_event(&self) -> &Arc<SleepEvent> {
        &self.sleep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_wait_times_out_when_not_signalled() {
        let ev = SleepEvent::new();
        let start = Instant::now();
        assert!(!ev.wait(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_wait_cut_short_by_other_thread() {
        let ev = SleepEvent::new();
        let ev2 = Arc::clone(&ev);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            ev2.set();
        });
        let start = Instant::now();
        assert!(ev.wait(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_clear_resets_event() {
        let ev = SleepEvent::new();
        ev.set();
        assert!(ev.is_set());
        ev.clear();
        assert!(!ev.is_set());
        assert!(!ev.wait(Duration::from_millis(5)));
    }

    #[test]
    fn test_external_trigger_carries_board() {
        let ints = Interrupts::new(SleepEvent::new());
        ints.trigger_external("standings");
        assert!(ints.is_set(Interrupt::External));
        assert_eq!(ints.external_board().as_deref(), Some("standings"));
        assert!(ints.sleep_event().is_set());
    }

    #[test]
    fn test_take_consumes_flag() {
        let ints = Interrupts::new(SleepEvent::new());
        ints.trigger_manual();
        assert!(ints.take(Interrupt::Manual));
        assert!(!ints.take(Interrupt::Manual));
        assert!(!ints.any_set());
    }

    #[test]
    fn test_screensaver_off_wakes_waiter() {
        let ints = Interrupts::new(SleepEvent::new());
        ints.set_screensaver(true);
        ints.sleep_event().clear();
        ints.set_screensaver(false);
        assert!(!ints.is_set(Interrupt::Screensaver));
        assert!(ints.sleep_event().is_set());
    }
}
