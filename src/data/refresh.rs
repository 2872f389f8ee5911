/*
 *  data/refresh.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Periodic refresh jobs feeding the application context
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

//! Every job runs on the tokio runtime and talks to the rotation only
//! through [`AppContext`] setters and interrupt flags.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveTime, Timelike};
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::parse_hhmm;
use crate::context::AppContext;
use crate::interrupts::Interrupt;

use super::weather::{OwmClient, WeatherAlert};

const SCREENSAVER_CHECK: Duration = Duration::from_secs(30);

/// Is `now` inside `[start, stop)`; windows may wrap past midnight
pub fn in_window(now: NaiveTime, start: NaiveTime, stop: NaiveTime) -> bool {
    if start <= stop {
        now >= start && now < stop
    } else {
        now >= start || now < stop
    }
}

/// Remembers which alerts were already announced
#[derive(Debug, Default)]
pub struct AlertTracker {
    seen: HashSet<(String, i64)>,
}

impl AlertTracker {
    /// Alerts not announced before; forgets alerts that have expired
    pub fn fresh(&mut self, alerts: &[WeatherAlert]) -> Vec<WeatherAlert> {
        let current: HashSet<(String, i64)> =
            alerts.iter().map(|a| (a.event.clone(), a.start)).collect();
        let fresh = alerts
            .iter()
            .filter(|a| !self.seen.contains(&(a.event.clone(), a.start)))
            .cloned()
            .collect();
        self.seen = current;
        fresh
    }
}

/// Reports only crossings of the screensaver window
///
/// Between crossings the flag is left alone, so `screensaver on|off` from
/// the control listener holds until the window next opens or closes.
#[derive(Debug, Default)]
pub struct WindowEdge {
    last: Option<bool>,
}

impl WindowEdge {
    /// The new state when `inside` differs from the previous check; the first check always reports
    pub fn step(&mut self, inside: bool) -> Option<bool> {
        let changed = self.last != Some(inside);
        self.last = Some(inside);
        changed.then_some(inside)
    }
}

fn hhmm(s: &str) -> Option<NaiveTime> {
    let (h, m) = parse_hhmm(s)?;
    NaiveTime::from_hms_opt(h, m, 0)
}

/// Start every enabled refresh job
pub fn spawn_all(app: Arc<AppContext>) -> Vec<JoinHandle<()>> {
    let cfg = app.config();
    let mut jobs = Vec::new();

    let wx = cfg.weather();
    if wx.enabled || wx.show_alerts {
        match OwmClient::from_config(&wx) {
            Ok(client) => {
                if wx.enabled {
                    let every = Duration::from_secs(wx.update_freq_mins.max(1) * 60);
                    jobs.push(tokio::spawn(weather_job(Arc::clone(&app), client.clone(), every)));
                }
                if wx.show_alerts {
                    let every = Duration::from_secs(wx.alert_update_freq_mins.max(1) * 60);
                    jobs.push(tokio::spawn(alert_job(Arc::clone(&app), client, every)));
                }
            }
            Err(e) => error!("Weather disabled: {}", e),
        }
    }

    let ss = cfg.screensaver();
    if ss.enabled {
        match (hhmm(&ss.start), hhmm(&ss.stop)) {
            (Some(start), Some(stop)) => {
                jobs.push(tokio::spawn(screensaver_job(Arc::clone(&app), start, stop)));
            }
            _ => warn!("Screensaver disabled: bad start/stop '{}'/'{}'", ss.start, ss.stop),
        }
    }

    info!("Started {} refresh job(s)", jobs.len());
    jobs
}

async fn weather_job(app: Arc<AppContext>, client: OwmClient, every: Duration) {
    let mut tick = interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    while !app.shutdown_requested() {
        tick.tick().await;
        match client.current().await {
            Ok(snapshot) => {
                debug!("Weather updated: {} {}", snapshot.temp_label(), snapshot.description);
                app.set_weather(snapshot);
            }
            Err(e) => error!("Weather update failed: {}", e),
        }
    }
}

async fn alert_job(app: Arc<AppContext>, client: OwmClient, every: Duration) {
    let mut tick = interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tracker = AlertTracker::default();
    while !app.shutdown_requested() {
        tick.tick().await;
        let snapshot = match client.current().await {
            Ok(s) => s,
            Err(e) => {
                error!("Weather alert check failed: {}", e);
                continue;
            }
        };
        let fresh = tracker.fresh(&snapshot.alerts);
        app.set_weather(snapshot);
        if let Some(first) = fresh.first() {
            info!("New weather alert: {} ({})", first.event, first.sender);
            app.interrupts.trigger_weather_alert();
        }
    }
}

async fn screensaver_job(app: Arc<AppContext>, start: NaiveTime, stop: NaiveTime) {
    let mut tick = interval(SCREENSAVER_CHECK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut edge = WindowEdge::default();
    while !app.shutdown_requested() {
        tick.tick().await;
        let now = Local::now().time();
        let now = now.with_second(0).unwrap_or(now);
        let Some(want) = edge.step(in_window(now, start, stop)) else {
            continue;
        };
        if want != app.interrupts.is_set(Interrupt::Screensaver) {
            info!("Screensaver {}", if want { "starting" } else { "ending" });
            app.interrupts.set_screensaver(want);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        hhmm(s).unwrap()
    }

    #[test]
    fn test_in_window_same_day() {
        assert!(in_window(t("13:00"), t("12:00"), t("14:00")));
        assert!(!in_window(t("14:00"), t("12:00"), t("14:00")));
        assert!(!in_window(t("11:59"), t("12:00"), t("14:00")));
    }

    #[test]
    fn test_in_window_wraps_midnight() {
        assert!(in_window(t("23:30"), t("22:00"), t("08:00")));
        assert!(in_window(t("03:00"), t("22:00"), t("08:00")));
        assert!(!in_window(t("08:00"), t("22:00"), t("08:00")));
        assert!(!in_window(t("12:00"), t("22:00"), t("08:00")));
    }

    #[test]
    fn test_empty_window() {
        assert!(!in_window(t("10:00"), t("10:00"), t("10:00")));
    }

    #[test]
    fn test_window_edge_leaves_forced_state_alone() {
        let mut edge = WindowEdge::default();
        assert_eq!(edge.step(false), Some(false));
        // a forced "screensaver on" survives checks while still outside the window
        assert_eq!(edge.step(false), None);
        assert_eq!(edge.step(false), None);
        assert_eq!(edge.step(true), Some(true));
        assert_eq!(edge.step(true), None);
        assert_eq!(edge.step(false), Some(false));
    }

    #[test]
    fn test_alert_tracker_announces_once() {
        let alert = |event: &str, start| WeatherAlert {
            event: event.into(),
            sender: "ECCC".into(),
            start,
            end: start + 3600,
            description: String::new(),
        };
        let mut tr = AlertTracker::default();
        assert_eq!(tr.fresh(&[alert("Heat warning", 1)]).len(), 1);
        assert!(tr.fresh(&[alert("Heat warning", 1)]).is_empty());
        let fresh = tr.fresh(&[alert("Heat warning", 1), alert("Wind warning", 5)]);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].event, "Wind warning");
        // an expired alert that comes back is announced again
        assert!(tr.fresh(&[]).is_empty());
        assert_eq!(tr.fresh(&[alert("Heat warning", 1)]).len(), 1);
    }
}
