/*
 *  data/weather.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  OpenWeatherMap client and the weather snapshot boards read
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
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{debug, info};
use mini_moka::sync::Cache;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::WeatherConfig;

const OWM_ONECALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("OpenWeatherMap API error: {0}")]
    Api(String),
    #[error("weather configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("imperial") {
            Units::Imperial
        } else {
            Units::Metric
        }
    }

    pub fn api_name(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temp_suffix(&self) -> &'static str {
        match self {
            Units::Metric => "C",
            Units::Imperial => "F",
        }
    }

    pub fn wind_suffix(&self) -> &'static str {
        match self {
            Units::Metric => "kph",
            Units::Imperial => "mph",
        }
    }
}

/// An active weather alert
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WeatherAlert {
    pub event: String,
    pub sender: String,
    pub start: i64,
    pub end: i64,
    pub description: String,
}

/// Current conditions, as stored in the application context
#[derive(Debug, Clone)]
pub struct WeatherSnapshot {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    /// km/h for metric, mph for imperial
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
    pub units: Units,
    pub alerts: Vec<WeatherAlert>,
    pub fetched_at: DateTime<Local>,
}

impl WeatherSnapshot {
    pub fn temp_label(&self) -> String {
        format!("{:.0}{}", self.temp, self.units.temp_suffix())
    }

    pub fn feels_like_label(&self) -> String {
        format!("{:.0}{}", self.feels_like, self.units.temp_suffix())
    }

    pub fn wind_label(&self) -> String {
        format!("{:.1}{}", self.wind_speed, self.units.wind_suffix())
    }
}

// OpenWeatherMap one call 3.0 response, only the fields we use
#[derive(Debug, Deserialize)]
struct OneCall {
    current: OwmCurrent,
    #[serde(default)]
    alerts: Vec<OwmAlert>,
}

#[derive(Debug, Deserialize)]
struct OwmCurrent {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    wind_speed: f64,
    #[serde(default)]
    weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmAlert {
    #[serde(default)]
    sender_name: String,
    event: String,
    start: i64,
    end: i64,
    #[serde(default)]
    description: String,
}

/// Parse a one call response body
pub fn parse_onecall(body: &str, units: Units) -> Result<WeatherSnapshot, WeatherError> {
    let oc: OneCall = serde_json::from_str(body)?;
    let cond = oc.current.weather.first();
    let wind_speed = match units {
        // metric wind arrives in m/s
        Units::Metric => oc.current.wind_speed * 3.6,
        Units::Imperial => oc.current.wind_speed,
    };
    Ok(WeatherSnapshot {
        temp: oc.current.temp,
        feels_like: oc.current.feels_like,
        humidity: oc.current.humidity,
        wind_speed,
        description: cond.map(|c| c.description.clone()).unwrap_or_default(),
        icon: cond.map(|c| c.icon.clone()).unwrap_or_default(),
        units,
        alerts: oc
            .alerts
            .into_iter()
            .map(|a| WeatherAlert {
                event: a.event,
                sender: a.sender_name,
                start: a.start,
                end: a.end,
                description: a.description,
            })
            .collect(),
        fetched_at: Local::now(),
    })
}

/// "45.42,-75.69" -> (45.42, -75.69)
pub fn parse_location(s: &str) -> Option<(f64, f64)> {
    let (lat, lon) = s.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)).then_some((lat, lon))
}

/// OpenWeatherMap client with a short-lived response cache
///
/// The weather and alert jobs poll on their own intervals; the cache keeps
/// them from both hitting the API when their ticks line up.
#[derive(Clone)]
pub struct OwmClient {
    client: Client,
    api_key: String,
    lat: f64,
    lon: f64,
    units: Units,
    cache: Arc<Cache<String, WeatherSnapshot>>,
}

impl OwmClient {
    pub fn from_config(cfg: &WeatherConfig) -> Result<Self, WeatherError> {
        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| WeatherError::Config("api_key is required".into()))?;
        let (lat, lon) = cfg
            .location
            .as_deref()
            .and_then(parse_location)
            .ok_or_else(|| WeatherError::Config("location must be \"lat,lon\"".into()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("nhl-led-scoreboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_key,
            lat,
            lon,
            units: Units::parse(&cfg.units),
            cache: Arc::new(
                Cache::builder()
                    .max_capacity(4)
                    .time_to_live(Duration::from_secs(60))
                    .build(),
            ),
        })
    }

    fn cache_key(&self) -> String {
        format!("{:.3},{:.3},{}", self.lat, self.lon, self.units.api_name())
    }

    /// Current conditions plus alerts
    pub async fn current(&self) -> Result<WeatherSnapshot, WeatherError> {
        let key = self.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            debug!("Weather cache hit for {}", key);
            return Ok(hit);
        }

        info!("Fetching weather for {:.3},{:.3}", self.lat, self.lon);
        let resp = self
            .client
            .get(OWM_ONECALL_URL)
            .query(&[
                ("lat", self.lat.to_string()),
                ("lon", self.lon.to_string()),
                ("units", self.units.api_name().to_string()),
                ("exclude", "minutely,hourly,daily".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(WeatherError::Api(format!("{}: {}", status, body.chars().take(200).collect::<String>())));
        }

        let snapshot = parse_onecall(&body, self.units)?;
        self.cache.insert(key, snapshot.clone());
        Ok(snapshot)
    }
}
