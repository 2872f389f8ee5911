/*
 *  config.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  YAML configuration with CLI overrides
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

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level scoreboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub display: Option<DisplayConfig>,
    pub boards: Option<BoardsConfig>,
    pub pushbutton: Option<PushButtonConfig>,
    pub screensaver: Option<ScreensaverConfig>,
    pub weather: Option<WeatherConfig>,
    pub control: Option<ControlConfig>,
    /// Extra capability names reported as available to board manifests
    pub dependencies: Option<Vec<String>>,
}

impl Config {
    pub fn display(&self) -> DisplayConfig {
        self.display.clone().unwrap_or_default()
    }

    pub fn boards(&self) -> BoardsConfig {
        self.boards.clone().unwrap_or_default()
    }

    pub fn pushbutton(&self) -> PushButtonConfig {
        self.pushbutton.clone().unwrap_or_default()
    }

    pub fn screensaver(&self) -> ScreensaverConfig {
        self.screensaver.clone().unwrap_or_default()
    }

    pub fn weather(&self) -> WeatherConfig {
        self.weather.clone().unwrap_or_default()
    }

    pub fn control(&self) -> ControlConfig {
        self.control.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub brightness: Option<u8>,     // 0-100 (LED matrix percent)
    pub emulated: Option<bool>,     // render to the terminal instead of the panel
}

impl DisplayConfig {
    pub fn size(&self) -> (u32, u32) {
        (self.width.unwrap_or(64), self.height.unwrap_or(32))
    }
}

/// Rotation lists per game state plus the board roots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardsConfig {
    pub scheduled: Vec<String>,
    pub off_day: Vec<String>,
    pub intermission: Vec<String>,
    pub post_game: Vec<String>,
    /// Boards shipped with the scoreboard
    pub system_dir: PathBuf,
    /// Third-party boards installed by sb-plugins
    pub plugin_dir: PathBuf,
}

impl Default for BoardsConfig {
    fn default() -> Self {
        Self {
            scheduled: vec!["clock".into(), "weather".into()],
            off_day: vec![
                "season_countdown".into(),
                "clock".into(),
                "weather".into(),
                "holiday_countdown".into(),
            ],
            intermission: vec!["clock".into()],
            post_game: vec!["clock".into(), "weather".into()],
            system_dir: PathBuf::from("boards/builtins"),
            plugin_dir: PathBuf::from("boards/plugins"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushButtonConfig {
    pub enabled: bool,
    pub gpio_pin: u8,               // BCM numbering
    /// Board shown when the button is pressed
    pub state_triggered1: String,
}

impl Default for PushButtonConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            gpio_pin: 25,
            state_triggered1: "clock".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreensaverConfig {
    pub enabled: bool,
    pub start: String,              // "HH:MM" local
    pub stop: String,               // "HH:MM" local
}

impl Default for ScreensaverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start: "22:00".into(),
            stop: "08:00".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub location: Option<String>,   // "lat,lon"
    pub units: String,              // "metric" | "imperial"
    pub update_freq_mins: u64,
    pub show_alerts: bool,
    pub alert_update_freq_mins: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            location: None,
            units: "metric".into(),
            update_freq_mins: 5,
            show_alerts: false,
            alert_update_freq_mins: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub enabled: bool,
    pub bind: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: "127.0.0.1:7878".into(),
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "scoreboard", about = "NHL LED Scoreboard", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long)]
    pub display_width: Option<u32>,
    #[arg(long)]
    pub display_height: Option<u32>,
    #[arg(long)]
    pub brightness: Option<u8>,
    /// render to the terminal instead of the LED panel
    #[arg(long, action = ArgAction::SetTrue)]
    pub emulated: bool,
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub system_dir: Option<PathBuf>,
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub plugin_dir: Option<PathBuf>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
    /// list discovered boards and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub list_boards: bool,
}

/// Read YAML, merge, apply CLI overrides, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // built-in defaults first
    let mut cfg = Config::default();

    // then the YAML file, explicit path or the first one found
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // command line wins
    apply_cli_overrides(&mut cfg, cli);

    // finally validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Pretty YAML of the effective config (nice for debugging)
pub fn dump(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/scoreboard/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/scoreboard/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/scoreboard.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["scoreboard.yaml", "config/config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

pub fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()    { dst.log_level = src.log_level; }
    if src.boards.is_some()       { dst.boards = src.boards; }
    if src.pushbutton.is_some()   { dst.pushbutton = src.pushbutton; }
    if src.screensaver.is_some()  { dst.screensaver = src.screensaver; }
    if src.weather.is_some()      { dst.weather = src.weather; }
    if src.control.is_some()      { dst.control = src.control; }
    if src.dependencies.is_some() { dst.dependencies = src.dependencies; }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.width.is_some()       { dst.width = src.width; }
    if src.height.is_some()      { dst.height = src.height; }
    if src.brightness.is_some()  { dst.brightness = src.brightness; }
    if src.emulated.is_some()    { dst.emulated = src.emulated; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }

    let any_display = cli.display_width.is_some()
        || cli.display_height.is_some()
        || cli.brightness.is_some()
        || cli.emulated;

    if any_display && cfg.display.is_none() {
        cfg.display = Some(DisplayConfig::default());
    }
    if let Some(display) = cfg.display.as_mut() {
        if cli.display_width.is_some()  { display.width = cli.display_width; }
        if cli.display_height.is_some() { display.height = cli.display_height; }
        if cli.brightness.is_some()     { display.brightness = cli.brightness; }
        if cli.emulated                 { display.emulated = Some(true); }
    }

    if cli.system_dir.is_some() || cli.plugin_dir.is_some() {
        let mut boards = cfg.boards();
        if let Some(p) = cli.system_dir.as_ref() { boards.system_dir = p.clone(); }
        if let Some(p) = cli.plugin_dir.as_ref() { boards.plugin_dir = p.clone(); }
        cfg.boards = Some(boards);
    }
}

/// "HH:MM" -> (hour, minute)
pub fn parse_hhmm(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.trim().split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    (h < 24 && m < 60).then_some((h, m))
}

/// Reject sizes, brightness and screensaver windows the runtime cannot use
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(display) = cfg.display.as_ref() {
        if let (Some(w), Some(h)) = (display.width, display.height) {
            if w == 0 || h == 0 {
                return Err(ConfigError::Validation("display width/height must be > 0".into()));
            }
        }
        if let Some(b) = display.brightness {
            if b > 100 {
                return Err(ConfigError::Validation("display brightness must be 0..=100".into()));
            }
        }
    }

    let boards = cfg.boards();
    if boards.scheduled.is_empty()
        && boards.off_day.is_empty()
        && boards.intermission.is_empty()
        && boards.post_game.is_empty()
    {
        return Err(ConfigError::Validation("at least one board rotation list must be non-empty".into()));
    }

    let ss = cfg.screensaver();
    if ss.enabled && (parse_hhmm(&ss.start).is_none() || parse_hhmm(&ss.stop).is_none()) {
        return Err(ConfigError::Validation("screensaver start/stop must be HH:MM".into()));
    }

    let wx = cfg.weather();
    if wx.enabled || wx.show_alerts {
        if wx.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::Validation("weather requires an api_key".into()));
        }
        if wx.update_freq_mins == 0 || wx.alert_update_freq_mins == 0 {
            return Err(ConfigError::Validation("weather update frequencies must be > 0".into()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let cfg = Config::default();
        assert!(validate(&cfg).is_ok());
        assert_eq!(cfg.display().size(), (64, 32));
        assert_eq!(cfg.boards().system_dir, PathBuf::from("boards/builtins"));
    }

    #[test]
    fn test_yaml_sections_merge() {
        let yaml = r#"
log_level: debug
display:
  width: 128
boards:
  scheduled: [clock]
  off_day: [weather, clock]
pushbutton:
  enabled: true
  state_triggered1: standings
"#;
        let src: Config = serde_yaml::from_str(yaml).unwrap();
        let mut cfg = Config::default();
        merge(&mut cfg, src);
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.display().size(), (128, 32));
        assert_eq!(cfg.boards().off_day, vec!["weather", "clock"]);
        // unspecified list falls back to its default
        assert_eq!(cfg.boards().intermission, vec!["clock"]);
        assert_eq!(cfg.pushbutton().state_triggered1, "standings");
        assert_eq!(cfg.pushbutton().gpio_pin, 25);
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut cfg = Config::default();
        let cli = Cli {
            display_width: Some(128),
            emulated: true,
            plugin_dir: Some(PathBuf::from("/tmp/plugins")),
            ..Default::default()
        };
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.display().width, Some(128));
        assert_eq!(cfg.display().emulated, Some(true));
        assert_eq!(cfg.boards().plugin_dir, PathBuf::from("/tmp/plugins"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.display = Some(DisplayConfig { brightness: Some(150), ..Default::default() });
        assert!(validate(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.screensaver = Some(ScreensaverConfig { enabled: true, start: "25:00".into(), stop: "08:00".into() });
        assert!(validate(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.weather = Some(WeatherConfig { enabled: true, ..Default::default() });
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("22:30"), Some((22, 30)));
        assert_eq!(parse_hhmm(" 8:05 "), Some((8, 5)));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("nope"), None);
    }
}
