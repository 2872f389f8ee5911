/*
 *  input/control.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Line-based TCP control listener
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

//! One command per line, one reply line per command:
//!
//! ```text
//! showboard <id>      show a board on the next rotation pass
//! button              same as pressing the push-button
//! screensaver on|off  force the screensaver window
//! gamestate <state>   off_day, scheduled, intermission or post_game
//! status              current and previous board plus raised flags
//! ```
//!
//! A forced screensaver holds until the next edge of the configured window.
//! Lines longer than [`MAX_LINE`] bytes are answered with an error and skipped.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::context::{AppContext, GameState};
use crate::interrupts::Interrupt;

/// Longest accepted command line, newline included
pub const MAX_LINE: usize = 256;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArg(&'static str),
    #[error("bad argument '{0}'")]
    BadArg(String),
    #[error("unknown board '{0}'")]
    UnknownBoard(String),
    #[error("line longer than {0} bytes")]
    TooLong(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    ShowBoard(String),
    Button,
    Screensaver(bool),
    GameState(GameState),
    Status,
}

impl ControlCommand {
    pub fn parse(line: &str) -> Result<Self, ControlError> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next().ok_or(ControlError::Empty)?.to_ascii_lowercase();
        let arg = parts.next();
        match cmd.as_str() {
            "showboard" => arg
                .map(|id| ControlCommand::ShowBoard(id.to_string()))
                .ok_or(ControlError::MissingArg("showboard")),
            "button" => Ok(ControlCommand::Button),
            "screensaver" => match arg.map(str::to_ascii_lowercase).as_deref() {
                Some("on") => Ok(ControlCommand::Screensaver(true)),
                Some("off") => Ok(ControlCommand::Screensaver(false)),
                Some(other) => Err(ControlError::BadArg(other.to_string())),
                None => Err(ControlError::MissingArg("screensaver")),
            },
            "gamestate" => {
                let name = arg.ok_or(ControlError::MissingArg("gamestate"))?;
                GameState::from_name(name)
                    .map(ControlCommand::GameState)
                    .ok_or_else(|| ControlError::BadArg(name.to_string()))
            }
            "status" => Ok(ControlCommand::Status),
            _ => Err(ControlError::Unknown(cmd)),
        }
    }

    /// Act on the command; `known` lists the registered board ids
    pub fn apply(&self, app: &AppContext, known: &[String]) -> Result<String, ControlError> {
        match self {
            ControlCommand::ShowBoard(id) => {
                if !known.iter().any(|k| k == id) {
                    return Err(ControlError::UnknownBoard(id.clone()));
                }
                app.interrupts.trigger_external(id);
                Ok("ok".into())
            }
            ControlCommand::Button => {
                app.interrupts.trigger_manual();
                Ok("ok".into())
            }
            ControlCommand::Screensaver(on) => {
                app.interrupts.set_screensaver(*on);
                Ok("ok".into())
            }
            ControlCommand::GameState(state) => {
                app.set_game_state(*state);
                Ok("ok".into())
            }
            ControlCommand::Status => Ok(status_line(app)),
        }
    }
}

fn status_line(app: &AppContext) -> String {
    let track = app.board_track();
    let flags: Vec<&str> = [
        Interrupt::Manual,
        Interrupt::External,
        Interrupt::WeatherAlert,
        Interrupt::Screensaver,
    ]
    .into_iter()
    .filter(|i| app.interrupts.is_set(*i))
    .map(|i| i.name())
    .collect();
    format!(
        "board={} prev={} state={} flags=[{}]",
        track.curr_board.as_deref().unwrap_or("-"),
        track.prev_board.as_deref().unwrap_or("-"),
        app.game_state().name(),
        flags.join(",")
    )
}

/// Accept control connections until the runtime shuts down
pub async fn serve(app: Arc<AppContext>, bind: String, known: Vec<String>) -> std::io::Result<()> {
    let listener = TcpListener::bind(&bind).await?;
    info!("Control listener on {}", bind);
    let known = Arc::new(known);
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Control accept failed: {}", e);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        debug!("Control connection from {}", peer);
        let app = Arc::clone(&app);
        let known = Arc::clone(&known);
        tokio::spawn(async move {
            if let Err(e) = handle(stream, &app, &known).await {
                warn!("Control connection {} dropped: {}", peer, e);
            }
        });
    }
}

async fn handle(stream: TcpStream, app: &AppContext, known: &[String]) -> std::io::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);
    let mut line = String::new();
    loop {
        line.clear();
        let n = (&mut reader).take(MAX_LINE as u64).read_line(&mut line).await?;
        if n == 0 {
            break;
        }
        if n == MAX_LINE && !line.ends_with('\n') {
            skip_line(&mut reader).await?;
            warn!("Control line over {} bytes skipped", MAX_LINE);
            let reply = format!("error: {}\n", ControlError::TooLong(MAX_LINE));
            write.write_all(reply.as_bytes()).await?;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let reply = match ControlCommand::parse(&line).and_then(|c| c.apply(app, known)) {
            Ok(r) => r,
            Err(e) => format!("error: {}", e),
        };
        info!("Control '{}' -> {}", line.trim(), reply);
        write.write_all(reply.as_bytes()).await?;
        write.write_all(b"\n").await?;
    }
    Ok(())
}

/// Discard input up to and including the next newline
async fn skip_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        match buf.iter().position(|b| *b == b'\n') {
            Some(i) => {
                reader.consume(i + 1);
                return Ok(());
            }
            None => {
                let n = buf.len();
                reader.consume(n);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::interrupts::SleepEvent;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ControlCommand::parse("showboard clock"), Ok(ControlCommand::ShowBoard("clock".into())));
        assert_eq!(ControlCommand::parse("  BUTTON "), Ok(ControlCommand::Button));
        assert_eq!(ControlCommand::parse("screensaver Off"), Ok(ControlCommand::Screensaver(false)));
        assert_eq!(ControlCommand::parse("showboard"), Err(ControlError::MissingArg("showboard")));
        assert_eq!(ControlCommand::parse("screensaver maybe"), Err(ControlError::BadArg("maybe".into())));
        assert_eq!(ControlCommand::parse(""), Err(ControlError::Empty));
        assert_eq!(ControlCommand::parse("reboot"), Err(ControlError::Unknown("reboot".into())));
        assert_eq!(
            ControlCommand::parse("gamestate Intermission"),
            Ok(ControlCommand::GameState(GameState::Intermission))
        );
        assert_eq!(ControlCommand::parse("gamestate"), Err(ControlError::MissingArg("gamestate")));
        assert_eq!(ControlCommand::parse("gamestate overtime"), Err(ControlError::BadArg("overtime".into())));
    }

    #[test]
    fn test_gamestate_drives_rotation_mode() {
        use crate::mode_controller::{ModeController, RotationMode};

        let app = AppContext::new(Config::default(), SleepEvent::new());
        let mut modes = ModeController::new();
        assert!(!modes.update_mode(app.game_state()));

        ControlCommand::parse("gamestate post_game").unwrap().apply(&app, &[]).unwrap();
        assert_eq!(app.game_state(), GameState::PostGame);
        assert!(modes.update_mode(app.game_state()));
        assert_eq!(modes.current_mode(), RotationMode::PostGame);

        let status = ControlCommand::Status.apply(&app, &[]).unwrap();
        assert!(status.contains("state=post_game"), "{}", status);
    }

    #[test]
    fn test_apply_raises_flags() {
        let app = AppContext::new(Config::default(), SleepEvent::new());
        let known = vec!["clock".to_string()];

        let err = ControlCommand::ShowBoard("nope".into()).apply(&app, &known);
        assert_eq!(err, Err(ControlError::UnknownBoard("nope".into())));
        assert!(!app.interrupts.is_set(Interrupt::External));

        ControlCommand::ShowBoard("clock".into()).apply(&app, &known).unwrap();
        assert!(app.interrupts.is_set(Interrupt::External));
        assert_eq!(app.interrupts.external_board().as_deref(), Some("clock"));

        ControlCommand::Button.apply(&app, &known).unwrap();
        assert!(app.interrupts.is_set(Interrupt::Manual));

        let status = ControlCommand::Status.apply(&app, &known).unwrap();
        assert!(status.contains("flags=[pushbutton,external]"), "{}", status);
    }

    #[tokio::test]
    async fn test_serve_round_trip() {
        let app = AppContext::new(Config::default(), SleepEvent::new());
        let free = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = free.local_addr().unwrap();
        drop(free);

        let server = tokio::spawn(serve(Arc::clone(&app), addr.to_string(), vec!["clock".into()]));
        let mut stream = None;
        for _ in 0..50 {
            match TcpStream::connect(addr).await {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(_) => tokio::time::sleep(std::time::Duration::from_millis(20)).await,
            }
        }
        let stream = stream.expect("listener did not come up");
        let (read, mut write) = stream.into_split();
        let long = format!("showboard {}\n", "x".repeat(MAX_LINE * 3));
        let script = format!("screensaver on\nbogus\n{}gamestate scheduled\n", long);
        write.write_all(script.as_bytes()).await.unwrap();
        let mut lines = BufReader::new(read).lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("ok"));
        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some("error: unknown command 'bogus'")
        );
        assert_eq!(
            lines.next_line().await.unwrap(),
            Some(format!("error: line longer than {} bytes", MAX_LINE))
        );
        // the connection survives an oversized line
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("ok"));
        assert!(app.interrupts.is_set(Interrupt::Screensaver));
        assert_eq!(app.game_state(), GameState::Scheduled);
        server.abort();
    }
}
