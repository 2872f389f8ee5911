/*
 *  main.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Startup, background services and the mode dispatcher loop
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

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use scoreboard::boards::discovery::discover_configured;
use scoreboard::boards::{BoardRuntime, Boards, Catalog, Registry, RotationOutcome};
use scoreboard::config::{self, Cli};
use scoreboard::display::{create_driver, Matrix};
use scoreboard::{data, input, AppContext, ModeController, SleepEvent, APP_VERSION};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Pause when a whole rotation rendered nothing
const IDLE_WAIT: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".into());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("NHL LED Scoreboard v.{} built {}", APP_VERSION, BUILD_DATE);

    if cli.dump_config {
        print!("{}", config::dump(&cfg)?);
        return Ok(());
    }

    let catalog = Catalog::builtin();
    let registry = discover_configured(&cfg, &catalog);
    if cli.list_boards {
        print_boards(&registry);
        return Ok(());
    }
    if registry.is_empty() {
        warn!("No boards registered, the display will stay dark");
    }

    let display_cfg = cfg.display();
    let mut matrix = Matrix::new(create_driver(&display_cfg)).context("initializing matrix")?;
    if let Some(b) = display_cfg.brightness {
        matrix.set_brightness(b).context("setting brightness")?;
    }
    info!("Matrix ready, {}x{}", matrix.width(), matrix.height());

    let app = AppContext::new(cfg.clone(), SleepEvent::new());
    let rt = BoardRuntime::new(Arc::clone(&app), matrix.shared());
    let boards = Boards::new(registry);
    let early = boards.initialize_early(&rt);
    info!("{} board(s) registered, {} early initialized", boards.registry().len(), early);

    // background services, the rotation itself stays on this thread
    let services = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("sb-services")
        .enable_all()
        .build()
        .context("starting tokio runtime")?;
    let jobs = {
        let _guard = services.enter();
        let mut jobs = data::spawn_all(Arc::clone(&app));

        let control = cfg.control();
        if control.enabled {
            let known = boards.registry().ids();
            let app = Arc::clone(&app);
            jobs.push(tokio::spawn(async move {
                if let Err(e) = input::serve_control(app, control.bind.clone(), known).await {
                    error!("Control listener on {} stopped: {}", control.bind, e);
                }
            }));
        }

        let app = Arc::clone(&app);
        jobs.push(tokio::spawn(async move {
            match shutdown_signal().await {
                Ok(()) => app.request_shutdown(),
                Err(e) => error!("Signal handler failed: {}", e),
            }
        }));
        jobs
    };
    let _button = input::spawn_pushbutton(Arc::clone(&app));

    dispatch(&boards, &rt);

    info!("Shutting down");
    for job in jobs {
        job.abort();
    }
    let released = boards.cache().evict_all();
    info!("Released {} board instance(s)", released);
    services.shutdown_timeout(Duration::from_secs(2));
    Ok(())
}

/// Pick the rotation for the current game state until shutdown
fn dispatch(boards: &Boards, rt: &BoardRuntime) {
    let mut modes = ModeController::new();
    while !rt.app.shutdown_requested() {
        modes.update_mode(rt.app.game_state());
        let report = boards.run(modes.current_mode(), rt);
        if report.outcome == RotationOutcome::Shutdown {
            break;
        }
        if report.rendered.is_empty() && !rt.app.shutdown_requested() {
            warn!("Nothing rendered in {} rotation", modes.current_mode().name());
            rt.sleep.clear();
            rt.sleep.wait(IDLE_WAIT);
        }
    }
}

fn print_boards(registry: &Registry) {
    println!("{:<20} {:<8} {:<10} ORIGIN", "ID", "SOURCE", "EARLY");
    for desc in registry.descriptors() {
        println!(
            "{:<20} {:<8} {:<10} {}",
            desc.id,
            desc.source.to_string(),
            if desc.early_init() { "yes" } else { "" },
            desc.origin()
        );
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => info!("SIGINT received. Initiating graceful shutdown."),
        _ = sigterm.recv() => info!("SIGTERM received. Initiating graceful shutdown."),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received. Initiating graceful shutdown.");
    Ok(())
}
