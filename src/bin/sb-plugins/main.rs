/*
 *  bin/sb-plugins/main.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Board plugin manager command line
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

//! Plugins are git repositories copied into `boards/plugins/<name>`.
//! `plugins.json` lists what should be installed, `plugins.lock.json`
//! records the commit each one was installed from.

mod installer;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;

use installer::PluginPaths;

#[derive(Debug, Parser)]
#[command(name = "sb-plugins", about = "Manage board plugins for the NHL LED Scoreboard", version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Add or update a plugin
    Add {
        /// Plugin name (folder name)
        name: String,
        /// Git repository URL
        url: String,
        /// Git ref (tag, branch or SHA)
        #[arg(long = "ref")]
        git_ref: Option<String>,
    },
    /// Remove a plugin
    Rm {
        name: String,
        /// Preserve config.json when removing
        #[arg(long)]
        keep_config: bool,
    },
    /// List configured plugins
    List,
    /// Install or update every plugin in plugins.json
    Sync,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let paths = PluginPaths::from_env();
    match cli.command {
        Cmd::Add { name, url, git_ref } => installer::add(&paths, &name, &url, git_ref.as_deref()),
        Cmd::Rm { name, keep_config } => installer::remove(&paths, &name, keep_config),
        Cmd::List => {
            let rows = installer::list(&paths)?;
            if rows.is_empty() {
                println!("No plugins configured in {}", paths.plugins_json.display());
                return Ok(());
            }
            println!("{:<20} {:<12} {:<10}", "NAME", "STATUS", "COMMIT");
            println!("{}", "-".repeat(45));
            for row in rows {
                let status = if row.present { "present" } else { "missing" };
                println!("{:<20} {:<12} {:<10}", row.name, status, row.commit.as_deref().unwrap_or("-"));
            }
            Ok(())
        }
        Cmd::Sync => {
            let failed = installer::sync(&paths)?;
            if !failed.is_empty() {
                bail!("failed plugins: {}", failed.join(", "));
            }
            Ok(())
        }
    }
}
