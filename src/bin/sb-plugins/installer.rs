/*
 *  bin/sb-plugins/installer.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Git-backed board plugin installs and the plugins.json / lock files
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

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const MANIFEST_FILE: &str = "plugin.json";

/// Where plugins and their bookkeeping files live
#[derive(Debug, Clone)]
pub struct PluginPaths {
    pub plugins_dir: PathBuf,
    pub plugins_json: PathBuf,
    pub plugins_lock: PathBuf,
}

impl PluginPaths {
    /// Defaults, overridden by PLUGINS_DIR, PLUGINS_JSON and PLUGINS_LOCK
    pub fn from_env() -> Self {
        let var = |k: &str, d: &str| PathBuf::from(std::env::var(k).unwrap_or_else(|_| d.to_string()));
        Self {
            plugins_dir: var("PLUGINS_DIR", "boards/plugins"),
            plugins_json: var("PLUGINS_JSON", "plugins.json"),
            plugins_lock: var("PLUGINS_LOCK", "plugins.lock.json"),
        }
    }

    fn plugin_dir(&self, name: &str) -> PathBuf {
        self.plugins_dir.join(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    pub name: String,
    pub url: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PluginsFile {
    #[serde(default)]
    pub plugins: Vec<PluginSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub name: String,
    pub url: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub commit: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LockFile {
    #[serde(default)]
    pub locked: Vec<LockEntry>,
}

/// One row of `sb-plugins list`
#[derive(Debug, PartialEq, Eq)]
pub struct PluginStatus {
    pub name: String,
    pub present: bool,
    pub commit: Option<String>,
}

/// Read a JSON file, a missing file reads as the default value
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Write JSON through a temp file in the same directory, then rename over `path`
pub fn save_json_atomic<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    serde_json::to_writer_pretty(&mut tmp, data)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| anyhow!("replacing {}: {}", path.display(), e.error))?;
    Ok(())
}

/// Plugin names become directory names, keep them to one path component
pub fn check_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !ok {
        bail!("invalid plugin name '{}'", name);
    }
    Ok(())
}

fn run_git(args: &[&str], cwd: Option<&Path>) -> Result<Output> {
    debug!("Running: git {} (cwd={:?})", args.join(" "), cwd);
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd.output().context("running git")
}

pub fn check_git_available() -> Result<()> {
    match run_git(&["--version"], None) {
        Ok(out) if out.status.success() => Ok(()),
        _ => bail!("git is not installed or not in PATH"),
    }
}

fn stderr_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).trim().to_string()
}

/// Shallow clone `url` into `dir`, optionally check out `git_ref`; returns the commit
pub fn clone_plugin(url: &str, git_ref: Option<&str>, dir: &Path) -> Result<String> {
    let target = dir.to_string_lossy();
    let out = run_git(&["clone", "--depth", "1", url, &target], None)?;
    if !out.status.success() {
        bail!("failed to clone {}: {}", url, stderr_of(&out));
    }

    if let Some(r) = git_ref {
        debug!("Fetching ref: {}", r);
        let out = run_git(&["fetch", "--depth", "1", "origin", r], Some(dir))?;
        if !out.status.success() {
            warn!("Could not fetch ref '{}', using default branch", r);
        } else {
            let out = run_git(&["checkout", r], Some(dir))?;
            if !out.status.success() {
                bail!("failed to checkout ref '{}': {}", r, stderr_of(&out));
            }
        }
    }

    let out = run_git(&["rev-parse", "HEAD"], Some(dir))?;
    if !out.status.success() {
        bail!("failed to resolve commit: {}", stderr_of(&out));
    }
    let commit = String::from_utf8_lossy(&out.stdout).trim().to_string();
    debug!("Resolved commit: {}", commit);
    Ok(commit)
}

/// Replace `dest` with a copy of `src`, leaving out `.git`
pub fn copy_plugin_files(src: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        debug!("Removing existing plugin at {}", dest.display());
        fs::remove_dir_all(dest).with_context(|| format!("removing {}", dest.display()))?;
    }
    copy_tree(src, dest)
}

fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).with_context(|| format!("creating {}", dest.display()))?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }
        let to = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &to)?;
        } else {
            fs::copy(entry.path(), &to).with_context(|| format!("copying to {}", to.display()))?;
        }
    }
    Ok(())
}

/// Warn when the installed tree has no board manifest
pub fn validate_plugin(dir: &Path) -> bool {
    if dir.join(MANIFEST_FILE).exists() {
        return true;
    }
    warn!(
        "Plugin at {} has no {}; the scoreboard will not load it",
        dir.display(),
        MANIFEST_FILE
    );
    false
}

/// Clone and copy one plugin into place
pub fn install_plugin(paths: &PluginPaths, spec: &PluginSpec) -> Result<LockEntry> {
    check_name(&spec.name)?;
    info!("Installing plugin '{}' from {}", spec.name, spec.url);

    let tmp = tempfile::tempdir()?;
    let checkout = tmp.path().join("checkout");
    let commit = clone_plugin(&spec.url, spec.git_ref.as_deref(), &checkout)?;

    let dest = paths.plugin_dir(&spec.name);
    fs::create_dir_all(&paths.plugins_dir)?;
    copy_plugin_files(&checkout, &dest)?;
    validate_plugin(&dest);

    info!("Plugin '{}' installed (commit {})", spec.name, short(&commit));
    Ok(LockEntry {
        name: spec.name.clone(),
        url: spec.url.clone(),
        git_ref: spec.git_ref.clone().unwrap_or_else(|| "default".into()),
        commit,
    })
}

fn short(commit: &str) -> &str {
    commit.get(..7).unwrap_or(commit)
}

fn record_lock(paths: &PluginPaths, entry: LockEntry) -> Result<()> {
    let mut lock: LockFile = load_json(&paths.plugins_lock)?;
    lock.locked.retain(|l| l.name != entry.name);
    lock.locked.push(entry);
    save_json_atomic(&paths.plugins_lock, &lock)
}

/// Add or update a plugin in plugins.json, install it and lock it
pub fn add(paths: &PluginPaths, name: &str, url: &str, git_ref: Option<&str>) -> Result<()> {
    check_name(name)?;
    check_git_available()?;

    let spec = PluginSpec {
        name: name.to_string(),
        url: url.to_string(),
        git_ref: git_ref.map(str::to_string),
    };
    let mut file: PluginsFile = load_json(&paths.plugins_json)?;
    file.plugins.retain(|p| p.name != name);
    file.plugins.push(spec.clone());
    save_json_atomic(&paths.plugins_json, &file)?;
    info!("Added '{}' to {}", name, paths.plugins_json.display());

    let entry = install_plugin(paths, &spec).with_context(|| format!("installing plugin '{}'", name))?;
    record_lock(paths, entry)?;
    info!("Updated {}", paths.plugins_lock.display());
    Ok(())
}

/// Drop a plugin from both files and delete its directory
pub fn remove(paths: &PluginPaths, name: &str, keep_config: bool) -> Result<()> {
    check_name(name)?;

    let mut file: PluginsFile = load_json(&paths.plugins_json)?;
    let before = file.plugins.len();
    file.plugins.retain(|p| p.name != name);
    if file.plugins.len() == before {
        warn!("Plugin '{}' not found in {}", name, paths.plugins_json.display());
    } else {
        save_json_atomic(&paths.plugins_json, &file)?;
        info!("Removed '{}' from {}", name, paths.plugins_json.display());
    }

    if paths.plugins_lock.exists() {
        let mut lock: LockFile = load_json(&paths.plugins_lock)?;
        lock.locked.retain(|l| l.name != name);
        save_json_atomic(&paths.plugins_lock, &lock)?;
    }

    let dir = paths.plugin_dir(name);
    if !dir.exists() {
        warn!("Plugin directory not found: {}", dir.display());
        return Ok(());
    }

    let config_path = dir.join("config.json");
    let saved = if keep_config && config_path.exists() {
        info!("Preserving config.json for '{}'", name);
        Some(fs::read(&config_path)?)
    } else {
        None
    };

    fs::remove_dir_all(&dir).with_context(|| format!("removing {}", dir.display()))?;
    info!("Deleted plugin directory: {}", dir.display());

    if let Some(bytes) = saved {
        fs::create_dir_all(&dir)?;
        fs::write(&config_path, bytes)?;
        info!("Restored config.json to {}", dir.display());
    }
    Ok(())
}

/// Status of every plugin named in plugins.json
pub fn list(paths: &PluginPaths) -> Result<Vec<PluginStatus>> {
    let file: PluginsFile = load_json(&paths.plugins_json)?;
    let lock: LockFile = load_json(&paths.plugins_lock)?;
    Ok(file
        .plugins
        .iter()
        .map(|p| {
            let present = paths.plugin_dir(&p.name).exists();
            let commit = present
                .then(|| lock.locked.iter().find(|l| l.name == p.name))
                .flatten()
                .map(|l| short(&l.commit).to_string());
            PluginStatus { name: p.name.clone(), present, commit }
        })
        .collect())
}

/// Reinstall everything in plugins.json; returns the names that failed
pub fn sync(paths: &PluginPaths) -> Result<Vec<String>> {
    check_git_available()?;
    let file: PluginsFile = load_json(&paths.plugins_json)?;
    if file.plugins.is_empty() {
        warn!("No plugins configured in {}", paths.plugins_json.display());
        return Ok(Vec::new());
    }

    info!("Syncing {} plugin(s)...", file.plugins.len());
    let mut lock = LockFile::default();
    let mut failed = Vec::new();
    for spec in &file.plugins {
        match install_plugin(paths, spec) {
            Ok(entry) => lock.locked.push(entry),
            Err(e) => {
                log::error!("Plugin '{}' failed: {:#}", spec.name, e);
                failed.push(spec.name.clone());
            }
        }
    }
    save_json_atomic(&paths.plugins_lock, &lock)?;
    info!("Sync complete: {} installed, {} failed", lock.locked.len(), failed.len());
    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(root: &Path) -> PluginPaths {
        PluginPaths {
            plugins_dir: root.join("boards/plugins"),
            plugins_json: root.join("plugins.json"),
            plugins_lock: root.join("plugins.lock.json"),
        }
    }

    #[test]
    fn test_atomic_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = paths(dir.path());
        let missing: PluginsFile = load_json(&p.plugins_json).unwrap();
        assert!(missing.plugins.is_empty());

        let file = PluginsFile {
            plugins: vec![PluginSpec { name: "stocks".into(), url: "https://x/stocks.git".into(), git_ref: None }],
        };
        save_json_atomic(&p.plugins_json, &file).unwrap();
        let text = fs::read_to_string(&p.plugins_json).unwrap();
        assert!(text.ends_with('\n'));
        assert!(!text.contains("\"ref\""));

        let back: PluginsFile = load_json(&p.plugins_json).unwrap();
        assert_eq!(back.plugins, file.plugins);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = paths(dir.path());
        fs::write(&p.plugins_json, "{ nope").unwrap();
        assert!(load_json::<PluginsFile>(&p.plugins_json).is_err());
    }

    #[test]
    fn test_copy_skips_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join(".git/objects")).unwrap();
        fs::create_dir_all(src.join("assets")).unwrap();
        fs::write(src.join("plugin.json"), "{}").unwrap();
        fs::write(src.join("assets/logo.png"), [1u8, 2, 3]).unwrap();
        fs::write(src.join(".git/HEAD"), "ref").unwrap();

        let dest = dir.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale.txt"), "old").unwrap();

        copy_plugin_files(&src, &dest).unwrap();
        assert!(dest.join("plugin.json").exists());
        assert!(dest.join("assets/logo.png").exists());
        assert!(!dest.join(".git").exists());
        assert!(!dest.join("stale.txt").exists());
        assert!(validate_plugin(&dest));
    }

    #[test]
    fn test_remove_keeps_config() {
        let dir = tempfile::tempdir().unwrap();
        let p = paths(dir.path());
        let plugin = p.plugins_dir.join("stocks");
        fs::create_dir_all(&plugin).unwrap();
        fs::write(plugin.join("plugin.json"), "{}").unwrap();
        fs::write(plugin.join("config.json"), r#"{"symbols":["AAPL"]}"#).unwrap();

        let spec = PluginSpec { name: "stocks".into(), url: "u".into(), git_ref: None };
        save_json_atomic(&p.plugins_json, &PluginsFile { plugins: vec![spec] }).unwrap();
        let entry = LockEntry { name: "stocks".into(), url: "u".into(), git_ref: "default".into(), commit: "abcdef0123".into() };
        save_json_atomic(&p.plugins_lock, &LockFile { locked: vec![entry] }).unwrap();

        let rows = list(&p).unwrap();
        assert_eq!(rows, vec![PluginStatus { name: "stocks".into(), present: true, commit: Some("abcdef0".into()) }]);

        remove(&p, "stocks", true).unwrap();
        assert!(!plugin.join("plugin.json").exists());
        assert_eq!(fs::read_to_string(plugin.join("config.json")).unwrap(), r#"{"symbols":["AAPL"]}"#);
        assert!(load_json::<PluginsFile>(&p.plugins_json).unwrap().plugins.is_empty());
        assert!(load_json::<LockFile>(&p.plugins_lock).unwrap().locked.is_empty());

        remove(&p, "stocks", false).unwrap();
        assert!(!plugin.exists());
    }

    #[test]
    fn test_check_name() {
        assert!(check_name("stocks_v2").is_ok());
        assert!(check_name("../etc").is_err());
        assert!(check_name("a/b").is_err());
        assert!(check_name("").is_err());
        assert!(check_name("..").is_err());
    }
}
