/*
 *  boards/manifest.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  plugin.json module manifest
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

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "plugin.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no plugin.json in {}", .0.display())]
    Missing(PathBuf),
    #[error("cannot read {}: {source}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("malformed {}: {source}", path.display())]
    Json { path: PathBuf, #[source] source: serde_json::Error },
    #[error("{0}")]
    Invalid(String),
}

/// One module's `plugin.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardManifest {
    #[serde(alias = "name")]
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub boards: Vec<BoardEntry>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    /// Minimum application version, advisory
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default, alias = "python_dependencies")]
    pub dependencies: Vec<String>,
}

/// A `boards` list item, either a bare id or a full declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoardEntry {
    Bare(String),
    Full(BoardSpec),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSpec {
    pub id: String,
    /// Board class inside the module, optional when the module has one board
    #[serde(default)]
    pub class_name: Option<String>,
    /// Catalog module, defaults to the manifest id
    #[serde(default)]
    pub module: Option<String>,
    /// Shared library in the module directory providing the class
    #[serde(default)]
    pub library: Option<String>,
}

impl BoardManifest {
    /// Read and check `plugin.json` in `dir`
    pub fn load(dir: &Path) -> Result<Self, ManifestError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ManifestError::Missing(dir.to_path_buf()));
        }
        let text = fs::read_to_string(&path)
            .map_err(|source| ManifestError::Io { path: path.clone(), source })?;
        let manifest: BoardManifest = serde_json::from_str(&text)
            .map_err(|source| ManifestError::Json { path: path.clone(), source })?;
        manifest.check()?;
        Ok(manifest)
    }

    fn check(&self) -> Result<(), ManifestError> {
        if self.id.trim().is_empty() {
            return Err(ManifestError::Invalid("manifest id is empty".into()));
        }
        for b in self.board_specs() {
            if b.id.trim().is_empty() {
                return Err(ManifestError::Invalid(format!("{}: board with empty id", self.id)));
            }
        }
        Ok(())
    }

    pub fn version_str(&self) -> &str {
        self.version.as_deref().unwrap_or("0.0.0")
    }

    /// Board declarations with the bare form expanded
    ///
    /// A bare id names a board of the module the manifest describes.
    pub fn board_specs(&self) -> Vec<BoardSpec> {
        self.boards
            .iter()
            .map(|b| match b {
                BoardEntry::Bare(id) => BoardSpec {
                    id: id.clone(),
                    class_name: None,
                    module: None,
                    library: None,
                },
                BoardEntry::Full(spec) => spec.clone(),
            })
            .collect()
    }

    /// Dependency names with any version constraint stripped
    pub fn dependency_names(&self) -> Vec<String> {
        self.requirements
            .dependencies
            .iter()
            .map(|d| dependency_name(d))
            .filter(|d| !d.is_empty())
            .collect()
    }
}

/// `"requests>=2.31"` -> `"requests"`, normalised for lookups
pub fn dependency_name(spec: &str) -> String {
    let end = spec
        .find(|c: char| matches!(c, '<' | '>' | '=' | '!' | '~' | '[' | ';' | ' ' | '@'))
        .unwrap_or(spec.len());
    spec[..end].trim().to_ascii_lowercase().replace('_', "-")
}

/// Compare dotted numeric versions, leading operators are ignored
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    fn parts(v: &str) -> Vec<u64> {
        v.trim_start_matches(|c: char| !c.is_ascii_digit())
            .split('.')
            .map(|p| {
                p.chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect::<String>()
                    .parse()
                    .unwrap_or(0)
            })
            .collect()
    }
    let (pa, pb) = (parts(a), parts(b));
    let n = pa.len().max(pb.len());
    for i in 0..n {
        let (x, y) = (pa.get(i).copied().unwrap_or(0), pb.get(i).copied().unwrap_or(0));
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, body: &str) {
        fs::write(dir.join(MANIFEST_FILE), body).unwrap();
    }

    #[test]
    fn test_full_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), r#"{
            "name": "season_countdown",
            "version": "1.2.0",
            "requirements": {"app_version": ">=2025.1.0", "dependencies": ["chrono>=0.4"]},
            "boards": [{"id": "season_countdown", "class_name": "SeasonCountdownBoard", "module": "season_countdown"}]
        }"#);
        let m = BoardManifest::load(dir.path()).unwrap();
        assert_eq!(m.id, "season_countdown");
        assert!(m.enabled);
        assert_eq!(m.dependency_names(), vec!["chrono"]);
        let specs = m.board_specs();
        assert_eq!(specs[0].class_name.as_deref(), Some("SeasonCountdownBoard"));
    }

    #[test]
    fn test_bare_board_list() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), r#"{"id": "clock", "boards": ["clock"], "enabled": false}"#);
        let m = BoardManifest::load(dir.path()).unwrap();
        assert!(!m.enabled);
        let specs = m.board_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].id, "clock");
        assert!(specs[0].module.is_none() && specs[0].class_name.is_none());
    }

    #[test]
    fn test_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(BoardManifest::load(dir.path()), Err(ManifestError::Missing(_))));
        write(dir.path(), "{ not json");
        assert!(matches!(BoardManifest::load(dir.path()), Err(ManifestError::Json { .. })));
        write(dir.path(), r#"{"id": "  "}"#);
        assert!(matches!(BoardManifest::load(dir.path()), Err(ManifestError::Invalid(_))));
    }

    #[test]
    fn test_dependency_name() {
        assert_eq!(dependency_name("Embedded_Graphics>=0.8"), "embedded-graphics");
        assert_eq!(dependency_name("reqwest"), "reqwest");
        assert_eq!(dependency_name("x[extra]; target_os='linux'"), "x");
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("2025.10.0", "2025.9.3"), Ordering::Greater);
        assert_eq!(compare_versions(">=1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0.0", "1.0.1"), Ordering::Less);
    }
}
