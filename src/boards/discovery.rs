/*
 *  boards/discovery.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Startup scan of the board roots, manifest validation and registration
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
use std::collections::HashSet;
#[cfg(feature = "plugin-system")]
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::config::Config;

use super::catalog::{BoardClass, Catalog, ResolveError};
use super::manifest::{compare_versions, BoardManifest, BoardSpec, ManifestError};
use super::registry::{BoardDescriptor, BoardSource, Registry};

#[cfg(feature = "plugin-system")]
use super::plugin::{loader::LoadedLibrary, NativeBoardClass};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("module '{0}' is disabled")]
    Disabled(String),
    #[error("module '{module}' requires missing dependency '{dependency}'")]
    MissingDependency { module: String, dependency: String },
    #[error("module '{0}' declares no boards")]
    NoBoards(String),
    #[error("board '{board}': {source}")]
    Resolve { board: String, #[source] source: ResolveError },
    #[error("board '{board}': {message}")]
    Library { board: String, message: String },
}

/// Answers whether a declared dependency is present
pub trait CapabilityProbe {
    fn is_available(&self, dependency: &str) -> bool;
}

/// Set of dependency names the running binary can satisfy
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    names: HashSet<String>,
}

impl Capabilities {
    /// What this build links, plus the compiled-in feature names
    pub fn compiled() -> Self {
        let mut caps = Self::default().with([
            "chrono",
            "embedded-graphics",
            "reqwest",
            "serde",
            "serde-json",
            "tokio",
        ]);
        if cfg!(feature = "plugin-system") {
            caps = caps.with(["plugin-system", "libloading"]);
        }
        if cfg!(feature = "hardware") {
            caps = caps.with(["hardware", "rppal"]);
        }
        caps
    }

    /// Compiled capabilities plus the config's `dependencies` list
    pub fn from_config(cfg: &Config) -> Self {
        Self::compiled().with(cfg.dependencies.clone().unwrap_or_default())
    }

    pub fn with<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.names
            .extend(names.into_iter().map(|n| super::manifest::dependency_name(n.as_ref())));
        self
    }
}

impl CapabilityProbe for Capabilities {
    fn is_available(&self, dependency: &str) -> bool {
        self.names.contains(&super::manifest::dependency_name(dependency))
    }
}

/// Scans board roots and builds the registry
pub struct Discovery<'a> {
    catalog: &'a Catalog,
    probe: &'a dyn CapabilityProbe,
    app_version: String,
    #[cfg(feature = "plugin-system")]
    libraries: HashMap<PathBuf, Arc<LoadedLibrary>>,
}

impl<'a> Discovery<'a> {
    pub fn new(catalog: &'a Catalog, probe: &'a dyn CapabilityProbe, app_version: &str) -> Self {
        Self {
            catalog,
            probe,
            app_version: app_version.to_string(),
            #[cfg(feature = "plugin-system")]
            libraries: HashMap::new(),
        }
    }

    /// Scan the system root then the plugin root
    pub fn discover_dirs(&mut self, system_dir: &Path, plugin_dir: &Path) -> Registry {
        self.discover(&[
            (system_dir.to_path_buf(), BoardSource::System),
            (plugin_dir.to_path_buf(), BoardSource::Plugin),
        ])
    }

    /// Scan every root in order; never fails, bad modules are skipped
    pub fn discover(&mut self, roots: &[(PathBuf, BoardSource)]) -> Registry {
        let mut registry = Registry::new();
        for (root, source) in roots {
            self.scan_root(root, *source, &mut registry);
        }
        info!("Board discovery complete: {} board(s) available", registry.len());
        registry
    }

    fn scan_root(&mut self, root: &Path, source: BoardSource, registry: &mut Registry) {
        let entries = match fs::read_dir(root) {
            Ok(rd) => rd,
            Err(e) => {
                warn!("{} board directory {} not readable: {}", source, root.display(), e);
                return;
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| !n.starts_with('_') && !n.starts_with('.'))
            })
            .collect();
        dirs.sort();

        for dir in dirs {
            match self.load_module(&dir, source) {
                Ok(descs) => {
                    for desc in descs {
                        let origin = desc.origin();
                        let id = desc.id.clone();
                        match registry.register(desc) {
                            Ok(()) => info!("Registered board '{}' from {}", id, origin),
                            Err(existing) => warn!(
                                "Duplicate board id '{}' from {} ignored, already provided by {}",
                                id,
                                origin,
                                existing.origin()
                            ),
                        }
                    }
                }
                Err(DiscoveryError::Manifest(ManifestError::Missing(d))) => {
                    warn!("No plugin.json in {}, skipping", d.display());
                }
                Err(DiscoveryError::Disabled(m)) => {
                    info!("Board module '{}' is disabled, skipping", m);
                }
                Err(e) => {
                    error!("Board module {} rejected: {}", dir.display(), e);
                }
            }
        }
    }

    /// Validate one module directory and resolve its boards
    ///
    /// Module level problems reject the whole module. A board entry that
    /// fails to resolve is logged and dropped on its own.
    pub fn load_module(&mut self, dir: &Path, source: BoardSource) -> Result<Vec<BoardDescriptor>, DiscoveryError> {
        let manifest = BoardManifest::load(dir)?;

        if !manifest.enabled {
            return Err(DiscoveryError::Disabled(manifest.id));
        }

        for dep in manifest.dependency_names() {
            if !self.probe.is_available(&dep) {
                return Err(DiscoveryError::MissingDependency {
                    module: manifest.id.clone(),
                    dependency: dep,
                });
            }
        }

        if let Some(required) = &manifest.requirements.app_version {
            if compare_versions(required, &self.app_version) == Ordering::Greater {
                warn!(
                    "Module '{}' asks for app version {}, running {}",
                    manifest.id, required, self.app_version
                );
            }
        }

        let specs = manifest.board_specs();
        if specs.is_empty() {
            return Err(DiscoveryError::NoBoards(manifest.id));
        }

        let mut out = Vec::with_capacity(specs.len());
        for spec in &specs {
            match self.resolve_board(dir, &manifest, spec) {
                Ok(class) => out.push(BoardDescriptor {
                    id: spec.id.clone(),
                    class,
                    source,
                    module_dir: dir.to_path_buf(),
                    manifest_id: manifest.id.clone(),
                    manifest_version: manifest.version_str().to_string(),
                }),
                Err(e) => error!("Skipping board in module '{}': {}", manifest.id, e),
            }
        }
        debug!("Module '{}' provides {} of {} board(s)", manifest.id, out.len(), specs.len());
        Ok(out)
    }

    fn resolve_board(
        &mut self,
        dir: &Path,
        manifest: &BoardManifest,
        spec: &BoardSpec,
    ) -> Result<Arc<dyn BoardClass>, DiscoveryError> {
        if let Some(lib) = &spec.library {
            return self.resolve_native(&dir.join(lib), spec);
        }
        let module = spec.module.as_deref().unwrap_or(&manifest.id);
        self.catalog
            .resolve(module, spec.class_name.as_deref())
            .map_err(|source| DiscoveryError::Resolve { board: spec.id.clone(), source })
    }

    #[cfg(feature = "plugin-system")]
    fn resolve_native(&mut self, path: &Path, spec: &BoardSpec) -> Result<Arc<dyn BoardClass>, DiscoveryError> {
        let lib_err = |message: String| DiscoveryError::Library { board: spec.id.clone(), message };

        let library = match self.libraries.get(path) {
            Some(lib) => Arc::clone(lib),
            None => {
                let lib = Arc::new(LoadedLibrary::load(path).map_err(|e| lib_err(e.to_string()))?);
                self.libraries.insert(path.to_path_buf(), Arc::clone(&lib));
                lib
            }
        };
        let class_name = spec.class_name.as_deref().unwrap_or(&spec.id);
        let class = NativeBoardClass::new(library, class_name).map_err(|e| lib_err(e.to_string()))?;
        Ok(Arc::new(class))
    }

    #[cfg(not(feature = "plugin-system"))]
    fn resolve_native(&mut self, path: &Path, spec: &BoardSpec) -> Result<Arc<dyn BoardClass>, DiscoveryError> {
        Err(DiscoveryError::Library {
            board: spec.id.clone(),
            message: format!("{} needs the plugin-system feature", path.display()),
        })
    }
}

/// Discover boards from the configured directories with the builtin catalog
pub fn discover_configured(cfg: &Config, catalog: &Catalog) -> Registry {
    let boards = cfg.boards();
    let caps = Capabilities::from_config(cfg);
    Discovery::new(catalog, &caps, crate::APP_VERSION).discover_dirs(&boards.system_dir, &boards.plugin_dir)
}
