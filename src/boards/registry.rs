/*
 *  boards/registry.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Board id -> validated implementation
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

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::catalog::BoardClass;

/// Where a module was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardSource {
    System,
    Plugin,
}

impl fmt::Display for BoardSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardSource::System => write!(f, "system"),
            BoardSource::Plugin => write!(f, "plugin"),
        }
    }
}

/// A registry entry, built once by discovery and never changed
#[derive(Debug, Clone)]
pub struct BoardDescriptor {
    pub id: String,
    pub class: Arc<dyn BoardClass>,
    pub source: BoardSource,
    pub module_dir: PathBuf,
    pub manifest_id: String,
    pub manifest_version: String,
}

impl BoardDescriptor {
    pub fn early_init(&self) -> bool {
        self.class.requires_early_init()
    }

    /// "plugin season_countdown 1.0.0 (boards/plugins/season_countdown)"
    pub fn origin(&self) -> String {
        format!(
            "{} {} {} ({})",
            self.source,
            self.manifest_id,
            self.manifest_version,
            self.module_dir.display()
        )
    }
}

/// Board id -> descriptor
///
/// Filled by discovery, read-only afterwards.
#[derive(Debug, Default)]
pub struct Registry {
    boards: BTreeMap<String, BoardDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor unless the id is taken
    ///
    /// On conflict the existing entry stays and is returned as the error.
    pub fn register(&mut self, desc: BoardDescriptor) -> Result<(), Box<BoardDescriptor>> {
        if let Some(existing) = self.boards.get(&desc.id) {
            return Err(Box::new(existing.clone()));
        }
        self.boards.insert(desc.id.clone(), desc);
        Ok(())
    }

    pub fn resolve(&self, id: &str) -> Option<&BoardDescriptor> {
        self.boards.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.boards.contains_key(id)
    }

    /// Copy of the id -> descriptor map; later registrations do not show up in it
    pub fn list(&self) -> BTreeMap<String, BoardDescriptor> {
        self.boards.clone()
    }

    pub fn get_available_boards(&self) -> BTreeMap<String, BoardDescriptor> {
        self.list()
    }

    /// Sorted registered ids
    pub fn ids(&self) -> Vec<String> {
        self.boards.keys().cloned().collect()
    }

    pub fn is_board_loaded(&self, id: &str) -> bool {
        self.contains(id)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &BoardDescriptor> {
        self.boards.values()
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}
