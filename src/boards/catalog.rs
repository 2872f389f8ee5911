/*
 *  boards/catalog.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Compiled board classes, addressed by module and class name
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
use std::sync::Arc;

use thiserror::Error;

use super::{Board, BoardContext, BoardError, LegacyBoardAdapter, LegacyFactory};

/// A constructible board implementation
///
/// Manifests name classes; discovery turns each name into one of these.
pub trait BoardClass: Send + Sync {
    fn class_name(&self) -> &str;

    fn create(&self, ctx: BoardContext) -> Result<Box<dyn Board>, BoardError>;

    /// Build this board before the first rotation
    fn requires_early_init(&self) -> bool {
        false
    }
}

impl fmt::Debug for dyn BoardClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoardClass({})", self.class_name())
    }
}

pub type BoardFactory = fn(BoardContext) -> Result<Box<dyn Board>, BoardError>;

#[derive(Clone, Copy)]
enum Ctor {
    Board(BoardFactory),
    Legacy(LegacyFactory),
}

/// Board class compiled into the binary
#[derive(Clone)]
pub struct StaticClass {
    name: &'static str,
    ctor: Ctor,
    early_init: bool,
}

impl StaticClass {
    pub fn new(name: &'static str, factory: BoardFactory) -> Self {
        Self { name, ctor: Ctor::Board(factory), early_init: false }
    }

    /// Older board wrapped in the legacy adapter on construction
    pub fn legacy(name: &'static str, factory: LegacyFactory) -> Self {
        Self { name, ctor: Ctor::Legacy(factory), early_init: false }
    }

    pub fn early_init(mut self) -> Self {
        self.early_init = true;
        self
    }
}

impl BoardClass for StaticClass {
    fn class_name(&self) -> &str {
        self.name
    }

    fn create(&self, ctx: BoardContext) -> Result<Box<dyn Board>, BoardError> {
        match self.ctor {
            Ctor::Board(f) => f(ctx),
            Ctor::Legacy(f) => Ok(Box::new(LegacyBoardAdapter::construct(self.name, f, ctx)?)),
        }
    }

    fn requires_early_init(&self) -> bool {
        self.early_init
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("module '{0}' not found")]
    UnknownModule(String),
    #[error("module '{module}' has no board class '{class}'")]
    UnknownClass { module: String, class: String },
    #[error("module '{0}' has several board classes, class_name is required")]
    Ambiguous(String),
    #[error("module '{0}' declares no board class")]
    Empty(String),
}

/// module name -> board classes
#[derive(Default)]
pub struct Catalog {
    modules: BTreeMap<String, Vec<Arc<dyn BoardClass>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the boards shipped with the application
    pub fn builtin() -> Self {
        let mut c = Self::new();
        for (module, classes) in super::builtins::modules() {
            c.add_module(module, classes.into_iter().map(|k| Arc::new(k) as Arc<dyn BoardClass>).collect());
        }
        c
    }

    pub fn add_module(&mut self, module: &str, classes: Vec<Arc<dyn BoardClass>>) {
        self.modules.entry(module.to_string()).or_default().extend(classes);
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Look up `class_name` in `module`
    ///
    /// Without a class name the module must hold exactly one class.
    pub fn resolve(&self, module: &str, class_name: Option<&str>) -> Result<Arc<dyn BoardClass>, ResolveError> {
        let classes = self
            .modules
            .get(module)
            .ok_or_else(|| ResolveError::UnknownModule(module.to_string()))?;
        match class_name {
            Some(name) => classes
                .iter()
                .find(|c| c.class_name() == name)
                .cloned()
                .ok_or_else(|| ResolveError::UnknownClass {
                    module: module.to_string(),
                    class: name.to_string(),
                }),
            None => match classes.as_slice() {
                [] => Err(ResolveError::Empty(module.to_string())),
                [only] => Ok(Arc::clone(only)),
                _ => Err(ResolveError::Ambiguous(module.to_string())),
            },
        }
    }
}
