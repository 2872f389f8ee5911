/*
 *  boards/cache.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Live board instances, built on first use and reused until evicted
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

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use log::{debug, error, info};

use super::registry::BoardDescriptor;
use super::{Board, BoardContext, BoardRuntime};

/// Shared handle to a live board
pub type BoardHandle = Arc<Mutex<Box<dyn Board>>>;

/// Board id -> live instance, access serialized by one mutex
#[derive(Default)]
pub struct InstanceCache {
    instances: Mutex<HashMap<String, BoardHandle>>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached instance for `desc.id`, constructing it if needed
    ///
    /// Construction errors and panics are logged and yield `None`; nothing
    /// is cached in that case so the next call tries again.
    pub fn get_or_create(&self, desc: &BoardDescriptor, rt: &BoardRuntime) -> Option<BoardHandle> {
        let mut map = self.instances.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(handle) = map.get(&desc.id) {
            return Some(Arc::clone(handle));
        }

        let ctx = BoardContext::load(rt, &desc.module_dir);
        let built = panic::catch_unwind(AssertUnwindSafe(|| desc.class.create(ctx)));
        match built {
            Ok(Ok(board)) => {
                debug!("Created board instance '{}' from {}", desc.id, desc.origin());
                let handle: BoardHandle = Arc::new(Mutex::new(board));
                map.insert(desc.id.clone(), Arc::clone(&handle));
                Some(handle)
            }
            Ok(Err(e)) => {
                error!("Board '{}' missing or misconfigured: {}", desc.id, e);
                None
            }
            Err(_) => {
                error!("Board '{}' missing or misconfigured: constructor panicked", desc.id);
                None
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.instances.lock().unwrap_or_else(|p| p.into_inner()).contains_key(id)
    }

    /// Sorted ids of the live instances
    pub fn list_cached(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .instances
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Drop an instance after running its cleanup hook
    ///
    /// Returns false when nothing was cached under `id`.
    pub fn evict(&self, id: &str) -> bool {
        let removed = self.instances.lock().unwrap_or_else(|p| p.into_inner()).remove(id);
        match removed {
            Some(handle) => {
                cleanup(id, &handle);
                true
            }
            None => false,
        }
    }

    pub fn evict_all(&self) -> usize {
        let drained: Vec<(String, BoardHandle)> = self
            .instances
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .drain()
            .collect();
        let n = drained.len();
        for (id, handle) in drained {
            cleanup(&id, &handle);
        }
        if n > 0 {
            info!("Evicted {} board instance(s)", n);
        }
        n
    }
}

fn cleanup(id: &str, handle: &BoardHandle) {
    let mut board = handle.lock().unwrap_or_else(|p| p.into_inner());
    if panic::catch_unwind(AssertUnwindSafe(|| board.cleanup())).is_err() {
        error!("Board '{}' panicked during cleanup", id);
    } else {
        debug!("Board '{}' cleaned up", id);
    }
}
