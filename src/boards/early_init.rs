/*
 *  boards/early_init.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Build flagged boards before the first rotation
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

use log::{info, warn};

use super::{BoardRuntime, InstanceCache, Registry};

/// Instantiate every board whose class asks for early initialization
///
/// Returns how many were built. A failing board is logged and the rest
/// carry on.
pub fn initialize_flagged(registry: &Registry, cache: &InstanceCache, rt: &BoardRuntime) -> usize {
    let mut count = 0;
    for desc in registry.descriptors().filter(|d| d.early_init()) {
        match cache.get_or_create(desc, rt) {
            Some(_) => {
                info!("Early initialized board '{}'", desc.id);
                count += 1;
            }
            None => warn!("Early initialization of board '{}' failed", desc.id),
        }
    }
    count
}
