/*
 *  boards/layout.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Per-board layout files, generic plus panel-size overrides
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

use std::path::Path;

use embedded_graphics::pixelcolor::Rgb888;
use serde::Deserialize;
use serde_json::Value;

use crate::display::{named_color, FontSize};

/// Horizontal anchoring of a layout element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// One positioned element from a layout file
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutElement {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub align: Align,
}

impl LayoutElement {
    pub fn at(x: i32, y: i32) -> Self {
        Self { x, y, font: None, color: None, align: Align::Left }
    }

    pub fn centered(y: i32) -> Self {
        Self { x: 0, y, font: None, color: None, align: Align::Center }
    }

    pub fn font_size(&self) -> FontSize {
        self.font.as_deref().map(FontSize::parse).unwrap_or_default()
    }

    pub fn color_or(&self, default: Rgb888) -> Rgb888 {
        self.color.as_deref().map(named_color).unwrap_or(default)
    }
}

/// Combined `layout.json` + `layout_{w}x{h}.json` of a module directory
#[derive(Debug, Clone)]
pub struct BoardLayout {
    data: Value,
}

impl BoardLayout {
    /// Load the layout for a panel size
    ///
    /// Returns `None` when the module ships neither file. When only the
    /// size-specific file exists it is used on its own.
    pub fn load(board_dir: &Path, (w, h): (u32, u32)) -> Option<Self> {
        let generic = read_json(&board_dir.join("layout.json"));
        let sized = read_json(&board_dir.join(format!("layout_{}x{}.json", w, h)));
        match (generic, sized) {
            (None, None) => None,
            (Some(data), None) | (None, Some(data)) => Some(Self { data }),
            (Some(mut data), Some(over)) => {
                merge(&mut data, over);
                Some(Self { data })
            }
        }
    }

    pub fn from_value(data: Value) -> Self {
        Self { data }
    }

    /// Element `name` of the layout section `board`
    pub fn element(&self, board: &str, name: &str) -> Option<LayoutElement> {
        let v = self.data.get(board)?.get(name)?;
        match serde_json::from_value(v.clone()) {
            Ok(el) => Some(el),
            Err(e) => {
                log::warn!("Layout element {}.{} ignored: {}", board, name, e);
                None
            }
        }
    }
}

fn read_json(path: &Path) -> Option<Value> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(v) => Some(v),
        Err(e) => {
            log::error!("Error loading board layout {}: {}", path.display(), e);
            None
        }
    }
}

/// Deep merge `over` into `base`, objects recurse, everything else replaces
fn merge(base: &mut Value, over: Value) {
    match (base, over) {
        (Value::Object(b), Value::Object(o)) => {
            for (k, v) in o {
                match b.get_mut(&k) {
                    Some(slot) => merge(slot, v),
                    None => {
                        b.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_size_specific_overrides_generic() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("layout.json"),
            r#"{"clock": {"time": {"x": 1, "y": 2, "font": "large"}, "date": {"x": 0, "y": 20}}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("layout_128x64.json"),
            r#"{"clock": {"time": {"y": 30}}}"#,
        )
        .unwrap();

        let layout = BoardLayout::load(dir.path(), (128, 64)).unwrap();
        let time = layout.element("clock", "time").unwrap();
        assert_eq!((time.x, time.y), (1, 30));
        assert_eq!(time.font_size(), FontSize::Large);
        assert_eq!(layout.element("clock", "date").unwrap().y, 20);

        // other sizes only see the generic file
        let small = BoardLayout::load(dir.path(), (64, 32)).unwrap();
        assert_eq!(small.element("clock", "time").unwrap().y, 2);
    }

    #[test]
    fn test_only_sized_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BoardLayout::load(dir.path(), (64, 32)).is_none());
        std::fs::write(dir.path().join("layout_64x32.json"), r#"{"b": {"e": {"align": "center"}}}"#).unwrap();
        let layout = BoardLayout::load(dir.path(), (64, 32)).unwrap();
        assert_eq!(layout.element("b", "e").unwrap().align, Align::Center);
        assert!(layout.element("b", "missing").is_none());
    }

    #[test]
    fn test_merge_replaces_scalars() {
        let mut a = json!({"a": 1, "o": {"x": 1, "y": 2}});
        merge(&mut a, json!({"a": 5, "o": {"y": 9}, "n": true}));
        assert_eq!(a, json!({"a": 5, "o": {"x": 1, "y": 9}, "n": true}));
    }
}
