/*
 *  boards/builtins/pbdisplay.rs
 *
 *  NHL LED Scoreboard - board rotation runtime
 *  (c) 2020-26 Stuart Hunter
 *
 *  Push-button confirmation board, legacy draw style
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

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

use crate::boards::{BoardError, LegacyBoard, LegacyStyle};
use crate::context::AppContext;
use crate::display::{FontSize, SharedMatrix};
use crate::interrupts::SleepEvent;

use super::{hold, paint};

pub fn create(
    app: Arc<AppContext>,
    matrix: SharedMatrix,
    sleep: Arc<SleepEvent>,
) -> Result<Box<dyn LegacyBoard>, BoardError> {
    Ok(Box::new(PbDisplay { app, matrix, sleep }))
}

pub struct PbDisplay {
    app: Arc<AppContext>,
    matrix: SharedMatrix,
    sleep: Arc<SleepEvent>,
}

impl LegacyBoard for PbDisplay {
    fn style(&self) -> LegacyStyle {
        LegacyStyle::Draw
    }

    fn draw(&mut self) -> Result<(), BoardError> {
        let track = self.app.board_track();
        let prev = track.prev_board.unwrap_or_else(|| "-".into()).to_uppercase();
        paint(&self.matrix, |m| {
            m.clear();
            m.draw_text_centered("BUTTON", 4, FontSize::Medium, Rgb888::GREEN);
            m.draw_text_centered(&prev, 18, FontSize::Small, Rgb888::WHITE);
        })?;
        hold(&self.sleep, 5.0);
        Ok(())
    }
}
