//! Grid descent - the whole grid creeps toward the shooter.
//!
//! Speed rises as fewer rows remain on the board, so a nearly cleared board
//! refills quickly. Each time the grid has moved down one row height a new
//! row is due above the current top row.

use bevy::prelude::*;

use super::{config::DescentConfig, hex::HexLayout};

/// Descent progress of one session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct Descent {
    /// Current speed in world units per second.
    pub speed: f32,
    /// Top rows spawned since the session started.
    pub rows_spawned: u32,
}

impl Descent {
    /// Speed for a board with `active_rows` populated rows.
    pub fn speed_for(config: &DescentConfig, active_rows: u32) -> f32 {
        let max_rows = config.max_rows.max(1) as f32;
        let missing = max_rows - active_rows as f32;
        let increase = missing * config.speed_multiplier * config.base_speed / max_rows;
        (config.base_speed + increase).max(config.min_speed)
    }

    /// Move the layout down for one tick. Returns the distance moved.
    pub fn advance(
        &mut self,
        config: &DescentConfig,
        layout: &mut HexLayout,
        active_rows: u32,
        dt: f32,
    ) -> f32 {
        self.speed = Self::speed_for(config, active_rows);
        let step = self.speed * dt.max(0.0);
        layout.descent_offset += step;
        step
    }

    /// Whether the grid has descended far enough for another top row.
    pub fn row_due(&self, layout: &HexLayout) -> bool {
        layout.descent_offset >= layout.vertical_spacing * (self.rows_spawned + 1) as f32
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
