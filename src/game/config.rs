//! Session tuning.
//!
//! Every value has a default matching the classic layout, and a config can be
//! loaded from JSON where only the fields that differ need to be present.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{hex::HexLayout, trajectory::TrajectoryConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse session config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("`{field}` must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f32 },
    #[error("`{field}` must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("`{field}` must be between 0 and 1, got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },
    #[error("`columns` must be at least 1")]
    NoColumns,
}

/// Grid geometry and initial fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub horizontal_spacing: f32,
    pub vertical_spacing: f32,
    /// World position of cell (0, 0) before descent.
    pub origin: [f32; 3],
    /// Pieces in an odd row; even rows get one more.
    pub columns: u32,
    /// Rows filled when a session starts.
    pub initial_rows: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            horizontal_spacing: 1.0,
            vertical_spacing: 0.9,
            origin: [0.0; 3],
            columns: 6,
            initial_rows: 10,
        }
    }
}

/// Launch, aim line and wall bounce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotConfig {
    /// Where loaded pieces wait and are fired from.
    pub spawn_point: [f32; 3],
    pub speed: f32,
    /// Speed factor kept after a wall bounce.
    pub bounce_restitution: f32,
    /// Aim line length budget.
    pub max_line_length: f32,
    pub max_bounces: u32,
    pub bounce_padding: f32,
    /// Ticks to wait after a pop before the next piece is loaded.
    pub settle_ticks: u32,
    /// Chance the loaded color is picked from colors still on the grid.
    pub grid_color_bias: f64,
}

impl Default for ShotConfig {
    fn default() -> Self {
        Self {
            spawn_point: [2.5, -14.0, 0.0],
            speed: 10.0,
            bounce_restitution: 0.8,
            max_line_length: 30.0,
            max_bounces: 3,
            bounce_padding: 0.01,
            settle_ticks: 12,
            grid_color_bias: 0.8,
        }
    }
}

/// Grid descent speed curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescentConfig {
    pub base_speed: f32,
    pub speed_multiplier: f32,
    pub min_speed: f32,
    /// Row count at which descent runs at base speed.
    pub max_rows: u32,
}

impl Default for DescentConfig {
    fn default() -> Self {
        Self {
            base_speed: 0.5,
            speed_multiplier: 2.0,
            min_speed: 0.5,
            max_rows: 30,
        }
    }
}

/// Falling pieces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallConfig {
    /// Height of the hop before dropping.
    pub lift_height: f32,
    pub lift_ticks: u32,
    /// Initial downward speed once the hop ends.
    pub drop_speed: f32,
    pub gravity: f32,
    /// Falling pieces below this height go back to the pool.
    pub despawn_height: f32,
    pub points_per_piece: u32,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            lift_height: 0.5,
            lift_ticks: 6,
            drop_speed: 3.0,
            gravity: 9.81,
            despawn_height: -16.0,
            points_per_piece: 10,
        }
    }
}

/// How row colors are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorPolicy {
    #[default]
    Uniform,
    /// Pick from colors already on the grid with probability `bias`.
    WeightedTowardGrid { bias: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SpawnConfig {
    pub row_colors: ColorPolicy,
    /// Seed for reproducible sessions; seeded from the OS when absent.
    pub seed: Option<u64>,
}

/// All tuning for one session.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub grid: GridConfig,
    pub shot: ShotConfig,
    pub descent: DescentConfig,
    pub fall: FallConfig,
    pub spawn: SpawnConfig,
    /// Settled pieces below this height end the session. Disabled when `None`.
    pub danger_line_y: Option<f32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            shot: ShotConfig::default(),
            descent: DescentConfig::default(),
            fall: FallConfig::default(),
            spawn: SpawnConfig::default(),
            // Just above the default shooter spawn point.
            danger_line_y: Some(-12.5),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("grid.horizontal_spacing", self.grid.horizontal_spacing)?;
        positive("grid.vertical_spacing", self.grid.vertical_spacing)?;
        for value in self.grid.origin.into_iter().chain(self.shot.spawn_point) {
            finite("position", value)?;
        }
        if self.grid.columns == 0 {
            return Err(ConfigError::NoColumns);
        }

        positive("shot.speed", self.shot.speed)?;
        positive("shot.max_line_length", self.shot.max_line_length)?;
        finite("shot.bounce_restitution", self.shot.bounce_restitution)?;
        finite("shot.bounce_padding", self.shot.bounce_padding)?;
        unit("shot.grid_color_bias", self.shot.grid_color_bias)?;
        if let ColorPolicy::WeightedTowardGrid { bias } = self.spawn.row_colors {
            unit("spawn.row_colors.bias", bias)?;
        }

        finite("descent.base_speed", self.descent.base_speed)?;
        finite("descent.speed_multiplier", self.descent.speed_multiplier)?;
        finite("descent.min_speed", self.descent.min_speed)?;

        finite("fall.lift_height", self.fall.lift_height)?;
        finite("fall.drop_speed", self.fall.drop_speed)?;
        finite("fall.gravity", self.fall.gravity)?;
        finite("fall.despawn_height", self.fall.despawn_height)?;
        if let Some(y) = self.danger_line_y {
            finite("danger_line_y", y)?;
        }

        Ok(())
    }

    pub fn layout(&self) -> HexLayout {
        HexLayout::new(
            self.grid.horizontal_spacing,
            self.grid.vertical_spacing,
            Vec3::from_array(self.grid.origin),
        )
    }

    pub fn trajectory(&self) -> TrajectoryConfig {
        TrajectoryConfig {
            max_length: self.shot.max_line_length,
            max_bounces: self.shot.max_bounces,
            bounce_padding: self.shot.bounce_padding,
        }
    }

    pub fn spawn_point(&self) -> Vec3 {
        Vec3::from_array(self.shot.spawn_point)
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}
