//! The shooter/launcher at the bottom of the play area.
//!
//! The shooter always has a "loaded" piece waiting at the spawn point and a
//! "next" color preview. After a shot that popped something it waits a few
//! ticks before reloading, so the pop can play out.

use bevy::prelude::*;
use rand::Rng;

use super::{
    piece::{PieceColor, PieceId},
    pool::PiecePool,
};

/// Maximum angle from vertical (in radians) - prevents shooting too horizontally.
pub const MAX_AIM_ANGLE: f32 = 1.3; // About 75 degrees

/// Smallest upward component an aim direction may have.
const MIN_AIM_UP: f32 = 0.1;

/// The current state of the shooter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Default)]
pub enum ShooterState {
    /// Ready to fire
    #[default]
    Ready,
    /// A fired piece is still airborne.
    InFlight,
    /// Waiting for a pop to finish before reloading.
    Settling { ticks_left: u32 },
    /// Nothing loaded (session not started or over).
    Empty,
}

/// Loaded piece, next color and firing state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shooter {
    pub state: ShooterState,
    loaded: Option<PieceId>,
    /// The next color (preview).
    pub next: PieceColor,
    in_flight: Option<PieceId>,
}

impl Shooter {
    pub fn loaded(&self) -> Option<PieceId> {
        self.loaded
    }

    pub fn in_flight(&self) -> Option<PieceId> {
        self.in_flight
    }

    pub fn is_ready(&self) -> bool {
        self.state == ShooterState::Ready && self.loaded.is_some()
    }

    /// Pick a color, preferring colors still on the grid with probability `bias`.
    pub fn pick_color(rng: &mut impl Rng, grid_colors: &[PieceColor], bias: f64) -> PieceColor {
        PieceColor::random_weighted(rng, grid_colors, bias)
    }

    /// Load the next color into a piece at `spawn_point` and roll a new preview.
    pub fn reload(
        &mut self,
        pool: &mut PiecePool,
        rng: &mut impl Rng,
        grid_colors: &[PieceColor],
        bias: f64,
        spawn_point: Vec3,
    ) -> Option<PieceId> {
        let color = self.next;
        self.next = Self::pick_color(rng, grid_colors, bias);

        let id = pool.acquire();
        pool.get_mut(id)?.draw(color, spawn_point);
        self.loaded = Some(id);
        self.state = ShooterState::Ready;

        info!("Reloaded with {:?}, next is {:?}", color, self.next);
        Some(id)
    }

    /// Fire the loaded piece along `direction`.
    ///
    /// Returns `None` if the shooter is not ready.
    pub fn fire(&mut self, pool: &mut PiecePool, direction: Vec3, speed: f32) -> Option<PieceId> {
        if !self.is_ready() {
            return None;
        }

        let id = self.loaded.take()?;
        let direction = clamp_aim(direction);
        pool.get_mut(id)?.launch(direction, speed);
        self.in_flight = Some(id);
        self.state = ShooterState::InFlight;

        info!("Fired {} in direction {:?}", id, direction);
        Some(id)
    }

    /// The airborne piece resolved. Wait `settle_ticks` if something popped.
    pub fn landed(&mut self, popped: bool, settle_ticks: u32) {
        self.in_flight = None;
        self.state = if popped && settle_ticks > 0 {
            ShooterState::Settling {
                ticks_left: settle_ticks,
            }
        } else {
            ShooterState::Empty
        };
    }

    /// Count down the settle delay. Returns `true` when a reload is due.
    pub fn tick(&mut self) -> bool {
        match self.state {
            ShooterState::Settling { ticks_left } if ticks_left > 1 => {
                self.state = ShooterState::Settling {
                    ticks_left: ticks_left - 1,
                };
                false
            }
            ShooterState::Settling { .. } => {
                self.state = ShooterState::Empty;
                true
            }
            ShooterState::Empty => self.in_flight.is_none(),
            _ => false,
        }
    }

    /// Forget everything (new game). Pieces are released by the caller.
    pub fn clear(&mut self) {
        self.loaded = None;
        self.in_flight = None;
        self.state = ShooterState::Empty;
    }
}

/// Keep an aim direction pointing upward and within [`MAX_AIM_ANGLE`] of vertical.
///
/// Works in the XY plane; the Z component is dropped.
pub fn clamp_aim(direction: Vec3) -> Vec3 {
    let mut dir = direction.truncate().normalize_or_zero();
    if dir == Vec2::ZERO {
        return Vec3::Y;
    }

    // Ensure we're aiming upward (not down)
    if dir.y < MIN_AIM_UP {
        dir.y = MIN_AIM_UP;
        dir = dir.normalize();
    }

    let angle = dir.x.atan2(dir.y).clamp(-MAX_AIM_ANGLE, MAX_AIM_ANGLE);
    Vec3::new(angle.sin(), angle.cos(), 0.0)
}
