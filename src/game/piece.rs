//! Pieces - the colored bubbles that live on the grid.
//!
//! A piece is never destroyed. It cycles through
//! `Pooled -> Airborne -> Settled -> Falling -> Pooled`, and the grid owns the
//! coordinate it occupies; the piece only caches it.

use bevy::prelude::*;
use rand::Rng;

use super::hex::HexCoord;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<PieceColor>();
    app.register_type::<PieceId>();
    app.register_type::<PieceState>();
    app.register_type::<FallPhase>();
}

/// The different piece colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Default)]
pub enum PieceColor {
    #[default]
    Red,
    Blue,
    Green,
    Yellow,
}

impl PieceColor {
    /// Get all possible piece colors.
    pub const ALL: [PieceColor; 4] = [
        PieceColor::Red,
        PieceColor::Blue,
        PieceColor::Green,
        PieceColor::Yellow,
    ];

    /// Get a uniformly random piece color.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Get a random color, picking from `grid_colors` with probability `bias`.
    ///
    /// Falls back to [`PieceColor::random`] when the grid is empty.
    pub fn random_weighted(rng: &mut impl Rng, grid_colors: &[PieceColor], bias: f64) -> Self {
        if grid_colors.is_empty() {
            return Self::random(rng);
        }

        if rng.random_bool(bias.clamp(0.0, 1.0)) {
            grid_colors[rng.random_range(0..grid_colors.len())]
        } else {
            Self::random(rng)
        }
    }
}

/// Stable handle of a piece inside the [`PiecePool`](super::pool::PiecePool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct PieceId(pub(super) u32);

impl PieceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PieceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sub-state of a falling piece.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum FallPhase {
    /// Short hop upward before the drop.
    Lift { ticks_left: u32 },
    /// Free fall under gravity until it crosses the despawn height.
    Drop,
}

/// Lifecycle state of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Default)]
pub enum PieceState {
    /// Inactive, waiting in the pool.
    #[default]
    Pooled,
    /// Drawn from the pool and moving, not yet resolved to a coordinate.
    Airborne,
    /// Occupying a grid coordinate.
    Settled,
    /// Detached from the grid, animating off-world.
    Falling(FallPhase),
}

/// A single piece.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    id: PieceId,
    pub color: PieceColor,
    pub(super) coord: Option<HexCoord>,
    pub(super) state: PieceState,
    pub position: Vec3,
    pub velocity: Vec3,
}

impl Piece {
    pub(super) fn new(id: PieceId) -> Self {
        Self {
            id,
            color: PieceColor::default(),
            coord: None,
            state: PieceState::Pooled,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
        }
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    /// Last coordinate assigned by the grid. `None` unless settled.
    pub fn coord(&self) -> Option<HexCoord> {
        self.coord
    }

    pub fn state(&self) -> PieceState {
        self.state
    }

    pub fn is_airborne(&self) -> bool {
        self.state == PieceState::Airborne
    }

    pub fn is_settled(&self) -> bool {
        self.state == PieceState::Settled
    }

    pub fn is_falling(&self) -> bool {
        matches!(self.state, PieceState::Falling(_))
    }

    /// Take the piece out of the pool with a color, ready to be placed or fired.
    pub(super) fn draw(&mut self, color: PieceColor, position: Vec3) {
        self.color = color;
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.coord = None;
        self.state = PieceState::Airborne;
    }

    /// Give a drawn piece its launch velocity.
    pub(super) fn launch(&mut self, direction: Vec3, speed: f32) {
        self.state = PieceState::Airborne;
        self.velocity = direction.normalize_or_zero() * speed;
    }

    /// Stop in-flight motion, e.g. on contact with another piece.
    pub(super) fn stop(&mut self) {
        self.velocity = Vec3::ZERO;
    }

    /// Detach from the grid and start the fall sequence.
    ///
    /// The caller must already have removed the grid entry.
    pub(super) fn start_falling(&mut self, lift_ticks: u32) {
        self.coord = None;
        self.velocity = Vec3::ZERO;
        self.state = PieceState::Falling(FallPhase::Lift {
            ticks_left: lift_ticks,
        });
    }

    /// Advance the fall sequence by one tick. No-op unless falling.
    ///
    /// While lifting the piece rises `lift_step` per tick; afterwards it drops,
    /// starting at `drop_speed` and accelerating with `gravity`.
    pub(super) fn step_fall(&mut self, lift_step: f32, drop_speed: f32, gravity: f32, dt: f32) {
        match self.state {
            PieceState::Falling(FallPhase::Lift { ticks_left }) if ticks_left > 0 => {
                self.position.y += lift_step;
                self.state = PieceState::Falling(FallPhase::Lift {
                    ticks_left: ticks_left - 1,
                });
            }
            PieceState::Falling(FallPhase::Lift { .. }) => {
                self.velocity = Vec3::NEG_Y * drop_speed;
                self.state = PieceState::Falling(FallPhase::Drop);
            }
            PieceState::Falling(FallPhase::Drop) => {
                self.velocity.y -= gravity * dt;
                self.position += self.velocity * dt;
            }
            _ => {}
        }
    }

    /// Back to the inactive pool state, parked at `park`.
    pub(super) fn recycle(&mut self, park: Vec3) {
        self.coord = None;
        self.velocity = Vec3::ZERO;
        self.position = park;
        self.state = PieceState::Pooled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_weighted_color_comes_from_grid_when_fully_biased() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let color = PieceColor::random_weighted(&mut rng, &[PieceColor::Green], 1.0);
            assert_eq!(color, PieceColor::Green);
        }
    }

    #[test]
    fn test_weighted_color_on_empty_grid_is_any_color() {
        let mut rng = StdRng::seed_from_u64(7);
        let color = PieceColor::random_weighted(&mut rng, &[], 1.0);
        assert!(PieceColor::ALL.contains(&color));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut piece = Piece::new(PieceId(0));
        assert_eq!(piece.state(), PieceState::Pooled);

        piece.draw(PieceColor::Blue, Vec3::ZERO);
        piece.launch(Vec3::new(0.0, 3.0, 0.0), 10.0);
        assert!(piece.is_airborne());
        assert!((piece.velocity.y - 10.0).abs() < 1e-6);

        piece.start_falling(4);
        assert!(piece.is_falling());
        assert_eq!(piece.coord(), None);

        piece.recycle(Vec3::ONE);
        assert_eq!(piece.state(), PieceState::Pooled);
        assert_eq!(piece.position, Vec3::ONE);
    }

    #[test]
    fn test_fall_lifts_then_drops() {
        let mut piece = Piece::new(PieceId(0));
        piece.draw(PieceColor::Red, Vec3::ZERO);
        piece.start_falling(2);

        piece.step_fall(0.25, 3.0, 10.0, 0.1);
        piece.step_fall(0.25, 3.0, 10.0, 0.1);
        assert!((piece.position.y - 0.5).abs() < 1e-6);

        piece.step_fall(0.25, 3.0, 10.0, 0.1);
        assert_eq!(piece.state(), PieceState::Falling(FallPhase::Drop));
        assert!((piece.velocity.y + 3.0).abs() < 1e-6);

        piece.step_fall(0.25, 3.0, 10.0, 0.1);
        assert!((piece.velocity.y + 4.0).abs() < 1e-5);
        assert!((piece.position.y - 0.1).abs() < 1e-5);
    }
}
