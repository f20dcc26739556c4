//! Game state - score and whether the session is still running.
//!
//! Lose: a fired piece touches the fail boundary, or settled pieces descend
//! past the danger line when one is configured.

use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<GameScore>();
    app.register_type::<SessionPhase>();
}

/// Whether the session is accepting input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Default)]
pub enum SessionPhase {
    /// Nothing spawned yet.
    #[default]
    Idle,
    Playing,
    Over,
}

/// Running score of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Reflect)]
pub struct GameScore {
    pub score: u32,
    /// Pieces that left the play area after being popped or dropped.
    pub pieces_cleared: u32,
    pub clusters_popped: u32,
    pub orphans_dropped: u32,
}

impl GameScore {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Credit one removed piece that has exited the play area.
    pub fn credit_exit(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        self.pieces_cleared += 1;
    }

    pub fn record_pop(&mut self, orphans: usize) {
        self.clusters_popped += 1;
        self.orphans_dropped += orphans as u32;
    }
}
