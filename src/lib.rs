//! Logic core of a descending bubble shooter.
//!
//! The [`game`] module holds the grid, cluster, placement, trajectory and pool
//! logic plus a [`Session`] that drives them. Add [`plugin`] to a Bevy app to
//! run a session from the fixed-step schedule.

pub mod game;

use bevy::prelude::*;

pub use game::*;

pub fn plugin(app: &mut App) {
    app.add_plugins(game::plugin);
}
