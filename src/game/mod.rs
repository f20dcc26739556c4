//! The bubble grid game core.
//!
//! This module contains all the gameplay logic including:
//! - Staggered hex lattice and the sparse grid of settled pieces
//! - Cluster and orphan detection
//! - Placement of a moving piece after it hits the grid
//! - Multi-bounce aim line projection
//! - Piece pool and lifecycle
//! - Descent, shooter, falling pieces and score, driven by [`Session`]

pub mod cluster;
pub mod config;
pub mod descent;
pub mod grid;
pub mod hex;
pub mod piece;
pub mod placement;
pub mod pool;
pub mod session;
pub mod shooter;
pub mod spawner;
pub mod state;
pub mod trajectory;

use bevy::prelude::*;

pub use self::{
    config::{ConfigError, SessionConfig},
    grid::HexGrid,
    hex::{HexCoord, HexLayout},
    piece::{FallPhase, Piece, PieceColor, PieceId, PieceState},
    pool::PiecePool,
    session::{Contact, ContactOutcome, Placement, Session, TickReport},
    shooter::ShooterState,
    state::{GameScore, SessionPhase},
    trajectory::{RayCaster, RayHit, Trajectory, TrajectoryConfig},
};

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((hex::plugin, piece::plugin, state::plugin));
    app.register_type::<descent::Descent>();
    app.register_type::<ShooterState>();

    app.init_resource::<SessionConfig>();
    app.add_message::<FireRequested>();
    app.add_message::<ContactReported>();
    app.add_message::<RestartRequested>();
    app.add_message::<SessionSignal>();

    app.add_systems(Startup, start_session);
    app.add_systems(
        FixedUpdate,
        (
            restart_session,
            fire_requested,
            resolve_contacts,
            advance_session,
        )
            .chain()
            .in_set(SessionSystems)
            .run_if(resource_exists::<Session>),
    );
}

/// System set for the fixed-step session systems.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionSystems;

/// Message to fire the loaded piece.
#[derive(Message, Debug, Clone)]
pub struct FireRequested {
    pub direction: Vec3,
}

/// Message carrying a collision detected by the host's physics.
#[derive(Message, Debug, Clone)]
pub struct ContactReported(pub Contact);

/// Message to throw the current game away and start a new one.
#[derive(Message, Debug, Clone)]
pub struct RestartRequested;

/// Message sent for everything a host may want to animate or display.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum SessionSignal {
    Placed(Placement),
    Bounced { piece: PieceId, velocity: Vec3 },
    RowSpawned(i32),
    /// A falling piece left the play area and is back in the pool.
    Recycled(PieceId),
    Reloaded(PieceId),
    GameOver,
}

fn start_session(mut commands: Commands, config: Res<SessionConfig>) {
    let config = match config.validate() {
        Ok(()) => (*config).clone(),
        Err(err) => {
            warn!("Invalid session config, using defaults: {}", err);
            SessionConfig::default()
        }
    };

    let mut session = Session::new(config);
    session.start();
    commands.insert_resource(session);
}

fn restart_session(mut requests: MessageReader<RestartRequested>, mut session: ResMut<Session>) {
    if requests.read().count() > 0 {
        session.start();
    }
}

fn fire_requested(mut requests: MessageReader<FireRequested>, mut session: ResMut<Session>) {
    for request in requests.read() {
        if session.fire(request.direction).is_none() {
            debug!("Shooter not ready, ignoring fire request");
        }
    }
}

/// Resolve the first reported contact of this step.
///
/// Physics may report several contacts for one impact; only the first counts.
fn resolve_contacts(
    mut contacts: MessageReader<ContactReported>,
    mut session: ResMut<Session>,
    mut signals: MessageWriter<SessionSignal>,
) {
    let mut reported = contacts.read();
    let Some(ContactReported(contact)) = reported.next().cloned() else {
        return;
    };
    let extra = reported.count();
    if extra > 0 {
        debug!("Dropped {} extra contacts this step", extra);
    }

    let signal = match session.resolve_contact(contact) {
        ContactOutcome::Placed(placement) => Some(SessionSignal::Placed(placement)),
        ContactOutcome::Bounced { piece, velocity } => {
            Some(SessionSignal::Bounced { piece, velocity })
        }
        ContactOutcome::GameOver => Some(SessionSignal::GameOver),
        ContactOutcome::Ignored => None,
    };

    if let Some(signal) = signal {
        signals.write(signal);
    }
}

fn advance_session(
    time: Res<Time>,
    mut session: ResMut<Session>,
    mut signals: MessageWriter<SessionSignal>,
) {
    let report = session.tick(time.delta_secs());

    for row in report.rows_spawned {
        signals.write(SessionSignal::RowSpawned(row));
    }
    for piece in report.recycled {
        signals.write(SessionSignal::Recycled(piece));
    }
    if let Some(piece) = report.reloaded {
        signals.write(SessionSignal::Reloaded(piece));
    }
    if report.game_over {
        signals.write(SessionSignal::GameOver);
    }
}
