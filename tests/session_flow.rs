//! Scenario tests: core operations on hand-built grids, and a full session
//! driven through the Bevy plugin.

use bevy::prelude::*;
use bubblegrid::{
    Contact, ContactOutcome, ContactReported, FireRequested, HexCoord, HexGrid, PieceColor,
    PiecePool, RayHit, Session, SessionConfig, SessionPhase, TrajectoryConfig,
    cluster::{orphan_set, same_color_cluster},
    placement::best_empty_slot,
    spawner::spawn_colored,
    trajectory::project,
};

fn release_at(grid: &mut HexGrid, pool: &mut PiecePool, coord: HexCoord) {
    if let Some(id) = grid.remove(coord) {
        pool.release(id);
    }
}

#[test]
fn strip_below_a_gap_pops_and_leaves_nothing_to_orphan() {
    let mut grid = HexGrid::default();
    let mut pool = PiecePool::default();
    spawn_colored(&mut grid, &mut pool, 5, &[PieceColor::Red; 3]);

    let cluster = same_color_cluster(&grid, &pool, HexCoord::new(1, 5));
    assert_eq!(cluster.len(), 3);
    // Nothing above holds the strip.
    assert_eq!(orphan_set(&grid).len(), 3);

    for q in 0..3 {
        release_at(&mut grid, &mut pool, HexCoord::new(q, 5));
    }
    assert!(orphan_set(&grid).is_empty());
    assert_eq!(pool.available(), 3);
}

#[test]
fn placement_snaps_to_the_only_free_neighbor() {
    let mut grid = HexGrid::default();
    let mut pool = PiecePool::default();
    for r in 3..=5 {
        spawn_colored(&mut grid, &mut pool, r, &[PieceColor::Blue; 5]);
    }
    release_at(&mut grid, &mut pool, HexCoord::new(2, 3));

    let anchor_coord = HexCoord::new(2, 4);
    let anchor = grid.get(anchor_coord).unwrap();
    let anchor_pos = pool.get(anchor).unwrap().position;
    let impact = grid
        .layout
        .relative_world(anchor_pos, anchor_coord, HexCoord::new(2, 3));

    assert_eq!(
        best_empty_slot(&grid, &pool, impact, anchor),
        Some(HexCoord::new(2, 3))
    );
}

#[test]
fn single_bounce_turns_the_aim_line_around() {
    let wall = |origin: Vec3, dir: Vec3, max: f32| -> Option<RayHit> {
        if dir.x <= 0.0 {
            return None;
        }
        let t = (5.0 - origin.x) / dir.x;
        (t <= max).then(|| RayHit {
            point: origin + dir * t,
            normal: Vec3::NEG_X,
        })
    };

    let path = project(Vec3::ZERO, Vec3::X, &TrajectoryConfig::default(), &wall);
    assert_eq!(path.bounces(), 1);
    let second = path.segment_direction(1).unwrap();
    assert!(second.distance(Vec3::NEG_X) < 1e-6);
    assert!((path.length() - 30.0).abs() < 1e-3);
}

#[test]
fn restart_reuses_pooled_pieces() {
    let mut config = SessionConfig::default();
    config.spawn.seed = Some(4);
    let mut session = Session::new(config);

    session.start();
    let created = session.pool().len();
    assert_eq!(created, session.grid().len() + 1);

    session.start();
    assert_eq!(session.pool().len(), created);
    assert_eq!(session.pool().available(), 0);
}

#[test]
fn shot_that_misses_everything_ends_the_game_only_once() {
    let mut config = SessionConfig::default();
    config.spawn.seed = Some(21);
    let mut session = Session::new(config);
    session.start();

    let fired = session.fire(Vec3::new(0.3, 1.0, 0.0)).unwrap();
    for _ in 0..10 {
        session.tick(1.0 / 60.0);
    }
    assert!(session.piece(fired).unwrap().position.y > -14.0);

    assert_eq!(
        session.resolve_contact(Contact::FailBoundary { piece: fired }),
        ContactOutcome::GameOver
    );
    assert_eq!(
        session.resolve_contact(Contact::FailBoundary { piece: fired }),
        ContactOutcome::Ignored
    );
    assert_eq!(session.phase(), SessionPhase::Over);
}

fn test_app() -> App {
    let mut config = SessionConfig::default();
    config.spawn.seed = Some(99);
    config.grid.initial_rows = 4;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(config);
    app.add_plugins(bubblegrid::plugin);
    app.update();
    app
}

#[test]
fn plugin_starts_a_session() {
    let app = test_app();
    let session = app.world().resource::<Session>();
    assert_eq!(session.phase(), SessionPhase::Playing);
    assert_eq!(session.grid().len(), 7 + 6 + 7 + 6);
    assert!(session.shooter().is_ready());
}

#[test]
fn plugin_fires_and_resolves_contacts_in_fixed_update() {
    let mut app = test_app();

    app.world_mut().write_message(FireRequested { direction: Vec3::Y });
    app.world_mut().run_schedule(FixedUpdate);

    let moving = {
        let session = app.world().resource::<Session>();
        let moving = session.shooter().in_flight().unwrap();
        assert!(session.piece(moving).unwrap().is_airborne());
        moving
    };

    app.world_mut().write_message(ContactReported(Contact::Surface {
        moving,
        normal: Vec3::NEG_Y,
    }));
    app.world_mut().run_schedule(FixedUpdate);

    let session = app.world().resource::<Session>();
    let velocity = session.piece(moving).unwrap().velocity;
    assert!(velocity.y < 0.0);
    assert!((velocity.length() - 8.0).abs() < 1e-4);
}
