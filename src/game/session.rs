//! The session - one grid, one pool and everything that drives them.
//!
//! A host calls [`Session::tick`] once per fixed step and hands every collision
//! its physics detects to [`Session::resolve_contact`]. Nothing here is global,
//! so several sessions can run side by side.

use bevy::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

use super::{
    cluster::{self, MIN_CLUSTER_SIZE},
    config::SessionConfig,
    descent::Descent,
    grid::HexGrid,
    hex::HexCoord,
    piece::{Piece, PieceColor, PieceId},
    placement,
    pool::PiecePool,
    shooter::{self, Shooter},
    spawner::{self, RowSpawner},
    state::{GameScore, SessionPhase},
    trajectory::{self, RayCaster, Trajectory},
};

/// A collision reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// `moving` touched the settled piece `hit` at `point`.
    Piece {
        moving: PieceId,
        hit: PieceId,
        point: Vec3,
    },
    /// `moving` touched a wall or the ceiling; `normal` points back into the play area.
    Surface { moving: PieceId, normal: Vec3 },
    /// `piece` crossed the fail boundary below the grid.
    FailBoundary { piece: PieceId },
}

/// Where a piece ended up and what it took with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub piece: PieceId,
    pub coord: HexCoord,
    /// The popped cluster, placed piece first. Empty when too small to pop.
    pub popped: Vec<PieceId>,
    /// Pieces that lost their connection to the top rows.
    pub dropped: Vec<PieceId>,
}

/// Result of [`Session::resolve_contact`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContactOutcome {
    Placed(Placement),
    Bounced { piece: PieceId, velocity: Vec3 },
    GameOver,
    /// The contact named a piece that cannot take part in it.
    Ignored,
}

/// What happened during one [`Session::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// How far the grid moved down.
    pub descended: f32,
    /// Rows spawned above the grid, in spawn order.
    pub rows_spawned: Vec<i32>,
    /// Falling pieces that left the play area and went back to the pool.
    pub recycled: Vec<PieceId>,
    pub reloaded: Option<PieceId>,
    pub game_over: bool,
}

/// One game: grid, pool, shooter, descent, score and the RNG behind them.
#[derive(Resource, Debug)]
pub struct Session {
    config: SessionConfig,
    spawner: RowSpawner,
    grid: HexGrid,
    pool: PiecePool,
    shooter: Shooter,
    descent: Descent,
    score: GameScore,
    phase: SessionPhase,
    rng: StdRng,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    /// An idle session. Call [`Session::start`] to fill the grid.
    pub fn new(config: SessionConfig) -> Self {
        let rng = match config.spawn.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            spawner: RowSpawner::new(config.grid.columns, config.spawn.row_colors),
            grid: HexGrid::new(config.layout()),
            pool: PiecePool::new(config.spawn_point()),
            shooter: Shooter::default(),
            descent: Descent::default(),
            score: GameScore::default(),
            phase: SessionPhase::Idle,
            rng,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn pool(&self) -> &PiecePool {
        &self.pool
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pool.get(id)
    }

    pub fn shooter(&self) -> &Shooter {
        &self.shooter
    }

    pub fn descent(&self) -> &Descent {
        &self.descent
    }

    pub fn score(&self) -> &GameScore {
        &self.score
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Start a fresh game: fill the initial rows and load the shooter.
    pub fn start(&mut self) {
        self.reset();

        self.spawner.spawn_initial_grid(
            &mut self.grid,
            &mut self.pool,
            &mut self.rng,
            self.config.grid.initial_rows,
        );

        let colors = self.grid.colors_present(&self.pool);
        self.shooter.next =
            Shooter::pick_color(&mut self.rng, &colors, self.config.shot.grid_color_bias);
        self.reload();
        self.phase = SessionPhase::Playing;

        info!("Session started with {} pieces", self.grid.len());
    }

    /// Return every piece to the pool and clear all progress.
    ///
    /// This is the only way to cancel pieces that are still falling.
    pub fn reset(&mut self) {
        self.pool.release_all();
        self.grid.clear();
        self.shooter.clear();
        self.descent.reset();
        self.score.reset();
        self.phase = SessionPhase::Idle;
    }

    /// Settle `colors[i]` at column `i` of `row`. Occupied cells are skipped.
    ///
    /// The top row is left as is.
    pub fn populate_row(&mut self, row: i32, colors: &[PieceColor]) -> Vec<PieceId> {
        spawner::spawn_colored(&mut self.grid, &mut self.pool, row, colors)
    }

    /// Aim line from the loaded piece along `direction`, clamped like a real shot.
    pub fn aim_preview(&self, direction: Vec3, caster: &impl RayCaster) -> Trajectory {
        let start = self
            .shooter
            .loaded()
            .and_then(|id| self.pool.get(id))
            .map_or_else(|| self.config.spawn_point(), |piece| piece.position);

        trajectory::project(
            start,
            shooter::clamp_aim(direction),
            &self.config.trajectory(),
            caster,
        )
    }

    /// Fire the loaded piece. `None` if nothing is ready or the game is not running.
    pub fn fire(&mut self, direction: Vec3) -> Option<PieceId> {
        if self.phase != SessionPhase::Playing {
            return None;
        }
        self.shooter
            .fire(&mut self.pool, direction, self.config.shot.speed)
    }

    /// Advance one fixed step of `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let mut report = TickReport::default();
        if self.phase != SessionPhase::Playing {
            return report;
        }

        self.descend(dt, &mut report);

        for piece in self.pool.iter_mut().filter(|p| p.is_airborne()) {
            piece.position += piece.velocity * dt;
        }

        self.advance_falls(dt, &mut report);

        if self.shooter.tick() {
            report.reloaded = self.reload();
        }

        if self.below_danger_line() {
            self.end("settled pieces crossed the danger line");
            report.game_over = true;
        }

        report
    }

    /// Resolve one collision reported by the host.
    pub fn resolve_contact(&mut self, contact: Contact) -> ContactOutcome {
        if self.phase == SessionPhase::Over {
            return ContactOutcome::Ignored;
        }

        match contact {
            Contact::Piece { moving, hit, point } => self.place(moving, hit, point),
            Contact::Surface { moving, normal } => self.bounce(moving, normal),
            Contact::FailBoundary { piece } => self.fail(piece),
        }
    }

    fn reload(&mut self) -> Option<PieceId> {
        let colors = self.grid.colors_present(&self.pool);
        self.shooter.reload(
            &mut self.pool,
            &mut self.rng,
            &colors,
            self.config.shot.grid_color_bias,
            self.config.spawn_point(),
        )
    }

    fn descend(&mut self, dt: f32, report: &mut TickReport) {
        let active_rows = self.grid.active_rows();
        let step = self.descent.advance(
            &self.config.descent,
            &mut self.grid.layout,
            active_rows,
            dt,
        );
        for piece in self.pool.iter_mut().filter(|p| p.is_settled()) {
            piece.position.y -= step;
        }
        report.descended = step;

        while self.descent.row_due(&self.grid.layout) {
            let row = self
                .spawner
                .spawn_top_row(&mut self.grid, &mut self.pool, &mut self.rng);
            self.descent.rows_spawned += 1;
            report.rows_spawned.push(row);
        }
    }

    fn advance_falls(&mut self, dt: f32, report: &mut TickReport) {
        let fall = &self.config.fall;
        let lift_step = fall.lift_height / fall.lift_ticks.max(1) as f32;

        for piece in self.pool.iter_mut().filter(|p| p.is_falling()) {
            piece.step_fall(lift_step, fall.drop_speed, fall.gravity, dt);
        }

        let exited: Vec<PieceId> = self
            .pool
            .iter()
            .filter(|p| p.is_falling() && p.position.y < fall.despawn_height)
            .map(|p| p.id())
            .collect();

        for id in exited {
            self.pool.release(id);
            self.score.credit_exit(fall.points_per_piece);
            report.recycled.push(id);
        }
    }

    fn below_danger_line(&self) -> bool {
        let Some(line) = self.config.danger_line_y else {
            return false;
        };
        self.pool
            .iter()
            .any(|p| p.is_settled() && p.position.y < line)
    }

    fn end(&mut self, reason: &str) {
        self.phase = SessionPhase::Over;
        info!("Game over: {} (score {})", reason, self.score.score);
    }

    /// Whether `id` is the shooter's fired piece. The loaded piece is airborne
    /// too but has not left the shooter yet.
    fn is_launched(&self, id: PieceId) -> bool {
        self.shooter.in_flight() == Some(id) && self.pool.get(id).is_some_and(|p| p.is_airborne())
    }

    fn place(&mut self, moving: PieceId, hit: PieceId, point: Vec3) -> ContactOutcome {
        if !self.is_launched(moving) {
            warn!("Ignoring contact of {} which is not in flight", moving);
            return ContactOutcome::Ignored;
        }

        let Some(coord) = placement::best_empty_slot(&self.grid, &self.pool, point, hit) else {
            warn!("Ignoring contact of {} with unsettled piece {}", moving, hit);
            return ContactOutcome::Ignored;
        };

        let position = self.grid.to_world_relative_to_occupied(coord, &self.pool);
        let Some(piece) = self.pool.get_mut(moving) else {
            return ContactOutcome::Ignored;
        };
        piece.stop();
        piece.position = position;
        if !self.grid.insert(coord, piece) {
            warn!("Slot {} for {} was taken", coord, moving);
            return ContactOutcome::Ignored;
        }
        debug!("Placed {} at {}", moving, coord);

        let mut placement = Placement {
            piece: moving,
            coord,
            popped: Vec::new(),
            dropped: Vec::new(),
        };

        let cluster = cluster::same_color_cluster(&self.grid, &self.pool, coord);
        if cluster.len() >= MIN_CLUSTER_SIZE {
            let coords: Vec<HexCoord> = cluster
                .iter()
                .filter_map(|&id| self.pool.get(id)?.coord())
                .collect();
            placement.popped = coords.into_iter().filter_map(|c| self.detach(c)).collect();

            placement.dropped = cluster::orphan_set(&self.grid)
                .into_iter()
                .filter_map(|c| self.detach(c))
                .collect();

            self.score.record_pop(placement.dropped.len());
            info!(
                "Popped {} pieces, {} orphans dropped",
                placement.popped.len(),
                placement.dropped.len()
            );
        }

        if self.shooter.in_flight() == Some(moving) {
            self.shooter
                .landed(!placement.popped.is_empty(), self.config.shot.settle_ticks);
        }

        ContactOutcome::Placed(placement)
    }

    /// Take the piece at `coord` off the grid and start its fall.
    fn detach(&mut self, coord: HexCoord) -> Option<PieceId> {
        let id = self.grid.remove(coord)?;
        self.pool
            .get_mut(id)?
            .start_falling(self.config.fall.lift_ticks);
        Some(id)
    }

    fn bounce(&mut self, moving: PieceId, normal: Vec3) -> ContactOutcome {
        if !self.is_launched(moving) {
            warn!("Ignoring surface contact of {} which is not in flight", moving);
            return ContactOutcome::Ignored;
        }

        let shot = &self.config.shot;
        let Some(piece) = self.pool.get_mut(moving) else {
            return ContactOutcome::Ignored;
        };
        piece.velocity = trajectory::bounce_velocity(
            piece.velocity,
            normal,
            shot.speed,
            shot.bounce_restitution,
        );
        ContactOutcome::Bounced {
            piece: moving,
            velocity: piece.velocity,
        }
    }

    fn fail(&mut self, piece: PieceId) -> ContactOutcome {
        if !self.is_launched(piece) {
            debug!("Ignoring fail boundary contact of {}", piece);
            return ContactOutcome::Ignored;
        }

        self.end("a piece reached the fail boundary");
        ContactOutcome::GameOver
    }
}
