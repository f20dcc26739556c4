//! Trajectory projection - the bouncing aim line and in-flight wall bounces.
//!
//! The projector never intersects geometry itself. The collision layer hands
//! it a [`RayCaster`] and it only does the reflection bookkeeping.

use bevy::prelude::*;

/// Where a ray met a reflective surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
}

/// Ray-surface intersection oracle supplied by the collision layer.
pub trait RayCaster {
    /// Nearest hit along `direction` from `origin` within `max_distance`, if any.
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

impl<F> RayCaster for F
where
    F: Fn(Vec3, Vec3, f32) -> Option<RayHit>,
{
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        self(origin, direction, max_distance)
    }
}

/// Limits for a projected path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryConfig {
    /// Total path length budget.
    pub max_length: f32,
    /// Maximum number of reflections.
    pub max_bounces: u32,
    /// Hit points are pulled back this far along the incoming ray.
    pub bounce_padding: f32,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            max_length: 30.0,
            max_bounces: 3,
            bounce_padding: 0.01,
        }
    }
}

/// A projected polyline. The first point is the launch position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub points: Vec<Vec3>,
}

impl Trajectory {
    /// Number of reflections along the path.
    pub fn bounces(&self) -> usize {
        self.points.len().saturating_sub(2)
    }

    /// Sum of all segment lengths.
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Direction of segment `index`, or `None` if it does not exist or is degenerate.
    pub fn segment_direction(&self, index: usize) -> Option<Vec3> {
        let from = self.points.get(index)?;
        let to = self.points.get(index + 1)?;
        (*to - *from).try_normalize()
    }

    pub fn end(&self) -> Option<Vec3> {
        self.points.last().copied()
    }
}

/// Reflect `direction` about the surface normal: `d - 2(d·n)n` with `n` normalized.
pub fn reflect(direction: Vec3, normal: Vec3) -> Vec3 {
    let n = normal.normalize_or_zero();
    direction - 2.0 * direction.dot(n) * n
}

/// New velocity of an in-flight piece after touching a wall.
///
/// The reflected direction keeps the launch speed scaled by `restitution`.
pub fn bounce_velocity(direction: Vec3, normal: Vec3, speed: f32, restitution: f32) -> Vec3 {
    reflect(direction.normalize_or_zero(), normal).normalize_or_zero() * speed * restitution
}

/// Project a multi-bounce path from `start` along `direction`.
///
/// Terminates on a miss, when the bounce limit is reached, or when the length
/// budget is spent; in every case the path ends with the remaining budget
/// travelled along the current direction.
pub fn project(
    start: Vec3,
    direction: Vec3,
    config: &TrajectoryConfig,
    caster: &impl RayCaster,
) -> Trajectory {
    let mut points = vec![start];
    let mut current_pos = start;
    let mut current_dir = direction.normalize_or_zero();
    let mut remaining = config.max_length.max(0.0);

    if current_dir == Vec3::ZERO {
        points.push(start);
        return Trajectory { points };
    }

    let mut bounces = 0;
    while bounces < config.max_bounces && remaining > 0.0 {
        let Some(hit) = caster.cast(current_pos, current_dir, remaining) else {
            break;
        };

        let hit_point = hit.point - current_dir * config.bounce_padding;
        remaining -= current_pos.distance(hit_point);
        points.push(hit_point);

        current_dir = reflect(current_dir, hit.normal).normalize_or_zero();
        current_pos = hit_point;
        bounces += 1;
    }

    points.push(current_pos + current_dir * remaining.max(0.0));
    Trajectory { points }
}
