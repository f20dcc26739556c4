//! Hexagonal coordinate system using staggered offset rows.
//!
//! Rows increase downward (the direction the grid descends). Even rows sit
//! half a cell to the left of odd rows, which is the classic bubble shooter
//! packing. Row parity decides which diagonal cells count as neighbors.

use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<HexCoord>();
    app.register_type::<HexLayout>();
}

/// Offset hex coordinate.
///
/// - q is the column (increases to the right)
/// - r is the row (increases downward, toward the shooter)
///
/// The lattice is unbounded; rows above the initial grid are negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct HexCoord {
    /// Column (x-axis)
    pub q: i32,
    /// Row (y-axis, downward)
    pub r: i32,
}

impl HexCoord {
    /// Create a new hex coordinate.
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Whether this coordinate sits on an even row (shifted half a cell left).
    #[inline]
    pub const fn is_even_row(&self) -> bool {
        self.r.rem_euclid(2) == 0
    }

    /// Get all 6 neighboring hex coordinates.
    ///
    /// The order is fixed: left, right, upper-left, upper-right, lower-left,
    /// lower-right. Placement tie-breaking relies on it.
    pub fn neighbors(&self) -> [HexCoord; 6] {
        let (x, y) = (self.q, self.r);

        if self.is_even_row() {
            [
                HexCoord::new(x - 1, y),
                HexCoord::new(x + 1, y),
                HexCoord::new(x - 1, y - 1),
                HexCoord::new(x, y - 1),
                HexCoord::new(x - 1, y + 1),
                HexCoord::new(x, y + 1),
            ]
        } else {
            // Odd row (shifted right)
            [
                HexCoord::new(x - 1, y),
                HexCoord::new(x + 1, y),
                HexCoord::new(x, y - 1),
                HexCoord::new(x + 1, y - 1),
                HexCoord::new(x, y + 1),
                HexCoord::new(x + 1, y + 1),
            ]
        }
    }

    /// Check if `other` is one of the six neighbors of this coordinate.
    pub fn is_adjacent(&self, other: HexCoord) -> bool {
        self.neighbors().contains(&other)
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

impl std::ops::Sub for HexCoord {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        HexCoord::new(self.q - other.q, self.r - other.r)
    }
}

/// World-space layout of the grid.
///
/// Converts coordinates to positions using fixed spacing. The descent offset
/// grows as the grid moves down, so the same coordinate maps to a lower
/// position over time while freshly spawned top rows land at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct HexLayout {
    /// Horizontal distance between cell centers in a row.
    pub horizontal_spacing: f32,
    /// Vertical distance between rows.
    pub vertical_spacing: f32,
    /// World position of cell (0, 0) before any descent, ignoring the even-row shift.
    pub origin: Vec3,
    /// How far the grid has moved down since the session started.
    pub descent_offset: f32,
}

impl Default for HexLayout {
    fn default() -> Self {
        Self {
            horizontal_spacing: 1.0,
            vertical_spacing: 0.9,
            origin: Vec3::ZERO,
            descent_offset: 0.0,
        }
    }
}

impl HexLayout {
    pub fn new(horizontal_spacing: f32, vertical_spacing: f32, origin: Vec3) -> Self {
        Self {
            horizontal_spacing,
            vertical_spacing,
            origin,
            descent_offset: 0.0,
        }
    }

    /// Horizontal shift applied to a row: even rows move half a cell left.
    #[inline]
    fn row_shift(&self, coord: HexCoord) -> f32 {
        if coord.is_even_row() {
            -self.horizontal_spacing / 2.0
        } else {
            0.0
        }
    }

    /// Convert a coordinate to its world position from spacing alone.
    ///
    /// Does not look at the grid contents, so it is what new, unconnected
    /// rows are spawned with.
    pub fn to_world(&self, coord: HexCoord) -> Vec3 {
        let x = coord.q as f32 * self.horizontal_spacing + self.row_shift(coord);
        let y = -(coord.r as f32) * self.vertical_spacing - self.descent_offset;
        self.origin + Vec3::new(x, y, 0.0)
    }

    /// Position of `target` measured from a piece known to sit at `reference_pos`.
    ///
    /// A half-cell correction is applied whenever the two rows differ in parity,
    /// matching the offsets encoded in [`HexCoord::neighbors`].
    pub fn relative_world(
        &self,
        reference_pos: Vec3,
        reference: HexCoord,
        target: HexCoord,
    ) -> Vec3 {
        let delta = target - reference;
        let mut x = delta.q as f32 * self.horizontal_spacing;
        let y = -(delta.r as f32) * self.vertical_spacing;

        match (reference.is_even_row(), target.is_even_row()) {
            (true, false) => x += self.horizontal_spacing / 2.0,
            (false, true) => x -= self.horizontal_spacing / 2.0,
            _ => {}
        }

        reference_pos + Vec3::new(x, y, 0.0)
    }
}
