//! Row spawning - filling the initial grid and each new top row.
//!
//! Even rows hold one more piece than odd rows so the staggered edges line up.

use bevy::prelude::*;
use rand::Rng;

use super::{
    config::ColorPolicy,
    grid::HexGrid,
    hex::HexCoord,
    piece::{PieceColor, PieceId},
    pool::PiecePool,
};

/// Spawns rows of pieces into a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSpawner {
    /// Pieces in an odd row.
    pub columns: u32,
    pub policy: ColorPolicy,
}

impl RowSpawner {
    pub fn new(columns: u32, policy: ColorPolicy) -> Self {
        Self { columns, policy }
    }

    /// Number of pieces a row gets.
    pub fn columns_in_row(&self, row: i32) -> u32 {
        if row.rem_euclid(2) == 0 {
            self.columns + 1
        } else {
            self.columns
        }
    }

    fn pick_color(&self, rng: &mut impl Rng, grid_colors: &[PieceColor]) -> PieceColor {
        match self.policy {
            ColorPolicy::Uniform => PieceColor::random(rng),
            ColorPolicy::WeightedTowardGrid { bias } => {
                PieceColor::random_weighted(rng, grid_colors, bias)
            }
        }
    }

    /// Fill `row` with pieces at their static layout positions.
    ///
    /// Colors come from the spawner's [`ColorPolicy`].
    pub fn spawn_row(
        &self,
        grid: &mut HexGrid,
        pool: &mut PiecePool,
        rng: &mut impl Rng,
        row: i32,
    ) -> Vec<PieceId> {
        let grid_colors = grid.colors_present(pool);
        let colors: Vec<PieceColor> = (0..self.columns_in_row(row))
            .map(|_| self.pick_color(rng, &grid_colors))
            .collect();
        spawn_colored(grid, pool, row, &colors)
    }

    /// Fill rows `0..rows` and mark row 0 as the top row.
    pub fn spawn_initial_grid(
        &self,
        grid: &mut HexGrid,
        pool: &mut PiecePool,
        rng: &mut impl Rng,
        rows: u32,
    ) -> usize {
        let mut count = 0;
        for r in 0..rows as i32 {
            count += self.spawn_row(grid, pool, rng, r).len();
        }
        grid.set_top_row(0);

        info!("Spawned {} initial pieces in {} rows", count, rows);
        count
    }

    /// Spawn a new row above the current top row and make it the top row.
    pub fn spawn_top_row(
        &self,
        grid: &mut HexGrid,
        pool: &mut PiecePool,
        rng: &mut impl Rng,
    ) -> i32 {
        let row = grid.top_row() - 1;
        let spawned = self.spawn_row(grid, pool, rng, row);
        grid.set_top_row(row);

        debug!("Spawned top row {} with {} pieces", row, spawned.len());
        row
    }
}

/// Place `colors[i]` at column `i` of `row`, each at its static layout position.
///
/// Cells that are already occupied are skipped; their drawn piece goes
/// straight back to the pool.
pub fn spawn_colored(
    grid: &mut HexGrid,
    pool: &mut PiecePool,
    row: i32,
    colors: &[PieceColor],
) -> Vec<PieceId> {
    let mut spawned = Vec::new();

    for (q, &color) in colors.iter().enumerate() {
        let coord = HexCoord::new(q as i32, row);
        let position = grid.to_world(coord);

        let id = pool.acquire();
        let Some(piece) = pool.get_mut(id) else {
            continue;
        };
        piece.draw(color, position);

        if grid.insert(coord, piece) {
            spawned.push(id);
        } else {
            pool.release(id);
        }
    }

    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_rows_alternate_width() {
        let spawner = RowSpawner::new(6, ColorPolicy::Uniform);
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let mut rng = StdRng::seed_from_u64(1);

        let count = spawner.spawn_initial_grid(&mut grid, &mut pool, &mut rng, 4);
        assert_eq!(count, 7 + 6 + 7 + 6);
        assert_eq!(grid.len(), count);
        assert_eq!(grid.top_row(), 0);
        assert!(grid.is_occupied(HexCoord::new(6, 0)));
        assert!(!grid.is_occupied(HexCoord::new(6, 1)));
    }

    #[test]
    fn test_top_row_goes_above() {
        let spawner = RowSpawner::new(3, ColorPolicy::Uniform);
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let mut rng = StdRng::seed_from_u64(2);

        spawner.spawn_initial_grid(&mut grid, &mut pool, &mut rng, 2);
        assert_eq!(spawner.spawn_top_row(&mut grid, &mut pool, &mut rng), -1);
        assert_eq!(spawner.spawn_top_row(&mut grid, &mut pool, &mut rng), -2);
        assert_eq!(grid.top_row(), -2);
        // Row -1 is odd (3 pieces), row -2 even (4 pieces).
        assert_eq!(grid.len(), 4 + 3 + 3 + 4);
    }

    #[test]
    fn test_occupied_cells_are_skipped() {
        let spawner = RowSpawner::new(2, ColorPolicy::Uniform);
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let mut rng = StdRng::seed_from_u64(3);

        spawner.spawn_row(&mut grid, &mut pool, &mut rng, 1);
        let again = spawner.spawn_row(&mut grid, &mut pool, &mut rng, 1);
        assert!(again.is_empty());
        assert_eq!(grid.len(), 2);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_spawn_colored_uses_given_colors() {
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let colors = [PieceColor::Blue, PieceColor::Red, PieceColor::Blue];

        let ids = spawn_colored(&mut grid, &mut pool, 5, &colors);
        assert_eq!(ids.len(), 3);
        for (q, color) in colors.iter().enumerate() {
            let id = grid.get(HexCoord::new(q as i32, 5)).unwrap();
            assert_eq!(pool.get(id).unwrap().color, *color);
        }
    }

    #[test]
    fn test_weighted_policy_matches_grid() {
        let spawner = RowSpawner::new(4, ColorPolicy::WeightedTowardGrid { bias: 1.0 });
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let mut rng = StdRng::seed_from_u64(4);

        let seed = pool.acquire();
        let piece = pool.get_mut(seed).unwrap();
        piece.draw(PieceColor::Yellow, Vec3::ZERO);
        grid.insert(HexCoord::new(0, 0), piece);

        for id in spawner.spawn_row(&mut grid, &mut pool, &mut rng, 1) {
            assert_eq!(pool.get(id).unwrap().color, PieceColor::Yellow);
        }
    }
}
