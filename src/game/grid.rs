//! The hexagonal grid that holds all settled pieces.
//!
//! Uses a HashMap for sparse storage - only occupied cells are stored.
//! The lattice is unbounded, so rows spawned above the initial grid simply
//! get negative row indices.

use bevy::prelude::*;
use std::collections::HashMap;

use super::{
    hex::{HexCoord, HexLayout},
    piece::{Piece, PieceColor, PieceId, PieceState},
    pool::PiecePool,
};

/// Coordinate -> piece mapping plus the layout used to place pieces in the world.
#[derive(Debug, Default)]
pub struct HexGrid {
    /// Map from hex coordinates to settled pieces.
    cells: HashMap<HexCoord, PieceId>,

    /// Smallest (closest to the ceiling) row that has been spawned.
    top_row: i32,

    pub layout: HexLayout,
}

impl HexGrid {
    pub fn new(layout: HexLayout) -> Self {
        Self {
            cells: HashMap::new(),
            top_row: 0,
            layout,
        }
    }

    /// Check if a cell is occupied.
    pub fn is_occupied(&self, coord: HexCoord) -> bool {
        self.cells.contains_key(&coord)
    }

    /// Get the piece at a position, if any.
    pub fn get(&self, coord: HexCoord) -> Option<PieceId> {
        self.cells.get(&coord).copied()
    }

    /// Settle a piece at a position.
    ///
    /// Does nothing and returns `false` if the cell is already occupied, so a
    /// duplicate collision report can never overwrite a resident piece.
    pub fn insert(&mut self, coord: HexCoord, piece: &mut Piece) -> bool {
        if self.is_occupied(coord) {
            debug!("Ignoring insert of {} at occupied cell {}", piece.id(), coord);
            return false;
        }

        self.cells.insert(coord, piece.id());
        piece.coord = Some(coord);
        piece.state = PieceState::Settled;
        true
    }

    /// Remove a piece from a position.
    ///
    /// Leaves the piece's lifecycle alone; the caller decides what happens next.
    pub fn remove(&mut self, coord: HexCoord) -> Option<PieceId> {
        self.cells.remove(&coord)
    }

    /// Clear all pieces from the grid and reset the top row.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.top_row = 0;
        self.layout.descent_offset = 0.0;
    }

    /// Get the number of pieces in the grid.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all occupied cells.
    pub fn iter(&self) -> impl Iterator<Item = (&HexCoord, &PieceId)> {
        self.cells.iter()
    }

    /// Get all occupied coordinates.
    pub fn coords(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.cells.keys().copied()
    }

    /// The topmost spawned row.
    pub fn top_row(&self) -> i32 {
        self.top_row
    }

    pub fn set_top_row(&mut self, row: i32) {
        self.top_row = row;
    }

    /// Smallest and largest populated row, or `None` for an empty grid.
    pub fn row_span(&self) -> Option<(i32, i32)> {
        let min = self.cells.keys().map(|c| c.r).min()?;
        let max = self.cells.keys().map(|c| c.r).max()?;
        Some((min, max))
    }

    /// Number of rows between the highest and lowest populated row, inclusive.
    pub fn active_rows(&self) -> u32 {
        self.row_span()
            .map(|(min, max)| (max - min + 1) as u32)
            .unwrap_or(0)
    }

    /// The distinct colors of all settled pieces, in a stable order.
    pub fn colors_present(&self, pool: &PiecePool) -> Vec<PieceColor> {
        PieceColor::ALL
            .into_iter()
            .filter(|color| {
                self.cells
                    .values()
                    .filter_map(|&id| pool.get(id))
                    .any(|p| p.color == *color)
            })
            .collect()
    }

    /// World position of a coordinate from spacing alone.
    pub fn to_world(&self, coord: HexCoord) -> Vec3 {
        self.layout.to_world(coord)
    }

    /// World position of a coordinate measured from a settled neighbor.
    ///
    /// Anchoring on an actual piece avoids drift between the global spacing
    /// math and where pieces really are. Falls back to [`HexGrid::to_world`]
    /// when no neighbor is settled.
    pub fn to_world_relative_to_occupied(&self, coord: HexCoord, pool: &PiecePool) -> Vec3 {
        for neighbor in coord.neighbors() {
            let Some(piece) = self.get(neighbor).and_then(|id| pool.get(id)) else {
                continue;
            };
            return self.layout.relative_world(piece.position, neighbor, coord);
        }

        self.to_world(coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(grid: &mut HexGrid, pool: &mut PiecePool, coord: HexCoord) -> PieceId {
        let id = pool.acquire();
        let position = grid.to_world(coord);
        let piece = pool.get_mut(id).unwrap();
        piece.draw(PieceColor::Red, position);
        assert!(grid.insert(coord, piece));
        id
    }

    #[test]
    fn test_insert_settles_piece() {
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let id = settle(&mut grid, &mut pool, HexCoord::new(1, 1));

        let piece = pool.get(id).unwrap();
        assert!(piece.is_settled());
        assert_eq!(piece.coord(), Some(HexCoord::new(1, 1)));
        assert_eq!(grid.get(HexCoord::new(1, 1)), Some(id));
    }

    #[test]
    fn test_insert_on_occupied_cell_is_a_noop() {
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let first = settle(&mut grid, &mut pool, HexCoord::new(0, 0));

        let second = pool.acquire();
        let piece = pool.get_mut(second).unwrap();
        piece.draw(PieceColor::Blue, Vec3::ZERO);
        assert!(!grid.insert(HexCoord::new(0, 0), piece));

        assert_eq!(grid.get(HexCoord::new(0, 0)), Some(first));
        assert!(pool.get(second).unwrap().is_airborne());
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_remove_keeps_lifecycle() {
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let id = settle(&mut grid, &mut pool, HexCoord::new(0, 0));

        assert_eq!(grid.remove(HexCoord::new(0, 0)), Some(id));
        assert_eq!(grid.remove(HexCoord::new(0, 0)), None);
        assert!(pool.get(id).unwrap().is_settled());
    }

    #[test]
    fn test_relative_position_follows_drifted_neighbor() {
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let id = settle(&mut grid, &mut pool, HexCoord::new(2, 4));
        // Nudge the resident piece; the relative position must follow it.
        pool.get_mut(id).unwrap().position += Vec3::new(0.1, 0.0, 0.0);

        let expected = grid.to_world(HexCoord::new(2, 3)) + Vec3::new(0.1, 0.0, 0.0);
        let actual = grid.to_world_relative_to_occupied(HexCoord::new(2, 3), &pool);
        assert!(actual.distance(expected) < 1e-5);

        // Nothing settled around (10, 10): falls back to global layout.
        let far = grid.to_world_relative_to_occupied(HexCoord::new(10, 10), &pool);
        assert_eq!(far, grid.to_world(HexCoord::new(10, 10)));
    }

    #[test]
    fn test_row_span_and_colors() {
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        assert_eq!(grid.row_span(), None);
        assert_eq!(grid.active_rows(), 0);

        settle(&mut grid, &mut pool, HexCoord::new(0, -1));
        settle(&mut grid, &mut pool, HexCoord::new(0, 3));
        assert_eq!(grid.row_span(), Some((-1, 3)));
        assert_eq!(grid.active_rows(), 5);
        assert_eq!(grid.colors_present(&pool), vec![PieceColor::Red]);
    }
}
