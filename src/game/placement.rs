//! Placement - snapping a moving piece into the grid after it hits a resident.
//!
//! Candidates are the anchor's empty neighbors, measured from where the anchor
//! actually sits rather than from the global layout.

use bevy::prelude::*;
use std::collections::{HashSet, VecDeque};

use super::{grid::HexGrid, hex::HexCoord, piece::PieceId, pool::PiecePool};

/// Upper bound on cells visited by the outward search for a free slot.
const MAX_OUTWARD_SEARCH: usize = 4096;

/// Find the best empty slot next to `anchor` for a piece that hit it at `impact`.
///
/// Picks the free neighbor whose position relative to the anchor is closest to
/// the impact point; ties go to the first neighbor in [`HexCoord::neighbors`]
/// order. When the anchor is fully surrounded the search widens ring by ring
/// through occupied cells, so a shot is never lost to a full neighborhood.
///
/// Returns `None` only if `anchor` is not a settled piece.
pub fn best_empty_slot(
    grid: &HexGrid,
    pool: &PiecePool,
    impact: Vec3,
    anchor: PieceId,
) -> Option<HexCoord> {
    let anchor_piece = pool.get(anchor)?;
    let anchor_coord = anchor_piece.coord()?;
    if grid.get(anchor_coord) != Some(anchor) {
        return None;
    }

    let candidates: Vec<HexCoord> = anchor_coord
        .neighbors()
        .into_iter()
        .filter(|n| !grid.is_occupied(*n))
        .collect();

    if let Some(best) = closest_to(&candidates, impact, |c| {
        grid.layout
            .relative_world(anchor_piece.position, anchor_coord, c)
    }) {
        return Some(best);
    }

    debug!(
        "No free neighbor around {} at {}, searching outward",
        anchor, anchor_coord
    );
    outward_empty_slot(grid, pool, impact, anchor_coord)
}

/// Breadth-first ring search through occupied cells starting at `start`.
///
/// The first ring that contains free cells wins; inside it, the free cell
/// closest to `impact` is chosen.
fn outward_empty_slot(
    grid: &HexGrid,
    pool: &PiecePool,
    impact: Vec3,
    start: HexCoord,
) -> Option<HexCoord> {
    let mut visited = HashSet::from([start]);
    let mut ring = VecDeque::from([start]);

    while !ring.is_empty() && visited.len() < MAX_OUTWARD_SEARCH {
        let mut free = Vec::new();
        let mut next_ring = VecDeque::new();

        for coord in ring.drain(..) {
            for neighbor in coord.neighbors() {
                if !visited.insert(neighbor) {
                    continue;
                }
                if grid.is_occupied(neighbor) {
                    next_ring.push_back(neighbor);
                } else {
                    free.push(neighbor);
                }
            }
        }

        if let Some(best) = closest_to(&free, impact, |c| {
            grid.to_world_relative_to_occupied(c, pool)
        }) {
            return Some(best);
        }

        ring = next_ring;
    }

    warn!("Outward slot search from {} found nothing", start);
    None
}

/// First candidate with the strictly smallest distance to `target`.
fn closest_to(
    candidates: &[HexCoord],
    target: Vec3,
    position_of: impl Fn(HexCoord) -> Vec3,
) -> Option<HexCoord> {
    let mut best: Option<(HexCoord, f32)> = None;

    for &coord in candidates {
        let distance = target.distance(position_of(coord));
        if best.is_none_or(|(_, closest)| distance < closest) {
            best = Some((coord, distance));
        }
    }

    best.map(|(coord, _)| coord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::piece::PieceColor;

    fn settle(grid: &mut HexGrid, pool: &mut PiecePool, q: i32, r: i32) -> PieceId {
        let coord = HexCoord::new(q, r);
        let id = pool.acquire();
        let position = grid.to_world(coord);
        let piece = pool.get_mut(id).unwrap();
        piece.draw(PieceColor::Red, position);
        grid.insert(coord, piece);
        id
    }

    #[test]
    fn test_snaps_to_only_free_neighbor() {
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let anchor = settle(&mut grid, &mut pool, 2, 4);
        // Fill every neighbor of (2, 4) except (2, 3).
        for (q, r) in [(1, 4), (3, 4), (1, 3), (1, 5), (2, 5)] {
            settle(&mut grid, &mut pool, q, r);
        }

        let impact = grid.to_world(HexCoord::new(2, 3)) + Vec3::new(0.05, -0.05, 0.0);
        let slot = best_empty_slot(&grid, &pool, impact, anchor);
        assert_eq!(slot, Some(HexCoord::new(2, 3)));
    }

    #[test]
    fn test_picks_closest_neighbor() {
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let anchor = settle(&mut grid, &mut pool, 2, 2);

        // Coming from below-right of (2, 2).
        let impact = grid.to_world(HexCoord::new(2, 3)) + Vec3::new(0.1, 0.1, 0.0);
        assert_eq!(
            best_empty_slot(&grid, &pool, impact, anchor),
            Some(HexCoord::new(2, 3))
        );
    }

    #[test]
    fn test_tie_goes_to_first_neighbor() {
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let anchor = settle(&mut grid, &mut pool, 2, 2);

        // The anchor's own center is equally far from both horizontal neighbors.
        let impact = pool.get(anchor).unwrap().position;
        assert_eq!(
            best_empty_slot(&grid, &pool, impact, anchor),
            Some(HexCoord::new(1, 2))
        );
    }

    #[test]
    fn test_placement_is_deterministic() {
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let anchor = settle(&mut grid, &mut pool, 0, 0);
        settle(&mut grid, &mut pool, 1, 0);
        let impact = Vec3::new(0.3, -0.7, 0.0);

        let first = best_empty_slot(&grid, &pool, impact, anchor);
        for _ in 0..10 {
            assert_eq!(best_empty_slot(&grid, &pool, impact, anchor), first);
        }
    }

    #[test]
    fn test_surrounded_anchor_searches_outward() {
        let mut grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let anchor = settle(&mut grid, &mut pool, 2, 4);
        for n in HexCoord::new(2, 4).neighbors() {
            settle(&mut grid, &mut pool, n.q, n.r);
        }

        let impact = grid.to_world(HexCoord::new(2, 6));
        let slot = best_empty_slot(&grid, &pool, impact, anchor).unwrap();
        assert!(!grid.is_occupied(slot));
        assert_eq!(slot, HexCoord::new(2, 6));
    }

    #[test]
    fn test_unsettled_anchor_has_no_slot() {
        let grid = HexGrid::default();
        let mut pool = PiecePool::default();
        let id = pool.acquire();
        assert_eq!(best_empty_slot(&grid, &pool, Vec3::ZERO, id), None);
    }
}
