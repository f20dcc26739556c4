//! Cluster detection - finding matching pieces and pieces that lost support.
//!
//! Uses flood fill (BFS) over settled cells only. Pieces that are airborne or
//! falling are not in the grid and therefore invisible here.

use std::collections::{HashSet, VecDeque};

use super::{grid::HexGrid, hex::HexCoord, piece::PieceId, pool::PiecePool};

/// Minimum cluster size to pop (match-3).
pub const MIN_CLUSTER_SIZE: usize = 3;

/// Number of rows, starting at the topmost spawned row, that count as held by the ceiling.
pub const ANCHOR_BAND_ROWS: i32 = 3;

/// Find all connected pieces of the same color as the piece at `seed` (BFS).
///
/// Returns an empty cluster when `seed` is not occupied. The seed piece is
/// always the first element otherwise.
pub fn same_color_cluster(grid: &HexGrid, pool: &PiecePool, seed: HexCoord) -> Vec<PieceId> {
    let mut cluster = Vec::new();

    let Some(target_color) = grid.get(seed).and_then(|id| pool.get(id)).map(|p| p.color) else {
        return cluster;
    };

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(seed);
    queue.push_back(seed);

    while let Some(coord) = queue.pop_front() {
        let Some(id) = grid.get(coord) else {
            continue;
        };
        let Some(piece) = pool.get(id) else {
            continue;
        };
        if piece.color != target_color {
            continue;
        }

        cluster.push(id);

        for neighbor in coord.neighbors() {
            if visited.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }

    cluster
}

/// Find every occupied coordinate no longer connected to the anchor band.
///
/// The anchor band is the topmost spawned row plus the two rows below it.
/// Anything not reachable from an occupied anchor-band cell through occupied
/// cells (of any color) has lost support and must fall.
pub fn orphan_set(grid: &HexGrid) -> Vec<HexCoord> {
    if grid.is_empty() {
        return Vec::new();
    }

    let anchored = find_anchored(grid);

    let mut orphans: Vec<HexCoord> = grid.coords().filter(|c| !anchored.contains(c)).collect();
    // HashMap order is arbitrary; keep results reproducible.
    orphans.sort_by_key(|c| (c.r, c.q));
    orphans
}

/// All occupied coordinates reachable from the anchor band.
fn find_anchored(grid: &HexGrid) -> HashSet<HexCoord> {
    let top = grid.top_row();
    let band = top..top + ANCHOR_BAND_ROWS;

    let mut anchored = HashSet::new();
    let mut queue = VecDeque::new();

    for coord in grid.coords().filter(|c| band.contains(&c.r)) {
        anchored.insert(coord);
        queue.push_back(coord);
    }

    while let Some(coord) = queue.pop_front() {
        for neighbor in coord.neighbors() {
            if grid.is_occupied(neighbor) && anchored.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }

    anchored
}
