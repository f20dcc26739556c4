//! Piece pool - create-or-recycle storage for every piece in the session.
//!
//! Pieces are addressed by [`PieceId`]. Released pieces are parked and handed
//! out again before any new piece is created.

use bevy::prelude::*;

use super::piece::{Piece, PieceId, PieceState};

/// Owns every piece that has ever been created in a session.
#[derive(Debug, Default)]
pub struct PiecePool {
    pieces: Vec<Piece>,
    /// Where pooled pieces are parked.
    park: Vec3,
}

impl PiecePool {
    pub fn new(park: Vec3) -> Self {
        Self {
            pieces: Vec::new(),
            park,
        }
    }

    /// Get a piece, recycling the first available one or creating a new one.
    ///
    /// The returned piece is still `Pooled`, so it counts as available until
    /// the caller draws it. Draw it before the next `acquire`, otherwise the
    /// same id is handed out again.
    pub fn acquire(&mut self) -> PieceId {
        if let Some(piece) = self
            .pieces
            .iter()
            .find(|p| p.state() == PieceState::Pooled)
        {
            return piece.id();
        }

        let id = PieceId(self.pieces.len() as u32);
        let mut piece = Piece::new(id);
        piece.position = self.park;
        self.pieces.push(piece);
        debug!("Pool grew to {} pieces", self.pieces.len());
        id
    }

    /// Return a piece to availability.
    ///
    /// The caller must already have detached it from the grid.
    pub fn release(&mut self, id: PieceId) {
        let park = self.park;
        if let Some(piece) = self.pieces.get_mut(id.index()) {
            piece.recycle(park);
        }
    }

    /// Return every piece to the pool (new game).
    pub fn release_all(&mut self) {
        let park = self.park;
        for piece in &mut self.pieces {
            piece.recycle(park);
        }
    }

    pub fn get(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id.index())
    }

    pub fn get_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.get_mut(id.index())
    }

    /// Total number of pieces ever created.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Number of pieces currently waiting in the pool.
    pub fn available(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| p.state() == PieceState::Pooled)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Piece> {
        self.pieces.iter_mut()
    }
}
