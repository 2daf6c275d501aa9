use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::shapes::ShapeKind;

pub trait PieceProvider {
    fn next_piece(&mut self) -> ShapeKind;
}

pub struct RandomPieceProvider {
    rng: StdRng,
}

impl RandomPieceProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self) -> ShapeKind {
        ShapeKind::ALL[self.rng.gen_range(0..ShapeKind::ALL.len())]
    }
}

/// Cycles through a fixed list. An empty list yields `O` pieces.
pub struct SequencePieceProvider {
    pieces: Vec<ShapeKind>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<ShapeKind>) -> Self {
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> ShapeKind {
        if self.pieces.is_empty() {
            return ShapeKind::O;
        }
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}
