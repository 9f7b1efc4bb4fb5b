//! Piece spawner: uniform random kinds and the next-piece queue.

use super::piece::{ActivePiece, PieceKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Picks kinds uniformly at random (no bag) and places them at the spawn point.
#[derive(Debug, Clone)]
pub struct Spawner {
    rng: StdRng,
    spawn_x: i32,
}

impl Spawner {
    /// Seeded spawner; the same seed yields the same sequence.
    pub fn from_seed(board_width: usize, seed: u64) -> Self {
        Self::with_rng(board_width, StdRng::seed_from_u64(seed))
    }

    /// Spawner seeded from the operating system.
    pub fn from_os_rng(board_width: usize) -> Self {
        Self::with_rng(board_width, StdRng::from_os_rng())
    }

    fn with_rng(board_width: usize, rng: StdRng) -> Self {
        Self {
            rng,
            spawn_x: spawn_column(board_width),
        }
    }

    /// Spawn point for this board: `(width / 2 - 1, 0)`.
    pub fn spawn_point(&self) -> (i32, i32) {
        (self.spawn_x, 0)
    }

    pub fn generate(&mut self) -> ActivePiece {
        let kind = PieceKind::ALL[self.rng.random_range(0..PieceKind::ALL.len())];
        ActivePiece::new(kind, self.spawn_x, 0)
    }

    /// Append fresh pieces until `queue` holds `length` entries.
    pub fn refill(&mut self, queue: &mut VecDeque<ActivePiece>, length: usize) {
        while queue.len() < length {
            queue.push_back(self.generate());
        }
    }
}

/// Spawn column for a board of `width` columns (truncating division).
pub fn spawn_column(width: usize) -> i32 {
    width as i32 / 2 - 1
}
