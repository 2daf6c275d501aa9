//! The active falling piece and its `Falling -> Landed -> Locked` state
//! machine. The piece never lives in grid storage until it locks, so it can
//! never block its own moves.

use std::time::Duration;

use log::warn;

use crate::grid::{Cell, Grid, OccupantId};
use crate::shapes::{ShapeKind, ROTATIONS};

// Tried in order after a blocked rotation.
const WALL_KICKS: [(i32, i32); 5] = [(1, 0), (-1, 0), (0, 1), (2, 0), (-2, 0)];

// ============================================================================
// Collision Query
// ============================================================================

/// Answers whether a cell is unavailable to the active piece.
pub trait CollisionQuery {
    fn is_blocked(&self, x: i32, y: i32) -> bool;
}

impl CollisionQuery for Grid {
    fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.is_occupied(x, y)
    }
}

pub fn is_valid_position(piece: &Tetromino, grid: &impl CollisionQuery) -> bool {
    piece.cells().iter().all(|c| !grid.is_blocked(c.x, c.y))
}

// ============================================================================
// Tetromino
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tetromino {
    pub kind: ShapeKind,
    pub anchor: Cell,
    pub rotation: usize,
}

impl Tetromino {
    pub fn new_at(kind: ShapeKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            anchor: Cell::new(x, y),
            rotation: 0,
        }
    }

    /// Horizontally centred with its highest cell on the top grid row.
    pub fn spawn(kind: ShapeKind, width: usize, height: usize) -> Self {
        let x = (width as i32 - kind.width(0)) / 2;
        let y = height as i32 - kind.height(0);
        Self::new_at(kind, x, y)
    }

    pub fn cells(&self) -> [Cell; 4] {
        self.kind
            .offsets(self.rotation)
            .map(|offset| self.anchor.offset(offset.x, offset.y))
    }

    pub fn moved(&self, dx: i32, dy: i32) -> Self {
        Self {
            anchor: self.anchor.offset(dx, dy),
            ..*self
        }
    }

    pub fn rotated(&self, rotation: Rotation) -> Self {
        let rotation = match rotation {
            Rotation::Clockwise => (self.rotation + 1) % ROTATIONS,
            Rotation::CounterClockwise => (self.rotation + ROTATIONS - 1) % ROTATIONS,
        };
        Self { rotation, ..*self }
    }
}

// ============================================================================
// Piece Controller
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PieceState {
    Falling,
    /// Resting on something; the lock-delay countdown is running.
    Landed,
    Locked,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PieceTiming {
    pub fall_interval: Duration,
    pub lock_delay: Duration,
    pub soft_drop_factor: u32,
}

/// What a locked piece left behind in the grid.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LockedPiece {
    pub kind: ShapeKind,
    pub anchor: Cell,
    pub occupants: Vec<OccupantId>,
    pub rows: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct PieceController {
    piece: Tetromino,
    state: PieceState,
    fall_timer: Duration,
    lock_timer: Duration,
    soft_drop: bool,
}

impl PieceController {
    pub fn new(piece: Tetromino) -> Self {
        Self {
            piece,
            state: PieceState::Falling,
            fall_timer: Duration::ZERO,
            lock_timer: Duration::ZERO,
            soft_drop: false,
        }
    }

    pub fn piece(&self) -> &Tetromino {
        &self.piece
    }

    pub fn state(&self) -> PieceState {
        self.state
    }

    pub fn lock_timer(&self) -> Duration {
        self.lock_timer
    }

    pub fn set_soft_drop(&mut self, held: bool) {
        self.soft_drop = held;
    }

    pub fn can_fall(&self, grid: &impl CollisionQuery) -> bool {
        is_valid_position(&self.piece.moved(0, -1), grid)
    }

    /// Advances timers by `dt` and returns the resulting state.
    pub fn tick(&mut self, dt: Duration, timing: PieceTiming, grid: &impl CollisionQuery) -> PieceState {
        match self.state {
            PieceState::Locked => {}
            PieceState::Falling => {
                let interval = if self.soft_drop {
                    timing.fall_interval / timing.soft_drop_factor.max(1)
                } else {
                    timing.fall_interval
                };
                self.fall_timer += dt;
                if self.fall_timer >= interval {
                    self.fall_timer = Duration::ZERO;
                    let below = self.piece.moved(0, -1);
                    if is_valid_position(&below, grid) {
                        self.piece = below;
                        self.lock_timer = Duration::ZERO;
                    } else {
                        self.state = PieceState::Landed;
                    }
                }
            }
            PieceState::Landed => {
                if self.can_fall(grid) {
                    self.state = PieceState::Falling;
                    self.lock_timer = Duration::ZERO;
                } else {
                    self.lock_timer += dt;
                    if self.lock_timer >= timing.lock_delay {
                        self.state = PieceState::Locked;
                    }
                }
            }
        }
        self.state
    }

    pub fn try_move(&mut self, dx: i32, dy: i32, grid: &impl CollisionQuery) -> bool {
        let candidate = self.piece.moved(dx, dy);
        self.commit(candidate, grid)
    }

    pub fn try_rotate(&mut self, rotation: Rotation, grid: &impl CollisionQuery) -> bool {
        let rotated = self.piece.rotated(rotation);
        if self.commit(rotated, grid) {
            return true;
        }
        WALL_KICKS
            .iter()
            .any(|&(dx, dy)| self.commit(rotated.moved(dx, dy), grid))
    }

    fn commit(&mut self, candidate: Tetromino, grid: &impl CollisionQuery) -> bool {
        if self.state == PieceState::Locked || !is_valid_position(&candidate, grid) {
            return false;
        }
        self.piece = candidate;
        self.lock_timer = Duration::ZERO;
        if self.state == PieceState::Landed && self.can_fall(grid) {
            self.state = PieceState::Falling;
        }
        true
    }

    /// Drops until blocked and locks without waiting for the lock delay.
    /// Returns how many rows the piece fell.
    pub fn hard_drop(&mut self, grid: &impl CollisionQuery) -> u32 {
        if self.state == PieceState::Locked {
            return 0;
        }
        let mut rows = 0;
        while self.can_fall(grid) {
            self.piece = self.piece.moved(0, -1);
            rows += 1;
        }
        self.state = PieceState::Locked;
        rows
    }

    /// Writes the piece's cells into `grid` as occupants and consumes the
    /// controller.
    pub fn lock(self, grid: &mut Grid) -> LockedPiece {
        let mut occupants = Vec::with_capacity(4);
        let mut rows = Vec::new();
        for cell in self.piece.cells() {
            if !grid.in_bounds(cell.x, cell.y) {
                warn!(
                    "{:?} locked with a cell outside the grid at ({}, {})",
                    self.piece.kind, cell.x, cell.y
                );
                continue;
            }
            let id = grid.spawn_occupant(self.piece.kind);
            grid.place(cell.x, cell.y, id);
            occupants.push(id);
            let row = cell.y as usize;
            if !rows.contains(&row) {
                rows.push(row);
            }
        }
        rows.sort_unstable();
        LockedPiece {
            kind: self.piece.kind,
            anchor: self.piece.anchor,
            occupants,
            rows,
        }
    }
}
