//! Owns the grid together with the systems that mutate it, so a reset always
//! takes the line-clear cycle and the game-over flag down with the blocks.

use crate::config::EngineConfig;
use crate::game_over::GameOverDetector;
use crate::grid::Grid;
use crate::line_clear::{ClearedLines, LineCheck, LineClearEngine};
use crate::piece::{LockedPiece, PieceController};

pub struct Playfield {
    grid: Grid,
    line_clear: LineClearEngine,
    detector: GameOverDetector,
}

impl Playfield {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            grid: Grid::from_config(config),
            line_clear: LineClearEngine::new(),
            detector: GameOverDetector::new(config.top_row()),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct grid access for setting up positions.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn is_grid_moving(&self) -> bool {
        self.line_clear.is_grid_moving()
    }

    pub fn is_game_over(&self) -> bool {
        self.detector.is_game_over()
    }

    /// Commits `piece` into the grid and recomputes the game-over flag.
    pub fn lock_piece(&mut self, piece: PieceController) -> LockedPiece {
        let locked = piece.lock(&mut self.grid);
        self.detector.recompute(&self.grid);
        locked
    }

    /// Runs the line-clear phase of a tick. A cycle marked on an earlier
    /// tick is committed first; then, if `check` is set or a request was
    /// deferred, full rows are marked for the next tick. Recomputes the
    /// game-over flag afterwards.
    pub fn tick_line_clear(&mut self, check: bool) -> (Option<ClearedLines>, LineCheck) {
        let cleared = self.line_clear.commit(&mut self.grid);
        let retry = self.line_clear.take_retry();
        let marked = if check || retry {
            self.line_clear.request(&mut self.grid)
        } else {
            LineCheck::Empty
        };
        self.detector.recompute(&self.grid);
        (cleared, marked)
    }

    /// Marks full rows now. While the grid is moving this is a no-op that
    /// gets replayed on the next line-clear phase.
    pub fn check_lines(&mut self) -> LineCheck {
        self.line_clear.request(&mut self.grid)
    }

    pub fn marked_rows(&self) -> &[usize] {
        self.line_clear.marked_rows()
    }

    pub fn recompute_game_over(&mut self) -> bool {
        self.detector.recompute(&self.grid)
    }

    pub fn reset(&mut self) {
        self.line_clear.cancel();
        self.grid.reset();
        self.detector.reset();
    }
}
