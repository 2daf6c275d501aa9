//! Tick-driven falling-block grid engine.
//!
//! The engine is headless: a driver calls [`session::Session::tick`] once per
//! frame and drains [`session::GameEvent`] notifications afterwards.

pub mod config;
pub mod game_over;
pub mod grid;
pub mod line_clear;
pub mod piece;
pub mod playfield;
pub mod provider;
pub mod score;
pub mod session;
pub mod shapes;

pub use config::{ConfigError, EngineConfig};
pub use grid::{Cell, Grid, Occupant, OccupantId, WorldPos};
pub use piece::{PieceController, PieceState, Rotation, Tetromino};
pub use session::{Command, GameEvent, Session, SessionState};
pub use shapes::ShapeKind;

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use crate::grid::{Grid, OccupantId};
    use crate::shapes::ShapeKind;

    /// Places a fresh `T` occupant at every `(x, y)` given.
    pub fn fill_cells(grid: &mut Grid, cells: &[(i32, i32)]) -> Vec<OccupantId> {
        cells
            .iter()
            .map(|&(x, y)| {
                let id = grid.spawn_occupant(ShapeKind::T);
                grid.place(x, y, id);
                id
            })
            .collect()
    }

    pub fn fill_row(grid: &mut Grid, y: i32) -> Vec<OccupantId> {
        let cells: Vec<_> = (0..grid.width() as i32).map(|x| (x, y)).collect();
        fill_cells(grid, &cells)
    }

    pub fn fill_row_with_gap(grid: &mut Grid, y: i32, gap_x: i32) -> Vec<OccupantId> {
        let cells: Vec<_> = (0..grid.width() as i32)
            .filter(|&x| x != gap_x)
            .map(|x| (x, y))
            .collect();
        fill_cells(grid, &cells)
    }
}
