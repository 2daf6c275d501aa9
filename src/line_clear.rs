//! Full-row detection and removal.
//!
//! A clear runs in two phases a tick apart: [`LineClearEngine::request`]
//! marks every occupant in full rows for removal, then
//! [`LineClearEngine::commit`] destroys them and compacts the grid. Between
//! the two the grid is "moving" and further requests are deferred.

use log::debug;

use crate::grid::Grid;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LineCheck {
    /// A cycle is already in flight; the request will be retried after it.
    Busy,
    Empty,
    /// Ascending indices of the rows whose occupants were marked.
    Marked(Vec<usize>),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ClearedLines {
    pub rows: Vec<usize>,
    pub destroyed: usize,
}

impl ClearedLines {
    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Clone, Debug, Default)]
enum Phase {
    #[default]
    Idle,
    Marked(Vec<usize>),
}

#[derive(Debug, Default)]
pub struct LineClearEngine {
    phase: Phase,
    retry: bool,
}

impl LineClearEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_grid_moving(&self) -> bool {
        matches!(self.phase, Phase::Marked(_))
    }

    pub fn marked_rows(&self) -> &[usize] {
        match &self.phase {
            Phase::Marked(rows) => rows.as_slice(),
            Phase::Idle => &[],
        }
    }

    pub fn request(&mut self, grid: &mut Grid) -> LineCheck {
        if self.is_grid_moving() {
            self.retry = true;
            return LineCheck::Busy;
        }

        let rows = grid.full_rows();
        if rows.is_empty() {
            return LineCheck::Empty;
        }

        for &y in &rows {
            for x in 0..grid.width() as i32 {
                if let Some(id) = grid.occupant_at(x, y as i32).map(|o| o.id) {
                    grid.mark_for_removal(id);
                }
            }
        }
        debug!("marked rows {rows:?} for clearing");
        self.phase = Phase::Marked(rows.clone());
        LineCheck::Marked(rows)
    }

    /// Finishes a marked cycle. Returns `None` when nothing was marked.
    pub fn commit(&mut self, grid: &mut Grid) -> Option<ClearedLines> {
        let Phase::Marked(rows) = std::mem::take(&mut self.phase) else {
            return None;
        };
        let destroyed = grid.commit_removals();
        grid.compact(&rows);
        debug!("cleared rows {rows:?}, destroyed {destroyed} occupants");
        Some(ClearedLines { rows, destroyed })
    }

    /// Returns and resets whether a request was deferred while busy.
    pub fn take_retry(&mut self) -> bool {
        std::mem::take(&mut self.retry)
    }

    /// Abandons an in-flight cycle. The grid's pending set must be cleared by
    /// the caller (see [`Grid::reset`]).
    pub fn cancel(&mut self) {
        self.phase = Phase::Idle;
        self.retry = false;
    }
}
