use crate::grid::Grid;

/// Watches one designated row; any live occupant there means game over.
/// Only sets a flag: ending the game is the driver's job.
#[derive(Clone, Debug)]
pub struct GameOverDetector {
    top_row: usize,
    flag: bool,
}

impl GameOverDetector {
    pub fn new(top_row: usize) -> Self {
        Self {
            top_row,
            flag: false,
        }
    }

    pub fn top_row(&self) -> usize {
        self.top_row
    }

    pub fn recompute(&mut self, grid: &Grid) -> bool {
        let y = self.top_row as i32;
        self.flag = (0..grid.width() as i32).any(|x| grid.in_bounds(x, y) && grid.is_occupied(x, y));
        self.flag
    }

    pub fn is_game_over(&self) -> bool {
        self.flag
    }

    pub fn reset(&mut self) {
        self.flag = false;
    }
}
