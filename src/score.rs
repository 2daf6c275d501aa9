// Scoring
pub const SCORE_SINGLE: u32 = 100;
pub const SCORE_DOUBLE: u32 = 300;
pub const SCORE_TRIPLE: u32 = 500;
pub const SCORE_TETRIS: u32 = 800;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scoreboard {
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    lines_per_level: u32,
}

impl Scoreboard {
    pub fn new(lines_per_level: u32) -> Self {
        Self {
            score: 0,
            lines: 0,
            level: 1,
            lines_per_level: lines_per_level.max(1),
        }
    }

    /// Adds a clear of `count` lines. Returns the new level on level-up.
    pub fn record_clear(&mut self, count: u32) -> Option<u32> {
        let base = match count {
            0 => 0,
            1 => SCORE_SINGLE,
            2 => SCORE_DOUBLE,
            3 => SCORE_TRIPLE,
            _ => SCORE_TETRIS,
        };
        self.score = self.score.saturating_add(base.saturating_mul(self.level));
        self.lines += count;

        let level = self.lines / self.lines_per_level + 1;
        if level > self.level {
            self.level = level;
            Some(level)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.lines_per_level);
    }
}
