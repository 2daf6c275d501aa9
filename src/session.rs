//! The game-loop driver. Each [`Session::tick`] runs its phases in a fixed
//! order: queued input, piece controller, grid mutation, line clear,
//! game-over check, spawn.

use std::collections::VecDeque;
use std::time::Duration;

use log::{error, info};

use crate::config::{ConfigError, EngineConfig};
use crate::grid::Cell;
use crate::piece::{is_valid_position, PieceController, PieceState, PieceTiming, Rotation, Tetromino};
use crate::playfield::Playfield;
use crate::provider::{PieceProvider, RandomPieceProvider};
use crate::score::Scoreboard;
use crate::shapes::ShapeKind;

pub const PREVIEW_COUNT: usize = 3;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    MoveLeft,
    MoveRight,
    RotateClockwise,
    RotateCounterClockwise,
    /// Continuous signal: `true` while the soft-drop input is held.
    SoftDrop(bool),
    HardDrop,
    TogglePause,
    Restart,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    Playing,
    Paused,
    GameOver,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceSpawned(ShapeKind),
    PieceMoved,
    PieceRotated,
    PieceLocked { kind: ShapeKind, anchor: Cell },
    LinesCleared { count: usize, rows: Vec<usize> },
    GameOver(bool),
    LevelUp(u32),
    Paused,
    Unpaused,
    GameRestarted,
}

// ============================================================================
// Session
// ============================================================================

pub struct Session {
    config: EngineConfig,
    playfield: Playfield,
    active: Option<PieceController>,
    preview_queue: VecDeque<ShapeKind>,
    commands: VecDeque<Command>,
    soft_drop_held: bool,
    state: SessionState,
    scoreboard: Scoreboard,
    piece_provider: Box<dyn PieceProvider>,
    events: Vec<GameEvent>,
}

impl Session {
    pub fn new(config: EngineConfig, provider: Box<dyn PieceProvider>) -> Result<Self, ConfigError> {
        if let Err(err) = config.validate() {
            error!("refusing to start session: {err}");
            return Err(err);
        }

        let mut session = Self {
            playfield: Playfield::new(&config),
            scoreboard: Scoreboard::new(config.lines_per_level),
            config,
            active: None,
            preview_queue: VecDeque::new(),
            commands: VecDeque::new(),
            soft_drop_held: false,
            state: SessionState::Playing,
            piece_provider: provider,
            events: Vec::new(),
        };
        session.fill_preview();
        session.spawn_next_piece();
        Ok(session)
    }

    pub fn with_random_pieces(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::new(config, Box::new(RandomPieceProvider::new()))
    }

    fn fill_preview(&mut self) {
        while self.preview_queue.len() < PREVIEW_COUNT {
            self.preview_queue.push_back(self.piece_provider.next_piece());
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state == SessionState::GameOver
    }

    pub fn playfield(&self) -> &Playfield {
        &self.playfield
    }

    pub fn playfield_mut(&mut self) -> &mut Playfield {
        &mut self.playfield
    }

    pub fn active_piece(&self) -> Option<&PieceController> {
        self.active.as_ref()
    }

    /// Replaces the active piece, e.g. to set up a position.
    pub fn set_active_piece(&mut self, piece: Tetromino) {
        let mut controller = PieceController::new(piece);
        controller.set_soft_drop(self.soft_drop_held);
        self.active = Some(controller);
    }

    pub fn preview(&self) -> impl Iterator<Item = &ShapeKind> {
        self.preview_queue.iter()
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn queue(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn timing(&self) -> PieceTiming {
        PieceTiming {
            fall_interval: self.config.fall_interval(self.scoreboard.level),
            lock_delay: self.config.lock_delay(),
            soft_drop_factor: self.config.soft_drop_factor,
        }
    }

    // ------------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------------

    pub fn tick(&mut self, dt: Duration) {
        while let Some(command) = self.commands.pop_front() {
            self.apply(command);
        }
        if self.state != SessionState::Playing {
            return;
        }

        let timing = self.timing();
        let locking = match self.active.as_mut() {
            Some(active) => active.tick(dt, timing, self.playfield.grid()) == PieceState::Locked,
            None => false,
        };

        if locking {
            self.lock_active();
        }

        let (cleared, _) = self.playfield.tick_line_clear(locking);
        if let Some(cleared) = cleared {
            let count = cleared.count();
            if let Some(level) = self.scoreboard.record_clear(count as u32) {
                self.events.push(GameEvent::LevelUp(level));
            }
            self.events.push(GameEvent::LinesCleared {
                count,
                rows: cleared.rows,
            });
        }

        // A pending clear may still pull the top row down.
        if !self.playfield.is_grid_moving() && self.playfield.is_game_over() {
            self.end_game();
            return;
        }

        if self.active.is_none() && !self.playfield.is_grid_moving() {
            self.spawn_next_piece();
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::TogglePause => return self.toggle_pause(),
            Command::Restart => return self.restart(),
            _ => {}
        }
        // Level-triggered: the latest value sticks even while paused.
        if let Command::SoftDrop(held) = command {
            self.soft_drop_held = held;
            if let Some(active) = self.active.as_mut() {
                active.set_soft_drop(held);
            }
            return;
        }
        if self.state != SessionState::Playing {
            return;
        }
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let grid = self.playfield.grid();
        match command {
            Command::MoveLeft | Command::MoveRight => {
                let dx = if command == Command::MoveLeft { -1 } else { 1 };
                if active.try_move(dx, 0, grid) {
                    self.events.push(GameEvent::PieceMoved);
                }
            }
            Command::RotateClockwise | Command::RotateCounterClockwise => {
                let rotation = if command == Command::RotateClockwise {
                    Rotation::Clockwise
                } else {
                    Rotation::CounterClockwise
                };
                if active.try_rotate(rotation, grid) {
                    self.events.push(GameEvent::PieceRotated);
                }
            }
            Command::HardDrop => {
                active.hard_drop(grid);
            }
            Command::TogglePause | Command::Restart | Command::SoftDrop(_) => {}
        }
    }

    fn lock_active(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        let locked = self.playfield.lock_piece(active);
        self.events.push(GameEvent::PieceLocked {
            kind: locked.kind,
            anchor: locked.anchor,
        });
    }

    pub fn spawn_next_piece(&mut self) {
        let kind = match self.preview_queue.pop_front() {
            Some(kind) => kind,
            None => self.piece_provider.next_piece(),
        };
        self.fill_preview();

        let piece = Tetromino::spawn(kind, self.config.width, self.config.height);
        if !is_valid_position(&piece, self.playfield.grid()) {
            self.active = None;
            self.end_game();
            return;
        }
        self.set_active_piece(piece);
        self.events.push(GameEvent::PieceSpawned(kind));
    }

    fn end_game(&mut self) {
        if self.state == SessionState::GameOver {
            return;
        }
        info!(
            "game over with score {} after {} lines",
            self.scoreboard.score, self.scoreboard.lines
        );
        self.state = SessionState::GameOver;
        self.events.push(GameEvent::GameOver(true));
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            SessionState::Playing => {
                self.state = SessionState::Paused;
                self.events.push(GameEvent::Paused);
            }
            SessionState::Paused => {
                self.state = SessionState::Playing;
                self.events.push(GameEvent::Unpaused);
            }
            SessionState::GameOver => {
                // Cannot pause when game is over
            }
        }
    }

    /// Resets the grid, cancelling any in-flight line clear, and starts over.
    pub fn restart(&mut self) {
        let was_over = self.state == SessionState::GameOver;
        self.playfield.reset();
        self.scoreboard.reset();
        self.active = None;
        self.commands.clear();
        self.soft_drop_held = false;
        self.state = SessionState::Playing;

        self.events.clear();
        if was_over {
            self.events.push(GameEvent::GameOver(false));
        }
        self.events.push(GameEvent::GameRestarted);

        self.preview_queue.clear();
        self.fill_preview();
        self.spawn_next_piece();
    }

    /// Locked blocks with the active piece overlaid, bottom row first.
    pub fn render_rows(&self) -> Vec<Vec<Option<ShapeKind>>> {
        let mut rows = self.playfield.grid().rows();
        if let Some(active) = &self.active {
            let piece = active.piece();
            for cell in piece.cells() {
                if let Some(slot) = rows
                    .get_mut(cell.y as usize)
                    .and_then(|row| row.get_mut(cell.x as usize))
                {
                    *slot = Some(piece.kind);
                }
            }
        }
        rows
    }
}
