use std::collections::VecDeque;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use log::{info, LevelFilter, Log, Metadata, Record};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use tetrispace::provider::{PieceProvider, RandomPieceProvider};
use tetrispace::{Command, EngineConfig, GameEvent, Session, SessionState, ShapeKind};

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";
const FRAME: Duration = Duration::from_millis(16);
const LOG_LINES: usize = 4;

// ============================================================================
// CLI
// ============================================================================

/// Falling-block grid engine in the terminal.
#[derive(Debug, Parser)]
#[command(name = "tetrispace", version)]
struct Args {
    /// JSON engine config; command-line sizes override it.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the 4x5 player grid.
    #[arg(long, conflicts_with = "wide")]
    compact: bool,

    /// Use the 32x24 arena grid.
    #[arg(long)]
    wide: bool,

    #[arg(long, value_name = "COLS")]
    width: Option<usize>,

    #[arg(long, value_name = "ROWS")]
    height: Option<usize>,

    /// Seed for the piece sequence.
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None if self.compact => EngineConfig::compact(),
            None if self.wide => EngineConfig::wide(),
            None => EngineConfig::default(),
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
            config.top_row = None;
        }
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Log Capture
// ============================================================================

/// Keeps the last few log lines for the info panel; the alternate screen
/// swallows anything written to stderr.
struct PanelLogger {
    lines: Mutex<VecDeque<String>>,
}

static LOGGER: PanelLogger = PanelLogger {
    lines: Mutex::new(VecDeque::new()),
};

impl Log for PanelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() == LOG_LINES {
                lines.pop_front();
            }
            lines.push_back(format!("{}: {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

impl PanelLogger {
    fn recent(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default()
    }
}

// ============================================================================
// Color Mapping
// ============================================================================

fn shape_color(kind: ShapeKind) -> Color {
    match kind {
        ShapeKind::I => Color::Cyan,
        ShapeKind::O => Color::Yellow,
        ShapeKind::T => Color::Magenta,
        ShapeKind::S => Color::Green,
        ShapeKind::Z => Color::Red,
        ShapeKind::L => Color::Rgb(255, 165, 0),
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, session: &Session) {
    let area = frame.size();
    render_game(frame, session, area);

    match session.state() {
        SessionState::Playing => {}
        SessionState::Paused => render_popup(
            frame,
            area,
            " Paused ",
            vec![
                Line::from(""),
                Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
                Line::from(""),
                Line::from(Span::styled("Press P to continue", Style::default().fg(Color::DarkGray))),
            ],
        ),
        SessionState::GameOver => {
            let board = session.scoreboard();
            render_popup(
                frame,
                area,
                " Game Over ",
                vec![
                    Line::from(""),
                    Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
                    Line::from(""),
                    Line::from(format!("Score: {}", board.score)),
                    Line::from(format!("Lines: {}", board.lines)),
                    Line::from(""),
                    Line::from(Span::styled("R: restart  ESC: quit", Style::default().fg(Color::DarkGray))),
                ],
            );
        }
    }
}

fn render_game(frame: &mut Frame, session: &Session, area: Rect) {
    let config = session.config();
    let grid_display_width = (config.width as u16 * CELL_WIDTH) + 2;
    let grid_display_height = config.height as u16 + 2;
    let side_width = 24;
    let total_width = grid_display_width + side_width + 2;
    let total_height = grid_display_height.max(18) + 2;

    let main_area = centered_rect(total_width, total_height, area);
    let vertical = Layout::vertical([Constraint::Length(total_height - 2), Constraint::Fill(1)])
        .split(main_area);
    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(side_width),
    ])
    .split(vertical[0]);

    render_grid(frame, session, horizontal[0]);
    render_info(frame, session, horizontal[1]);

    let controls = Paragraph::new(Line::from(
        "←→/AD: Move | ↑/W: Rotate | ↓/S: Soft | Space: Drop | P: Pause | Q: Quit",
    ))
    .alignment(Alignment::Center)
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(controls, vertical[1]);
}

fn render_grid(frame: &mut Frame, session: &Session, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Tetrispace ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let marked = session.playfield().marked_rows();
    // Row 0 is the bottom of the grid, so draw from the top down.
    let lines: Vec<Line> = session
        .render_rows()
        .into_iter()
        .enumerate()
        .rev()
        .map(|(y, row)| {
            let flashing = marked.contains(&y);
            let spans: Vec<Span> = row
                .into_iter()
                .map(|cell| match cell {
                    _ if flashing => Span::styled(BLOCK_CHAR, Style::default().fg(Color::White)),
                    Some(kind) => Span::styled(BLOCK_CHAR, Style::default().fg(shape_color(kind))),
                    None => Span::raw(EMPTY_CHAR),
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, session: &Session, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let board = session.scoreboard();
    let next: Vec<String> = session.preview().map(|kind| format!("{kind:?}")).collect();
    let mut lines = vec![
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", board.score)),
        Line::from(Span::styled("Lines", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", board.lines)),
        Line::from(Span::styled("Level", Style::default().fg(Color::Green))),
        Line::from(format!("{}", board.level)),
        Line::from(Span::styled("Next", Style::default().fg(Color::Magenta))),
        Line::from(next.join(" ")),
        Line::from(""),
    ];
    lines.extend(
        LOGGER
            .recent()
            .into_iter()
            .map(|line| Line::from(Span::styled(line, Style::default().fg(Color::DarkGray)))),
    );

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_popup(frame: &mut Frame, area: Rect, title: &str, text: Vec<Line>) {
    let height = text.len() as u16 + 3;
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );
    frame.render_widget(paragraph, centered_rect(26, height, area));
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Input
// ============================================================================

fn command_for(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Command::MoveLeft),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Command::MoveRight),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Command::RotateClockwise),
        KeyCode::Char('z') | KeyCode::Char('Z') => Some(Command::RotateCounterClockwise),
        KeyCode::Char(' ') => Some(Command::HardDrop),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::TogglePause),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Restart),
        _ => None,
    }
}

// ============================================================================
// Main Loop
// ============================================================================

/// Panel line for the events worth showing; the board itself is drawn from
/// session state.
fn event_message(event: &GameEvent) -> Option<String> {
    match event {
        GameEvent::LinesCleared { count: 1, .. } => Some("cleared 1 line".to_string()),
        GameEvent::LinesCleared { count, .. } => Some(format!("cleared {count} lines")),
        GameEvent::LevelUp(level) => Some(format!("level {level}")),
        GameEvent::GameRestarted => Some("new game".to_string()),
        _ => None,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.engine_config()?;

    log::set_logger(&LOGGER).map_err(|err| anyhow::anyhow!("installing logger: {err}"))?;
    log::set_max_level(LevelFilter::Info);

    let provider: Box<dyn PieceProvider> = match args.seed {
        Some(seed) => Box::new(RandomPieceProvider::seeded(seed)),
        None => Box::new(RandomPieceProvider::new()),
    };
    let mut session = Session::new(config, provider)?;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let result = run(&mut session);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    result
}

fn run(session: &mut Session) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut last_tick = Instant::now();
    // Terminals report key presses but not releases, so soft drop is held
    // for a short window after each press.
    let mut soft_drop_until: Option<Instant> = None;

    loop {
        terminal.draw(|frame| render(frame, session))?;

        let timeout = FRAME.checked_sub(last_tick.elapsed()).unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => break,
                        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
                            session.queue(Command::SoftDrop(true));
                            soft_drop_until = Some(Instant::now() + Duration::from_millis(150));
                        }
                        code => {
                            if let Some(command) = command_for(code) {
                                session.queue(command);
                            }
                        }
                    }
                }
            }
        }

        if soft_drop_until.is_some_and(|until| Instant::now() >= until) {
            session.queue(Command::SoftDrop(false));
            soft_drop_until = None;
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= FRAME {
            session.tick(elapsed);
            for message in session.take_events().iter().filter_map(event_message) {
                info!("{message}");
            }
            last_tick = Instant::now();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_shows_clears_and_level_ups_only() {
        let cleared = GameEvent::LinesCleared {
            count: 2,
            rows: vec![0, 1],
        };
        assert_eq!(event_message(&cleared).as_deref(), Some("cleared 2 lines"));
        assert_eq!(event_message(&GameEvent::LevelUp(3)).as_deref(), Some("level 3"));
        assert_eq!(event_message(&GameEvent::PieceMoved), None);
        assert_eq!(event_message(&GameEvent::PieceSpawned(ShapeKind::O)), None);
    }
}
