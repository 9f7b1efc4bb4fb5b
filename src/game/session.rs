//! Game session: active piece, next queue, score, level and drop timing.

use super::collision::check_collision;
use super::grid::Grid;
use super::piece::{ActivePiece, rotate};
use super::spawner::Spawner;
use log::{debug, info};
use std::collections::VecDeque;
use std::time::Duration;

/// Lines needed for each level-up.
pub const LINES_PER_LEVEL: i32 = 10;

/// Speed multiplier applied per level.
const LEVEL_SPEEDUP: f64 = 0.9;

/// Floors for the drop intervals.
const MIN_DROP_INTERVAL: Duration = Duration::from_millis(50);
const MIN_SOFT_DROP_INTERVAL: Duration = Duration::from_millis(25);

/// Engine-level commands. Quit and replay belong to the application shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDropOn,
    SoftDropOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Playing,
    GameOver,
}

/// Board size, timing and queue settings for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub width: usize,
    pub height: usize,
    /// Automatic drop interval at level 1.
    pub base_interval: Duration,
    /// Drop interval while soft drop is held, before any level-up.
    pub soft_drop_interval: Duration,
    pub queue_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 20,
            base_interval: Duration::from_millis(500),
            soft_drop_interval: Duration::from_millis(50),
            queue_len: 3,
        }
    }
}

/// What one lock cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockReport {
    pub lines_cleared: usize,
    /// Row indices (before removal) that were cleared.
    pub cleared_rows: Vec<usize>,
    /// Points added: line-clear score plus any soft-drop bonus.
    pub points: u32,
    pub leveled_up: bool,
    pub game_over: bool,
}

/// Result of a downward step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Moved,
    Locked(LockReport),
}

/// Read-only view handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub board: &'a Grid,
    pub active: &'a ActivePiece,
    pub next: &'a VecDeque<ActivePiece>,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub game_over: bool,
}

/// Points for clearing `lines` rows in one lock.
pub fn line_clear_points(lines: usize) -> u32 {
    match lines {
        0 => 0,
        1 => 100,
        2 => 300,
        3 => 500,
        4 => 800,
        _ => 1200,
    }
}

/// Automatic drop interval at `level`: `max(50ms, base * 0.9^(level-1))`, truncated to ms.
pub fn level_drop_interval(base: Duration, level: u32) -> Duration {
    scaled(base, level).max(MIN_DROP_INTERVAL)
}

/// Soft-drop interval after levelling up to `level`, scaling the current value.
fn next_soft_drop_interval(current: Duration, level: u32) -> Duration {
    scaled(current, level).max(MIN_SOFT_DROP_INTERVAL)
}

fn scaled(interval: Duration, level: u32) -> Duration {
    let exp = level.saturating_sub(1).min(i32::MAX as u32) as i32;
    let ms = interval.as_millis() as f64 * LEVEL_SPEEDUP.powi(exp);
    Duration::from_millis(ms as u64)
}

/// One game from first spawn to game over.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: SessionConfig,
    board: Grid,
    piece: ActivePiece,
    next_pieces: VecDeque<ActivePiece>,
    spawner: Spawner,
    state: SessionState,
    score: u32,
    lines_cleared: u32,
    level: u32,
    lines_to_next_level: i32,
    drop_interval: Duration,
    soft_drop_interval: Duration,
    soft_drop: bool,
    /// Rows descended under soft drop since the last lock; paid on lock.
    soft_drop_bonus: u32,
    /// Time since the last automatic drop.
    drop_timer: Duration,
}

impl GameSession {
    pub fn new(config: SessionConfig, spawner: Spawner) -> Self {
        Self::with_board(config, Grid::new(config.width, config.height), spawner)
    }

    /// Start on a prepared board. A blocked spawn ends the game before any move.
    pub fn with_board(config: SessionConfig, board: Grid, mut spawner: Spawner) -> Self {
        let piece = spawner.generate();
        let mut next_pieces = VecDeque::with_capacity(config.queue_len);
        spawner.refill(&mut next_pieces, config.queue_len);
        let mut session = Self {
            config,
            board,
            piece,
            next_pieces,
            spawner,
            state: SessionState::Playing,
            score: 0,
            lines_cleared: 0,
            level: 1,
            lines_to_next_level: LINES_PER_LEVEL,
            drop_interval: config.base_interval,
            soft_drop_interval: config.soft_drop_interval,
            soft_drop: false,
            soft_drop_bonus: 0,
            drop_timer: Duration::ZERO,
        };
        if check_collision(&session.board, &session.piece) {
            session.state = SessionState::GameOver;
        }
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state() == SessionState::GameOver
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn board(&self) -> &Grid {
        &self.board
    }

    pub fn piece(&self) -> &ActivePiece {
        &self.piece
    }

    pub fn next_pieces(&self) -> &VecDeque<ActivePiece> {
        &self.next_pieces
    }

    pub fn is_soft_dropping(&self) -> bool {
        self.soft_drop
    }

    /// Interval the next automatic drop waits for.
    pub fn current_interval(&self) -> Duration {
        if self.soft_drop {
            self.soft_drop_interval()
        } else {
            self.drop_interval()
        }
    }

    pub fn drop_interval(&self) -> Duration {
        self.drop_interval
    }

    pub fn soft_drop_interval(&self) -> Duration {
        self.soft_drop_interval
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            board: self.board(),
            active: self.piece(),
            next: self.next_pieces(),
            score: self.score(),
            level: self.level(),
            lines: self.lines_cleared(),
            game_over: self.is_game_over(),
        }
    }

    /// Apply one player command. Ignored once the game is over.
    pub fn apply(&mut self, command: Command) {
        if self.is_game_over() {
            return;
        }
        match command {
            Command::MoveLeft => self.move_horizontal(-1),
            Command::MoveRight => self.move_horizontal(1),
            Command::Rotate => self.rotate(),
            Command::SoftDropOn => self.soft_drop = true,
            Command::SoftDropOff => self.soft_drop = false,
        }
    }

    /// Advance the drop clock. Performs at most one automatic drop.
    pub fn tick(&mut self, elapsed: Duration) -> Option<DropOutcome> {
        if self.is_game_over() {
            return None;
        }
        self.drop_timer += elapsed;
        if self.drop_timer <= self.current_interval() {
            return None;
        }
        self.drop_timer = Duration::ZERO;
        let soft = self.soft_drop;
        let outcome = self.move_down()?;
        if soft && outcome == DropOutcome::Moved {
            self.soft_drop_bonus = self.soft_drop_bonus.saturating_add(1);
        }
        Some(outcome)
    }

    fn move_horizontal(&mut self, dx: i32) {
        self.piece.x += dx;
        if check_collision(&self.board, &self.piece) {
            self.piece.x -= dx;
        }
    }

    fn rotate(&mut self) {
        let original = self.piece.offsets;
        self.piece.offsets = rotate(&original);
        if check_collision(&self.board, &self.piece) {
            self.piece.offsets = original;
        }
    }

    /// Move one row down, or lock the piece where it is if that row is blocked.
    /// `None` once the game is over.
    pub fn move_down(&mut self) -> Option<DropOutcome> {
        if self.is_game_over() {
            return None;
        }
        self.piece.y += 1;
        if !check_collision(&self.board, &self.piece) {
            return Some(DropOutcome::Moved);
        }
        self.piece.y -= 1;
        Some(DropOutcome::Locked(self.lock_piece()))
    }

    fn lock_piece(&mut self) -> LockReport {
        self.board.lock_cells(self.piece.cells(), self.piece.kind);

        let cleared_rows = self.board.full_rows();
        let lines = self.board.clear_full_lines();
        let mut points = line_clear_points(lines);
        self.lines_cleared += lines as u32;
        let leveled_up = self.count_lines(lines);

        points = points.saturating_add(self.soft_drop_bonus);
        self.score = self.score.saturating_add(points);
        debug!(
            "locked {} at ({}, {})",
            self.piece.kind.name(),
            self.piece.x,
            self.piece.y
        );

        self.spawn_next();
        self.soft_drop = false;
        self.soft_drop_bonus = 0;

        let game_over = check_collision(&self.board, &self.piece);
        if game_over {
            self.state = SessionState::GameOver;
            info!(
                "game over: score {}, level {}, lines {}",
                self.score, self.level, self.lines_cleared
            );
        }
        LockReport {
            lines_cleared: lines,
            cleared_rows,
            points,
            leveled_up,
            game_over,
        }
    }

    /// Count cleared lines toward the next level. At most one level-up per lock.
    fn count_lines(&mut self, lines: usize) -> bool {
        self.lines_to_next_level -= lines as i32;
        if self.lines_to_next_level > 0 {
            return false;
        }
        self.level += 1;
        self.lines_to_next_level = LINES_PER_LEVEL;
        self.drop_interval = level_drop_interval(self.config.base_interval, self.level);
        self.soft_drop_interval = next_soft_drop_interval(self.soft_drop_interval, self.level);
        true
    }

    fn spawn_next(&mut self) {
        let (x, y) = self.spawner.spawn_point();
        let mut piece = match self.next_pieces.pop_front() {
            Some(p) => p,
            None => self.spawner.generate(),
        };
        piece.x = x;
        piece.y = y;
        self.piece = piece;
        self.spawner.refill(&mut self.next_pieces, self.config.queue_len);
    }

    #[cfg(test)]
    fn set_piece(&mut self, piece: ActivePiece) {
        self.piece = piece;
    }

    #[cfg(test)]
    fn board_mut(&mut self) -> &mut Grid {
        &mut self.board
    }
}
