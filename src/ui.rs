//! Layout and drawing: playfield, next queue, stats, game over overlay and effects.

use crate::game::{ActivePiece, Snapshot};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each board cell is two terminal columns wide so cells look square.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 22;
const LINE_CLEAR_FLASH_MS: u32 = 300;
const GAME_OVER_FADE_MS: u32 = 500;

/// Next preview: pieces stacked vertically, one blank row between them.
const PREVIEW_COUNT: usize = 3;
const PREVIEW_ROWS: u16 = 2;
const PREVIEW_GAP: u16 = 1;

const FILLED: &str = "██";
const EMPTY: &str = " ·";

/// Everything the renderer needs for one frame.
pub struct View<'a> {
    pub snapshot: Snapshot<'a>,
    pub theme: &'a Theme,
    pub high_score: u32,
    pub new_record: bool,
    /// Game-over hold has passed; replay is accepted.
    pub replay_ready: bool,
}

/// TachyonFX effects that outlive a single frame.
#[derive(Default)]
pub struct Effects {
    /// Board rows waiting for a flash; the effect is built once the board rect is known.
    pending_rows: Vec<usize>,
    line_clear: Option<Effect>,
    game_over: Option<Effect>,
    game_over_pending: bool,
    last_process: Option<Instant>,
}

impl Effects {
    /// Flash the given board rows (indices before the clear shifted them).
    pub fn flash_rows(&mut self, rows: &[usize]) {
        self.pending_rows = rows.to_vec();
        self.line_clear = None;
    }

    /// Fade the game over popup in.
    pub fn show_game_over(&mut self) {
        self.game_over_pending = true;
        self.game_over = None;
    }

    fn is_idle(&self) -> bool {
        self.line_clear.is_none()
            && self.game_over.is_none()
            && self.pending_rows.is_empty()
            && !self.game_over_pending
    }

    fn delta(&mut self, now: Instant) -> TfxDuration {
        let delta = self
            .last_process
            .map_or(std::time::Duration::ZERO, |t| now.saturating_duration_since(t));
        self.last_process = Some(now);
        let ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
        TfxDuration::from_millis(ms)
    }

    fn render_line_clear(&mut self, frame: &mut Frame, theme: &Theme, board: Rect, delta: TfxDuration) {
        if !self.pending_rows.is_empty() {
            let rows: Vec<u16> = self
                .pending_rows
                .drain(..)
                .map(|r| board.y + r as u16)
                .collect();
            let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
                rows.contains(&pos.y)
            }));
            let flash = theme.main_fg;
            let effect = fx::fade_from(flash, flash, (LINE_CLEAR_FLASH_MS, Interpolation::Linear))
                .with_filter(filter)
                .with_area(board);
            self.line_clear = Some(effect);
        }
        if let Some(effect) = &mut self.line_clear {
            frame.render_effect(effect, board, delta);
        }
        if self.line_clear.as_ref().is_some_and(Effect::done) {
            self.line_clear = None;
        }
    }

    fn render_game_over(&mut self, frame: &mut Frame, theme: &Theme, popup: Rect, delta: TfxDuration) {
        if self.game_over_pending {
            self.game_over_pending = false;
            let effect = fx::fade_from(theme.bg, theme.bg, (GAME_OVER_FADE_MS, Interpolation::Linear))
                .with_area(popup);
            self.game_over = Some(effect);
        }
        if let Some(effect) = &mut self.game_over {
            frame.render_effect(effect, popup, delta);
        }
        if self.game_over.as_ref().is_some_and(Effect::done) {
            self.game_over = None;
        }
    }
}

/// Playfield size in terminal cells (grid + border).
fn playfield_size(width: usize, height: usize) -> (u16, u16) {
    let w = u16::try_from(width).unwrap_or(u16::MAX);
    let h = u16::try_from(height).unwrap_or(u16::MAX);
    (
        w.saturating_mul(CELL_WIDTH).saturating_add(2),
        h.saturating_add(2),
    )
}

/// Draw one frame: board and sidebar centred in `frame.area()`, then effects and overlays.
pub fn draw(frame: &mut Frame, view: &View<'_>, effects: &mut Effects, now: Instant) {
    let area = frame.area();
    let theme = view.theme;
    Block::default()
        .style(Style::default().bg(theme.bg))
        .render(area, frame.buffer_mut());

    let board = view.snapshot.board;
    let (pw, ph) = playfield_size(board.width(), board.height());
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert_chunks[1]);
    let (playfield_area, sidebar_area) = (inner[0], inner[1]);

    let board_rect = draw_playfield(frame, view, playfield_area);
    draw_sidebar(frame, view, sidebar_area);

    if effects.is_idle() {
        effects.last_process = None;
        draw_overlays(frame, view, playfield_area);
        return;
    }
    let delta = effects.delta(now);
    effects.render_line_clear(frame, theme, board_rect, delta);
    if let Some(popup) = draw_overlays(frame, view, playfield_area) {
        effects.render_game_over(frame, theme, popup, delta);
    }
}

/// Overlays on top of the board. Returns the popup rect when one was drawn.
fn draw_overlays(frame: &mut Frame, view: &View<'_>, playfield: Rect) -> Option<Rect> {
    view.snapshot
        .game_over
        .then(|| draw_game_over(frame, view, playfield))
}

/// Board border, locked cells, then the active piece. Returns the inner grid rect.
fn draw_playfield(frame: &mut Frame, view: &View<'_>, area: Rect) -> Rect {
    let theme = view.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" tetrui ", Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let empty_style = Style::default().fg(theme.inactive_fg).bg(theme.bg);
    for (y, row) in view.snapshot.board.rows().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let (symbol, style) = match cell {
                Some(kind) => (FILLED, Style::default().fg(theme.piece_color(*kind)).bg(theme.bg)),
                None => (EMPTY, empty_style),
            };
            put_cell(frame, inner, x as i32, y as i32, symbol, style);
        }
    }

    let active = view.snapshot.active;
    let style = Style::default().fg(theme.active_color(active)).bg(theme.bg);
    for (x, y) in active.cells() {
        // Cells above the top row are not drawn.
        if y >= 0 {
            put_cell(frame, inner, x, y, FILLED, style);
        }
    }
    inner
}

/// Write one board cell, clipped to `inner`.
fn put_cell(frame: &mut Frame, inner: Rect, x: i32, y: i32, symbol: &str, style: Style) {
    let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) else {
        return;
    };
    let px = inner.x + x * CELL_WIDTH;
    let py = inner.y + y;
    if px + CELL_WIDTH > inner.right() || py >= inner.bottom() {
        return;
    }
    frame.buffer_mut().set_string(px, py, symbol, style);
}

fn sidebar_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
}

fn draw_sidebar(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let next_height = 3 + PREVIEW_COUNT as u16 * (PREVIEW_ROWS + PREVIEW_GAP) - PREVIEW_GAP;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(next_height), // Next (border + title + previews)
            Constraint::Length(6),           // Stats
            Constraint::Length(5),           // Controls
        ])
        .split(area);

    // --- Next ---
    let next_block = sidebar_block(theme);
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    Paragraph::new(Line::from(Span::styled("Next", title_style))).render(
        Rect {
            height: next_inner.height.min(1),
            ..next_inner
        },
        frame.buffer_mut(),
    );
    for (i, piece) in view.snapshot.next.iter().take(PREVIEW_COUNT).enumerate() {
        let y = next_inner.y + 1 + i as u16 * (PREVIEW_ROWS + PREVIEW_GAP);
        if y + PREVIEW_ROWS > next_inner.bottom() {
            break;
        }
        let slot = Rect {
            x: next_inner.x,
            y,
            width: next_inner.width,
            height: PREVIEW_ROWS,
        };
        draw_piece_preview(frame, theme, slot, piece);
    }

    // --- Stats ---
    let snapshot = &view.snapshot;
    let stats_block = sidebar_block(theme);
    let stats_inner = stats_block.inner(chunks[1]);
    stats_block.render(chunks[1], frame.buffer_mut());
    let stat = |label: &'static str, value: u32| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value.to_string(), fg_style),
        ])
    };
    let stats_lines = vec![
        stat("Level: ", snapshot.level),
        stat("Lines: ", snapshot.lines),
        stat("Score: ", snapshot.score),
        stat("Best:  ", view.high_score),
    ];
    Paragraph::new(Text::from(stats_lines)).render(stats_inner, frame.buffer_mut());

    // --- Controls ---
    let dim = Style::default().fg(theme.inactive_fg);
    let controls_block = sidebar_block(theme);
    let controls_inner = controls_block.inner(chunks[2]);
    controls_block.render(chunks[2], frame.buffer_mut());
    let controls = vec![
        Line::from(Span::styled("←→ move   ↑ rotate", dim)),
        Line::from(Span::styled("↓ soft drop (hold)", dim)),
        Line::from(Span::styled("q quit", dim)),
    ];
    Paragraph::new(Text::from(controls)).render(controls_inner, frame.buffer_mut());
}

/// Draw a queued piece in its spawn orientation, centred on its bounding box.
#[allow(clippy::similar_names)]
fn draw_piece_preview(frame: &mut Frame, theme: &Theme, area: Rect, piece: &ActivePiece) {
    let offsets = piece.offsets;
    let (dx_lo, dy_lo) = offsets
        .iter()
        .fold((i32::MAX, i32::MAX), |(ax, ay), (dx, dy)| (ax.min(*dx), ay.min(*dy)));
    let (dx_hi, dy_hi) = offsets
        .iter()
        .fold((i32::MIN, i32::MIN), |(ax, ay), (dx, dy)| (ax.max(*dx), ay.max(*dy)));

    let bw = (dx_hi - dx_lo + 1) as u16;
    let bh = (dy_hi - dy_lo + 1) as u16;
    let off_x = area.width.saturating_sub(bw * CELL_WIDTH) / 2;
    let off_y = area.height.saturating_sub(bh) / 2;

    let style = Style::default().fg(theme.active_color(piece)).bg(theme.bg);
    for (dx, dy) in offsets {
        let px = area.x + off_x + (dx - dx_lo) as u16 * CELL_WIDTH;
        let py = area.y + off_y + (dy - dy_lo) as u16;
        if px + CELL_WIDTH <= area.right() && py < area.bottom() {
            frame.buffer_mut().set_string(px, py, FILLED, style);
        }
    }
}

/// Game over popup over the playfield. Returns its rect for the fade-in.
fn draw_game_over(frame: &mut Frame, view: &View<'_>, playfield: Rect) -> Rect {
    let theme = view.theme;
    let fg_style = Style::default().fg(theme.main_fg);
    let popup_w = playfield.width.max(22);
    let popup_h = if view.new_record { 10 } else { 9 };
    let area = frame.area();
    let popup = Rect {
        x: playfield.x + playfield.width.saturating_sub(popup_w) / 2,
        y: playfield.y + playfield.height.saturating_sub(popup_h) / 2,
        width: popup_w,
        height: popup_h,
    }
    .intersection(area);

    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", view.snapshot.score),
            fg_style,
        )),
        Line::from(Span::styled(
            format!(" High Score: {} ", view.high_score),
            fg_style,
        )),
    ];
    if view.new_record {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    let hint_style = if view.replay_ready {
        fg_style
    } else {
        Style::default().fg(theme.inactive_fg)
    };
    lines.push(Line::from(Span::styled(" R Replay   Q Quit ", hint_style)));

    Clear.render(popup, frame.buffer_mut());
    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" tetrui ", theme.title)),
        );
    p.render(popup, frame.buffer_mut());
    popup
}
