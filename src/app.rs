//! App: terminal init, frame loop, held-key repeat and game-over handling.

use crate::GameConfig;
use crate::game::{Command, DropOutcome, GameSession, LockReport, Spawner};
use crate::highscore::{load_high_score, save_high_score};
use crate::input::{Action, key_to_action, released_action};
use crate::theme::Theme;
use crate::ui::{self, Effects, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use log::{debug, error, info};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// DAS (Delayed Auto-Shift): delay before a held move starts repeating.
const REPEAT_DELAY: Duration = Duration::from_millis(200);
/// ARR (Auto-Repeat Rate): time between repeated moves while holding.
const REPEAT_INTERVAL: Duration = Duration::from_millis(50);
/// One frame at ~60 FPS.
const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Playing,
    GameOver,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    session: GameSession,
    screen: Screen,
    /// Best score on disk, raised when a finished game beats it.
    high_score: u32,
    new_record: bool,
    game_over_at: Option<Instant>,
    last_frame: Instant,
    /// Terminal reports key releases, so held keys can be tracked.
    release_events: bool,
    repeat_state: Option<(Action, Instant)>,
    last_repeat_fire: Option<Instant>,
    last_soft_drop_press: Option<Instant>,
    effects: Effects,
}

fn new_session(config: &GameConfig) -> GameSession {
    let width = config.session.width;
    let spawner = match config.seed {
        Some(seed) => Spawner::from_seed(width, seed),
        None => Spawner::from_os_rng(width),
    };
    info!(
        "new game: {}x{} board, seed {:?}",
        width, config.session.height, config.seed
    );
    GameSession::new(config.session, spawner)
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let high_score = load_high_score(&config.high_score_path);
        let session = new_session(&config);
        Self {
            config,
            theme,
            session,
            screen: Screen::Playing,
            high_score,
            new_record: false,
            game_over_at: None,
            last_frame: Instant::now(),
            release_events: false,
            repeat_state: None,
            last_repeat_fire: None,
            last_soft_drop_press: None,
            effects: Effects::default(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
                supports_keyboard_enhancement,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Release events drive soft drop and held-key repeat when the terminal has them.
        self.release_events = supports_keyboard_enhancement().unwrap_or(false);
        if self.release_events {
            let _ = execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            );
        }
        info!("key release events: {}", self.release_events);

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        self.last_frame = Instant::now();

        let result = self.run_loop(&mut terminal);

        // Restore
        if self.release_events {
            let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        }
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let view = View {
                snapshot: self.session.snapshot(),
                theme: &self.theme,
                high_score: self.high_score.max(self.session.score()),
                new_record: self.new_record,
                replay_ready: self.replay_ready(now),
            };
            terminal.draw(|f| ui::draw(f, &view, &mut self.effects, now))?;

            let timeout = FRAME.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if self.handle_key(key, Instant::now()) {
                            return Ok(());
                        }
                    }
                }
            }

            self.update(Instant::now());
        }
    }

    /// Advance game time to `now`: held-key repeat, stale soft drop, then at most one drop.
    fn update(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        if self.screen != Screen::Playing {
            return;
        }
        self.tick_repeat(now);
        self.release_stale_soft_drop(now);
        if let Some(DropOutcome::Locked(report)) = self.session.tick(elapsed) {
            self.on_lock(&report, now);
        }
    }

    /// Handle one key event. Returns true when the player quits.
    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        let action = key_to_action(key);
        if action == Action::Quit {
            return true;
        }
        if let Some(held) = released_action(key) {
            if self.repeat_state.is_some_and(|(a, _)| a == held) {
                self.repeat_state = None;
                self.last_repeat_fire = None;
            }
        }
        match self.screen {
            Screen::Playing => self.play_action(action, key.kind, now),
            Screen::GameOver => {
                if action == Action::Replay && self.replay_ready(now) {
                    self.reset_game(now);
                }
            }
        }
        false
    }

    fn play_action(&mut self, action: Action, kind: KeyEventKind, now: Instant) {
        let Some(command) = action.command() else {
            return;
        };
        // With release events we run our own repeat for moves; terminal repeats would double it.
        if self.release_events && kind == KeyEventKind::Repeat && action.repeats() {
            return;
        }
        self.session.apply(command);
        if action == Action::SoftDropOn {
            self.last_soft_drop_press = Some(now);
        }
        if self.release_events && action.repeats() && kind == KeyEventKind::Press {
            self.repeat_state = Some((action, now));
            self.last_repeat_fire = None;
        }
    }

    fn tick_repeat(&mut self, now: Instant) {
        let Some((action, first)) = self.repeat_state else {
            return;
        };
        if now.duration_since(first) < REPEAT_DELAY {
            return;
        }
        let next = self.last_repeat_fire.unwrap_or(first) + REPEAT_INTERVAL;
        if now >= next {
            if let Some(command) = action.command() {
                self.session.apply(command);
            }
            self.last_repeat_fire = Some(now);
        }
    }

    /// Without release events, soft drop ends once Down has not been seen for the timeout.
    fn release_stale_soft_drop(&mut self, now: Instant) {
        if self.release_events || !self.session.is_soft_dropping() {
            return;
        }
        let stale = self
            .last_soft_drop_press
            .is_none_or(|t| now.saturating_duration_since(t) >= self.config.soft_drop_timeout);
        if stale {
            self.session.apply(Command::SoftDropOff);
            self.last_soft_drop_press = None;
        }
    }

    fn on_lock(&mut self, report: &LockReport, now: Instant) {
        debug!(
            "lock: {} lines, +{} points, score {}",
            report.lines_cleared,
            report.points,
            self.session.score()
        );
        if report.leveled_up {
            info!(
                "level {} reached: drop {}ms, soft drop {}ms",
                self.session.level(),
                self.session.drop_interval().as_millis(),
                self.session.soft_drop_interval().as_millis()
            );
        }
        if !report.cleared_rows.is_empty() {
            self.effects.flash_rows(&report.cleared_rows);
        }
        if report.game_over {
            self.enter_game_over(now);
        }
    }

    /// Game-over transition: the only place the high score is written.
    fn enter_game_over(&mut self, now: Instant) {
        self.screen = Screen::GameOver;
        self.game_over_at = Some(now);
        self.repeat_state = None;
        self.last_repeat_fire = None;
        self.effects.show_game_over();

        let score = self.session.score();
        if score <= self.high_score {
            return;
        }
        self.high_score = score;
        self.new_record = true;
        match save_high_score(&self.config.high_score_path, score) {
            Ok(()) => info!("new high score {score}"),
            Err(e) => error!("could not save high score: {e:#}"),
        }
    }

    /// Replay input is ignored until the game-over hold has passed.
    fn replay_ready(&self, now: Instant) -> bool {
        self.game_over_at
            .is_some_and(|t| now.saturating_duration_since(t) >= self.config.game_over_hold)
    }

    fn reset_game(&mut self, now: Instant) {
        self.session = new_session(&self.config);
        self.screen = Screen::Playing;
        self.new_record = false;
        self.game_over_at = None;
        self.last_frame = now;
        self.repeat_state = None;
        self.last_repeat_fire = None;
        self.last_soft_drop_press = None;
        self.effects = Effects::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::SessionConfig;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::fs;
    use std::path::PathBuf;

    const STEP: Duration = Duration::from_millis(600);

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tetrui-app-{}-{}", std::process::id(), name));
        let _ = fs::remove_dir_all(&dir);
        dir.join("highscore")
    }

    fn app(high_score_path: PathBuf) -> App {
        let config = GameConfig {
            session: SessionConfig::default(),
            seed: Some(7),
            high_score_path,
            game_over_hold: Duration::from_millis(1000),
            soft_drop_timeout: Duration::from_millis(800),
        };
        App::new(config, Theme::default())
    }

    fn press(app: &mut App, code: KeyCode, now: Instant) -> bool {
        app.handle_key(KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press), now)
    }

    /// Run frames until the game ends, holding soft drop when `soft` is set. Returns the end time.
    fn play_to_game_over(app: &mut App, soft: bool) -> Instant {
        app.release_events = true;
        let mut now = app.last_frame;
        for _ in 0..20_000 {
            if soft && !app.session.is_soft_dropping() {
                press(app, KeyCode::Down, now);
            }
            now += STEP;
            app.update(now);
            if app.screen == Screen::GameOver {
                return now;
            }
        }
        panic!("game never ended");
    }

    #[test]
    fn test_beaten_high_score_saved_at_game_over() {
        let path = scratch("beaten");
        let mut app = app(path.clone());
        assert_eq!(app.high_score, 0);
        let end = play_to_game_over(&mut app, true);

        let score = app.session.score();
        assert!(score > 0);
        assert!(app.new_record);
        assert_eq!(app.high_score, score);
        assert_eq!(load_high_score(&path), score);

        // No second write once the game is over.
        fs::remove_file(&path).unwrap();
        for i in 1..10 {
            app.update(end + STEP * i);
        }
        assert!(!path.exists());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_unbeaten_high_score_left_alone() {
        let path = scratch("unbeaten");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "1000000\n").unwrap();
        let mut app = app(path.clone());
        assert_eq!(app.high_score, 1_000_000);
        play_to_game_over(&mut app, false);

        assert!(!app.new_record);
        assert_eq!(app.high_score, 1_000_000);
        assert_eq!(fs::read_to_string(&path).unwrap(), "1000000\n");
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_replay_waits_for_hold_then_resets() {
        let path = scratch("replay");
        let mut app = app(path.clone());
        let end = play_to_game_over(&mut app, true);

        assert!(!press(&mut app, KeyCode::Char('r'), end + Duration::from_millis(500)));
        assert_eq!(app.screen, Screen::GameOver);
        assert!(app.session.is_game_over());

        let later = end + Duration::from_millis(1000);
        assert!(!press(&mut app, KeyCode::Char('r'), later));
        assert_eq!(app.screen, Screen::Playing);
        assert!(!app.session.is_game_over());
        assert_eq!(app.session.score(), 0);
        assert_eq!(app.session.level(), 1);
        assert!(app.session.board().rows().flatten().all(Option::is_none));
        assert!(!app.new_record);
        assert_eq!(app.game_over_at, None);
        assert!(!app.replay_ready(later));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_quit_works_during_hold() {
        let path = scratch("quit");
        let mut app = app(path.clone());
        let end = play_to_game_over(&mut app, false);
        assert!(press(&mut app, KeyCode::Char('q'), end));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_soft_drop_survives_key_repeat_delay() {
        let mut app = app(scratch("soft-drop"));
        let start = app.last_frame;
        press(&mut app, KeyCode::Down, start);
        let frame = Duration::from_millis(16);
        // 660 ms is a common OS auto-repeat delay.
        for i in 1..=41 {
            app.update(start + frame * i);
        }
        assert!(app.session.is_soft_dropping());

        app.update(start + Duration::from_millis(800));
        assert!(!app.session.is_soft_dropping());
    }
}
