//! tetrui: classic falling-block puzzle game in the terminal.

mod app;
mod game;
mod highscore;
mod input;
mod logging;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use game::SessionConfig;
use log::{LevelFilter, warn};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Narrowest board where an I piece fits at the spawn column.
const MIN_BOARD_WIDTH: u16 = 5;
const MIN_BOARD_HEIGHT: u16 = 4;
const MAX_BOARD_SIDE: u16 = 100;

/// Options derived from CLI that affect game behaviour (board, timing, persistence).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub session: SessionConfig,
    /// Fixed seed for the piece sequence; fresh OS entropy per game when unset.
    pub seed: Option<u64>,
    pub high_score_path: PathBuf,
    /// Replay input is ignored this long after game over.
    pub game_over_hold: Duration,
    /// Without key release events, soft drop ends when Down has been quiet this long.
    pub soft_drop_timeout: Duration,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("board width {0} out of range (5..=100)")]
    Width(u16),
    #[error("board height {0} out of range (4..=100)")]
    Height(u16),
    #[error("{0} interval must be at least 1 ms")]
    ZeroInterval(&'static str),
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if !(MIN_BOARD_WIDTH..=MAX_BOARD_SIDE).contains(&args.width) {
            return Err(ConfigError::Width(args.width));
        }
        if !(MIN_BOARD_HEIGHT..=MAX_BOARD_SIDE).contains(&args.height) {
            return Err(ConfigError::Height(args.height));
        }
        if args.drop_ms == 0 {
            return Err(ConfigError::ZeroInterval("drop"));
        }
        if args.soft_drop_ms == 0 {
            return Err(ConfigError::ZeroInterval("soft drop"));
        }
        if args.soft_drop_timeout_ms == 0 {
            return Err(ConfigError::ZeroInterval("soft drop timeout"));
        }
        Ok(Self {
            session: SessionConfig {
                width: args.width as usize,
                height: args.height as usize,
                base_interval: Duration::from_millis(args.drop_ms),
                soft_drop_interval: Duration::from_millis(args.soft_drop_ms),
                ..SessionConfig::default()
            },
            seed: args.seed,
            high_score_path: args
                .high_score_file
                .clone()
                .unwrap_or_else(highscore::default_path),
            game_over_hold: Duration::from_millis(args.game_over_hold_ms),
            soft_drop_timeout: Duration::from_millis(args.soft_drop_timeout_ms),
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = GameConfig::from_args(&args)?;
    if let Some(path) = &args.log_file {
        // Logging is optional; a bad path must not stop the game.
        if let Err(e) = logging::init_log(args.log_level.into(), path) {
            eprintln!("tetrui: logging disabled: {e:#}");
        }
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        warn!("theme not loaded, using defaults: {e}");
        theme::Theme::default_for(args.palette)
    });
    let mut app = App::new(config, theme);
    app.run()?;
    Ok(())
}

/// Classic falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tetrui",
    version,
    about = "Classic falling-block puzzle in the terminal. Clear full rows to score; every 10 lines the pieces fall faster.",
    long_about = "tetrui is a terminal take on the classic falling-block puzzle.\n\n\
        Steer the falling piece and complete horizontal rows to clear them. Clearing \
        1/2/3/4 rows at once scores 100/300/500/800. Every 10 lines the level rises and \
        pieces fall faster. Holding soft drop earns a point per row.\n\n\
        CONTROLS:\n  Left/Right or h/l  Move    Up or k  Rotate    Down or j (hold)  Soft drop\n  \
        R  Replay after game over      Q / Esc  Quit\n\n\
        The best score is kept in the config directory (see --high-score-file)."
)]
pub struct Args {
    /// Board width in cells.
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub width: u16,

    /// Board height in cells.
    #[arg(long, default_value = "20", value_name = "ROWS")]
    pub height: u16,

    /// Automatic drop interval at level 1, in ms. Shrinks by 10% per level, down to 50 ms.
    #[arg(long, default_value = "500", value_name = "MS")]
    pub drop_ms: u64,

    /// Drop interval while soft drop is held, in ms.
    #[arg(long, default_value = "50", value_name = "MS")]
    pub soft_drop_ms: u64,

    /// Seed for the piece sequence (same seed, same pieces).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]="value"; keys piece_i..piece_z, main_bg, div_line, main_fg, title, inactive_fg).
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Terminals without key release events: soft drop stops after Down is quiet this long, in ms.
    /// Keep it above the OS key-repeat delay.
    #[arg(long, default_value = "800", value_name = "MS")]
    pub soft_drop_timeout_ms: u64,

    /// High score file. Defaults to $XDG_CONFIG_HOME/tetrui/highscore.
    #[arg(long, value_name = "FILE")]
    pub high_score_file: Option<PathBuf>,

    /// How long the game-over screen ignores replay input, in ms.
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub game_over_hold_ms: u64,

    /// Write a log to this file (the terminal is busy drawing the game).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log verbosity when --log-file is set.
    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["tetrui"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--high-score-file", "hs"]);
        let config = GameConfig::from_args(&args).unwrap();
        assert_eq!(config.session, SessionConfig::default());
        assert_eq!(config.high_score_path, PathBuf::from("hs"));
        assert_eq!(config.game_over_hold, Duration::from_millis(1000));
        assert_eq!(config.soft_drop_timeout, Duration::from_millis(800));
        assert_eq!(config.seed, None);
        assert_eq!(args.palette, Palette::Normal);
        assert_eq!(args.log_level, LogLevel::Info);
    }

    #[test]
    fn test_custom_board_and_timing() {
        let args = parse(&["--width", "12", "--height", "24", "--drop-ms", "800", "--seed", "7"]);
        let config = GameConfig::from_args(&args).unwrap();
        assert_eq!(config.session.width, 12);
        assert_eq!(config.session.height, 24);
        assert_eq!(config.session.base_interval, Duration::from_millis(800));
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_rejects_bad_config() {
        let err = GameConfig::from_args(&parse(&["--width", "2"])).unwrap_err();
        assert_eq!(err, ConfigError::Width(2));
        let err = GameConfig::from_args(&parse(&["--height", "500"])).unwrap_err();
        assert_eq!(err, ConfigError::Height(500));
        let err = GameConfig::from_args(&parse(&["--soft-drop-ms", "0"])).unwrap_err();
        assert_eq!(err, ConfigError::ZeroInterval("soft drop"));
        let err = GameConfig::from_args(&parse(&["--soft-drop-timeout-ms", "0"])).unwrap_err();
        assert_eq!(err, ConfigError::ZeroInterval("soft drop timeout"));
    }

    #[test]
    fn test_palette_aliases() {
        assert_eq!(parse(&["--palette", "contrast"]).palette, Palette::HighContrast);
        assert_eq!(parse(&["--palette", "colourblind"]).palette, Palette::Colorblind);
    }

    #[test]
    fn test_log_level_maps_to_filter() {
        assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::Warn);
        assert_eq!(LevelFilter::from(parse(&["--log-level", "debug"]).log_level), LevelFilter::Debug);
    }
}
