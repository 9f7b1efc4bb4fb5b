//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::game::{ActivePiece, PieceKind};
use crate::game::piece::Rgb;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Theme file keys for piece colours, in `PieceKind::index` order.
const PIECE_KEYS: [&str; 7] = [
    "piece_i", "piece_o", "piece_t", "piece_l", "piece_j", "piece_s", "piece_z",
];

/// Piece colour overrides plus One Dark UI colours.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Piece colour overrides indexed by `PieceKind::index`; `None` keeps the piece's own colour.
    pub pieces: [Option<Color>; 7],
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, level).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Empty-cell dots.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

const fn rgb(c: Rgb) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

impl Theme {
    /// One Dark UI with the classic piece colours.
    pub fn onedark_default() -> Self {
        Self {
            pieces: [None; 7],
            bg: Color::Rgb(0x28, 0x2C, 0x34),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to defaults if path is None or the file is missing.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Default theme for a palette when no file is loaded.
    pub fn default_for(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override piece colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.pieces = [
                    Color::Rgb(0x00, 0xFF, 0xFF), // I
                    Color::Rgb(0xFF, 0xFF, 0x00), // O
                    Color::Rgb(0xFF, 0x00, 0xFF), // T
                    Color::Rgb(0xFF, 0x88, 0x00), // L
                    Color::Rgb(0x00, 0x88, 0xFF), // J
                    Color::Rgb(0x00, 0xFF, 0x00), // S
                    Color::Rgb(0xFF, 0x00, 0x00), // Z
                ]
                .map(Some);
                self.bg = Color::Black;
                self.main_fg = Color::White;
            }
            crate::Palette::Colorblind => {
                // Okabe-Ito style: no red/green pair carries meaning on its own.
                self.pieces = [
                    Color::Rgb(0x56, 0xB4, 0xE9), // I sky blue
                    Color::Rgb(0xF0, 0xE4, 0x42), // O yellow
                    Color::Rgb(0xCC, 0x79, 0xA7), // T reddish purple
                    Color::Rgb(0xE6, 0x9F, 0x00), // L orange
                    Color::Rgb(0x00, 0x72, 0xB2), // J blue
                    Color::Rgb(0x00, 0x9E, 0x73), // S bluish green
                    Color::Rgb(0xD5, 0x5E, 0x00), // Z vermillion
                ]
                .map(Some);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::onedark_default();
        let mut pieces = defaults.pieces;
        for (slot, key) in pieces.iter_mut().zip(PIECE_KEYS) {
            if let Some(c) = get(key) {
                *slot = Some(c);
            }
        }
        Self {
            pieces,
            bg: get("main_bg").or_else(|| get("meter_bg")).unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            inactive_fg: get("inactive_fg").unwrap_or(defaults.inactive_fg),
        }
    }

    /// Colour of a locked block of `kind`.
    #[inline]
    pub fn piece_color(&self, kind: PieceKind) -> Color {
        self.pieces[kind.index()].unwrap_or_else(|| rgb(kind.color()))
    }

    /// Colour of a live piece: the theme override, else the piece's own colour.
    pub fn active_color(&self, piece: &ActivePiece) -> Color {
        self.pieces[piece.kind.index()].unwrap_or_else(|| rgb(piece.color))
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
            if !value.is_empty() {
                map.insert(key.to_string(), value);
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&s[range], 16).map_err(|_| invalid())
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_junk() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
        assert!(parse_hex("#ééé").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_theme_file_overrides_pieces() {
        let map = parse_theme_file(
            "# comment\ntheme[piece_t]='#112233'\ntheme[title]=\"#ABC\"\nnot a theme line\n",
        );
        let theme = Theme::from_map(&map);
        assert_eq!(theme.piece_color(PieceKind::T), Color::Rgb(0x11, 0x22, 0x33));
        assert_eq!(theme.title, Color::Rgb(0xAA, 0xBB, 0xCC));
        assert_eq!(theme.piece_color(PieceKind::I), Color::Rgb(0, 255, 255));
    }

    #[test]
    fn test_default_piece_colours() {
        let theme = Theme::default();
        assert_eq!(theme.piece_color(PieceKind::L), Color::Rgb(255, 165, 0));
        assert_eq!(theme.piece_color(PieceKind::Z), Color::Rgb(255, 0, 0));
    }

    #[test]
    fn test_active_color_follows_override() {
        let piece = ActivePiece::new(PieceKind::T, 0, 0);
        assert_eq!(Theme::default().active_color(&piece), Color::Rgb(255, 0, 255));
        let theme = Theme::default_for(crate::Palette::Colorblind);
        assert_eq!(theme.active_color(&piece), Color::Rgb(0xCC, 0x79, 0xA7));
    }

    #[test]
    fn test_missing_file_uses_palette() {
        let theme = Theme::load(
            Some(Path::new("/nonexistent/tetrui.theme")),
            crate::Palette::HighContrast,
        )
        .unwrap();
        assert_eq!(theme.bg, Color::Black);
    }
}
