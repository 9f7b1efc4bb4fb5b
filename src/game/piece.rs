//! Piece catalog: the seven tetrominoes, their templates and colours, and the rotation rule.

/// Plain RGB display colour. The engine stays free of terminal types; the theme maps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Tetromino kinds (I, O, T, L, J, S, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

/// One cell offset `(dx, dy)` relative to a piece origin; y grows downwards.
pub type Offset = (i32, i32);

/// The four occupied cells of a piece in its current orientation.
pub type Offsets = [Offset; 4];

impl PieceKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::L, Self::J, Self::S, Self::Z];

    /// Canonical (unrotated) template. Rotation is never applied to these.
    pub const fn template(self) -> Offsets {
        match self {
            Self::I => [(0, 1), (1, 1), (2, 1), (3, 1)],
            Self::O => [(0, 0), (1, 0), (0, 1), (1, 1)],
            Self::T => [(0, 1), (1, 0), (1, 1), (2, 1)],
            Self::L => [(0, 0), (0, 1), (1, 1), (2, 1)],
            Self::J => [(2, 0), (0, 1), (1, 1), (2, 1)],
            Self::S => [(0, 1), (1, 1), (1, 0), (2, 0)],
            Self::Z => [(0, 0), (1, 0), (1, 1), (2, 1)],
        }
    }

    /// Default display colour.
    pub const fn color(self) -> Rgb {
        match self {
            Self::I => Rgb(0, 255, 255),
            Self::O => Rgb(255, 255, 0),
            Self::T => Rgb(255, 0, 255),
            Self::L => Rgb(255, 165, 0),
            Self::J => Rgb(0, 0, 255),
            Self::S => Rgb(0, 255, 0),
            Self::Z => Rgb(255, 0, 0),
        }
    }

    /// Stable index 0..7, used for theme lookups.
    pub const fn index(self) -> usize {
        match self {
            Self::I => 0,
            Self::O => 1,
            Self::T => 2,
            Self::L => 3,
            Self::J => 4,
            Self::S => 5,
            Self::Z => 6,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::I => "I",
            Self::O => "O",
            Self::T => "T",
            Self::L => "L",
            Self::J => "J",
            Self::S => "S",
            Self::Z => "Z",
        }
    }
}

/// Quarter turn about the origin: `(x, y) -> (y, -x)`.
///
/// This turns about the template origin, not the visual centre of the piece, so
/// pieces drift as they spin. No kick is attempted; the caller validates the result.
pub fn rotate(offsets: &Offsets) -> Offsets {
    offsets.map(|(x, y)| (y, -x))
}

/// The piece currently under player control (or waiting in the next queue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePiece {
    pub kind: PieceKind,
    /// Offsets after any rotations.
    pub offsets: Offsets,
    /// Board-relative origin; `y` may be negative while the piece pokes above the board.
    pub x: i32,
    pub y: i32,
    pub color: Rgb,
}

impl ActivePiece {
    /// New piece of `kind` at `(x, y)` with the canonical orientation.
    pub fn new(kind: PieceKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            offsets: kind.template(),
            x,
            y,
            color: kind.color(),
        }
    }

    /// Absolute board coordinates of the four cells.
    pub fn cells(&self) -> [(i32, i32); 4] {
        self.offsets.map(|(dx, dy)| (self.x + dx, self.y + dy))
    }
}
