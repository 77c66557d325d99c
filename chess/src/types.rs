//! Canonical piece, color, square and move types for the project.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Project-owned piece type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// Project-owned color type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceColor {
    White,
    Black,
}

/// How a piece kind travels across the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Forward pushes and diagonal captures, direction depends on color.
    Pawn,
    /// One jump to each offset.
    Step(&'static [(i8, i8)]),
    /// Repeated steps along each offset until blocked.
    Slide(&'static [(i8, i8)]),
}

static KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

static DIAGONAL_OFFSETS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

static ORTHOGONAL_OFFSETS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

static ALL_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        Self::Pawn,
        Self::Knight,
        Self::Bishop,
        Self::Rook,
        Self::Queen,
        Self::King,
    ];

    /// Pieces a pawn may promote to, strongest first.
    pub const PROMOTIONS: [PieceKind; 4] = [Self::Queen, Self::Rook, Self::Bishop, Self::Knight];

    pub fn movement(self) -> Movement {
        match self {
            Self::Pawn => Movement::Pawn,
            Self::Knight => Movement::Step(&KNIGHT_OFFSETS),
            Self::Bishop => Movement::Slide(&DIAGONAL_OFFSETS),
            Self::Rook => Movement::Slide(&ORTHOGONAL_OFFSETS),
            Self::Queen => Movement::Slide(&ALL_OFFSETS),
            Self::King => Movement::Step(&ALL_OFFSETS),
        }
    }

    pub fn to_char_upper(self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Rook => 'R',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    pub fn to_char_lower(self) -> char {
        self.to_char_upper().to_ascii_lowercase()
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(Self::Pawn),
            'n' => Some(Self::Knight),
            'b' => Some(Self::Bishop),
            'r' => Some(Self::Rook),
            'q' => Some(Self::Queen),
            'k' => Some(Self::King),
            _ => None,
        }
    }

    /// Piece letter as written in SAN. Pawns have none.
    pub fn san_letter(self) -> Option<char> {
        match self {
            Self::Pawn => None,
            other => Some(other.to_char_upper()),
        }
    }

    /// Parse an uppercase SAN piece letter (`N`, `B`, `R`, `Q`, `K`).
    pub fn from_san_letter(c: char) -> Option<Self> {
        match c {
            'N' => Some(Self::Knight),
            'B' => Some(Self::Bishop),
            'R' => Some(Self::Rook),
            'Q' => Some(Self::Queen),
            'K' => Some(Self::King),
            _ => None,
        }
    }
}

impl PieceColor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Row delta of a forward pawn step. White advances towards row 0.
    pub fn pawn_direction(self) -> i8 {
        match self {
            Self::White => -1,
            Self::Black => 1,
        }
    }

    /// Row holding this color's king and rooks at the start.
    pub fn home_row(self) -> u8 {
        match self {
            Self::White => 7,
            Self::Black => 0,
        }
    }

    pub fn pawn_start_row(self) -> u8 {
        match self {
            Self::White => 6,
            Self::Black => 1,
        }
    }

    pub fn promotion_row(self) -> u8 {
        match self {
            Self::White => 0,
            Self::Black => 7,
        }
    }
}

/// A colored piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: PieceColor,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: PieceColor) -> Self {
        Self { kind, color }
    }

    /// FEN character: uppercase for White, lowercase for Black.
    pub fn fen_char(self) -> char {
        match self.color {
            PieceColor::White => self.kind.to_char_upper(),
            PieceColor::Black => self.kind.to_char_lower(),
        }
    }

    pub fn from_fen_char(c: char) -> Option<Self> {
        let kind = PieceKind::from_char(c)?;
        let color = if c.is_ascii_uppercase() {
            PieceColor::White
        } else {
            PieceColor::Black
        };
        Some(Self::new(kind, color))
    }
}

/// A board square. Row 0 is rank 8, column 0 is file a.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Returns `None` when either coordinate is off the board.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        (row < 8 && col < 8).then_some(Self { row, col })
    }

    /// Caller guarantees both coordinates are below 8.
    pub(crate) const fn at(row: u8, col: u8) -> Self {
        debug_assert!(row < 8 && col < 8);
        Self { row, col }
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// Displayed rank, 1 through 8.
    pub fn rank(self) -> u8 {
        8 - self.row
    }

    pub fn file_char(self) -> char {
        (b'a' + self.col) as char
    }

    pub fn rank_char(self) -> char {
        (b'0' + self.rank()) as char
    }

    /// The square `(dr, dc)` away, or `None` if that leaves the board.
    pub fn offset(self, dr: i8, dc: i8) -> Option<Self> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Self::at(row as u8, col as u8))
        } else {
            None
        }
    }

    /// All 64 squares, a8 first, h1 last.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Self::at(row, col)))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid square: {0}")]
pub struct ParseSquareError(pub String);

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ParseSquareError(s.to_string()));
        }
        let col = match bytes[0] {
            b @ b'a'..=b'h' => b - b'a',
            _ => return Err(ParseSquareError(s.to_string())),
        };
        let row = match bytes[1] {
            b @ b'1'..=b'8' => 8 - (b - b'0'),
            _ => return Err(ParseSquareError(s.to_string())),
        };
        Ok(Self::at(row, col))
    }
}

impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A transition between two positions.
///
/// Capture, castle, en passant and promotion are fixed when the move is
/// generated. Check and checkmate are filled in when the move is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub is_capture: bool,
    pub is_castle: bool,
    pub is_en_passant: bool,
    pub promotion: Option<PieceKind>,
    pub is_check: bool,
    pub is_checkmate: bool,
}

impl Move {
    pub fn new(from: Square, to: Square, piece: PieceKind) -> Self {
        Self {
            from,
            to,
            piece,
            is_capture: false,
            is_castle: false,
            is_en_passant: false,
            promotion: None,
            is_check: false,
            is_checkmate: false,
        }
    }

    pub fn with_promotion(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }

    /// Same origin, destination and promotion, ignoring derived flags.
    pub fn same_action(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char_upper())
    }
}

impl fmt::Display for PieceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
