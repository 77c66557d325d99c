//! Position state: piece placement plus the metadata FEN carries.

use serde::{Deserialize, Serialize};

use crate::types::{Move, Piece, PieceColor, PieceKind, Square};

/// Which castling moves are still available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    pub const ALL: Self = Self {
        white_king_side: true,
        white_queen_side: true,
        black_king_side: true,
        black_queen_side: true,
    };

    pub const NONE: Self = Self {
        white_king_side: false,
        white_queen_side: false,
        black_king_side: false,
        black_queen_side: false,
    };

    pub fn king_side(self, color: PieceColor) -> bool {
        match color {
            PieceColor::White => self.white_king_side,
            PieceColor::Black => self.black_king_side,
        }
    }

    pub fn queen_side(self, color: PieceColor) -> bool {
        match color {
            PieceColor::White => self.white_queen_side,
            PieceColor::Black => self.black_queen_side,
        }
    }

    fn revoke_color(&mut self, color: PieceColor) {
        match color {
            PieceColor::White => {
                self.white_king_side = false;
                self.white_queen_side = false;
            }
            PieceColor::Black => {
                self.black_king_side = false;
                self.black_queen_side = false;
            }
        }
    }

    /// Anything leaving or landing on a rook corner kills that right.
    fn revoke_corner(&mut self, sq: Square) {
        match (sq.row(), sq.col()) {
            (7, 0) => self.white_queen_side = false,
            (7, 7) => self.white_king_side = false,
            (0, 0) => self.black_queen_side = false,
            (0, 7) => self.black_king_side = false,
            _ => {}
        }
    }
}

/// A complete chess position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
    side_to_move: PieceColor,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Board {
    /// An empty board, White to move, no castling rights.
    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
            side_to_move: PieceColor::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// The standard initial position.
    pub fn starting_position() -> Self {
        let mut board = Self::empty();
        for color in [PieceColor::White, PieceColor::Black] {
            let home = color.home_row();
            let pawns = color.pawn_start_row();
            for (col, kind) in BACK_RANK.iter().enumerate() {
                board.squares[home as usize][col] = Some(Piece::new(*kind, color));
                board.squares[pawns as usize][col] = Some(Piece::new(PieceKind::Pawn, color));
            }
        }
        board.castling = CastlingRights::ALL;
        board
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.row() as usize][sq.col() as usize]
    }

    /// Lookup by raw coordinates. Anything off the board reads as empty.
    pub fn piece_at_coords(&self, row: i32, col: i32) -> Option<Piece> {
        if !(0..8).contains(&row) || !(0..8).contains(&col) {
            return None;
        }
        self.squares[row as usize][col as usize]
    }

    pub fn set_piece(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.row() as usize][sq.col() as usize] = piece;
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.side_to_move
    }

    pub fn set_side_to_move(&mut self, color: PieceColor) {
        self.side_to_move = color;
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    pub fn set_castling_rights(&mut self, rights: CastlingRights) {
        self.castling = rights;
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn set_en_passant(&mut self, sq: Option<Square>) {
        self.en_passant = sq;
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn set_clocks(&mut self, halfmove_clock: u32, fullmove_number: u32) {
        self.halfmove_clock = halfmove_clock;
        self.fullmove_number = fullmove_number;
    }

    /// Every occupied square holding a piece of `color`.
    pub fn pieces(&self, color: PieceColor) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| {
            self.piece_at(sq)
                .filter(|piece| piece.color == color)
                .map(|piece| (sq, piece))
        })
    }

    pub fn king_square(&self, color: PieceColor) -> Option<Square> {
        let king = Piece::new(PieceKind::King, color);
        Square::all().find(|sq| self.piece_at(*sq) == Some(king))
    }

    /// Play a move without checking legality.
    pub(crate) fn play_unchecked(&mut self, mv: &Move) {
        let Some(moving) = self.piece_at(mv.from) else {
            return;
        };
        let color = moving.color;
        let captured = self.piece_at(mv.to);

        self.set_piece(mv.from, None);
        if mv.is_en_passant {
            // The captured pawn sits beside the origin, not on the destination.
            self.set_piece(Square::at(mv.from.row(), mv.to.col()), None);
        }
        let placed = match mv.promotion {
            Some(kind) => Piece::new(kind, color),
            None => moving,
        };
        self.set_piece(mv.to, Some(placed));

        if mv.is_castle {
            let row = mv.from.row();
            let (rook_from, rook_to) = if mv.to.col() == 6 { (7, 5) } else { (0, 3) };
            let rook = self.piece_at(Square::at(row, rook_from));
            self.set_piece(Square::at(row, rook_from), None);
            self.set_piece(Square::at(row, rook_to), rook);
        }

        if moving.kind == PieceKind::King {
            self.castling.revoke_color(color);
        }
        self.castling.revoke_corner(mv.from);
        self.castling.revoke_corner(mv.to);

        let is_double_push =
            moving.kind == PieceKind::Pawn && mv.from.row().abs_diff(mv.to.row()) == 2;
        self.en_passant = if is_double_push {
            Some(Square::at((mv.from.row() + mv.to.row()) / 2, mv.from.col()))
        } else {
            None
        };

        if moving.kind == PieceKind::Pawn || captured.is_some() || mv.is_en_passant {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if color == PieceColor::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side_to_move = color.opponent();
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::starting_position()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", crate::fen::format_fen(self))
    }
}
