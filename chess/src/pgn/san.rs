use serde::Serialize;
use smallvec::SmallVec;

use crate::board::Board;
use crate::movegen::{all_legal_moves, legal_moves};
use crate::types::{Move, PieceKind, Square};

/// Format a move as SAN.
///
/// `board` is the position before the move. Check and checkmate suffixes
/// come from the flags cached on `mv`.
pub fn format_san(board: &Board, mv: &Move) -> String {
    let mut san = String::new();

    if mv.is_castle {
        san.push_str(if mv.to.col() == 6 { "O-O" } else { "O-O-O" });
    } else if let Some(letter) = mv.piece.san_letter() {
        san.push(letter);
        san.push_str(&disambiguation(board, mv));
        if mv.is_capture {
            san.push('x');
        }
        san.push_str(&mv.to.to_string());
    } else {
        if mv.is_capture {
            san.push(mv.from.file_char());
            san.push('x');
        }
        san.push_str(&mv.to.to_string());
        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(promo.to_char_upper());
        }
    }

    if mv.is_checkmate {
        san.push('#');
    } else if mv.is_check {
        san.push('+');
    }

    san
}

/// Origin hint needed when several same-kind pieces reach the destination:
/// file first, then rank, then the full square.
fn disambiguation(board: &Board, mv: &Move) -> String {
    let candidates: SmallVec<[Square; 10]> = board
        .pieces(board.side_to_move())
        .filter(|(_, piece)| piece.kind == mv.piece)
        .filter(|(sq, _)| legal_moves(board, *sq).iter().any(|m| m.to == mv.to))
        .map(|(sq, _)| sq)
        .collect();

    if candidates.len() <= 1 {
        return String::new();
    }

    let same_file = candidates
        .iter()
        .filter(|sq| sq.col() == mv.from.col())
        .count();
    if same_file == 1 {
        return mv.from.file_char().to_string();
    }

    let same_rank = candidates
        .iter()
        .filter(|sq| sq.row() == mv.from.row())
        .count();
    if same_rank == 1 {
        return mv.from.rank_char().to_string();
    }

    mv.from.to_string()
}

/// Parse Standard Algebraic Notation (SAN) move against a position.
///
/// Accepts `O-O` and `0-0` castling forms, trailing `+ # ! ?` marks, and
/// promotions with or without `=`. A pawn reaching the last rank without a
/// named piece promotes to a queen.
pub fn resolve_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let pattern = SanPattern::parse(san)?;

    let mut matches = all_legal_moves(board)
        .into_iter()
        .filter(|mv| pattern.matches(mv));
    match (matches.next(), matches.next()) {
        (Some(mv), None) => Ok(mv),
        (None, _) => Err(SanError::NoLegalMove(san.to_string())),
        (Some(_), Some(_)) => Err(SanError::AmbiguousMove(san.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SanPattern {
    Castle {
        king_side: bool,
    },
    Regular {
        piece: PieceKind,
        from_col: Option<u8>,
        from_row: Option<u8>,
        to: Square,
        promotion: Option<PieceKind>,
    },
}

impl SanPattern {
    fn parse(san: &str) -> Result<Self, SanError> {
        let text = san
            .trim()
            .trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'));

        match text {
            "O-O" | "0-0" => return Ok(Self::Castle { king_side: true }),
            "O-O-O" | "0-0-0" => return Ok(Self::Castle { king_side: false }),
            _ => {}
        }

        let mut chars: Vec<char> = text.chars().filter(|c| *c != 'x').collect();

        let promotion = match chars.last().copied() {
            Some(c) if c.is_ascii_uppercase() && chars.len() > 2 => {
                let kind = PieceKind::from_san_letter(c)
                    .filter(|kind| PieceKind::PROMOTIONS.contains(kind))
                    .ok_or_else(|| SanError::InvalidPromotion(san.to_string()))?;
                chars.pop();
                if chars.last() == Some(&'=') {
                    chars.pop();
                }
                Some(kind)
            }
            _ => None,
        };

        let piece = match chars.first().copied() {
            Some(c) if c.is_ascii_uppercase() => {
                chars.remove(0);
                PieceKind::from_san_letter(c)
                    .ok_or_else(|| SanError::InvalidFormat(san.to_string()))?
            }
            _ => PieceKind::Pawn,
        };
        if promotion.is_some() && piece != PieceKind::Pawn {
            return Err(SanError::InvalidPromotion(san.to_string()));
        }

        if chars.len() < 2 {
            return Err(SanError::InvalidFormat(san.to_string()));
        }
        let dest: String = chars[chars.len() - 2..].iter().collect();
        let to: Square = dest
            .parse()
            .map_err(|_| SanError::InvalidSquare(dest.clone()))?;

        let mut from_col = None;
        let mut from_row = None;
        for c in &chars[..chars.len() - 2] {
            match c {
                'a'..='h' if from_col.is_none() && from_row.is_none() => {
                    from_col = Some(*c as u8 - b'a');
                }
                '1'..='8' if from_row.is_none() => from_row = Some(b'8' - *c as u8),
                _ => return Err(SanError::InvalidFormat(san.to_string())),
            }
        }

        Ok(Self::Regular {
            piece,
            from_col,
            from_row,
            to,
            promotion,
        })
    }

    fn matches(&self, mv: &Move) -> bool {
        match *self {
            Self::Castle { king_side } => mv.is_castle && (mv.to.col() == 6) == king_side,
            Self::Regular {
                piece,
                from_col,
                from_row,
                to,
                promotion,
            } => {
                if mv.is_castle || mv.piece != piece || mv.to != to {
                    return false;
                }
                if from_col.is_some_and(|col| col != mv.from.col())
                    || from_row.is_some_and(|row| row != mv.from.row())
                {
                    return false;
                }
                match promotion {
                    Some(kind) => mv.promotion == Some(kind),
                    None => mv.promotion.is_none() || mv.promotion == Some(PieceKind::Queen),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}
