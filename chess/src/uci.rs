//! Coordinate (UCI-style) move notation: `e2e4`, `e7e8q`.

use crate::board::Board;
use crate::movegen::{resolve_move, MoveError};
use crate::types::{Move, PieceKind, Square};

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q")
pub fn format_uci_move(mv: &Move) -> String {
    let mut s = format!("{}{}", mv.from, mv.to);
    if let Some(promo) = mv.promotion {
        s.push(promo.to_char_lower());
    }
    s
}

/// A coordinate move before it has been checked against a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UciMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl UciMove {
    /// Look the move up among the legal moves of `board`.
    ///
    /// Castling is written as the king's two-square step (`e1g1`).
    pub fn resolve(&self, board: &Board) -> Result<Move, MoveError> {
        resolve_move(board, self.from, self.to, self.promotion)
    }
}

pub fn parse_uci_move(text: &str) -> Result<UciMove, UciError> {
    let text = text.trim();
    if !(4..=5).contains(&text.len()) || !text.is_ascii() {
        return Err(UciError::InvalidFormat(text.to_string()));
    }

    let square = |s: &str| {
        s.parse::<Square>()
            .map_err(|_| UciError::InvalidSquare(s.to_string()))
    };
    let from = square(&text[0..2])?;
    let to = square(&text[2..4])?;

    let promotion = match text[4..].chars().next() {
        None => None,
        Some(c) => Some(
            PieceKind::from_char(c)
                .filter(|kind| PieceKind::PROMOTIONS.contains(kind))
                .ok_or_else(|| UciError::InvalidPromotion(c))?,
        ),
    };

    Ok(UciMove {
        from,
        to,
        promotion,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UciError {
    #[error("Invalid coordinate move: {0}")]
    InvalidFormat(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion piece: {0}")]
    InvalidPromotion(char),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_format_uci_move() {
        let mv = Move::new(sq("e2"), sq("e4"), PieceKind::Pawn);
        assert_eq!(format_uci_move(&mv), "e2e4");
    }

    #[test]
    fn test_format_uci_move_with_promotion() {
        let mv = Move::new(sq("e7"), sq("e8"), PieceKind::Pawn).with_promotion(PieceKind::Queen);
        assert_eq!(format_uci_move(&mv), "e7e8q");
    }

    #[test]
    fn test_parse_uci_move() {
        assert_eq!(
            parse_uci_move("e7e8n"),
            Ok(UciMove {
                from: sq("e7"),
                to: sq("e8"),
                promotion: Some(PieceKind::Knight),
            })
        );
        assert_eq!(parse_uci_move(" g1f3 ").map(|m| m.promotion), Ok(None));
        assert!(matches!(parse_uci_move("e2"), Err(UciError::InvalidFormat(_))));
        assert!(matches!(parse_uci_move("e2e9"), Err(UciError::InvalidSquare(_))));
        assert_eq!(parse_uci_move("e7e8k"), Err(UciError::InvalidPromotion('k')));
    }

    #[test]
    fn test_resolve_castling() {
        let board = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mv = parse_uci_move("e1g1").unwrap().resolve(&board).unwrap();
        assert!(mv.is_castle);
        assert!(parse_uci_move("e1f3").unwrap().resolve(&board).is_err());
    }
}
