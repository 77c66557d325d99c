use crate::board::{Board, CastlingRights};
use crate::types::{Piece, PieceColor, PieceKind, Square};

/// FEN of the standard initial position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a Board.
///
/// The halfmove clock and fullmove number may be omitted, defaulting to
/// `0` and `1`. Each color must have exactly one king.
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if !(4..=6).contains(&parts.len()) {
        return Err(FenError::WrongFieldCount(parts.len()));
    }

    let mut board = Board::empty();
    parse_placement(&mut board, parts[0])?;

    let side = match parts[1] {
        "w" => PieceColor::White,
        "b" => PieceColor::Black,
        other => return Err(FenError::InvalidSideToMove(other.to_string())),
    };
    board.set_side_to_move(side);
    board.set_castling_rights(parse_castling(parts[2])?);
    board.set_en_passant(parse_en_passant(parts[3])?);

    let halfmove = match parts.get(4) {
        Some(field) => parse_counter(field)?,
        None => 0,
    };
    let fullmove = match parts.get(5) {
        Some(field) => parse_counter(field)?,
        None => 1,
    };
    board.set_clocks(halfmove, fullmove);

    for color in [PieceColor::White, PieceColor::Black] {
        let king = Piece::new(PieceKind::King, color);
        let count = Square::all()
            .filter(|sq| board.piece_at(*sq) == Some(king))
            .count();
        if count != 1 {
            return Err(FenError::KingCount { color, count });
        }
    }

    Ok(board)
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    let mut fen = String::with_capacity(90);

    for row in 0..8u8 {
        if row > 0 {
            fen.push('/');
        }
        let mut empty = 0u8;
        for col in 0..8u8 {
            match board.piece_at(Square::at(row, col)) {
                Some(piece) => {
                    if empty > 0 {
                        fen.push((b'0' + empty) as char);
                        empty = 0;
                    }
                    fen.push(piece.fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            fen.push((b'0' + empty) as char);
        }
    }

    fen.push(' ');
    fen.push(match board.side_to_move() {
        PieceColor::White => 'w',
        PieceColor::Black => 'b',
    });

    fen.push(' ');
    let rights = board.castling_rights();
    let flags = [
        (rights.white_king_side, 'K'),
        (rights.white_queen_side, 'Q'),
        (rights.black_king_side, 'k'),
        (rights.black_queen_side, 'q'),
    ];
    if flags.iter().any(|(held, _)| *held) {
        fen.extend(flags.iter().filter(|(held, _)| *held).map(|(_, c)| *c));
    } else {
        fen.push('-');
    }

    fen.push(' ');
    match board.en_passant() {
        Some(sq) => fen.push_str(&sq.to_string()),
        None => fen.push('-'),
    }

    fen.push_str(&format!(
        " {} {}",
        board.halfmove_clock(),
        board.fullmove_number()
    ));
    fen
}

fn parse_placement(board: &mut Board, placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount(ranks.len()));
    }

    for (row, rank) in ranks.iter().enumerate() {
        let mut col = 0usize;
        for c in rank.chars() {
            match c {
                '1'..='8' => col += c as usize - '0' as usize,
                _ => {
                    let piece = Piece::from_fen_char(c).ok_or(FenError::InvalidPiece(c))?;
                    if col < 8 {
                        board.set_piece(Square::at(row as u8, col as u8), Some(piece));
                    }
                    col += 1;
                }
            }
        }
        if col != 8 {
            return Err(FenError::WrongSquareCount {
                rank: 8 - row,
                count: col,
            });
        }
    }

    Ok(())
}

fn parse_castling(field: &str) -> Result<CastlingRights, FenError> {
    if field == "-" {
        return Ok(CastlingRights::NONE);
    }

    let mut rights = CastlingRights::NONE;
    for c in field.chars() {
        let slot = match c {
            'K' => &mut rights.white_king_side,
            'Q' => &mut rights.white_queen_side,
            'k' => &mut rights.black_king_side,
            'q' => &mut rights.black_queen_side,
            _ => return Err(FenError::InvalidCastling(field.to_string())),
        };
        if *slot {
            return Err(FenError::InvalidCastling(field.to_string()));
        }
        *slot = true;
    }
    Ok(rights)
}

fn parse_en_passant(field: &str) -> Result<Option<Square>, FenError> {
    if field == "-" {
        return Ok(None);
    }
    let sq: Square = field
        .parse()
        .map_err(|_| FenError::InvalidEnPassant(field.to_string()))?;
    if sq.rank() != 3 && sq.rank() != 6 {
        return Err(FenError::InvalidEnPassant(field.to_string()));
    }
    Ok(Some(sq))
}

fn parse_counter(field: &str) -> Result<u32, FenError> {
    field
        .parse()
        .map_err(|_| FenError::InvalidCounter(field.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("Expected 4 to 6 FEN fields, found {0}")]
    WrongFieldCount(usize),
    #[error("Expected 8 ranks, found {0}")]
    WrongRankCount(usize),
    #[error("Rank {rank} describes {count} squares")]
    WrongSquareCount { rank: usize, count: usize },
    #[error("Invalid piece character: {0}")]
    InvalidPiece(char),
    #[error("Invalid side to move: {0}")]
    InvalidSideToMove(String),
    #[error("Invalid castling field: {0}")]
    InvalidCastling(String),
    #[error("Invalid en passant field: {0}")]
    InvalidEnPassant(String),
    #[error("Invalid move counter: {0}")]
    InvalidCounter(String),
    #[error("Expected one {color} king, found {count}")]
    KingCount { color: PieceColor, count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_fen_matches_starting_position() {
        let board = parse_fen(STARTING_FEN).unwrap();
        assert_eq!(board, Board::starting_position());
        assert_eq!(format_fen(&Board::starting_position()), STARTING_FEN);
    }

    #[test]
    fn test_round_trip() {
        for fen in [
            STARTING_FEN,
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K2R b Kq - 17 42",
        ] {
            assert_eq!(format_fen(&parse_fen(fen).unwrap()), fen);
        }
    }

    #[test]
    fn test_missing_counters_default() {
        let board = parse_fen("4k3/8/8/8/8/8/8/4K3 w - -").unwrap();
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.fullmove_number(), 1);
        assert_eq!(format_fen(&board), "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
    }

    #[test]
    fn test_rejects_wrong_rank_count() {
        assert_eq!(
            parse_fen("4k3/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::WrongRankCount(7))
        );
    }

    #[test]
    fn test_rejects_wrong_square_count() {
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K4 w - - 0 1"),
            Err(FenError::WrongSquareCount { rank: 1, count: 9 })
        ));
        assert!(matches!(
            parse_fen("4k3/7/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::WrongSquareCount { rank: 7, count: 7 })
        ));
    }

    #[test]
    fn test_rejects_bad_fields() {
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1"),
            Err(FenError::InvalidSideToMove(_))
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w KK - 0 1"),
            Err(FenError::InvalidCastling(_))
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w Kx - 0 1"),
            Err(FenError::InvalidCastling(_))
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w - e4 0 1"),
            Err(FenError::InvalidEnPassant(_))
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3 w - - x 1"),
            Err(FenError::InvalidCounter(_))
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4K3"),
            Err(FenError::WrongFieldCount(1))
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/4X3 w - - 0 1"),
            Err(FenError::InvalidPiece('X'))
        ));
    }

    #[test]
    fn test_requires_one_king_each() {
        assert!(matches!(
            parse_fen("8/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(FenError::KingCount {
                color: PieceColor::Black,
                count: 0
            })
        ));
        assert!(matches!(
            parse_fen("4k3/8/8/8/8/8/8/3KK3 w - - 0 1"),
            Err(FenError::KingCount {
                color: PieceColor::White,
                count: 2
            })
        ));
    }
}
