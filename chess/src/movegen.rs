//! Move generation, attack detection and move application.
//!
//! Generation happens per origin square. Pseudo-legal moves follow each
//! piece's movement pattern; legal moves are the subset that does not leave
//! the mover's king attacked once played.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::Board;
use crate::types::{Move, Movement, Piece, PieceColor, PieceKind, Square};

/// Moves from a single origin. A queen tops out at 27.
pub type MoveList = SmallVec<[Move; 32]>;

/// Status of the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    Normal,
    Check,
    Checkmate,
    Stalemate,
}

impl GameStatus {
    pub fn is_game_over(self) -> bool {
        matches!(self, Self::Checkmate | Self::Stalemate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("Illegal move: {from}{to}")]
    Illegal { from: Square, to: Square },
}

/// Moves for the piece on `from` that follow its movement pattern,
/// ignoring whether the mover's king ends up attacked.
///
/// Only the side to move has moves; any other square yields an empty list.
pub fn pseudo_legal_moves(board: &Board, from: Square) -> MoveList {
    let mut moves = MoveList::new();
    let Some(piece) = board.piece_at(from) else {
        return moves;
    };
    if piece.color != board.side_to_move() {
        return moves;
    }

    match piece.kind.movement() {
        Movement::Pawn => pawn_moves(board, from, piece.color, &mut moves),
        Movement::Step(offsets) => {
            for &(dr, dc) in offsets {
                if let Some(to) = from.offset(dr, dc) {
                    push_unless_own(board, from, to, piece, &mut moves);
                }
            }
        }
        Movement::Slide(offsets) => {
            for &(dr, dc) in offsets {
                let mut cursor = from;
                while let Some(to) = cursor.offset(dr, dc) {
                    let blocked = board.piece_at(to).is_some();
                    push_unless_own(board, from, to, piece, &mut moves);
                    if blocked {
                        break;
                    }
                    cursor = to;
                }
            }
        }
    }

    if piece.kind == PieceKind::King {
        castling_moves(board, from, piece.color, &mut moves);
    }

    moves
}

/// Pseudo-legal moves from `from` that keep the mover's king safe.
/// No ordering is guaranteed.
pub fn legal_moves(board: &Board, from: Square) -> MoveList {
    let mut moves = pseudo_legal_moves(board, from);
    moves.retain(|mv| !leaves_king_attacked(board, mv));
    moves
}

/// Every legal move for the side to move.
pub fn all_legal_moves(board: &Board) -> Vec<Move> {
    board
        .pieces(board.side_to_move())
        .flat_map(|(sq, _)| legal_moves(board, sq))
        .collect()
}

fn has_legal_move(board: &Board) -> bool {
    board
        .pieces(board.side_to_move())
        .any(|(sq, _)| !legal_moves(board, sq).is_empty())
}

/// Whether any piece of color `by` attacks `target`.
///
/// Pawns attack diagonally whether or not the target is occupied. Castling
/// never counts as an attack.
pub fn is_attacked(board: &Board, target: Square, by: PieceColor) -> bool {
    // An attacking pawn stands one step behind the target from its own side.
    let pawn = Piece::new(PieceKind::Pawn, by);
    let behind = -by.pawn_direction();
    for dc in [-1, 1] {
        if target
            .offset(behind, dc)
            .is_some_and(|sq| board.piece_at(sq) == Some(pawn))
        {
            return true;
        }
    }

    for kind in [PieceKind::Knight, PieceKind::King] {
        let Movement::Step(offsets) = kind.movement() else {
            continue;
        };
        let attacker = Piece::new(kind, by);
        if offsets.iter().any(|&(dr, dc)| {
            target
                .offset(dr, dc)
                .is_some_and(|sq| board.piece_at(sq) == Some(attacker))
        }) {
            return true;
        }
    }

    for (ray_kind, other) in [
        (PieceKind::Rook, PieceKind::Queen),
        (PieceKind::Bishop, PieceKind::Queen),
    ] {
        let Movement::Slide(offsets) = ray_kind.movement() else {
            continue;
        };
        for &(dr, dc) in offsets {
            let mut cursor = target;
            while let Some(sq) = cursor.offset(dr, dc) {
                if let Some(piece) = board.piece_at(sq) {
                    if piece.color == by && (piece.kind == ray_kind || piece.kind == other) {
                        return true;
                    }
                    break;
                }
                cursor = sq;
            }
        }
    }

    false
}

/// Whether the side to move has its king attacked.
pub fn is_in_check(board: &Board) -> bool {
    let side = board.side_to_move();
    board
        .king_square(side)
        .is_some_and(|king| is_attacked(board, king, side.opponent()))
}

/// The legal move from `from` to `to` with the given promotion.
pub fn resolve_move(
    board: &Board,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) -> Result<Move, MoveError> {
    legal_moves(board, from)
        .into_iter()
        .find(|mv| mv.to == to && mv.promotion == promotion)
        .ok_or(MoveError::Illegal { from, to })
}

/// Produce the position after `mv`.
///
/// The move is matched against the legal moves of its origin square by
/// destination and promotion; the caller's flags are not trusted.
pub fn apply_move(board: &Board, mv: &Move) -> Result<Board, MoveError> {
    let resolved = resolve_move(board, mv.from, mv.to, mv.promotion)?;
    let mut next = board.clone();
    next.play_unchecked(&resolved);
    Ok(next)
}

/// Like [`apply_move`], also returning the resolved move with its check and
/// checkmate flags filled in.
pub fn play_move(board: &Board, mv: &Move) -> Result<(Board, Move), MoveError> {
    let mut resolved = resolve_move(board, mv.from, mv.to, mv.promotion)?;
    let mut next = board.clone();
    next.play_unchecked(&resolved);

    match game_status(&next) {
        GameStatus::Check => resolved.is_check = true,
        GameStatus::Checkmate => {
            resolved.is_check = true;
            resolved.is_checkmate = true;
        }
        GameStatus::Normal | GameStatus::Stalemate => {}
    }

    Ok((next, resolved))
}

pub fn game_status(board: &Board) -> GameStatus {
    match (is_in_check(board), has_legal_move(board)) {
        (true, true) => GameStatus::Check,
        (true, false) => GameStatus::Checkmate,
        (false, true) => GameStatus::Normal,
        (false, false) => GameStatus::Stalemate,
    }
}

/// Count leaf nodes of the legal move tree to `depth`.
pub fn perft(board: &Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = all_legal_moves(board);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .iter()
        .map(|mv| {
            let mut next = board.clone();
            next.play_unchecked(mv);
            perft(&next, depth - 1)
        })
        .sum()
}

fn leaves_king_attacked(board: &Board, mv: &Move) -> bool {
    let mover = board.side_to_move();
    let mut next = board.clone();
    next.play_unchecked(mv);
    next.king_square(mover)
        .is_some_and(|king| is_attacked(&next, king, mover.opponent()))
}

fn push_unless_own(board: &Board, from: Square, to: Square, piece: Piece, moves: &mut MoveList) {
    match board.piece_at(to) {
        Some(target) if target.color == piece.color => {}
        target => {
            let mut mv = Move::new(from, to, piece.kind);
            mv.is_capture = target.is_some();
            moves.push(mv);
        }
    }
}

fn pawn_moves(board: &Board, from: Square, color: PieceColor, moves: &mut MoveList) {
    let dir = color.pawn_direction();

    if let Some(one) = from.offset(dir, 0) {
        if board.piece_at(one).is_none() {
            push_pawn(from, one, color, false, moves);
            if from.row() == color.pawn_start_row() {
                if let Some(two) = one.offset(dir, 0) {
                    if board.piece_at(two).is_none() {
                        moves.push(Move::new(from, two, PieceKind::Pawn));
                    }
                }
            }
        }
    }

    for dc in [-1, 1] {
        let Some(to) = from.offset(dir, dc) else {
            continue;
        };
        match board.piece_at(to) {
            Some(target) if target.color != color => push_pawn(from, to, color, true, moves),
            None if board.en_passant() == Some(to) => {
                let victim = Square::at(from.row(), to.col());
                if board.piece_at(victim) == Some(Piece::new(PieceKind::Pawn, color.opponent())) {
                    let mut mv = Move::new(from, to, PieceKind::Pawn);
                    mv.is_capture = true;
                    mv.is_en_passant = true;
                    moves.push(mv);
                }
            }
            _ => {}
        }
    }
}

fn push_pawn(from: Square, to: Square, color: PieceColor, is_capture: bool, moves: &mut MoveList) {
    let mut mv = Move::new(from, to, PieceKind::Pawn);
    mv.is_capture = is_capture;
    if to.row() == color.promotion_row() {
        for kind in PieceKind::PROMOTIONS {
            moves.push(mv.with_promotion(kind));
        }
    } else {
        moves.push(mv);
    }
}

struct CastleSide {
    allowed: bool,
    rook_col: u8,
    empty_cols: &'static [u8],
    safe_cols: &'static [u8],
    king_to_col: u8,
}

fn castling_moves(board: &Board, from: Square, color: PieceColor, moves: &mut MoveList) {
    let home = color.home_row();
    if from != Square::at(home, 4) {
        return;
    }
    let enemy = color.opponent();
    let rights = board.castling_rights();
    let sides = [
        CastleSide {
            allowed: rights.king_side(color),
            rook_col: 7,
            empty_cols: &[5, 6],
            safe_cols: &[5, 6],
            king_to_col: 6,
        },
        CastleSide {
            allowed: rights.queen_side(color),
            rook_col: 0,
            empty_cols: &[1, 2, 3],
            safe_cols: &[3, 2],
            king_to_col: 2,
        },
    ];
    if !sides.iter().any(|side| side.allowed) || is_attacked(board, from, enemy) {
        return;
    }

    let rook = Piece::new(PieceKind::Rook, color);
    for side in sides {
        if !side.allowed || board.piece_at(Square::at(home, side.rook_col)) != Some(rook) {
            continue;
        }
        if side
            .empty_cols
            .iter()
            .any(|&col| board.piece_at(Square::at(home, col)).is_some())
        {
            continue;
        }
        if side
            .safe_cols
            .iter()
            .any(|&col| is_attacked(board, Square::at(home, col), enemy))
        {
            continue;
        }
        let mut mv = Move::new(from, Square::at(home, side.king_to_col), PieceKind::King);
        mv.is_castle = true;
        moves.push(mv);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::{format_fen, parse_fen, STARTING_FEN};

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn board(fen: &str) -> Board {
        parse_fen(fen).unwrap()
    }

    #[test]
    fn test_starting_position_has_twenty_moves() {
        let start = board(STARTING_FEN);
        assert_eq!(start.side_to_move(), PieceColor::White);
        let moves = all_legal_moves(&start);
        assert_eq!(moves.len(), 20);
        let pawn_moves = moves.iter().filter(|m| m.piece == PieceKind::Pawn).count();
        let knight_moves = moves.iter().filter(|m| m.piece == PieceKind::Knight).count();
        assert_eq!(pawn_moves, 16);
        assert_eq!(knight_moves, 4);
    }

    #[test]
    fn test_opponent_pieces_have_no_moves() {
        let start = board(STARTING_FEN);
        assert!(pseudo_legal_moves(&start, sq("e7")).is_empty());
        assert!(legal_moves(&start, sq("e4")).is_empty());
    }

    #[test]
    fn test_perft_starting_position() {
        let start = board(STARTING_FEN);
        assert_eq!(perft(&start, 1), 20);
        assert_eq!(perft(&start, 2), 400);
        assert_eq!(perft(&start, 3), 8902);
    }

    #[test]
    fn test_perft_kiwipete() {
        let kiwipete =
            board("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        assert_eq!(perft(&kiwipete, 1), 48);
        assert_eq!(perft(&kiwipete, 2), 2039);
    }

    #[test]
    fn test_perft_rook_endgame() {
        let position = board("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1");
        assert_eq!(perft(&position, 1), 14);
        assert_eq!(perft(&position, 2), 191);
        assert_eq!(perft(&position, 3), 2812);
    }

    #[test]
    fn test_pinned_piece_cannot_leave_line() {
        // Bishop on e2 is pinned against the king by the rook on e8.
        let position = board("4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1");
        assert!(!pseudo_legal_moves(&position, sq("e2")).is_empty());
        assert!(legal_moves(&position, sq("e2")).is_empty());
    }

    #[test]
    fn test_is_attacked_patterns() {
        let position = board("4k3/8/8/3p4/8/5N2/8/R3K3 w - - 0 1");
        // Black pawn on d5 attacks c4 and e4, not d4.
        assert!(is_attacked(&position, sq("c4"), PieceColor::Black));
        assert!(is_attacked(&position, sq("e4"), PieceColor::Black));
        assert!(!is_attacked(&position, sq("d4"), PieceColor::Black));
        // Knight f3 hits e5 and g1.
        assert!(is_attacked(&position, sq("e5"), PieceColor::White));
        assert!(is_attacked(&position, sq("g1"), PieceColor::White));
        // Rook a1 sees up the a-file and along the rank until the king.
        assert!(is_attacked(&position, sq("a8"), PieceColor::White));
        assert!(is_attacked(&position, sq("d1"), PieceColor::White));
        assert!(!is_attacked(&position, sq("f1"), PieceColor::Black));
    }

    #[test]
    fn test_kingside_castling_requires_clear_safe_path() {
        let open = board("4k3/8/8/8/8/8/8/4K2R w K - 0 1");
        assert!(legal_moves(&open, sq("e1"))
            .iter()
            .any(|m| m.is_castle && m.to == sq("g1")));

        let blocked = board("4k3/8/8/8/8/8/8/4K1NR w K - 0 1");
        assert!(!legal_moves(&blocked, sq("e1")).iter().any(|m| m.is_castle));

        // Black rook on f8 covers f1, the transit square.
        let through_check = board("4kr2/8/8/8/8/8/8/4K2R w K - 0 1");
        assert!(!legal_moves(&through_check, sq("e1")).iter().any(|m| m.is_castle));

        // Cannot castle out of check.
        let in_check = board("4r1k1/8/8/8/8/8/8/4K2R w K - 0 1");
        assert!(!legal_moves(&in_check, sq("e1")).iter().any(|m| m.is_castle));

        let no_right = board("4k3/8/8/8/8/8/8/4K2R w - - 0 1");
        assert!(!legal_moves(&no_right, sq("e1")).iter().any(|m| m.is_castle));
    }

    #[test]
    fn test_queenside_castling_allows_attacked_b_file() {
        // b1 is attacked but the king never crosses it.
        let position = board("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        let castle = legal_moves(&position, sq("e1"))
            .into_iter()
            .find(|m| m.is_castle)
            .unwrap();
        assert_eq!(castle.to, sq("c1"));
        let after = apply_move(&position, &castle).unwrap();
        assert_eq!(
            after.piece_at(sq("d1")),
            Some(Piece::new(PieceKind::Rook, PieceColor::White))
        );
        assert_eq!(after.piece_at(sq("a1")), None);
        assert!(!after.castling_rights().white_queen_side);
    }

    #[test]
    fn test_king_move_forfeits_castling() {
        let position = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let after = apply_move(&position, &Move::new(sq("e1"), sq("f1"), PieceKind::King)).unwrap();
        let rights = after.castling_rights();
        assert!(!rights.white_king_side && !rights.white_queen_side);
        assert!(rights.black_king_side && rights.black_queen_side);
    }

    #[test]
    fn test_capturing_rook_forfeits_castling() {
        let position = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let after = apply_move(&position, &Move::new(sq("a1"), sq("a8"), PieceKind::Rook)).unwrap();
        assert_eq!(format_fen(&after), "R3k2r/8/8/8/8/8/8/4K2R b Kk - 0 1");
    }

    #[test]
    fn test_en_passant_capture() {
        let position = board("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        let ep = legal_moves(&position, sq("e5"))
            .into_iter()
            .find(|m| m.is_en_passant)
            .unwrap();
        assert_eq!(ep.to, sq("d6"));
        assert!(ep.is_capture);
        let after = apply_move(&position, &ep).unwrap();
        assert_eq!(after.piece_at(sq("d5")), None);
        assert_eq!(format_fen(&after), "4k3/8/3P4/8/8/8/8/4K3 b - - 0 2");
    }

    #[test]
    fn test_en_passant_expires() {
        let position = board("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 2");
        assert!(!legal_moves(&position, sq("e5")).iter().any(|m| m.is_en_passant));
    }

    #[test]
    fn test_promotion_generates_four_choices() {
        let position = board("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let moves = legal_moves(&position, sq("a7"));
        assert_eq!(moves.len(), 4);
        let after = apply_move(
            &position,
            &Move::new(sq("a7"), sq("a8"), PieceKind::Pawn).with_promotion(PieceKind::Knight),
        )
        .unwrap();
        assert_eq!(
            after.piece_at(sq("a8")),
            Some(Piece::new(PieceKind::Knight, PieceColor::White))
        );
    }

    #[test]
    fn test_apply_illegal_move_is_rejected() {
        let start = board(STARTING_FEN);
        let result = apply_move(&start, &Move::new(sq("e2"), sq("e5"), PieceKind::Pawn));
        assert_eq!(
            result,
            Err(MoveError::Illegal {
                from: sq("e2"),
                to: sq("e5")
            })
        );
        // Promotion must be named.
        let promo = board("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        assert!(apply_move(&promo, &Move::new(sq("a7"), sq("a8"), PieceKind::Pawn)).is_err());
    }

    #[test]
    fn test_clocks_update() {
        let start = board(STARTING_FEN);
        let after_knight =
            apply_move(&start, &Move::new(sq("g1"), sq("f3"), PieceKind::Knight)).unwrap();
        assert_eq!(after_knight.halfmove_clock(), 1);
        assert_eq!(after_knight.fullmove_number(), 1);
        let after_reply =
            apply_move(&after_knight, &Move::new(sq("e7"), sq("e5"), PieceKind::Pawn)).unwrap();
        assert_eq!(after_reply.halfmove_clock(), 0);
        assert_eq!(after_reply.fullmove_number(), 2);
        assert_eq!(after_reply.en_passant(), Some(sq("e6")));
    }

    #[test]
    fn test_status_checkmate() {
        // Fool's mate.
        let mated = board("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert_eq!(game_status(&mated), GameStatus::Checkmate);
        assert!(game_status(&mated).is_game_over());
    }

    #[test]
    fn test_status_stalemate() {
        let stalemate = board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(game_status(&stalemate), GameStatus::Stalemate);
    }

    #[test]
    fn test_status_check_and_normal() {
        let check = board("4k3/8/8/8/8/8/8/R3K3 b - - 0 1");
        assert_eq!(game_status(&check), GameStatus::Normal);
        let check = board("4k3/8/8/8/8/8/8/4KR2 b - - 0 1");
        assert_eq!(game_status(&check), GameStatus::Normal);
        let check = board("4k3/8/8/8/8/8/8/4RK2 b - - 0 1");
        assert_eq!(game_status(&check), GameStatus::Check);
    }

    #[test]
    fn test_play_move_flags_check() {
        let position = board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        let (_, played) =
            play_move(&position, &Move::new(sq("a1"), sq("a8"), PieceKind::Rook)).unwrap();
        assert!(played.is_check);
        assert!(!played.is_checkmate);
    }

    #[test]
    fn test_play_move_flags_checkmate() {
        let position = board("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1");
        let (after, played) =
            play_move(&position, &Move::new(sq("a1"), sq("a8"), PieceKind::Rook)).unwrap();
        assert!(played.is_check && played.is_checkmate);
        assert_eq!(game_status(&after), GameStatus::Checkmate);
    }
}
