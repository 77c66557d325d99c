//! Plain-text board rendering for terminals and logs.

use crate::board::Board;
use crate::types::Square;

/// Render the placement with rank labels, `.` for empty squares and a file
/// footer. White pieces are uppercase.
///
/// ```text
/// 8 r n b q k b n r
/// ...
/// 1 R N B Q K B N R
///   a b c d e f g h
/// ```
pub fn render_board(board: &Board) -> String {
    let mut out = String::with_capacity(8 * 18 + 18);
    for row in 0..8u8 {
        out.push((b'8' - row) as char);
        for col in 0..8u8 {
            out.push(' ');
            out.push(
                board
                    .piece_at(Square::at(row, col))
                    .map_or('.', |piece| piece.fen_char()),
            );
        }
        out.push('\n');
    }
    out.push_str("  a b c d e f g h\n");
    out
}
