pub mod bank;
pub mod board;
pub mod board_display;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod pgn;
pub mod replay;
pub mod types;
pub mod uci;

pub use bank::{GameBank, ImportSummary, DEFAULT_GAME_INDEX};
pub use board::{Board, CastlingRights};
pub use board_display::render_board;
pub use fen::{format_fen, parse_fen, FenError, STARTING_FEN};
pub use game::{Game, GameError, GameResult, HistoryEntry};
pub use movegen::{
    all_legal_moves, apply_move, game_status, is_attacked, is_in_check, legal_moves, perft,
    play_move, pseudo_legal_moves, resolve_move, GameStatus, MoveError, MoveList,
};
pub use pgn::{format_san, parse_pgn, resolve_san, write_pgn, ImportedGame, PgnImport, SanError};
pub use replay::{replay_tokens, CancelToken, Replay, ReplayReport, TokenOutcome};
pub use types::{Move, Piece, PieceColor, PieceKind, Square};
pub use uci::{format_uci_move, parse_uci_move, UciError, UciMove};
