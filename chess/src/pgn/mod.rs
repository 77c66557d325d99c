//! PGN import and export, plus SAN in both directions.

pub mod imported;
pub mod parser;
pub mod san;
pub mod writer;

pub use imported::ImportedGame;
pub use parser::{parse_game, parse_pgn, parse_pgn_cancellable, PgnImport};
pub use san::{format_san, resolve_san, SanError};
pub use writer::{format_movetext, write_pgn};
