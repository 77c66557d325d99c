//! Configuration for the scrambler CLI.
//!
//! Every value has a compile-time default and can be overridden at runtime
//! via a dedicated environment variable.

use std::path::PathBuf;

/// Default index of the game served when `--game` is omitted (the third game).
const DEFAULT_GAME: usize = chess::DEFAULT_GAME_INDEX;

/// Default tracing filter.
const DEFAULT_LOG_FILTER: &str = "info";

/// Filter directive added when game logging is switched on.
const GAME_LOGGING_DIRECTIVE: &str = "chess=debug";

/// Get the PGN file used when a command is given no path.
///
/// Returns the value of `SCRAMBLER_PGN_PATH`, or `None` when it is unset.
pub fn get_pgn_path() -> Option<PathBuf> {
    std::env::var_os("SCRAMBLER_PGN_PATH").map(PathBuf::from)
}

/// Get the index of the default game.
///
/// Priority:
/// 1. `SCRAMBLER_DEFAULT_GAME` env variable if set (falls back to default
///    if the value cannot be parsed as a `usize`)
/// 2. `2` as fallback
pub fn get_default_game() -> usize {
    if let Ok(index) = std::env::var("SCRAMBLER_DEFAULT_GAME") {
        return index.parse().unwrap_or(DEFAULT_GAME);
    }

    DEFAULT_GAME
}

/// Whether `SCRAMBLER_GAME_LOGGING` asks for verbose game logging.
pub fn get_game_logging() -> bool {
    std::env::var("SCRAMBLER_GAME_LOGGING")
        .map(|value| parse_flag(&value))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Get the tracing filter directives.
///
/// `SCRAMBLER_LOG` replaces the `info` default; game logging appends
/// `chess=debug`.
pub fn get_log_filter() -> String {
    let base = std::env::var("SCRAMBLER_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    build_filter(&base, get_game_logging())
}

fn build_filter(base: &str, game_logging: bool) -> String {
    if game_logging {
        format!("{},{}", base, GAME_LOGGING_DIRECTIVE)
    } else {
        base.to_string()
    }
}
