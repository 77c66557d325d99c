//! Replaying recorded SAN tokens against a starting position.
//!
//! A token that does not resolve to a legal move is recorded as skipped and
//! replay carries on from the position already reached, so one corrupt move
//! never costs the rest of the game.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::board::Board;
use crate::fen::format_fen;
use crate::game::HistoryEntry;
use crate::movegen::play_move;
use crate::pgn::san::{format_san, resolve_san, SanError};

/// Shared flag checked between units of bulk work.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// What happened to a single token during replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TokenOutcome {
    /// The token resolved; `san` is the canonical rendering of the move played.
    Matched { token: String, san: String },
    Skipped { token: String, reason: SanError },
}

impl TokenOutcome {
    pub fn token(&self) -> &str {
        match self {
            Self::Matched { token, .. } | Self::Skipped { token, .. } => token,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub outcomes: Vec<TokenOutcome>,
    pub cancelled: bool,
}

impl ReplayReport {
    /// Every token matched and nothing was cut short.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.skipped_count() == 0
    }

    pub fn matched_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, TokenOutcome::Matched { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.matched_count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SanError)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            TokenOutcome::Skipped { token, reason } => Some((token.as_str(), reason)),
            TokenOutcome::Matched { .. } => None,
        })
    }
}

/// Result of a replay: final position, the moves actually played, and the
/// per-token report.
#[derive(Debug, Clone)]
pub struct Replay {
    pub board: Board,
    pub history: Vec<HistoryEntry>,
    pub report: ReplayReport,
}

pub fn replay_tokens<S: AsRef<str>>(start: &Board, tokens: &[S], cancel: &CancelToken) -> Replay {
    let mut board = start.clone();
    let mut history = Vec::with_capacity(tokens.len());
    let mut report = ReplayReport::default();

    for token in tokens {
        if cancel.is_cancelled() {
            tracing::debug!("Replay cancelled after {} tokens", report.outcomes.len());
            report.cancelled = true;
            break;
        }
        let token = token.as_ref();

        let played = resolve_san(&board, token).and_then(|mv| {
            play_move(&board, &mv).map_err(|_| SanError::NoLegalMove(token.to_string()))
        });
        match played {
            Ok((next, mv)) => {
                let san = format_san(&board, &mv);
                history.push(HistoryEntry::new(mv, san.clone(), next.clone()));
                report.outcomes.push(TokenOutcome::Matched {
                    token: token.to_string(),
                    san,
                });
                board = next;
            }
            Err(reason) => {
                tracing::warn!("Skipping token {:?} at {}: {}", token, format_fen(&board), reason);
                report.outcomes.push(TokenOutcome::Skipped {
                    token: token.to_string(),
                    reason,
                });
            }
        }
    }

    Replay {
        board,
        history,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;

    #[test]
    fn test_replays_clean_game() {
        let tokens = ["e4", "e5", "Nf3", "Nc6", "Bb5"];
        let replay = replay_tokens(&Board::starting_position(), &tokens, &CancelToken::new());

        assert!(replay.report.is_complete());
        assert_eq!(replay.report.matched_count(), 5);
        assert_eq!(replay.history.len(), 5);
        assert_eq!(
            format_fen(&replay.board),
            "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3"
        );
    }

    #[test]
    fn test_skips_bad_token_and_continues() {
        let tokens = ["e4", "e5", "Qh9", "Nf3"];
        let replay = replay_tokens(&Board::starting_position(), &tokens, &CancelToken::new());

        assert!(!replay.report.is_complete());
        assert_eq!(replay.report.matched_count(), 3);
        assert_eq!(replay.report.skipped_count(), 1);
        let skipped: Vec<_> = replay.report.skipped().collect();
        assert_eq!(skipped[0].0, "Qh9");
        assert_eq!(replay.history.last().map(|e| e.san.as_str()), Some("Nf3"));
    }

    #[test]
    fn test_illegal_token_skipped() {
        // Black to move, so a white move does not resolve.
        let tokens = ["e4", "d4"];
        let replay = replay_tokens(&Board::starting_position(), &tokens, &CancelToken::new());
        assert_eq!(replay.report.matched_count(), 1);
        assert!(matches!(
            replay.report.outcomes[1],
            TokenOutcome::Skipped {
                reason: SanError::NoLegalMove(_),
                ..
            }
        ));
    }

    #[test]
    fn test_canonical_san_recorded() {
        let start = parse_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let replay = replay_tokens(&start, &["Ra8"], &CancelToken::new());
        assert_eq!(
            replay.report.outcomes[0],
            TokenOutcome::Matched {
                token: "Ra8".to_string(),
                san: "Ra8#".to_string()
            }
        );
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let replay = replay_tokens(&Board::starting_position(), &["e4"], &cancel);
        assert!(replay.report.cancelled);
        assert!(replay.report.outcomes.is_empty());
        assert_eq!(replay.board, Board::starting_position());
    }

    #[test]
    fn test_clones_share_flag() {
        let cancel = CancelToken::new();
        let other = cancel.clone();
        other.cancel();
        assert!(cancel.is_cancelled());
    }
}
