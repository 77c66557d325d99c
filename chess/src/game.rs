use std::collections::BTreeMap;

use serde::Serialize;

use crate::board::Board;
use crate::fen::{format_fen, parse_fen, FenError, STARTING_FEN};
use crate::movegen::{all_legal_moves, game_status, play_move, GameStatus, MoveError};
use crate::pgn::imported::ImportedGame;
use crate::pgn::san::{format_san, resolve_san, SanError};
use crate::pgn::writer::format_movetext;
use crate::replay::{replay_tokens, CancelToken, ReplayReport};
use crate::types::{Move, PieceColor};

/// A linear move list with a cursor for navigating back and forth.
///
/// Making a move while the cursor is behind the last move discards the
/// moves after the cursor.
#[derive(Debug, Clone)]
pub struct Game {
    initial_fen: String,
    initial: Board,
    history: Vec<HistoryEntry>,
    /// Index of the move the position is shown after; `None` is the start.
    cursor: Option<usize>,
    tags: BTreeMap<String, String>,
}

/// A played move together with the position it produced.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub mv: Move,
    pub san: String,
    pub fen_after: String,
    #[serde(skip)]
    pub position: Board,
}

impl HistoryEntry {
    pub fn new(mv: Move, san: String, position: Board) -> Self {
        Self {
            mv,
            san,
            fen_after: format_fen(&position),
            position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    Ongoing,
}

impl GameResult {
    /// PGN result token.
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Ongoing => "*",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "1-0" => Self::WhiteWins,
            "0-1" => Self::BlackWins,
            "1/2-1/2" => Self::Draw,
            _ => Self::Ongoing,
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self::with_board(Board::starting_position())
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        Ok(Self::with_board(parse_fen(fen)?))
    }

    fn with_board(initial: Board) -> Self {
        Self {
            initial_fen: format_fen(&initial),
            initial,
            history: Vec::new(),
            cursor: None,
            tags: BTreeMap::new(),
        }
    }

    /// Rebuild a game by replaying an imported game's tokens.
    ///
    /// Unplayable tokens are skipped and listed in the report. The cursor
    /// ends on the last move played.
    pub fn from_imported(imported: &ImportedGame, cancel: &CancelToken) -> (Self, ReplayReport) {
        let mut game = Self::with_board(imported.start_board());
        game.tags = imported.tags().clone();

        let replay = replay_tokens(&game.initial, imported.san_tokens(), cancel);
        if !replay.report.is_complete() {
            tracing::warn!(
                "Replayed {} of {} tokens for {}",
                replay.report.matched_count(),
                imported.san_tokens().len(),
                imported.display_name()
            );
        }
        game.history = replay.history;
        game.cursor = game.history.len().checked_sub(1);
        (game, replay.report)
    }

    pub fn initial_fen(&self) -> &str {
        &self.initial_fen
    }

    /// Whether the game starts from the standard initial position.
    pub fn is_standard_start(&self) -> bool {
        self.initial_fen == STARTING_FEN
    }

    pub fn initial_board(&self) -> &Board {
        &self.initial
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn set_tag(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(name.into(), value.into());
    }

    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    /// Board at the cursor.
    pub fn position(&self) -> &Board {
        match self.cursor {
            Some(index) => &self.history[index].position,
            None => &self.initial,
        }
    }

    /// Export the position at the cursor to FEN
    pub fn to_fen(&self) -> String {
        format_fen(self.position())
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.position().side_to_move()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        all_legal_moves(self.position())
    }

    pub fn status(&self) -> GameStatus {
        game_status(self.position())
    }

    /// Result implied by the position at the cursor.
    pub fn result(&self) -> GameResult {
        match self.status() {
            GameStatus::Checkmate => match self.side_to_move() {
                PieceColor::White => GameResult::BlackWins,
                PieceColor::Black => GameResult::WhiteWins,
            },
            GameStatus::Stalemate => GameResult::Draw,
            GameStatus::Normal | GameStatus::Check => GameResult::Ongoing,
        }
    }

    /// Append an entry after the cursor, dropping any moves past it.
    pub fn add_move(&mut self, entry: HistoryEntry) {
        let keep = self.cursor.map_or(0, |index| index + 1);
        self.history.truncate(keep);
        self.history.push(entry);
        self.cursor = Some(self.history.len() - 1);
    }

    /// Validate and play a move at the cursor position.
    pub fn make_move(&mut self, mv: &Move) -> Result<&HistoryEntry, GameError> {
        let before = self.position();
        let (after, played) = play_move(before, mv)?;
        let san = format_san(before, &played);
        tracing::debug!("Played {} -> {}", san, format_fen(&after));

        self.add_move(HistoryEntry::new(played, san, after));
        Ok(&self.history[self.history.len() - 1])
    }

    /// Play a move written in SAN at the cursor position.
    pub fn make_san_move(&mut self, san: &str) -> Result<&HistoryEntry, GameError> {
        let mv = resolve_san(self.position(), san)?;
        self.make_move(&mv)
    }

    /// Move the cursor. `None` is the initial position; out-of-range indices
    /// are ignored. Returns whether the cursor was accepted.
    pub fn go_to(&mut self, index: Option<usize>) -> bool {
        match index {
            Some(i) if i >= self.history.len() => false,
            _ => {
                self.cursor = index;
                true
            }
        }
    }

    pub fn go_to_first(&mut self) {
        self.cursor = None;
    }

    pub fn go_to_last(&mut self) {
        self.cursor = self.history.len().checked_sub(1);
    }

    pub fn go_to_previous(&mut self) {
        if let Some(index) = self.cursor {
            self.cursor = index.checked_sub(1);
        }
    }

    pub fn go_to_next(&mut self) {
        if self.can_go_forward() {
            self.cursor = Some(self.cursor.map_or(0, |index| index + 1));
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_go_forward(&self) -> bool {
        match self.cursor {
            Some(index) => index + 1 < self.history.len(),
            None => !self.history.is_empty(),
        }
    }

    pub fn moves_up_to_current(&self) -> &[HistoryEntry] {
        &self.history[..self.cursor.map_or(0, |index| index + 1)]
    }

    /// Numbered SAN for the moves up to the cursor, e.g. `1. e4 e5 2. Nf3`.
    pub fn move_history_text(&self) -> String {
        let sans: Vec<&str> = self
            .moves_up_to_current()
            .iter()
            .map(|entry| entry.san.as_str())
            .collect();
        format_movetext(
            &sans,
            self.initial.fullmove_number(),
            self.initial.side_to_move() == PieceColor::Black,
        )
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    IllegalMove(#[from] MoveError),
    #[error("SAN error: {0}")]
    San(#[from] SanError),
    #[error("FEN parse error: {0}")]
    Fen(#[from] FenError),
}
