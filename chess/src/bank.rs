//! An owned collection of imported games.

use serde::Serialize;
use uuid::Uuid;

use crate::pgn::imported::ImportedGame;
use crate::pgn::parser::parse_pgn_cancellable;
use crate::replay::CancelToken;

/// Position of the game served by [`GameBank::default_game`]: the third
/// imported game.
pub const DEFAULT_GAME_INDEX: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub dropped: usize,
    /// Games held after the import.
    pub total: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone)]
pub struct GameBank {
    games: Vec<ImportedGame>,
    default_index: usize,
}

impl GameBank {
    pub fn new() -> Self {
        Self::with_default_index(DEFAULT_GAME_INDEX)
    }

    pub fn with_default_index(default_index: usize) -> Self {
        Self {
            games: Vec::new(),
            default_index,
        }
    }

    pub fn import_pgn(&mut self, text: &str) -> ImportSummary {
        self.import_pgn_cancellable(text, &CancelToken::new())
    }

    /// Parse `text` and append its games. Games parsed before cancellation
    /// are kept.
    pub fn import_pgn_cancellable(&mut self, text: &str, cancel: &CancelToken) -> ImportSummary {
        if text.trim().is_empty() {
            tracing::debug!("PGN content is empty, skipping import");
            return ImportSummary {
                total: self.games.len(),
                ..ImportSummary::default()
            };
        }

        let import = parse_pgn_cancellable(text, cancel);
        let summary = ImportSummary {
            imported: import.games.len(),
            dropped: import.dropped_blocks,
            total: self.games.len() + import.games.len(),
            cancelled: import.cancelled,
        };
        self.games.extend(import.games);

        tracing::info!(
            "Imported {} games ({} dropped), {} total",
            summary.imported,
            summary.dropped,
            summary.total
        );
        summary
    }

    pub fn games(&self) -> &[ImportedGame] {
        &self.games
    }

    pub fn get(&self, id: Uuid) -> Option<&ImportedGame> {
        self.games.iter().find(|game| game.id() == id)
    }

    /// Games where either player's name contains `name`, ignoring case.
    pub fn games_by_player(&self, name: &str) -> Vec<&ImportedGame> {
        let needle = name.to_lowercase();
        self.games
            .iter()
            .filter(|game| {
                game.white().to_lowercase().contains(&needle)
                    || game.black().to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Games whose ECO code contains `eco`, ignoring case.
    pub fn games_by_opening(&self, eco: &str) -> Vec<&ImportedGame> {
        let needle = eco.to_lowercase();
        self.games
            .iter()
            .filter(|game| game.opening().to_lowercase().contains(&needle))
            .collect()
    }

    pub fn default_game(&self) -> Option<&ImportedGame> {
        self.games.get(self.default_index)
    }

    pub fn default_index(&self) -> usize {
        self.default_index
    }

    pub fn clear(&mut self) {
        tracing::debug!("Clearing {} games", self.games.len());
        self.games.clear();
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl Default for GameBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pgn(games: &[(&str, &str, &str, &str)]) -> String {
        games
            .iter()
            .map(|(white, black, eco, moves)| {
                format!(
                    "[Event \"Test\"]\n[White \"{}\"]\n[Black \"{}\"]\n[ECO \"{}\"]\n\n{}\n\n",
                    white, black, eco, moves
                )
            })
            .collect()
    }

    fn sample_bank() -> GameBank {
        let mut bank = GameBank::new();
        bank.import_pgn(&pgn(&[
            ("Carlsen, Magnus", "Nakamura, Hikaru", "C65", "1. e4 e5 2. Nf3 Nc6 3. Bb5 Nf6"),
            ("Caruana, Fabiano", "Carlsen, Magnus", "D37", "1. d4 d5 2. c4 e6"),
            ("Ding, Liren", "Nepomniachtchi, Ian", "C65", "1. e4 e5"),
        ]));
        bank
    }

    #[test]
    fn test_import_summary() {
        let mut bank = GameBank::new();
        let text = format!(
            "{}[Event \"Broken\"]\n[White \"X\"]\n",
            pgn(&[("A", "B", "", "1. e4")])
        );
        let summary = bank.import_pgn(&text);
        assert_eq!(
            summary,
            ImportSummary {
                imported: 1,
                dropped: 1,
                total: 1,
                cancelled: false
            }
        );

        let again = bank.import_pgn(&pgn(&[("C", "D", "", "1. d4")]));
        assert_eq!(again.total, 2);
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn test_empty_import_is_noop() {
        let mut bank = GameBank::new();
        assert_eq!(bank.import_pgn("  \n"), ImportSummary::default());
        assert!(bank.is_empty());
    }

    #[test]
    fn test_default_game_is_third() {
        let bank = sample_bank();
        assert_eq!(bank.default_game().map(|g| g.white()), Some("Ding, Liren"));

        let mut small = GameBank::new();
        small.import_pgn(&pgn(&[("A", "B", "", "1. e4")]));
        assert!(small.default_game().is_none());

        let mut first = GameBank::with_default_index(0);
        first.import_pgn(&pgn(&[("A", "B", "", "1. e4")]));
        assert_eq!(first.default_game().map(|g| g.white()), Some("A"));
    }

    #[test]
    fn test_queries() {
        let bank = sample_bank();
        assert_eq!(bank.games_by_player("carlsen").len(), 2);
        assert_eq!(bank.games_by_player("LIREN").len(), 1);
        assert!(bank.games_by_player("Kasparov").is_empty());
        assert_eq!(bank.games_by_opening("c65").len(), 2);

        let id = bank.games()[1].id();
        assert_eq!(bank.get(id).map(|g| g.opening()), Some("D37"));
        assert!(bank.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_clear() {
        let mut bank = sample_bank();
        bank.clear();
        assert!(bank.is_empty());
        assert!(bank.default_game().is_none());
    }

    #[test]
    fn test_cancelled_import_keeps_nothing_new() {
        let mut bank = GameBank::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let summary = bank.import_pgn_cancellable(&pgn(&[("A", "B", "", "1. e4")]), &cancel);
        assert!(summary.cancelled);
        assert_eq!(summary.imported, 0);
        assert!(bank.is_empty());
    }
}
