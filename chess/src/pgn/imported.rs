use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::Board;
use crate::fen::{format_fen, parse_fen, STARTING_FEN};
use crate::replay::{replay_tokens, CancelToken};

/// Plies played before each middlegame snapshot.
const SNAPSHOT_PLIES: [usize; 5] = [8, 12, 16, 20, 24];

/// A game read from PGN text, kept as tags plus raw SAN tokens.
///
/// Tokens are not validated at import; replay decides which of them are
/// playable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedGame {
    id: Uuid,
    tags: BTreeMap<String, String>,
    san_tokens: Vec<String>,
    raw_text: String,
    #[serde(skip)]
    snapshots: OnceLock<Vec<String>>,
}

impl ImportedGame {
    pub fn new(tags: BTreeMap<String, String>, san_tokens: Vec<String>, raw_text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            tags,
            san_tokens,
            raw_text,
            snapshots: OnceLock::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn san_tokens(&self) -> &[String] {
        &self.san_tokens
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    fn tag_or<'a>(&'a self, name: &str, fallback: &'a str) -> &'a str {
        self.tag(name).unwrap_or(fallback)
    }

    pub fn white(&self) -> &str {
        self.tag_or("White", "Unknown")
    }

    pub fn black(&self) -> &str {
        self.tag_or("Black", "Unknown")
    }

    pub fn event(&self) -> &str {
        self.tag_or("Event", "Unknown Event")
    }

    pub fn site(&self) -> &str {
        self.tag_or("Site", "Unknown Site")
    }

    pub fn date(&self) -> &str {
        self.tag_or("Date", "????.??.??")
    }

    pub fn round(&self) -> &str {
        self.tag_or("Round", "?")
    }

    pub fn result(&self) -> &str {
        self.tag_or("Result", "*")
    }

    /// ECO code, empty when the tag is absent.
    pub fn opening(&self) -> &str {
        self.tag_or("ECO", "")
    }

    pub fn display_name(&self) -> String {
        format!("{} vs {} ({})", self.white(), self.black(), self.date())
    }

    /// FEN the game starts from: the `FEN` tag when present, else the
    /// standard initial position.
    pub fn start_fen(&self) -> &str {
        self.tag_or("FEN", STARTING_FEN)
    }

    pub fn start_board(&self) -> Board {
        match self.tag("FEN") {
            Some(fen) => parse_fen(fen).unwrap_or_else(|e| {
                tracing::warn!(
                    "Ignoring bad FEN tag in {}: {}",
                    self.display_name(),
                    e
                );
                Board::starting_position()
            }),
            None => Board::starting_position(),
        }
    }

    /// Positions a few moves into the game, computed on first use.
    ///
    /// Between three and five snapshots are taken (one per ten tokens), after
    /// 8, 12, 16, 20 and 24 plies. Games shorter than a snapshot's ply count
    /// yield the final position for it.
    pub fn middlegame_fens(&self) -> &[String] {
        self.snapshots.get_or_init(|| {
            let count = (self.san_tokens.len() / 10).clamp(3, 5);
            let start = self.start_board();
            let cancel = CancelToken::new();
            let fens: Vec<String> = SNAPSHOT_PLIES[..count]
                .iter()
                .map(|plies| {
                    let end = (*plies).min(self.san_tokens.len());
                    let replay = replay_tokens(&start, &self.san_tokens[..end], &cancel);
                    format_fen(&replay.board)
                })
                .collect();
            tracing::debug!(
                "Computed {} middlegame snapshots for {}",
                fens.len(),
                self.display_name()
            );
            fens
        })
    }

    /// Snapshot `index`, wrapping around the available snapshots.
    pub fn middlegame_fen(&self, index: usize) -> String {
        let fens = self.middlegame_fens();
        if fens.is_empty() {
            return STARTING_FEN.to_string();
        }
        fens[index % fens.len()].clone()
    }
}
