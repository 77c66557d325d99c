//! Command handlers. Each returns the text to print so the handlers can be
//! tested without touching stdout.

use chess::pgn::ImportedGame;
use chess::{
    all_legal_moves, format_san, game_status, parse_fen, parse_uci_move, play_move,
    render_board, write_pgn, CancelToken, Game, GameBank, GameResult, GameStatus, ReplayReport,
};
use serde::Serialize;

use crate::CliError;

/// One line of `games` output.
#[derive(Debug, Serialize)]
pub struct GameSummary<'a> {
    pub index: usize,
    pub id: String,
    pub white: &'a str,
    pub black: &'a str,
    pub date: &'a str,
    pub event: &'a str,
    pub eco: &'a str,
    pub result: &'a str,
    pub moves: usize,
}

#[derive(Debug, Serialize)]
struct ReplayOutput<'a> {
    game: String,
    ply: Option<usize>,
    fen: String,
    status: GameStatus,
    result: GameResult,
    moves: Vec<&'a str>,
    report: &'a ReplayReport,
}

pub fn list_games(
    bank: &GameBank,
    player: Option<&str>,
    opening: Option<&str>,
    json: bool,
) -> Result<String, CliError> {
    let by_player = player.map(|name| bank.games_by_player(name));
    let by_opening = opening.map(|eco| bank.games_by_opening(eco));
    let summaries: Vec<GameSummary> = bank
        .games()
        .iter()
        .enumerate()
        .filter(|(_, game)| {
            passes(by_player.as_deref(), game) && passes(by_opening.as_deref(), game)
        })
        .map(|(index, game)| GameSummary {
            index,
            id: game.id().to_string(),
            white: game.white(),
            black: game.black(),
            date: game.date(),
            event: game.event(),
            eco: game.opening(),
            result: game.result(),
            moves: game.san_tokens().len(),
        })
        .collect();

    if json {
        return Ok(serde_json::to_string_pretty(&summaries)?);
    }

    let mut out = String::new();
    for summary in &summaries {
        out.push_str(&format!(
            "{:>3}  {} vs {} ({})  {}  {}  [{} moves]\n",
            summary.index,
            summary.white,
            summary.black,
            summary.date,
            if summary.eco.is_empty() { "---" } else { summary.eco },
            summary.result,
            summary.moves
        ));
    }
    if summaries.is_empty() {
        out.push_str("No games found.\n");
    }
    Ok(out)
}

/// A missing filter lets every game through.
fn passes(filter: Option<&[&ImportedGame]>, game: &ImportedGame) -> bool {
    filter.map_or(true, |games| games.iter().any(|g| g.id() == game.id()))
}

/// Pick `index` or the bank's default game.
pub fn select_game(bank: &GameBank, index: Option<usize>) -> Result<&ImportedGame, CliError> {
    let wanted = index.unwrap_or(bank.default_index());
    bank.games().get(wanted).ok_or(CliError::NoSuchGame {
        index: wanted,
        count: bank.len(),
    })
}

/// Replay a game, optionally stopping the cursor at `ply` (0 is the start).
pub fn replay(game: &ImportedGame, ply: Option<usize>, json: bool) -> Result<String, CliError> {
    let (mut replayed, report) = Game::from_imported(game, &CancelToken::new());
    if let Some(ply) = ply {
        if !replayed.go_to(ply.checked_sub(1)) {
            return Err(CliError::NoSuchPly {
                ply,
                count: replayed.history().len(),
            });
        }
    }

    if json {
        let output = ReplayOutput {
            game: game.display_name(),
            ply: replayed.current_index().map(|index| index + 1),
            fen: replayed.to_fen(),
            status: replayed.status(),
            result: replayed.result(),
            moves: replayed
                .moves_up_to_current()
                .iter()
                .map(|entry| entry.san.as_str())
                .collect(),
            report: &report,
        };
        return Ok(serde_json::to_string_pretty(&output)?);
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n", game.display_name()));
    out.push_str(&render_board(replayed.position()));
    out.push_str(&format!("FEN: {}\n", replayed.to_fen()));
    out.push_str(&format!("Status: {:?}\n", replayed.status()));
    out.push_str(&format!("Moves: {}\n", replayed.move_history_text()));
    if !report.is_complete() {
        out.push_str(&format!(
            "Replayed {} of {} tokens{}\n",
            report.matched_count(),
            game.san_tokens().len(),
            if report.cancelled { " (cancelled)" } else { "" }
        ));
        for (token, reason) in report.skipped() {
            out.push_str(&format!("  skipped {}: {}\n", token, reason));
        }
    }
    Ok(out)
}

pub fn snapshots(game: &ImportedGame) -> Result<String, CliError> {
    let mut out = String::new();
    out.push_str(&format!("{}\n", game.display_name()));
    for (i, fen) in game.middlegame_fens().iter().enumerate() {
        let board = parse_fen(fen)?;
        out.push_str(&format!("\n#{} {}\n", i + 1, fen));
        out.push_str(&render_board(&board));
    }
    Ok(out)
}

/// Describe a position: board, status and every legal move in SAN.
pub fn position(fen: &str) -> Result<String, CliError> {
    let board = parse_fen(fen)?;

    let mut sans: Vec<String> = all_legal_moves(&board)
        .iter()
        .filter_map(|mv| play_move(&board, mv).ok())
        .map(|(_, played)| format_san(&board, &played))
        .collect();
    sans.sort();

    let mut out = render_board(&board);
    out.push_str(&format!("Side to move: {}\n", board.side_to_move().as_str()));
    out.push_str(&format!("Status: {:?}\n", game_status(&board)));
    out.push_str(&format!("Legal moves ({}): {}\n", sans.len(), sans.join(" ")));
    Ok(out)
}

/// Play coordinate moves from `fen` (or the start) and print the game as PGN.
pub fn play(fen: Option<&str>, moves: &[String]) -> Result<String, CliError> {
    let mut game = match fen {
        Some(fen) => Game::from_fen(fen)?,
        None => Game::new(),
    };
    for text in moves {
        let uci = parse_uci_move(text)?;
        let mv = uci.resolve(game.position())?;
        game.make_move(&mv)?;
    }
    Ok(write_pgn(&game))
}

/// Replay a game and print it back as normalized PGN.
pub fn export(game: &ImportedGame) -> Result<String, CliError> {
    let (replayed, report) = Game::from_imported(game, &CancelToken::new());
    if !report.is_complete() {
        tracing::warn!(
            "Exporting {} with {} skipped tokens",
            game.display_name(),
            report.skipped_count()
        );
    }
    Ok(write_pgn(&replayed))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PGN: &str = "[Event \"One\"]\n[White \"Alice\"]\n[Black \"Bob\"]\n[ECO \"C20\"]\n\n\
1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7# 1-0\n\n\
[Event \"Two\"]\n[White \"Carol\"]\n[Black \"Alice\"]\n\n1. d4 d5 *\n\n\
[Event \"Three\"]\n[White \"Dave\"]\n[Black \"Erin\"]\n\n1. e4 c5 2. Nf3 Qz9 3. d4 *\n";

    fn bank() -> GameBank {
        let mut bank = GameBank::new();
        bank.import_pgn(PGN);
        bank
    }

    #[test]
    fn test_list_games_filters() {
        let bank = bank();
        let all = list_games(&bank, None, None, false).unwrap();
        assert_eq!(all.lines().count(), 3);

        let alice = list_games(&bank, Some("alice"), None, false).unwrap();
        assert_eq!(alice.lines().count(), 2);

        let eco = list_games(&bank, None, Some("c20"), false).unwrap();
        assert!(eco.contains("Alice vs Bob"));
        assert_eq!(eco.lines().count(), 1);

        let none = list_games(&bank, Some("Zed"), None, false).unwrap();
        assert_eq!(none, "No games found.\n");
    }

    #[test]
    fn test_list_games_json() {
        let bank = bank();
        let json = list_games(&bank, None, None, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(3));
        assert_eq!(value[0]["white"], "Alice");
        assert_eq!(value[0]["moves"], 7);
    }

    #[test]
    fn test_select_game_defaults_to_third() {
        let bank = bank();
        assert_eq!(select_game(&bank, None).unwrap().white(), "Dave");
        assert_eq!(select_game(&bank, Some(1)).unwrap().white(), "Carol");
        assert!(matches!(
            select_game(&bank, Some(9)),
            Err(CliError::NoSuchGame { index: 9, count: 3 })
        ));
    }

    #[test]
    fn test_replay_reports_skipped_tokens() {
        let bank = bank();
        let out = replay(&bank.games()[2], None, false).unwrap();
        assert!(out.contains("Moves: 1. e4 c5 2. Nf3\n"));
        assert!(out.contains("Replayed 3 of 4 tokens\n"));
        assert!(out.contains("skipped d4"));
    }

    #[test]
    fn test_replay_at_ply_json() {
        let bank = bank();
        let json = replay(&bank.games()[0], Some(2), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["ply"], 2);
        assert_eq!(value["moves"], serde_json::json!(["e4", "e5"]));
        assert_eq!(value["status"], "Normal");
        assert_eq!(value["report"]["cancelled"], false);

        assert!(matches!(
            replay(&bank.games()[0], Some(50), false),
            Err(CliError::NoSuchPly { ply: 50, count: 7 })
        ));
    }

    #[test]
    fn test_position_lists_moves() {
        let out = position(chess::STARTING_FEN).unwrap();
        assert!(out.contains("Legal moves (20):"));
        assert!(out.contains("Nf3"));
        assert!(matches!(position("bad fen"), Err(CliError::Fen(_))));
    }

    #[test]
    fn test_play_prints_pgn() {
        let moves: Vec<String> = ["f2f3", "e7e5", "g2g4", "d8h4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let pgn = play(None, &moves).unwrap();
        assert!(pgn.contains("[Result \"0-1\"]"));
        assert!(pgn.contains("1. f3 e5 2. g4 Qh4# 0-1"));

        let illegal = play(None, &["e2e5".to_string()]);
        assert!(matches!(illegal, Err(CliError::Move(_))));
    }

    #[test]
    fn test_export_and_snapshots() {
        let bank = bank();
        let pgn = export(&bank.games()[0]).unwrap();
        assert!(pgn.contains("[White \"Alice\"]"));
        assert!(pgn.contains("4. Qxf7# 1-0"));

        let out = snapshots(&bank.games()[0]).unwrap();
        assert!(out.contains("#3 "));
    }
}
