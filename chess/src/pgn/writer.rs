use crate::game::{Game, GameResult};
use crate::types::PieceColor;

/// Tags every exported game carries, in export order.
const SEVEN_TAG_ROSTER: [&str; 7] = ["Event", "Site", "Date", "Round", "White", "Black", "Result"];

const MAX_LINE: usize = 80;

/// Render a game as PGN.
///
/// The result comes from the final position when it is decisive, otherwise
/// from the game's `Result` tag. Missing roster tags are written with the
/// standard PGN `?` placeholder (`????.??.??` for the date), not the
/// "Unknown ..." display names [`ImportedGame`](crate::pgn::ImportedGame)
/// reports for absent tags. An exported game reads back with `?` in them.
pub fn write_pgn(game: &Game) -> String {
    let mut at_end = game.clone();
    at_end.go_to_last();
    let sans: Vec<&str> = game.history().iter().map(|e| e.san.as_str()).collect();

    let result = match at_end.result() {
        GameResult::Ongoing => game
            .tags()
            .get("Result")
            .map(|tag| GameResult::from_tag(tag))
            .unwrap_or(GameResult::Ongoing),
        decided => decided,
    };

    let mut out = String::new();
    for name in SEVEN_TAG_ROSTER {
        let value = match name {
            "Result" => result.as_tag().to_string(),
            "Date" => tag_value(game, name, "????.??.??"),
            _ => tag_value(game, name, "?"),
        };
        push_tag(&mut out, name, &value);
    }
    if !game.is_standard_start() {
        push_tag(&mut out, "SetUp", "1");
        push_tag(&mut out, "FEN", game.initial_fen());
    }
    for (name, value) in game.tags() {
        if SEVEN_TAG_ROSTER.contains(&name.as_str()) || name == "SetUp" || name == "FEN" {
            continue;
        }
        push_tag(&mut out, name, value);
    }
    out.push('\n');

    let initial = game.initial_board();
    let movetext = format_movetext(
        &sans,
        initial.fullmove_number(),
        initial.side_to_move() == PieceColor::Black,
    );
    let mut words: Vec<&str> = movetext.split(' ').filter(|w| !w.is_empty()).collect();
    words.push(result.as_tag());
    out.push_str(&wrap(&words));
    out.push('\n');
    out
}

fn tag_value(game: &Game, name: &str, fallback: &str) -> String {
    game.tags()
        .get(name)
        .filter(|value| !value.is_empty())
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

fn push_tag(out: &mut String, name: &str, value: &str) {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    out.push_str(&format!("[{} \"{}\"]\n", name, escaped));
}

fn wrap(words: &[&str]) -> String {
    let mut out = String::new();
    let mut line_len = 0;
    for word in words {
        if line_len > 0 && line_len + 1 + word.len() > MAX_LINE {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        out.push_str(word);
        line_len += word.len();
    }
    out
}

/// Number a list of SAN moves. A game starting with Black to move opens
/// with `N...`.
pub fn format_movetext<S: AsRef<str>>(sans: &[S], first_fullmove: u32, black_first: bool) -> String {
    let mut out = String::new();
    let mut number = first_fullmove;
    let mut white_to_move = !black_first;

    for (i, san) in sans.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        if white_to_move {
            out.push_str(&format!("{}. ", number));
        } else if i == 0 {
            out.push_str(&format!("{}... ", number));
        }
        out.push_str(san.as_ref());
        if !white_to_move {
            number += 1;
        }
        white_to_move = !white_to_move;
    }
    out
}
