use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use super::imported::ImportedGame;
use crate::replay::CancelToken;

/// Outcome of importing a PGN document.
#[derive(Debug, Clone, Default)]
pub struct PgnImport {
    pub games: Vec<ImportedGame>,
    /// Blocks that produced no moves.
    pub dropped_blocks: usize,
    pub cancelled: bool,
}

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r#"^\[(\w+)\s+"((?:[^"\\]|\\.)*)"\]$"#).expect("valid tag regex"))
}

fn move_regex() -> &'static Regex {
    static MOVE: OnceLock<Regex> = OnceLock::new();
    MOVE.get_or_init(|| {
        Regex::new(
            r"(?:\d+\.+\s*)?((?:O-O-O|O-O|0-0-0|0-0)[+#]?|[NBRQK]?[a-h]?[1-8]?x?[a-h][1-8](?:=?[NBRQ])?[+#]?)",
        )
        .expect("valid move regex")
    })
}

/// Parse every game in a PGN document.
///
/// Blocks without a single recognizable move are dropped and counted rather
/// than failing the import.
pub fn parse_pgn(text: &str) -> PgnImport {
    parse_pgn_cancellable(text, &CancelToken::new())
}

/// As [`parse_pgn`], checking `cancel` between blocks.
pub fn parse_pgn_cancellable(text: &str, cancel: &CancelToken) -> PgnImport {
    let blocks = split_games(text);
    tracing::debug!("Split PGN into {} game blocks", blocks.len());

    let mut import = PgnImport::default();
    for block in blocks {
        if cancel.is_cancelled() {
            tracing::debug!("PGN import cancelled after {} games", import.games.len());
            import.cancelled = true;
            break;
        }
        match parse_game(&block) {
            Some(game) => {
                tracing::debug!(
                    "Parsed game: {} with {} moves",
                    game.display_name(),
                    game.san_tokens().len()
                );
                import.games.push(game);
            }
            None => {
                let first_line = block.lines().next().unwrap_or_default();
                tracing::warn!("Dropping game block without moves: {}", first_line);
                import.dropped_blocks += 1;
            }
        }
    }
    import
}

/// Split a PGN document into per-game blocks.
///
/// A block starts at the first tag line. A new `[Event` tag after any
/// content closes the current block. Text before the first tag is ignored
/// and blank lines are dropped.
pub fn split_games(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_game = false;

    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            if in_game && !current.is_empty() && line.starts_with("[Event") {
                blocks.push(current.join("\n"));
                current.clear();
            }
            in_game = true;
            current.push(line);
        } else if in_game && !line.is_empty() {
            current.push(line);
        }
    }

    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
}

/// Collect `[Name "Value"]` tag lines. Later duplicates win.
pub fn parse_tags(block: &str) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    for line in block.lines().map(str::trim).filter(|l| l.starts_with('[')) {
        match tag_regex().captures(line) {
            Some(caps) => {
                tags.insert(caps[1].to_string(), unescape_tag_value(&caps[2]));
            }
            None => tracing::debug!("Skipping malformed tag line: {}", line),
        }
    }
    tags
}

/// Undo the `\"` and `\\` escapes allowed inside tag values.
fn unescape_tag_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Extract SAN tokens from movetext.
///
/// Comments, variations, move numbers, annotations and result markers are
/// discarded.
pub fn tokenize_movetext(text: &str) -> Vec<String> {
    let stripped = strip_comments(text);
    move_regex()
        .captures_iter(&stripped)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Remove `{...}` comments, `;` rest-of-line comments and `(...)`
/// variations, which may nest.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_brace = false;
    let mut in_line_comment = false;
    let mut depth = 0usize;

    for c in text.chars() {
        if in_line_comment {
            if c == '\n' {
                in_line_comment = false;
                out.push(' ');
            }
            continue;
        }
        if in_brace {
            if c == '}' {
                in_brace = false;
                out.push(' ');
            }
            continue;
        }
        match c {
            '{' => in_brace = true,
            ';' => in_line_comment = true,
            '(' => depth += 1,
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    out.push(' ');
                }
            }
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Build a game from one block, or `None` when the block has no moves.
pub fn parse_game(block: &str) -> Option<ImportedGame> {
    let tags = parse_tags(block);
    let movetext: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|l| !l.starts_with('['))
        .collect();
    let tokens = tokenize_movetext(&movetext.join("\n"));
    if tokens.is_empty() {
        return None;
    }
    Some(ImportedGame::new(tags, tokens, block.to_string()))
}
