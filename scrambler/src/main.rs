//! Scrambler CLI - import PGN collections, replay games and explore
//! positions from the terminal.
//!
//! Every command that reads a PGN file takes an optional path and falls back
//! to `SCRAMBLER_PGN_PATH` (see [`config`] for all tunables). Imports run on
//! a blocking worker and are cancelled by Ctrl-C.

use std::path::{Path, PathBuf};

use chess::{CancelToken, FenError, GameBank, GameError, MoveError, UciError};
use clap::{Parser, Subcommand};

mod commands;
mod config;

/// Top-level CLI arguments.
#[derive(Parser)]
#[command(name = "scrambler", about = "Chess PGN importer and position explorer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List imported games.
    Games {
        /// PGN file; defaults to SCRAMBLER_PGN_PATH.
        pgn: Option<PathBuf>,
        /// Only games where White or Black contains this name.
        #[arg(long)]
        player: Option<String>,
        /// Only games whose ECO code contains this text.
        #[arg(long)]
        opening: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Replay a game and show the position reached.
    Replay {
        pgn: Option<PathBuf>,
        /// Game index; defaults to SCRAMBLER_DEFAULT_GAME.
        #[arg(short, long)]
        game: Option<usize>,
        /// Stop after this many plies (0 shows the starting position).
        #[arg(short, long)]
        ply: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Show the middlegame snapshots of a game.
    Snapshots {
        pgn: Option<PathBuf>,
        #[arg(short, long)]
        game: Option<usize>,
    },
    /// Describe a FEN position and its legal moves.
    Position {
        fen: String,
    },
    /// Play coordinate moves (e2e4, e7e8q) and print the game as PGN.
    Play {
        /// Starting FEN; defaults to the standard initial position.
        #[arg(long)]
        fen: Option<String>,
        moves: Vec<String>,
    },
    /// Replay a game and print it as normalized PGN.
    Export {
        pgn: Option<PathBuf>,
        #[arg(short, long)]
        game: Option<usize>,
    },
}

/// Error type for CLI operations.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("no PGN file given and SCRAMBLER_PGN_PATH is not set")]
    MissingPgnPath,

    #[error("failed to read {}: {}", .path.display(), .source)]
    ReadPgn {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("import cancelled")]
    Cancelled,

    #[error("import worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("no game at index {index} ({count} imported)")]
    NoSuchGame { index: usize, count: usize },

    #[error("ply {ply} is past the end of the game ({count} plies)")]
    NoSuchPly { ply: usize, count: usize },

    #[error(transparent)]
    Fen(#[from] FenError),

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error(transparent)]
    Uci(#[from] UciError),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn resolve_pgn_path(arg: Option<PathBuf>) -> Result<PathBuf, CliError> {
    arg.or_else(config::get_pgn_path)
        .ok_or(CliError::MissingPgnPath)
}

/// Read and import a PGN file on a blocking worker. Ctrl-C cancels the import
/// between games.
async fn load_bank(path: &Path) -> Result<GameBank, CliError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::ReadPgn {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!("Read {} bytes from {}", text.len(), path.display());

    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let mut worker = tokio::task::spawn_blocking(move || {
        let mut bank = GameBank::with_default_index(config::get_default_game());
        let summary = bank.import_pgn_cancellable(&text, &worker_cancel);
        (bank, summary)
    });

    let (bank, summary) = tokio::select! {
        joined = &mut worker => joined?,
        signal = tokio::signal::ctrl_c() => {
            handle_interrupt(signal, &cancel);
            worker.await?
        }
    };

    if summary.cancelled {
        return Err(CliError::Cancelled);
    }
    if summary.dropped > 0 {
        tracing::warn!("{} game blocks had no moves and were dropped", summary.dropped);
    }
    Ok(bank)
}

/// Cancel the import on Ctrl-C. A failed handler registration leaves the
/// import running.
fn handle_interrupt(signal: std::io::Result<()>, cancel: &CancelToken) {
    match signal {
        Ok(()) => {
            tracing::info!("Interrupted, cancelling import...");
            cancel.cancel();
        }
        Err(e) => tracing::warn!("No Ctrl-C handler, import cannot be interrupted: {}", e),
    }
}

async fn run(cli: Cli) -> Result<String, CliError> {
    match cli.command {
        Commands::Games {
            pgn,
            player,
            opening,
            json,
        } => {
            let bank = load_bank(&resolve_pgn_path(pgn)?).await?;
            commands::list_games(&bank, player.as_deref(), opening.as_deref(), json)
        }
        Commands::Replay {
            pgn,
            game,
            ply,
            json,
        } => {
            let bank = load_bank(&resolve_pgn_path(pgn)?).await?;
            commands::replay(commands::select_game(&bank, game)?, ply, json)
        }
        Commands::Snapshots { pgn, game } => {
            let bank = load_bank(&resolve_pgn_path(pgn)?).await?;
            commands::snapshots(commands::select_game(&bank, game)?)
        }
        Commands::Position { fen } => commands::position(&fen),
        Commands::Play { fen, moves } => commands::play(fen.as_deref(), &moves),
        Commands::Export { pgn, game } => {
            let bank = load_bank(&resolve_pgn_path(pgn)?).await?;
            commands::export(commands::select_game(&bank, game)?)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(config::get_log_filter()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = run(cli).await?;
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }

    Ok(())
}
