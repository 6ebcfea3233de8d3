use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop the game from starting or keep running.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("terminal error: {0}")]
    Terminal(#[from] crossterm::ErrorKind),
    #[error("cannot read settings file {}: {source}", path.display())]
    ConfigRead { path: PathBuf, source: io::Error },
    #[error("cannot parse settings file {}: {source}", path.display())]
    ConfigParse { path: PathBuf, source: serde_json::Error },
    #[error("invalid settings: {0}")]
    InvalidConfig(String),
    #[error("terminal is {actual:?} but the board needs at least {needed:?} (columns, rows)")]
    TerminalTooSmall { needed: (u16, u16), actual: (u16, u16) },
}
