//! Typed errors for the file subsystem and the format players.
//!
//! Everything that happens inside the playback loop is converted into a state
//! transition; only startup failures of the file subsystem reach `main`.

use std::io;
use thiserror::Error;

/// Startup failures of the file selector subsystem. Each one aborts the
/// program before the playback loop runs.
#[derive(Debug, Error)]
pub enum FileSelError {
    #[error("fileselector pre-init failed: {0}")]
    PreInit(String),
    #[error("fileselector init failed: {0}")]
    Init(String),
    #[error("fileselector post-init failed: {0}")]
    LateInit(String),
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{name} is bigger than {limit} bytes - further loading blocked")]
    TooLarge { name: String, limit: u64 },
    #[error("{0}")]
    BadFormat(String),
    #[error("file is empty")]
    Empty,
}
