//! Error types for stats streams and the display loop.

use thiserror::Error;

/// Why a container's stats stream ended. Every variant is terminal for that container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("No such container: {0}")]
    NotFound(String),
    #[error("cannot open stats stream: {0}")]
    Connect(String),
    #[error("malformed stats frame: {0}")]
    Decode(String),
    #[error("connection lost: {0}")]
    Transport(String),
    #[error("stats stream closed")]
    Closed,
}

impl From<serde_json::Error> for StreamError {
    fn from(e: serde_json::Error) -> Self {
        StreamError::Decode(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("at least one container name is required")]
    NoEntities,
    /// Containers that had already failed when the initial settle window closed.
    #[error("{}", join_failures(.0))]
    Startup(Vec<(String, StreamError)>),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Outcome of drawing one container row.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The container's stream has ended; it should leave the table.
    #[error(transparent)]
    Retired(StreamError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn join_failures(failures: &[(String, StreamError)]) -> String {
    failures
        .iter()
        .map(|(name, err)| format!("{name}: {err}"))
        .collect::<Vec<_>>()
        .join(", ")
}
