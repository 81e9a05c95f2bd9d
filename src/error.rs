//! Error types for gridterm.
//!
//! Out-of-bounds drawing is never an error (it clips), and a resize racing a
//! tick is tolerated by the next full redraw. What remains is bad layout
//! requests, bad configuration, and terminal I/O failure.

use std::io;

use thiserror::Error;

/// An invalid grid placement request. Nothing is changed when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Column index outside `[0, count)`, or the entry's span would run past the last column.
    #[error("invalid column index: {value} (grid has {count} columns)")]
    InvalidColumn {
        /// The requested column.
        value: i32,
        /// Number of columns in the grid.
        count: usize,
    },

    /// Row index outside `[0, count)`, or the entry's span would run past the last row.
    #[error("invalid row index: {value} (grid has {count} rows)")]
    InvalidRow { value: i32, count: usize },

    /// Column span outside `[1, count]`, or running past the last column from the entry's column.
    #[error("invalid column span: {value} (grid has {count} columns)")]
    InvalidColumnSpan { value: i32, count: usize },

    /// Row span outside `[1, count]`, or running past the last row from the entry's row.
    #[error("invalid row span: {value} (grid has {count} rows)")]
    InvalidRowSpan { value: i32, count: usize },

    /// The handle does not name a live grid entry.
    #[error("unknown grid entry")]
    UnknownEntry,
}

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Refresh rate must be at least 1 Hz.
    #[error("refresh rate must be greater than 0, got {0}")]
    InvalidRefreshRate(u32),

    #[error("output chunk size must be greater than 0")]
    InvalidChunkSize,
}

/// Runtime failures of the engine and its loops.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Rendering or terminal I/O failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A loop of this kind is already running.
    #[error("{0} loop is already running")]
    AlreadyRunning(&'static str),

    /// A paint or event handler panicked inside a loop.
    #[error("{0}")]
    Panicked(String),
}

impl EngineError {
    /// Build a `Panicked` error from a `catch_unwind` payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::Panicked(format!("handler panicked: {message}"))
    }
}
