//! Crate error type
//!
//! Only start-up can fail: engine init and config files. The per-frame
//! tick is total and never returns an error.

use std::path::PathBuf;

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur before the frame loop starts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The rendering, audio or event engine could not start.
    #[error("engine init failed: {0}")]
    EngineInit(String),

    /// A config file could not be read or written.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid JSON for its document type.
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A tuning value violates its constraints.
    #[error("invalid tuning: {0}")]
    InvalidTuning(String),
}
