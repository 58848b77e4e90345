//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Errors that can occur when loading or validating an `fbind.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The content is not TOML, or does not have the shape of an `fbind.toml`.
    #[error("{origin} is not a valid fbind.toml: {message}")]
    Parse {
        /// Where the content came from: a file path, or `inline configuration`.
        origin: String,
        /// The parser's message, with line and column.
        message: String,
    },

    /// A required value is absent or empty.
    #[error("`{0}` must be set to a non-empty value")]
    MissingField(String),

    /// A `[modules]` entry cannot be built.
    #[error("module '{module}': {reason}")]
    InvalidModule {
        /// The library name as written in `[modules]`.
        module: String,
        /// What is wrong with it.
        reason: String,
    },
}
