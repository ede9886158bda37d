//! Error types for the minifier front end
//!
//! Provides structured errors for argument parsing and source resolution.

use thiserror::Error;

/// Main error type for parsing and source resolution
#[derive(Error, Debug)]
pub enum CsminError {
    /// An option-shaped token that no declared option accepts
    #[error("Invalid argument: {argument}")]
    InvalidArgument { argument: String },

    /// A value-taking option given as the last token
    #[error("Missing value for option '{option}'")]
    MissingValue { option: String },

    /// A source could not be read.
    ///
    /// The I/O error is kept as a plain field rather than a source so that
    /// this variant stays the root of the chain and its message names the
    /// source.
    #[error("{label}: {error}")]
    Io {
        label: String,
        error: std::io::Error,
    },

    /// An include or exclude glob that does not compile
    #[error("Invalid glob pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

impl CsminError {
    /// Create a new invalid argument error
    pub fn invalid_argument(argument: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
        }
    }

    /// Create a new missing value error
    pub fn missing_value(option: impl Into<String>) -> Self {
        Self::MissingValue {
            option: option.into(),
        }
    }

    /// Create a new source read error
    pub fn io(label: impl Into<String>, error: std::io::Error) -> Self {
        Self::Io {
            label: label.into(),
            error,
        }
    }

    /// Create a new glob pattern error
    pub fn pattern(pattern: impl Into<String>, source: glob::PatternError) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            source,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CsminError>;
