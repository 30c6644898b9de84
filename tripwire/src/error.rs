//! Error types for registry, term and bootstrap operations.

use crate::term::TermError;

/// Errors returned by [`Registry`](crate::Registry) operations.
///
/// Everything except [`Error::FatalBootstrapConfig`] is recoverable: a test
/// harness probing failpoints gets these back as values and keeps going.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// No failpoint is registered under this name.
    #[error("failpoint does not exist: {name}")]
    NotFound {
        /// The name that was looked up.
        name: String,
    },

    /// The failpoint exists but has no active term.
    #[error("failpoint is disabled: {name}")]
    NotEnabled {
        /// The name that was looked up.
        name: String,
    },

    /// The term text does not parse.
    #[error(transparent)]
    InvalidTerm(#[from] TermError),

    /// A `name=term;...` block sent at runtime is malformed.
    #[error(transparent)]
    MalformedBatch(ConfigError),

    /// The start-up configuration is malformed.
    ///
    /// The process must not continue with partially applied failpoints.
    #[error("fatal failpoint configuration: {0}")]
    FatalBootstrapConfig(ConfigError),
}

impl Error {
    pub(crate) fn not_found(name: &str) -> Self {
        Error::NotFound {
            name: name.to_string(),
        }
    }

    pub(crate) fn not_enabled(name: &str) -> Self {
        Error::NotEnabled {
            name: name.to_string(),
        }
    }
}

/// A bad segment in a `name=term[;name=term]*` string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("bad failpoint {entry:?}: {reason}")]
pub struct ConfigError {
    /// The offending segment.
    pub entry: String,
    /// What is wrong with it.
    pub reason: String,
}

/// Result alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;
