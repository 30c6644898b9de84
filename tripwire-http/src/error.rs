//! Error types for the HTTP control plane.

/// Errors raised while running the control plane server.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The listen address could not be bound.
    #[error("failed to bind control plane on {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Accepting a connection or reading the local address failed.
    #[error("control plane I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server task ended abnormally.
    #[error("control plane task failed: {message}")]
    Task {
        /// Details from the join error.
        message: String,
    },
}

impl From<tokio::task::JoinError> for HttpError {
    fn from(err: tokio::task::JoinError) -> Self {
        HttpError::Task {
            message: err.to_string(),
        }
    }
}

/// Result alias for the HTTP control plane.
pub type HttpResult<T> = Result<T, HttpError>;
