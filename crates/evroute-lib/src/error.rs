use thiserror::Error;

/// Convenient result alias for the route optimization library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// An infeasible route is not an error: it is reported through
/// [`RoutePlan::feasible`](crate::RoutePlan::feasible).
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when request input is rejected before graph construction.
    #[error("invalid route request: {message}")]
    InvalidRequest { message: String },

    /// Raised when station data produces non-finite geometry while building the graph.
    #[error("malformed geometry for node {node}: {message}")]
    MalformedGeometry { node: String, message: String },

    /// Raised when the caller's deadline passed before the search completed.
    #[error("route search deadline exceeded after finalizing {finalized} nodes")]
    DeadlineExceeded { finalized: usize },

    /// Wrapper for HTTP client construction errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidRequest {
            message: message.into(),
        }
    }
}
