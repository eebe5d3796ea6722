//! Error types for the integrator

use thiserror::Error;

/// Result type alias for integration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while integrating
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A step count, worker count or bound was rejected before any work ran
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The integrand failed at a sample point
    #[error("Evaluation failed at x = {x}: {message}")]
    Evaluation {
        /// Sample point at which the integrand failed
        x: f64,
        /// Message reported by the integrand
        message: String,
    },

    /// A worker panicked while running a job
    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),

    /// A worker thread could not be spawned
    #[error("Failed to spawn worker thread: {0}")]
    SpawnError(String),

    /// Channel send error
    #[error("Channel send error: {0}")]
    SendError(String),

    /// Channel receive error
    #[error("Channel receive error: {0}")]
    ReceiveError(String),
}

impl Error {
    /// Build an `InvalidArgument` error from anything printable
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Build an `Evaluation` error for sample `x`
    pub fn evaluation(x: f64, message: impl ToString) -> Self {
        Error::Evaluation {
            x,
            message: message.to_string(),
        }
    }
}

impl<T> From<flume::SendError<T>> for Error {
    fn from(err: flume::SendError<T>) -> Self {
        Error::SendError(err.to_string())
    }
}

impl From<flume::RecvError> for Error {
    fn from(err: flume::RecvError) -> Self {
        Error::ReceiveError(err.to_string())
    }
}
