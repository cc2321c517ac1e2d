//! Infrastructure-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;

/// Infrastructure errors wrap application errors and add grammar loading failures.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("python grammar unavailable: {message}")]
    Grammar { message: String },
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
