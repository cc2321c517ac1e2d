//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),

    #[error("{0} symbol(s) without a docstring")]
    Undocumented(usize),

    #[error("{0} unresolved re-export(s)")]
    UnresolvedReexports(usize),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::from(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Undocumented(_) => exitcode::FAILURE,
            CliError::UnresolvedReexports(_) => exitcode::DATAERR,
            CliError::Infra(e) => match e {
                InfraError::Grammar { .. } => exitcode::SOFTWARE,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(_) | ApplicationError::Parse { .. } => {
                        exitcode::DATAERR
                    }
                    ApplicationError::NotAPackage(_) => exitcode::NOINPUT,
                    ApplicationError::Config { .. } => exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => exitcode::IOERR,
                },
            },
        }
    }
}
