//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the inventory model.
/// Everything else over a built tree is total.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A package re-exports a name that no descendant defines.
    #[error(
        "unresolved re-export: package {package} exports `{name}`, not found in {}",
        .module.as_deref().unwrap_or("any descendant module")
    )]
    Reference {
        package: String,
        name: String,
        module: Option<String>,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
