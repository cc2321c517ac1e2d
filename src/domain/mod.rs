//! Domain layer: the symbol inventory model and its operations
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod docs;
pub mod entities;
pub mod error;
pub mod filter;
pub mod traversal;

pub use arena::{PackageData, PackageNode, PackageTree, TreeIterator};
pub use builder::TreeBuilder;
pub use docs::{check_documentation, clean_docstring, has_example, DocCoverage, DocPresence};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use filter::{filter_entries, VisibilityFilter};
pub use traversal::{EntryOrigin, InventoryEntry, ResolvedReexport, SymbolWalk};
