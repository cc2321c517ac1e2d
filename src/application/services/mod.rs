//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, SourceParser)
//! but are themselves concrete structs, not traits.

mod inventory;

pub use inventory::{DocReport, InventoryService};
