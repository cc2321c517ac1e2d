//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::InventoryService;
use crate::config::Settings;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::python::TreeSitterParser;
use crate::infrastructure::traits::{FileSystem, RealFileSystem, SourceParser};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Python source parser
    pub parser: Arc<dyn SourceParser>,

    inventory: InventoryService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    ///
    /// Fails when the Python grammar cannot be loaded.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        Ok(Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(TreeSitterParser::new()?),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        parser: Arc<dyn SourceParser>,
    ) -> Self {
        let settings = Arc::new(settings);
        let inventory = InventoryService::new(fs.clone(), parser.clone());

        Self {
            settings,
            fs,
            parser,
            inventory,
        }
    }

    pub fn inventory(&self) -> &InventoryService {
        &self.inventory
    }
}
