//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with in-memory implementations.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::domain::{ExportList, Symbol};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Canonicalize path (resolve symlinks, make absolute).
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Immediate entries of a directory, sorted by file name.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| entry.map(|e| e.into_path()).map_err(io::Error::from))
            .collect()
    }
}

// ============================================================
// SOURCE PARSING
// ============================================================

/// A `from X import name [as alias]` binding found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    /// Module path as written: `.internals`, `..`, `pkg.sub`
    pub module: String,
    /// Name imported from the module
    pub name: String,
    /// Local binding when the import is aliased
    pub alias: Option<String>,
}

impl ImportedName {
    /// Name bound in the importing namespace.
    pub fn bound_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// What a parser extracts from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSource {
    pub docstring: Option<String>,
    pub exports: Option<ExportList>,
    /// Top-level definitions in declaration order, classes with members
    pub symbols: Vec<Symbol>,
    pub imports: Vec<ImportedName>,
    /// Parser recovered from syntax errors
    pub has_errors: bool,
}

/// Source-to-declaration parser abstraction.
pub trait SourceParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<ParsedSource, String>;
}
