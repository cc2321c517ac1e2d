//! Symbol inventory service
//!
//! Loads a Python package from disk into a `PackageTree` and answers
//! inventory and documentation queries over it.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    check_documentation, filter_entries, DocCoverage, DocPresence, InventoryEntry, ModuleDecl,
    PackageDecl, PackageTree, Reexport, VisibilityFilter,
};
use crate::infrastructure::traits::{FileSystem, ImportedName, ParsedSource, SourceParser};
use crate::util::path::relative_to;

const INITIALIZER: &str = "__init__.py";
const SOURCE_EXT: &str = "py";

/// Documentation presence per symbol plus totals.
#[derive(Debug, Clone, Default)]
pub struct DocReport {
    pub presence: BTreeMap<String, DocPresence>,
    pub coverage: DocCoverage,
}

impl DocReport {
    /// Qualified names without a docstring, in name order.
    pub fn undocumented(&self) -> impl Iterator<Item = &str> {
        self.presence
            .iter()
            .filter(|(_, p)| !p.has_doc)
            .map(|(name, _)| name.as_str())
    }
}

/// Service building symbol inventories from package directories.
pub struct InventoryService {
    fs: Arc<dyn FileSystem>,
    parser: Arc<dyn SourceParser>,
}

impl InventoryService {
    pub fn new(fs: Arc<dyn FileSystem>, parser: Arc<dyn SourceParser>) -> Self {
        Self { fs, parser }
    }

    /// A directory is a package when it holds an initializer.
    pub fn is_package(&self, dir: &Path) -> bool {
        self.fs.is_dir(dir) && self.fs.is_file(&dir.join(INITIALIZER))
    }

    /// Load a package directory into an immutable tree.
    #[instrument(level = "debug", skip(self, exclude), fields(package = %package_dir.display()))]
    pub fn load(&self, package_dir: &Path, exclude: &[PathBuf]) -> ApplicationResult<PackageTree> {
        let decl = self.load_decl(package_dir, exclude)?;
        let tree = PackageTree::from_decl(decl);
        info!("loaded {} packages from {}", tree.len(), package_dir.display());
        Ok(tree)
    }

    /// Read a package directory into declarations without building the tree.
    pub fn load_decl(
        &self,
        package_dir: &Path,
        exclude: &[PathBuf],
    ) -> ApplicationResult<PackageDecl> {
        if !self.is_package(package_dir) {
            return Err(ApplicationError::NotAPackage(package_dir.to_path_buf()));
        }
        let package_dir = self
            .fs
            .canonicalize(package_dir)
            .with_path_context("canonicalize package", package_dir)?;
        let name = dir_name(&package_dir)?;
        // Exclude paths are relative to the directory holding the root package
        let base = package_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| package_dir.clone());

        let loader = Loader {
            service: self,
            base: &base,
            exclude,
        };
        loader.read_package(&package_dir, &name)
    }

    /// Traversal filtered by visibility, optionally dropping undocumented symbols.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn symbols<'a>(
        &self,
        tree: &'a PackageTree,
        filter: VisibilityFilter,
        skip_undoc: bool,
    ) -> ApplicationResult<Vec<InventoryEntry<'a>>> {
        let mut entries = filter_entries(tree.entries()?, filter);
        if skip_undoc {
            entries.retain(|entry| DocPresence::of(entry.docstring()).has_doc);
        }
        debug!("{} entries after filtering", entries.len());
        Ok(entries)
    }

    /// Documentation presence for every symbol admitted by `filter`.
    pub fn documentation(
        &self,
        tree: &PackageTree,
        filter: VisibilityFilter,
    ) -> ApplicationResult<DocReport> {
        let entries = self.symbols(tree, filter, false)?;
        let presence = check_documentation(&entries);
        let coverage = DocCoverage::from_report(&presence);
        Ok(DocReport { presence, coverage })
    }

    fn parse_file(&self, path: &Path) -> ApplicationResult<ParsedSource> {
        let source = self
            .fs
            .read_to_string(path)
            .with_path_context("read source", path)?;
        let parsed = self
            .parser
            .parse(&source)
            .map_err(|message| ApplicationError::Parse {
                path: path.to_path_buf(),
                message,
            })?;
        if parsed.has_errors {
            warn!(
                "syntax errors in {}, using recovered declarations",
                path.display()
            );
        }
        Ok(parsed)
    }
}

/// One recursive load: shared exclude state.
struct Loader<'s> {
    service: &'s InventoryService,
    base: &'s Path,
    exclude: &'s [PathBuf],
}

impl Loader<'_> {
    fn is_excluded(&self, path: &Path) -> bool {
        let relative = relative_to(path, self.base);
        self.exclude.iter().any(|pattern| {
            if pattern.is_absolute() {
                path.starts_with(pattern)
            } else {
                relative.as_ref().is_some_and(|rel| rel.starts_with(pattern))
            }
        })
    }

    fn read_package(&self, dir: &Path, qualified_name: &str) -> ApplicationResult<PackageDecl> {
        let name = dir_name(dir)?;
        let initializer = self.service.parse_file(&dir.join(INITIALIZER))?;

        let mut decl = PackageDecl::new(name).path(dir);
        decl.docstring = initializer.docstring;
        decl.exports = initializer.exports;
        decl.symbols = initializer.symbols;

        let entries = self
            .service
            .fs
            .list_dir(dir)
            .with_path_context("list package", dir)?;

        for entry in entries {
            if self.is_excluded(&entry) {
                debug!("excluded {}", entry.display());
                continue;
            }
            if self.service.is_package(&entry) {
                let child_name = dir_name(&entry)?;
                let child = self.read_package(&entry, &format!("{qualified_name}.{child_name}"))?;
                decl.packages.push(child);
            } else if is_module_file(&entry) && self.service.fs.is_file(&entry) {
                decl.modules.push(self.read_module(&entry)?);
            }
        }

        let mut namespaces = HashSet::new();
        collect_namespaces(&decl, "", &mut namespaces);
        decl.reexports = initializer
            .imports
            .iter()
            .filter_map(|import| to_reexport(import, qualified_name, &namespaces))
            .collect();

        debug!(
            "package {}: {} modules, {} subpackages, {} re-exports",
            qualified_name,
            decl.modules.len(),
            decl.packages.len(),
            decl.reexports.len()
        );
        Ok(decl)
    }

    fn read_module(&self, path: &Path) -> ApplicationResult<ModuleDecl> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ApplicationError::Parse {
                path: path.to_path_buf(),
                message: "module file name is not valid UTF-8".to_string(),
            })?;
        let parsed = self.service.parse_file(path)?;

        let mut module = ModuleDecl::new(name).path(path);
        module.docstring = parsed.docstring;
        module.exports = parsed.exports;
        module.symbols = parsed.symbols;
        Ok(module)
    }
}

fn dir_name(dir: &Path) -> ApplicationResult<String> {
    dir.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| ApplicationError::NotAPackage(dir.to_path_buf()))
}

fn is_module_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXT)
        && path.file_name().is_some_and(|name| name != INITIALIZER)
}

/// Dotted paths of every module and subpackage below `decl`, relative to it.
fn collect_namespaces(decl: &PackageDecl, prefix: &str, out: &mut HashSet<String>) {
    for module in &decl.modules {
        out.insert(format!("{prefix}{}", module.name));
    }
    for package in &decl.packages {
        let path = format!("{prefix}{}", package.name);
        collect_namespaces(package, &format!("{path}."), out);
        out.insert(path);
    }
}

/// Turn an initializer import into a re-export when it names a descendant.
///
/// `from .x import a` and `from pkg.x import a` both yield source `x`.
/// Imports binding a module or subpackage (`from . import child`,
/// `from .sub import mod`) are not symbol re-exports and are dropped.
fn to_reexport(
    import: &ImportedName,
    package: &str,
    namespaces: &HashSet<String>,
) -> Option<Reexport> {
    let source = if let Some(relative) = import.module.strip_prefix('.') {
        if relative.starts_with('.') {
            debug!("import from ancestor {} ignored", import.module);
            return None;
        }
        relative.to_string()
    } else if import.module == package {
        String::new()
    } else if let Some(rest) = import.module.strip_prefix(&format!("{package}.")) {
        rest.to_string()
    } else {
        debug!("external import from {} ignored", import.module);
        return None;
    };

    let target = if source.is_empty() {
        import.name.clone()
    } else {
        format!("{source}.{}", import.name)
    };
    if namespaces.contains(&target) {
        debug!("submodule import {} is not a symbol re-export", target);
        return None;
    }

    let mut reexport = Reexport::new(import.bound_name());
    if !source.is_empty() {
        reexport.source = Some(source);
    }
    if import.alias.is_some() {
        reexport.original = Some(import.name.clone());
    }
    Some(reexport)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(module: &str, name: &str, alias: Option<&str>) -> ImportedName {
        ImportedName {
            module: module.to_string(),
            name: name.to_string(),
            alias: alias.map(str::to_string),
        }
    }

    fn namespaces(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn given_relative_import_then_source_is_module_path() {
        let r = to_reexport(&import(".internals", "calc", None), "pkg", &namespaces(&[])).unwrap();
        assert_eq!(r.source.as_deref(), Some("internals"));
        assert_eq!(r.name, "calc");
    }

    #[test]
    fn given_absolute_import_of_descendant_then_becomes_reexport() {
        let r = to_reexport(
            &import("pkg.sub.mod", "thing", Some("alias")),
            "pkg",
            &namespaces(&["sub", "sub.mod"]),
        )
        .unwrap();
        assert_eq!(r.source.as_deref(), Some("sub.mod"));
        assert_eq!(r.name, "alias");
        assert_eq!(r.original.as_deref(), Some("thing"));
    }

    #[test]
    fn given_submodule_or_external_import_then_dropped() {
        let children = namespaces(&["sub", "sub.mod"]);
        assert!(to_reexport(&import(".", "sub", None), "pkg", &children).is_none());
        assert!(to_reexport(&import(".sub", "mod", Some("m")), "pkg", &children).is_none());
        assert!(to_reexport(&import("pkg.sub", "mod", None), "pkg", &children).is_none());
        assert!(to_reexport(&import("os.path", "join", None), "pkg", &children).is_none());
        assert!(to_reexport(&import("..", "up", None), "pkg", &children).is_none());
    }
}
