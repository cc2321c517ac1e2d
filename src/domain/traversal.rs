//! Symbol traversal over a package tree.
//!
//! Order: depth-first, declaration order. Within a package the re-exports
//! come first, then the initializer's own definitions, then every module
//! (a class is immediately followed by its members), then the subpackages.

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::{PackageNode, PackageTree};
use crate::domain::entities::{ModuleNode, Reexport, Symbol, SymbolKind, Visibility};
use crate::domain::error::{DomainError, DomainResult};

/// Where an inventory entry comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOrigin {
    /// Defined in the scope named by the entry
    Defined,
    /// Bound in a package initializer; `from` is the defining qualified name
    Reexported { from: String },
}

/// One reachable symbol: (qualified name, symbol, visibility).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry<'a> {
    pub qualified_name: String,
    pub symbol: &'a Symbol,
    pub visibility: Visibility,
    pub origin: EntryOrigin,
}

impl InventoryEntry<'_> {
    /// Name as bound in its scope (differs from `symbol.name` for aliases).
    pub fn name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    pub fn kind(&self) -> SymbolKind {
        self.symbol.kind
    }

    pub fn docstring(&self) -> Option<&str> {
        self.symbol.docstring()
    }

    pub fn is_reexport(&self) -> bool {
        matches!(self.origin, EntryOrigin::Reexported { .. })
    }
}

/// A re-export resolved to the symbol it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReexport<'a> {
    pub symbol: &'a Symbol,
    pub qualified_name: String,
}

/// Scope a dotted re-export path can land on.
enum Scope<'a> {
    Package(&'a PackageNode),
    Module(&'a ModuleNode),
}

enum Pending<'a> {
    Package(Index),
    Module(&'a ModuleNode),
    Reexport {
        package: &'a PackageNode,
        reexport: &'a Reexport,
    },
    Symbol {
        scope: String,
        symbol: &'a Symbol,
    },
}

/// Lazy depth-first walk over every reachable symbol.
///
/// Yields `Err(DomainError::Reference)` for a re-export that cannot be
/// resolved and carries on with the rest of the tree.
pub struct SymbolWalk<'a> {
    tree: &'a PackageTree,
    stack: Vec<Pending<'a>>,
}

impl<'a> SymbolWalk<'a> {
    fn new(tree: &'a PackageTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push(Pending::Package(root));
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for SymbolWalk<'a> {
    type Item = DomainResult<InventoryEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        while let Some(pending) = self.stack.pop() {
            match pending {
                Pending::Package(idx) => {
                    let Some(node) = tree.get_node(idx) else {
                        continue;
                    };
                    let data = &node.data;
                    // Pushed in reverse: popped as re-exports, symbols, modules, subpackages
                    for &child in node.children.iter().rev() {
                        self.stack.push(Pending::Package(child));
                    }
                    for module in data.modules.iter().rev() {
                        self.stack.push(Pending::Module(module));
                    }
                    for symbol in data.symbols.iter().rev() {
                        self.stack.push(Pending::Symbol {
                            scope: data.qualified_name.clone(),
                            symbol,
                        });
                    }
                    for reexport in data.reexports.iter().rev() {
                        self.stack.push(Pending::Reexport {
                            package: node,
                            reexport,
                        });
                    }
                }
                Pending::Module(module) => {
                    for symbol in module.symbols.iter().rev() {
                        self.stack.push(Pending::Symbol {
                            scope: module.qualified_name.clone(),
                            symbol,
                        });
                    }
                }
                Pending::Symbol { scope, symbol } => {
                    let qualified_name = format!("{scope}.{}", symbol.name);
                    for member in symbol.members.iter().rev() {
                        self.stack.push(Pending::Symbol {
                            scope: qualified_name.clone(),
                            symbol: member,
                        });
                    }
                    return Some(Ok(InventoryEntry {
                        qualified_name,
                        symbol,
                        visibility: symbol.visibility,
                        origin: EntryOrigin::Defined,
                    }));
                }
                Pending::Reexport { package, reexport } => {
                    let entry = tree
                        .resolve_reexport(package, reexport)
                        .map(|resolved| InventoryEntry {
                            qualified_name: format!(
                                "{}.{}",
                                package.data.qualified_name, reexport.name
                            ),
                            symbol: resolved.symbol,
                            visibility: Visibility::classify(
                                &reexport.name,
                                package.data.exports.as_ref(),
                            ),
                            origin: EntryOrigin::Reexported {
                                from: resolved.qualified_name,
                            },
                        });
                    return Some(entry);
                }
            }
        }
        None
    }
}

impl PackageTree {
    /// Start a fresh traversal. Walks are independent and repeatable.
    pub fn walk(&self) -> SymbolWalk<'_> {
        SymbolWalk::new(self)
    }

    /// Collect the whole traversal, failing on the first unresolved re-export.
    #[instrument(level = "debug", skip(self))]
    pub fn entries(&self) -> DomainResult<Vec<InventoryEntry<'_>>> {
        let entries = self.walk().collect::<DomainResult<Vec<_>>>()?;
        debug!("collected {} inventory entries", entries.len());
        Ok(entries)
    }

    /// Every unresolved re-export in the tree.
    #[instrument(level = "debug", skip(self))]
    pub fn validate(&self) -> Vec<DomainError> {
        self.iter()
            .flat_map(|(_, node)| {
                node.data
                    .reexports
                    .iter()
                    .filter_map(move |r| self.resolve_reexport(node, r).err())
            })
            .collect()
    }

    /// Resolve a re-export declared by `package` against its descendants.
    pub fn resolve_reexport<'a>(
        &'a self,
        package: &'a PackageNode,
        reexport: &Reexport,
    ) -> DomainResult<ResolvedReexport<'a>> {
        let target = reexport.target_name();
        let found = match reexport.source.as_deref() {
            Some(path) if !path.is_empty() => self
                .lookup_path(package, path)
                .and_then(|scope| self.lookup_in_scope(scope, target)),
            _ => self.search_descendants(package, target),
        };

        found.ok_or_else(|| DomainError::Reference {
            package: package.data.qualified_name.clone(),
            name: reexport.name.clone(),
            module: reexport
                .source
                .as_ref()
                .filter(|s| !s.is_empty())
                .map(|s| format!("{}.{}", package.data.qualified_name, s)),
        })
    }

    fn lookup_path<'a>(&'a self, package: &'a PackageNode, path: &str) -> Option<Scope<'a>> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut current = package;
        for (i, segment) in segments.iter().enumerate() {
            if let Some(child) = self.child_by_name(current, segment) {
                current = child;
                continue;
            }
            if i + 1 == segments.len() {
                return current.module(segment).map(Scope::Module);
            }
            return None;
        }
        Some(Scope::Package(current))
    }

    fn lookup_in_scope<'a>(&'a self, scope: Scope<'a>, name: &str) -> Option<ResolvedReexport<'a>> {
        match scope {
            Scope::Module(module) => module.symbol(name).map(|symbol| ResolvedReexport {
                symbol,
                qualified_name: format!("{}.{}", module.qualified_name, name),
            }),
            Scope::Package(package) => {
                if let Some(symbol) = package.symbol(name) {
                    return Some(ResolvedReexport {
                        symbol,
                        qualified_name: format!("{}.{}", package.data.qualified_name, name),
                    });
                }
                // A subpackage may itself re-export the name
                package
                    .data
                    .reexports
                    .iter()
                    .find(|r| r.name == name)
                    .and_then(|r| self.resolve_reexport(package, r).ok())
            }
        }
    }

    /// First definition of `name` in the modules and initializers below `package`.
    fn search_descendants<'a>(
        &'a self,
        package: &'a PackageNode,
        name: &str,
    ) -> Option<ResolvedReexport<'a>> {
        for module in &package.data.modules {
            if let Some(found) = self.lookup_in_scope(Scope::Module(module), name) {
                return Some(found);
            }
        }
        for child in package.children.iter().filter_map(|&idx| self.get_node(idx)) {
            if let Some(symbol) = child.symbol(name) {
                return Some(ResolvedReexport {
                    symbol,
                    qualified_name: format!("{}.{}", child.data.qualified_name, name),
                });
            }
            if let Some(found) = self.search_descendants(child, name) {
                return Some(found);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ModuleDecl, PackageDecl};

    fn names(tree: &PackageTree) -> Vec<String> {
        tree.walk()
            .map(|e| e.unwrap().qualified_name)
            .collect()
    }

    #[test]
    fn given_package_when_walking_then_reexports_come_before_modules_and_subpackages() {
        let decl = PackageDecl::new("pkg")
            .reexport(Reexport::from_module("sub.impl_mod", "exported"))
            .module(ModuleDecl::new("a").symbol(Symbol::function("fa")))
            .package(
                PackageDecl::new("sub")
                    .module(ModuleDecl::new("impl_mod").symbol(Symbol::function("exported"))),
            );
        let tree = PackageTree::from_decl(decl);

        assert_eq!(
            names(&tree),
            vec!["pkg.exported", "pkg.a.fa", "pkg.sub.impl_mod.exported"]
        );
    }

    #[test]
    fn given_reexport_without_source_then_searches_descendants() {
        let decl = PackageDecl::new("pkg")
            .reexport(Reexport::new("deep"))
            .package(
                PackageDecl::new("a").package(
                    PackageDecl::new("b")
                        .module(ModuleDecl::new("m").symbol(Symbol::constant("deep"))),
                ),
            );
        let tree = PackageTree::from_decl(decl);
        let entries = tree.entries().unwrap();

        assert_eq!(
            entries[0].origin,
            EntryOrigin::Reexported {
                from: "pkg.a.b.m.deep".to_string()
            }
        );
    }

    #[test]
    fn given_chained_reexport_then_resolves_through_subpackage_initializer() {
        let decl = PackageDecl::new("pkg")
            .reexport(Reexport::from_module("inner", "tool"))
            .package(
                PackageDecl::new("inner")
                    .reexport(Reexport::from_module("impl_mod", "tool"))
                    .module(ModuleDecl::new("impl_mod").symbol(Symbol::function("tool"))),
            );
        let tree = PackageTree::from_decl(decl);
        let entries = tree.entries().unwrap();

        assert_eq!(entries[0].qualified_name, "pkg.tool");
        assert_eq!(
            entries[0].origin,
            EntryOrigin::Reexported {
                from: "pkg.inner.impl_mod.tool".to_string()
            }
        );
    }

    #[test]
    fn given_unresolvable_reexport_when_walking_then_yields_reference_error() {
        let decl = PackageDecl::new("pkg")
            .reexport(Reexport::from_module("m", "missing"))
            .module(ModuleDecl::new("m").symbol(Symbol::function("present")));
        let tree = PackageTree::from_decl(decl);

        let results: Vec<_> = tree.walk().collect();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0],
            Err(DomainError::Reference {
                package: "pkg".to_string(),
                name: "missing".to_string(),
                module: Some("pkg.m".to_string()),
            })
        );
        assert!(results[1].is_ok());
        assert!(tree.entries().is_err());
        assert_eq!(tree.validate().len(), 1);
    }

    #[test]
    fn given_reexport_of_ancestor_symbol_then_does_not_resolve() {
        // only descendants count; the initializer's own names are not searched
        let decl = PackageDecl::new("pkg")
            .package(PackageDecl::new("sub").reexport(Reexport::new("top_level")))
            .module(ModuleDecl::new("m").symbol(Symbol::function("top_level")));
        let tree = PackageTree::from_decl(decl);

        assert_eq!(tree.validate().len(), 1);
    }

    #[test]
    fn given_aliased_reexport_then_entry_uses_alias_and_package_exports() {
        let decl = PackageDecl::new("pkg")
            .exports(["public_name"])
            .reexport(Reexport::from_module("m", "public_name").aliased("impl_name"))
            .module(ModuleDecl::new("m").symbol(Symbol::function("impl_name")));
        let tree = PackageTree::from_decl(decl);
        let entries = tree.entries().unwrap();

        assert_eq!(entries[0].name(), "public_name");
        assert_eq!(entries[0].symbol.name, "impl_name");
        assert_eq!(entries[0].visibility, Visibility::Public);
        assert!(entries[0].is_reexport());
    }
}
