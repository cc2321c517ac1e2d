//! Tree builder: turns package declarations into an immutable `PackageTree`.

use std::collections::HashSet;

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::arena::{PackageData, PackageTree};
use crate::domain::entities::{ExportList, ModuleDecl, ModuleNode, PackageDecl, Symbol};

/// Constructs package trees from declarations.
///
/// Assigns qualified names, fixes symbol visibility against the enclosing
/// export lists and keeps qualified names unique: when a name is bound twice
/// in one scope the later binding wins, and modules and subpackages win over
/// initializer definitions of the same name.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    packages_built: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of packages placed by the last `build` call.
    pub fn packages_built(&self) -> usize {
        self.packages_built
    }

    #[instrument(level = "debug", skip_all, fields(root = %root.name))]
    pub fn build(&mut self, root: PackageDecl) -> PackageTree {
        let mut tree = PackageTree::new();
        self.packages_built = 0;

        // (declaration, parent index, parent qualified name)
        let mut stack: Vec<(PackageDecl, Option<Index>, Option<String>)> = vec![(root, None, None)];

        while let Some((decl, parent_idx, parent_name)) = stack.pop() {
            let qualified_name = qualify(parent_name.as_deref(), &decl.name);
            let PackageDecl {
                name,
                docstring,
                exports,
                reexports,
                symbols,
                modules,
                packages,
                path,
            } = decl;

            let packages = keep_last_by(packages, |p| p.name.clone());
            let package_names: HashSet<&str> = packages.iter().map(|p| p.name.as_str()).collect();

            let modules: Vec<ModuleNode> = keep_last_by(modules, |m| m.name.clone())
                .into_iter()
                .filter(|m| {
                    let shadowed = package_names.contains(m.name.as_str());
                    if shadowed {
                        warn!(
                            "module {}.{} is shadowed by a subpackage of the same name",
                            qualified_name, m.name
                        );
                    }
                    !shadowed
                })
                .map(|m| build_module(m, &qualified_name))
                .collect();

            // Importing a submodule rebinds its name in the initializer
            let namespaces: HashSet<&str> = modules
                .iter()
                .map(|m| m.name.as_str())
                .chain(package_names.iter().copied())
                .collect();
            let symbols: Vec<Symbol> = symbols
                .into_iter()
                .filter(|s| {
                    let shadowed = namespaces.contains(s.name.as_str());
                    if shadowed {
                        warn!(
                            "symbol {}.{} is shadowed by a module of the same name",
                            qualified_name, s.name
                        );
                    }
                    !shadowed
                })
                .collect();
            let symbols = place_symbols(symbols, exports.as_ref());
            let defined: HashSet<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
            let reexports: Vec<_> = keep_last_by(reexports, |r| r.name.clone())
                .into_iter()
                .filter(|r| !defined.contains(r.name.as_str()))
                .collect();

            debug!(
                "package {}: {} modules, {} re-exports, {} subpackages",
                qualified_name,
                modules.len(),
                reexports.len(),
                packages.len()
            );

            let data = PackageData {
                name,
                qualified_name: qualified_name.clone(),
                docstring,
                exports,
                reexports,
                symbols,
                modules,
                path,
            };
            let current_idx = tree.insert_node(data, parent_idx);
            self.packages_built += 1;

            // Reverse so subpackages are inserted in declaration order
            for child in packages.into_iter().rev() {
                stack.push((child, Some(current_idx), Some(qualified_name.clone())));
            }
        }

        tree
    }
}

impl PackageTree {
    /// Build a tree from a root package declaration.
    pub fn from_decl(root: PackageDecl) -> Self {
        TreeBuilder::new().build(root)
    }
}

fn qualify(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}.{name}"),
        None => name.to_string(),
    }
}

fn build_module(decl: ModuleDecl, package: &str) -> ModuleNode {
    let symbols = place_symbols(decl.symbols, decl.exports.as_ref());
    ModuleNode {
        qualified_name: qualify(Some(package), &decl.name),
        name: decl.name,
        docstring: decl.docstring,
        exports: decl.exports,
        symbols,
        path: decl.path,
    }
}

/// Dedupe a scope's symbols and classify them against its export list.
fn place_symbols(symbols: Vec<Symbol>, exports: Option<&ExportList>) -> Vec<Symbol> {
    keep_last_by(symbols, |s| s.name.clone())
        .into_iter()
        .map(|mut symbol| {
            symbol.members = dedupe_members(std::mem::take(&mut symbol.members));
            symbol.apply_exports(exports);
            symbol
        })
        .collect()
}

fn dedupe_members(members: Vec<Symbol>) -> Vec<Symbol> {
    keep_last_by(members, |s| s.name.clone())
        .into_iter()
        .map(|mut member| {
            member.members = dedupe_members(std::mem::take(&mut member.members));
            member
        })
        .collect()
}

/// Keep only the last item for each key, at the position of that last item.
fn keep_last_by<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> String,
{
    let mut seen = HashSet::new();
    let mut kept: Vec<T> = items
        .into_iter()
        .rev()
        .filter(|item| seen.insert(key(item)))
        .collect();
    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Reexport, SymbolKind, Visibility};

    #[test]
    fn given_nested_declaration_when_building_then_assigns_qualified_names() {
        let decl = PackageDecl::new("pkg")
            .module(ModuleDecl::new("top").symbol(Symbol::function("f")))
            .package(
                PackageDecl::new("sub")
                    .module(ModuleDecl::new("inner"))
                    .package(PackageDecl::new("deeper")),
            );

        let mut builder = TreeBuilder::new();
        let tree = builder.build(decl);

        assert_eq!(builder.packages_built(), 3);
        assert_eq!(tree.depth(), 3);
        assert!(tree.find_module("pkg.top").is_some());
        assert!(tree.find_module("pkg.sub.inner").is_some());
        assert!(tree.find_package("pkg.sub.deeper").is_some());
    }

    #[test]
    fn given_module_export_list_when_building_then_unlisted_names_are_private() {
        let decl = PackageDecl::new("pkg").module(
            ModuleDecl::new("m")
                .exports(["listed"])
                .symbol(Symbol::function("listed"))
                .symbol(Symbol::function("unlisted"))
                .symbol(Symbol::class("Widget").with_member(Symbol::function("draw"))),
        );

        let tree = PackageTree::from_decl(decl);
        let module = tree.find_module("pkg.m").unwrap();

        assert_eq!(module.symbol("listed").unwrap().visibility, Visibility::Public);
        assert_eq!(module.symbol("unlisted").unwrap().visibility, Visibility::Private);
        let widget = module.symbol("Widget").unwrap();
        assert_eq!(widget.visibility, Visibility::Private);
        // members answer to the prefix rule only
        assert_eq!(widget.members[0].visibility, Visibility::Public);
    }

    #[test]
    fn given_rebound_name_when_building_then_later_binding_wins() {
        let decl = PackageDecl::new("pkg").module(
            ModuleDecl::new("m")
                .symbol(Symbol::function("dup").with_doc("first"))
                .symbol(Symbol::function("other"))
                .symbol(Symbol::constant("dup")),
        );

        let tree = PackageTree::from_decl(decl);
        let module = tree.find_module("pkg.m").unwrap();

        let names: Vec<_> = module.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["other", "dup"]);
        assert_eq!(module.symbol("dup").unwrap().kind, SymbolKind::Constant);
    }

    #[test]
    fn given_module_and_subpackage_with_same_name_then_subpackage_wins() {
        let decl = PackageDecl::new("pkg")
            .module(ModuleDecl::new("clash"))
            .package(PackageDecl::new("clash"));

        let tree = PackageTree::from_decl(decl);

        assert!(tree.find_module("pkg.clash").is_none());
        assert!(tree.find_package("pkg.clash").is_some());
    }

    #[test]
    fn given_initializer_symbol_named_like_module_then_module_wins() {
        let decl = PackageDecl::new("pkg")
            .symbol(Symbol::class("mid").with_member(Symbol::constant("X")))
            .symbol(Symbol::function("sub"))
            .symbol(Symbol::function("kept"))
            .module(ModuleDecl::new("mid").symbol(Symbol::constant("X")))
            .package(PackageDecl::new("sub"));

        let tree = PackageTree::from_decl(decl);
        let root = tree.root_node().unwrap();

        let names: Vec<_> = root.data.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["kept"]);
        assert!(root.module("mid").is_some());
    }

    #[test]
    fn given_reexport_shadowed_by_definition_then_reexport_is_dropped() {
        let decl = PackageDecl::new("pkg")
            .reexport(Reexport::from_module("m", "thing"))
            .symbol(Symbol::function("thing"))
            .module(ModuleDecl::new("m").symbol(Symbol::function("thing")));

        let tree = PackageTree::from_decl(decl);
        let root = tree.root_node().unwrap();

        assert!(root.data.reexports.is_empty());
        assert!(root.symbol("thing").is_some());
    }
}
