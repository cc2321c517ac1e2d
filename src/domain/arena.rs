use generational_arena::{Arena, Index};
use std::fmt;
use std::path::PathBuf;
use tracing::instrument;

use crate::domain::entities::{ExportList, ModuleNode, Reexport, Symbol};

/// Data payload for tree nodes representing packages.
#[derive(Debug, Clone)]
pub struct PackageData {
    /// Last path segment
    pub name: String,
    /// Dot-separated path from the root package
    pub qualified_name: String,
    pub docstring: Option<String>,
    pub exports: Option<ExportList>,
    /// Names imported into the initializer from descendants
    pub reexports: Vec<Reexport>,
    /// Definitions made directly in the initializer
    pub symbols: Vec<Symbol>,
    pub modules: Vec<ModuleNode>,
    /// Directory of the package when loaded from disk
    pub path: Option<PathBuf>,
}

impl fmt::Display for PackageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name)
    }
}

/// Tree node in the arena-based package hierarchy.
#[derive(Debug)]
pub struct PackageNode {
    pub data: PackageData,
    /// Index of parent node in the arena, None for the root.
    /// Never followed by traversal.
    pub parent: Option<Index>,
    /// Indices of subpackages, in declaration order
    pub children: Vec<Index>,
}

impl PackageNode {
    pub fn module(&self, name: &str) -> Option<&ModuleNode> {
        self.data.modules.iter().find(|m| m.name == name)
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.data.symbols.iter().find(|s| s.name == name)
    }
}

/// Arena-based package tree.
///
/// Immutable once built: nodes are only inserted by the builder. Uses a
/// generational arena so parent links are plain indices and the tree has
/// no reference cycles.
#[derive(Debug)]
pub struct PackageTree {
    arena: Arena<PackageNode>,
    root: Option<Index>,
}

impl Default for PackageTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    #[instrument(level = "trace", skip(self, data), fields(package = %data.qualified_name))]
    pub(crate) fn insert_node(&mut self, data: PackageData, parent: Option<Index>) -> Index {
        let node = PackageNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&PackageNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn root_node(&self) -> Option<&PackageNode> {
        self.root.and_then(|idx| self.get_node(idx))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Packages in depth-first pre-order, subpackages in declaration order.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Number of package levels (a lone root package has depth 1).
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Subpackage of `parent` with the given short name.
    pub fn child_by_name(&self, parent: &PackageNode, name: &str) -> Option<&PackageNode> {
        parent
            .children
            .iter()
            .filter_map(|&idx| self.get_node(idx))
            .find(|child| child.data.name == name)
    }

    /// Look up a package by its qualified name.
    pub fn find_package(&self, qualified_name: &str) -> Option<&PackageNode> {
        self.iter()
            .map(|(_, node)| node)
            .find(|node| node.data.qualified_name == qualified_name)
    }

    /// Look up a module by its qualified name.
    pub fn find_module(&self, qualified_name: &str) -> Option<&ModuleNode> {
        self.iter()
            .flat_map(|(_, node)| node.data.modules.iter())
            .find(|module| module.qualified_name == qualified_name)
    }
}

pub struct TreeIterator<'a> {
    tree: &'a PackageTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a PackageTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push(root);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a PackageNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(qualified_name: &str) -> PackageData {
        PackageData {
            name: qualified_name
                .rsplit('.')
                .next()
                .unwrap_or(qualified_name)
                .to_string(),
            qualified_name: qualified_name.to_string(),
            docstring: None,
            exports: None,
            reexports: Vec::new(),
            symbols: Vec::new(),
            modules: Vec::new(),
            path: None,
        }
    }

    // root
    // ├── a
    // │   └── a.c
    // └── b
    #[test]
    fn given_nested_packages_when_iterating_then_visits_preorder() {
        let mut tree = PackageTree::new();
        let root = tree.insert_node(data("root"), None);
        let a = tree.insert_node(data("root.a"), Some(root));
        tree.insert_node(data("root.b"), Some(root));
        tree.insert_node(data("root.a.c"), Some(a));

        let order: Vec<_> = tree
            .iter()
            .map(|(_, n)| n.data.qualified_name.clone())
            .collect();
        assert_eq!(order, vec!["root", "root.a", "root.a.c", "root.b"]);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn given_child_when_inserted_then_parent_link_is_index() {
        let mut tree = PackageTree::new();
        let root = tree.insert_node(data("root"), None);
        let child = tree.insert_node(data("root.a"), Some(root));

        assert_eq!(tree.get_node(child).unwrap().parent, Some(root));
        assert!(tree.get_node(root).unwrap().parent.is_none());
        assert!(tree.find_package("root.a").is_some());
    }

    #[test]
    fn given_empty_tree_then_depth_is_zero() {
        let tree = PackageTree::new();
        assert_eq!(tree.depth(), 0);
        assert!(tree.is_empty());
        assert_eq!(tree.iter().count(), 0);
    }
}
