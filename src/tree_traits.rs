//! Hierarchy rendering for package trees.

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::PackageTree;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for PackageTree {
    /// Packages render as `name/`, followed by their modules, then subpackages.
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(tree: &PackageTree, node_idx: Index) -> Option<Tree<String>> {
            let node = tree.get_node(node_idx)?;
            let modules = node
                .data
                .modules
                .iter()
                .map(|m| Tree::new(m.name.clone()));
            let packages = node
                .children
                .iter()
                .filter_map(|&child| build_tree(tree, child));
            Some(Tree::new(format!("{}/", node.data.name)).with_leaves(modules.chain(packages)))
        }

        self.root()
            .and_then(|root| build_tree(self, root))
            .unwrap_or_else(|| Tree::new("Empty tree".to_string()))
    }
}
