//! symtree: symbol inventory for Python package trees
//!
//! Layers:
//! - `domain`: package tree, traversal, visibility filter, documentation check
//! - `application`: services loading packages from disk
//! - `infrastructure`: filesystem and tree-sitter parser, DI container
//! - `cli`: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
