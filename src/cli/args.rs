//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::VisibilityFilter;

/// Symbol inventory for Python packages: traversal, visibility filtering, docstring coverage
#[derive(Parser, Debug)]
#[command(name = "symtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List symbols as `qualified_name kind visibility`
    Symbols {
        /// Package directory (contains __init__.py)
        #[arg(value_hint = ValueHint::DirPath)]
        package: PathBuf,
        /// public, private or all (default from config)
        #[arg(long)]
        visibility: Option<VisibilityFilter>,
        /// Leave out symbols without a docstring
        #[arg(long)]
        skip_undoc: bool,
    },

    /// Report docstring and example presence per symbol
    Docs {
        /// Package directory (contains __init__.py)
        #[arg(value_hint = ValueHint::DirPath)]
        package: PathBuf,
        /// public, private or all (default from config)
        #[arg(long)]
        visibility: Option<VisibilityFilter>,
        /// Only list symbols without a docstring
        #[arg(long)]
        missing: bool,
        /// Exit non-zero when any listed symbol is undocumented
        #[arg(long)]
        check: bool,
    },

    /// Show the package/module hierarchy
    Tree {
        /// Package directory (contains __init__.py)
        #[arg(value_hint = ValueHint::DirPath)]
        package: PathBuf,
    },

    /// Verify that every re-export resolves
    Check {
        /// Package directory (contains __init__.py)
        #[arg(value_hint = ValueHint::DirPath)]
        package: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
