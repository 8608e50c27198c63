//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::SortOrder;
use crate::domain::NodeKind;

/// AND/OR product configuration trees: prices, configuration counts and enumeration
#[derive(Parser, Debug)]
#[command(name = "trimtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Catalog file (overrides the configured one)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Pinned parameter values, applied before the snapshot is taken.
#[derive(Args, Debug, Default, Clone)]
pub struct FixArgs {
    /// Pin a parameter value, e.g. --fix "Engine=Diesel" (repeatable)
    #[arg(long = "fix", value_name = "PARAMETER=VALUE")]
    pub fix: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    Asc,
    Desc,
    None,
}

impl SortArg {
    pub fn order(self) -> Option<SortOrder> {
        match self {
            SortArg::Asc => Some(SortOrder::Ascending),
            SortArg::Desc => Some(SortOrder::Descending),
            SortArg::None => None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    And,
    Or,
    None,
}

impl From<KindArg> for NodeKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::And => NodeKind::And,
            KindArg::Or => NodeKind::Or,
            KindArg::None => NodeKind::None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the catalog tree with own and aggregate prices
    Tree,

    /// Show the price of the cheapest configuration
    Price,

    /// Count configurations
    Count {
        #[command(flatten)]
        fix: FixArgs,
    },

    /// List configurations
    Solutions {
        #[command(flatten)]
        fix: FixArgs,

        /// Sort by price (default: from config)
        #[arg(long, value_enum)]
        sort: Option<SortArg>,

        /// Show at most N configurations
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Render the chosen tree of every configuration
        #[arg(short, long)]
        verbose: bool,
    },

    /// List parameters and their alternatives
    Params,

    /// Write all configurations to the solutions file
    Save {
        #[command(flatten)]
        fix: FixArgs,

        /// Output file (default: from config)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Compare a solutions file with the current catalog
    Check {
        /// Solutions file (default: from config)
        #[arg(value_hint = ValueHint::FilePath)]
        path: Option<PathBuf>,
    },

    /// Add a node below PARENT, e.g. `add Mark/BMW/Model/X5/Options Sunroof --price 90000`
    Add {
        /// Path of the parent node
        parent: String,

        /// Name of the new node
        name: String,

        #[arg(short, long, value_enum, default_value = "none")]
        kind: KindArg,

        /// Own price in minor currency units
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        price: i64,
    },

    /// Remove a node with everything below it
    Remove {
        /// Path of the node
        path: String,
    },

    /// Rename a node
    Rename {
        /// Path of the node
        path: String,

        /// New name
        name: String,
    },

    /// Change the own price of a node
    Reprice {
        /// Path of the node
        path: String,

        /// Own price in minor currency units
        #[arg(allow_negative_numbers = true)]
        price: i64,
    },

    /// Change the kind of a node
    Kind {
        /// Path of the node
        path: String,

        #[arg(value_enum)]
        kind: KindArg,
    },

    /// Write the demo catalog
    Demo {
        /// Output file (default: the catalog path)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
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

    /// Show config file locations
    Path,
}
