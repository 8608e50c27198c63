//! Domain layer: the AND/OR tree core
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod item;
pub mod node;
pub mod render;
pub mod solution;
pub mod strategy;
pub mod tree;

pub use error::DomainError;
pub use item::{Catalog, NodeItem, Price};
pub use node::{Node, NodeId, NodeKind, Subtree};
pub use render::TreeRender;
pub use solution::{
    choice_based_compute_key, Choice, Fixed, Selected, Selection, SolutionIterator, SolutionTree,
};
pub use strategy::{default_compute_key, Key, KeyStrategy};
pub use tree::AndOrTree;
