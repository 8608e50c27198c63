//! Catalog payload: what a product tree node carries besides its price.

use std::fmt;

use crate::domain::solution::Fixed;
use crate::domain::tree::AndOrTree;

/// Price in minor currency units.
pub type Price = i64;

/// Product tree with prices as keys.
pub type Catalog = AndOrTree<Price, NodeItem>;

/// Component of a product configuration ("model", "engine", "Diesel", ...).
///
/// The fixed flag pins this node as the chosen alternative of its OR parent
/// for the next solution snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeItem {
    name: String,
    fixed: bool,
}

impl NodeItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed: false,
        }
    }

    /// Item pinned as the chosen alternative.
    pub fn pinned(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
    }
}

impl Fixed for NodeItem {
    fn is_fixed(&self) -> bool {
        self.fixed
    }
}

impl fmt::Display for NodeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.name)?;
        if self.fixed {
            write!(f, " *")?;
        }
        Ok(())
    }
}
