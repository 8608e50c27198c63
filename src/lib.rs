//! trimtree: AND/OR cost trees for product configuration
//!
//! A catalog is an AND/OR tree whose nodes carry a price. AND nodes combine
//! all their children, OR nodes offer alternatives. Every node keeps the
//! minimal cost of its subtree up to date, and a [`domain::SolutionIterator`]
//! counts and enumerates all configurations the catalog allows.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
