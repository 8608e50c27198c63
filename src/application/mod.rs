//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod catalog;
pub mod editing;
pub mod error;
pub mod error_ext;
pub mod hash;
pub mod selection;
pub mod services;
pub mod solutions;

pub use catalog::{demo_catalog, CatalogDocument, KindName, NodeTable};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use selection::{Assignment, Parameter};
pub use solutions::{
    ChosenOption, ReconcileReport, Solution, SolutionSet, SolutionsDocument, SortOrder,
};
