//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Business-rule violations found while interpreting a catalog or a
/// selection. Structural misuse of a tree is not reported here: it panics.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("catalog has no root node")]
    EmptyCatalog,

    #[error("node at {path} has no name")]
    MissingName { path: String },

    #[error("node '{name}' has a negative price: {price}")]
    NegativePrice { name: String, price: i64 },

    #[error("node '{name}' of kind none cannot have children")]
    ChildrenUnderPlainNode { name: String },

    #[error("prices below node '{name}' add up beyond the supported range")]
    PriceOverflow { name: String },

    #[error("no node at {0}")]
    UnknownNode(String),

    #[error("the root node cannot be removed")]
    RootNotRemovable,

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("parameter '{parameter}' has no value '{value}'")]
    UnknownValue { parameter: String, value: String },

    #[error("invalid assignment '{0}', expected PARAMETER=VALUE")]
    InvalidAssignment(String),
}
