//! Construction-time errors.
//!
//! Everything that can be wrong with a tree's shape or size is detected while
//! the tree is assembled and reported as a [`TreeError`]. Lifecycle misuse at
//! run time (tearing down a running behavior, stopping twice) indicates a bug
//! in a control algorithm or its caller and panics instead.

use crate::NodeId;

/// Errors surfaced while allocating or wiring nodes.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("arena exhausted: requested {requested} bytes with {used} of {capacity} in use")]
    ArenaExhausted {
        requested: usize,
        used: usize,
        capacity: usize,
    },

    #[error("node {node} already has the maximum of {capacity} children")]
    ChildTableFull { node: NodeId, capacity: usize },

    /// Children must be allocated after their parent and within the 16-bit
    /// offset range.
    #[error("child {child} is not addressable from parent {parent}")]
    OffsetOutOfRange { parent: NodeId, child: NodeId },

    #[error("node {0} does not exist in this arena")]
    UnknownNode(NodeId),

    #[error("node {node} is not a {expected}")]
    WrongKind { node: NodeId, expected: &'static str },

    #[error("decorator {0} already has a child")]
    DecoratorOccupied(NodeId),

    #[error("composite {0} has no children")]
    EmptyComposite(NodeId),

    #[error("decorator {0} has no child")]
    MissingChild(NodeId),

    #[error("repeat limit must be at least 1")]
    InvalidRepeatLimit,
}

pub type Result<T> = std::result::Result<T, TreeError>;
