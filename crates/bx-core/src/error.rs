//! Error types for document operations.

use crate::dom::NodeId;

/// Errors from document tree operations.
///
/// These mirror the DOM exceptions a browser would raise for the same
/// misuse. Callers that treat a condition as a no-op (double removal,
/// stale handles) check for it up front instead of matching on these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node was never created here or has been released.
    #[error("{0} does not exist in this document")]
    NodeNotFound(NodeId),
    /// An element-only operation was applied to a text node.
    #[error("{0} is not an element")]
    NotAnElement(NodeId),
    /// `child` was expected under `parent` but is attached elsewhere.
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    /// Inserting `child` under `parent` would create a cycle.
    #[error("cannot insert {child} into {parent}: {child} is an ancestor of {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}
