//! Error types for topology edits and engine setup.

use audiokit_core::FormatError;
use thiserror::Error;

use crate::node::NodeId;

/// Errors surfaced synchronously to control-path callers.
///
/// Every operation that returns one of these left the graph exactly as it
/// was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A node with this id already exists.
    #[error("node id '{0}' is already in use")]
    DuplicateId(NodeId),

    /// No node with this id exists.
    #[error("node '{0}' not found")]
    UnknownNode(NodeId),

    /// The edge would close a cycle.
    #[error("connecting '{from}' to '{to}' would create a cycle")]
    CycleDetected {
        /// Upstream end of the rejected edge.
        from: NodeId,
        /// Downstream end of the rejected edge.
        to: NodeId,
    },

    /// A parameter name, type or value was rejected.
    #[error("invalid parameter '{param}' for node '{node}': {reason}")]
    InvalidParameter {
        /// Node the parameter was meant for.
        node: NodeId,
        /// Parameter name as given by the caller.
        param: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The edge already exists.
    #[error("'{from}' is already connected to '{to}'")]
    DuplicateConnection {
        /// Upstream end.
        from: NodeId,
        /// Downstream end.
        to: NodeId,
    },

    /// The edge to remove does not exist.
    #[error("'{from}' is not connected to '{to}'")]
    UnknownConnection {
        /// Upstream end.
        from: NodeId,
        /// Downstream end.
        to: NodeId,
    },

    /// The edge violates a node role (into an input, out of an output).
    #[error("invalid connection from '{from}' to '{to}': {reason}")]
    InvalidConnection {
        /// Upstream end.
        from: NodeId,
        /// Downstream end.
        to: NodeId,
        /// Which role rule was broken.
        reason: &'static str,
    },

    /// The stream format cannot be used.
    #[error("invalid block format: {0}")]
    InvalidFormat(#[from] FormatError),
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
