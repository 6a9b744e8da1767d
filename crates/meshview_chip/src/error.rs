//! Fatal errors of the augmentation pipeline.

use meshview_common::{NodeUid, PipeId, UidParseError};
use meshview_model::{GraphError, LinkError, NodeType};

/// A structural error that aborts the current chip's load.
///
/// Everything here is fatal by contract: the aggregate being built is
/// discarded and the loader surfaces the failure with its file context.
/// Tolerated data gaps never reach this type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChipError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Uid(#[from] UidParseError),

    /// A node lookup that the API contract guarantees must succeed.
    #[error("no node with uid {0} on this chip")]
    UnknownNode(NodeUid),

    /// An operation lookup that the API contract guarantees must succeed.
    #[error("no operation named '{0}' on this chip")]
    UnknownOperation(String),

    /// A queue lookup that the API contract guarantees must succeed.
    #[error("no queue named '{0}' on this chip")]
    UnknownQueue(String),

    /// A pipe lookup that the API contract guarantees must succeed.
    #[error("no pipe with id {0} on this chip")]
    UnknownPipe(PipeId),

    /// Performance results keyed to a node that is not a compute core.
    /// This indicates a join-key collision, not a data gap.
    #[error("perf results target node {uid} of type {node_type:?}, expected a core")]
    PerfTargetNotCore { uid: NodeUid, node_type: NodeType },
}
