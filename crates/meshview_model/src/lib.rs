//! In-memory model of one chip's compute grid.
//!
//! This crate defines the building blocks that the chip aggregate assembles:
//! network links and the pipe segments that traverse them, compute nodes,
//! DRAM channel topology, the dataflow-graph vertices (operations and
//! queues), and the performance-measurement records attached by later
//! augmentation passes. All cross-entity references are held as stable IDs
//! ([`meshview_common::NodeUid`], [`meshview_common::PipeId`], vertex names)
//! rather than shared pointers; the aggregate's maps resolve them.

mod dram;
mod graph;
mod link;
mod node;
mod perf;

pub use dram::{DramChannel, DramChannelJson, DramSubchannel};
pub use graph::{
    parse_queue_location, AllocationInfo, GraphError, GraphVertex, OperandRef, QueueDetails,
    QueueLocation, VertexKind, VertexPayload,
};
pub use link::{
    noc_sort_order, DramBank, LinkError, LinkJson, LinkKind, LinkName, LinkState, NetworkLink,
    NocSelect, Pipe, PipeSegment,
};
pub use node::{ComputeNode, NodeType};
pub use perf::{
    MeasurementDetails, OpPerfDetails, OperandDirection, OperandPerformance, SlowestOperandDetails,
};
