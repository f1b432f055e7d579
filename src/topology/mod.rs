//! Network topology module.
//!
//! This module turns segment descriptions into a node/link graph: segment
//! builders produce fragments, the assembler merges them in order, numbers
//! every addressed device and finally seals the result.

pub mod types;
pub mod segment;
pub mod graph;
pub mod assembler;

// Re-export key types and functions for easier access
pub use types::{
    Attachment, BridgeGroup, Bounds, Device, DeviceId, Link, LinkId, LinkKind, LinkProfile, Node,
    NodeId, NodeRole, PlacementDirective, PlacementStrategy, Position,
};
pub use segment::{Addressing, Endpoint, Fragment, LanLayout, SegmentKind, SegmentSpec, SegmentType};
pub use graph::{SegmentRecord, Topology};
pub use assembler::{assemble, MergedSegment, TopologyAssembler};
