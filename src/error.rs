//! Error types for topology assembly and address planning.
//!
//! Every variant is fatal for the assembly in progress: they report either a
//! configured limit being exceeded or a caller breaking the builder contract.
//! Nothing here is transient, so nothing is retried.

use std::net::Ipv4Addr;

use crate::topology::types::{LinkKind, NodeId, NodeRole};

/// Errors raised by the address allocator and the topology assembler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// The subnet cursor ran past the last usable /24 block.
    #[error("address space exhausted: {issued} subnets issued from base {base}, no /24 left")]
    AddressSpaceExhausted { base: Ipv4Addr, issued: usize },

    /// A segment asked for more host addresses than its /24 can hold.
    #[error("subnet {network}/24 overflow: {requested} addresses requested, {available} available")]
    SubnetOverflow {
        network: Ipv4Addr,
        requested: usize,
        available: usize,
    },

    /// A node would own two devices on the same link.
    #[error("duplicate attachment of node '{node}' to a link of segment '{segment}'")]
    DuplicateAttachment { segment: String, node: String },

    /// The topology has been sealed and can no longer change.
    #[error("topology already sealed")]
    TopologyAlreadySealed,

    /// A fragment referenced a node that was never created by this assembler.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// A referenced node does not have the role its position requires.
    #[error("node '{node}' in segment '{segment}' has role {found}, expected {expected}")]
    RoleMismatch {
        segment: String,
        node: String,
        expected: String,
        found: NodeRole,
    },

    /// Subnet continuation named a segment that is missing or unaddressed.
    #[error("segment '{0}' is unknown or owns no subnet")]
    UnknownSegment(String),

    /// Two segments with the same name were merged.
    #[error("segment '{0}' merged twice")]
    DuplicateSegment(String),

    /// A link's attachments do not fit its kind: a point-to-point link needs
    /// exactly two, a shared medium at least two, a wireless cell exactly one
    /// access point.
    #[error("malformed {kind:?} link in segment '{segment}': {attachments} attachments, {access_points} access points")]
    MalformedLink {
        segment: String,
        kind: LinkKind,
        attachments: usize,
        access_points: usize,
    },

    /// Bridge-forwarders only exist as the forwarding node of a bridged LAN.
    #[error("bridge-forwarder '{0}' can only be created by a bridged LAN segment")]
    BridgeOutsideLan(String),

    /// A fragment refers to a node, link or attachment it does not contain.
    #[error("malformed fragment for segment '{segment}': {reason}")]
    MalformedFragment { segment: String, reason: String },

    /// Two nodes would share one name.
    #[error("node name '{0}' already in use")]
    DuplicateNodeName(String),
}

pub type Result<T> = std::result::Result<T, TopologyError>;
