//! Export document types.
//!
//! These structures are serialized as-is: `ScenarioDocument` to YAML for the
//! simulation engine, `AddressPlanDocument` to JSON for anything that needs
//! to look addresses up after the run.

use std::time::Duration;

use serde::Serialize;

use crate::topology::{LinkKind, NodeRole, PlacementStrategy, SegmentType};
use crate::traffic::FlowProtocol;

// ============================================================================
// Scenario document
// ============================================================================

/// Root of the exported scenario.
#[derive(Serialize, Debug, Default)]
pub struct ScenarioDocument {
    pub general: ScenarioGeneral,
    pub nodes: Vec<NodeEntry>,
    pub links: Vec<LinkEntry>,
    pub bridges: Vec<BridgeEntry>,
    pub placements: Vec<PlacementEntry>,
    pub routing: RoutingEntry,
    pub flows: Vec<FlowEntry>,
}

/// Simulation-wide settings.
#[derive(Serialize, Debug, Default)]
pub struct ScenarioGeneral {
    /// When the engine stops the simulation (e.g. "30s")
    #[serde(with = "humantime_serde")]
    pub stop_time: Duration,
}

#[derive(Serialize, Debug)]
pub struct NodeEntry {
    pub id: usize,
    pub name: String,
    pub role: NodeRole,
}

/// One medium and everything attached to it.
#[derive(Serialize, Debug)]
pub struct LinkEntry {
    pub id: usize,
    pub segment: String,
    pub kind: LinkKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    pub attachments: Vec<AttachmentEntry>,
}

#[derive(Serialize, Debug)]
pub struct AttachmentEntry {
    pub node: String,
    pub device: usize,
    /// Absent for bridge ports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Layer-2 forwarding instance.
#[derive(Serialize, Debug)]
pub struct BridgeEntry {
    pub node: String,
    pub segment: String,
    pub ports: Vec<usize>,
}

#[derive(Serialize, Debug)]
pub struct PlacementEntry {
    pub segment: String,
    pub nodes: Vec<String>,
    pub strategy: PlacementStrategy,
}

/// Input to the global routing service.
#[derive(Serialize, Debug, Default)]
pub struct RoutingEntry {
    pub nodes: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct FlowEntry {
    pub protocol: FlowProtocol,
    pub source: String,
    pub sink: String,
    pub port: u16,
    pub rate: String,
    #[serde(with = "humantime_serde")]
    pub start: Duration,
    #[serde(with = "humantime_serde")]
    pub stop: Duration,
}

// ============================================================================
// Address plan document
// ============================================================================

#[derive(Serialize, Debug, Default)]
pub struct AddressPlanDocument {
    pub subnets: Vec<SubnetEntry>,
}

/// One /24 and the hosts numbered in it.
#[derive(Serialize, Debug)]
pub struct SubnetEntry {
    /// CIDR notation, e.g. "10.1.1.0/24"
    pub network: String,
    pub netmask: String,
    /// Segments numbered in this subnet, in merge order
    pub segments: Vec<String>,
    pub hosts: Vec<HostEntry>,
}

#[derive(Serialize, Debug)]
pub struct HostEntry {
    pub address: String,
    pub node: String,
    pub device: usize,
    pub segment: String,
    pub segment_type: SegmentType,
}
