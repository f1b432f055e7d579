//! The assembled topology.
//!
//! A [`Topology`] is only ever mutated by the assembler while it is in the
//! building state. Once sealed it is handed out behind an `Arc` and exposes
//! read-only accessors.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::error::{Result, TopologyError};
use crate::ip::{AddressPlan, Subnet};

use super::segment::SegmentType;
use super::types::{
    BridgeGroup, Device, DeviceId, Link, LinkId, Node, NodeId, NodeRole, PlacementDirective,
};

/// What one merged segment contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRecord {
    pub name: String,
    pub segment_type: SegmentType,
    pub links: Vec<LinkId>,
    /// Index into [`Topology::subnets`]
    pub subnet: Option<usize>,
    /// Addresses handed out for this segment, in assignment order
    pub addresses: Vec<(DeviceId, Ipv4Addr)>,
}

/// Nodes, links, devices and the address plan of a whole scenario.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    pub(crate) devices: Vec<Device>,
    pub(crate) subnets: Vec<Subnet>,
    pub(crate) segments: Vec<SegmentRecord>,
    pub(crate) bridges: Vec<BridgeGroup>,
    pub(crate) placements: Vec<PlacementDirective>,
    pub(crate) plan: AddressPlan,
    pub(crate) routable: Vec<NodeId>,
    pub(crate) names: BTreeMap<String, NodeId>,
}

impl Topology {
    pub(crate) fn add_node(&mut self, name: String, role: NodeRole) -> Result<NodeId> {
        if self.names.contains_key(&name) {
            return Err(TopologyError::DuplicateNodeName(name));
        }
        let id = NodeId(self.nodes.len());
        self.names.insert(name.clone(), id);
        self.nodes.push(Node {
            id,
            name,
            role,
            devices: Vec::new(),
        });
        Ok(id)
    }

    /// Create a device for `node` on `link`. The node must exist.
    pub(crate) fn add_device(&mut self, node: NodeId, link: LinkId) -> DeviceId {
        let id = DeviceId(self.devices.len());
        self.devices.push(Device { id, node, link });
        self.nodes[node.0].devices.push(id);
        id
    }

    pub(crate) fn compute_routable(&mut self) {
        self.routable = self
            .nodes
            .iter()
            .filter(|n| n.role.is_routable())
            .map(|n| n.id)
            .collect();
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.names.get(name).and_then(|&id| self.node(id))
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0)
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id.0)
    }

    /// Subnets in allocation order.
    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    /// Segments in merge order.
    pub fn segments(&self) -> &[SegmentRecord] {
        &self.segments
    }

    pub fn segment(&self, name: &str) -> Option<&SegmentRecord> {
        self.segments.iter().find(|s| s.name == name)
    }

    /// Subnet a segment was numbered in, if it was addressed.
    pub fn segment_subnet(&self, name: &str) -> Option<&Subnet> {
        self.segment(name)
            .and_then(|s| s.subnet)
            .and_then(|idx| self.subnets.get(idx))
    }

    pub fn bridges(&self) -> &[BridgeGroup] {
        &self.bridges
    }

    pub fn placements(&self) -> &[PlacementDirective] {
        &self.placements
    }

    pub fn address_plan(&self) -> &AddressPlan {
        &self.plan
    }

    /// Nodes visible at layer 3: everything except bridge-forwarders.
    /// Empty until the topology is sealed.
    pub fn routable_nodes(&self) -> &[NodeId] {
        &self.routable
    }

    pub fn address_of(&self, device: DeviceId) -> Option<Ipv4Addr> {
        self.plan.address_of(device)
    }

    /// Every address a node holds, ordered by device.
    pub fn node_addresses(&self, node: NodeId) -> Vec<(DeviceId, Ipv4Addr)> {
        self.node(node)
            .map(|n| {
                n.devices
                    .iter()
                    .filter_map(|&d| self.plan.address_of(d).map(|addr| (d, addr)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Address `node` holds on the links of `segment`.
    pub fn address_on_segment(&self, node: NodeId, segment: &str) -> Option<Ipv4Addr> {
        let node = self.node(node)?;
        node.devices.iter().find_map(|&d| {
            let device = self.device(d)?;
            let link = self.link(device.link)?;
            if link.segment == segment {
                self.plan.address_of(d)
            } else {
                None
            }
        })
    }

    /// Number of bridge-forwarder nodes.
    pub fn bridge_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.role == NodeRole::BridgeForwarder)
            .count()
    }
}
