//! Topology assembly.
//!
//! The assembler merges fragments strictly in the order they are given,
//! allocating one subnet per addressed segment as it goes. Each merge is
//! staged on a copy of the in-progress graph and committed only on success,
//! so a rejected fragment leaves both the graph and the subnet cursor as they
//! were.

use std::net::Ipv4Addr;
use std::sync::Arc;

use log::{debug, info};

use crate::error::{Result, TopologyError};
use crate::ip::AddressAllocator;

use super::graph::{SegmentRecord, Topology};
use super::segment::{Addressing, Fragment, NodeRef, SegmentSpec};
use super::types::{
    Attachment, BridgeGroup, DeviceId, Link, LinkId, NodeId, NodeRole, PlacementDirective,
};

/// Result of merging one fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSegment {
    pub segment: String,
    /// Ids given to the fragment's new nodes, in fragment order
    pub new_nodes: Vec<NodeId>,
    pub links: Vec<LinkId>,
    /// Network address of the subnet the segment was numbered in
    pub subnet: Option<Ipv4Addr>,
    pub addresses: Vec<(DeviceId, Ipv4Addr)>,
}

#[derive(Debug, Clone, Default)]
struct Workspace {
    draft: Topology,
    allocator: AddressAllocator,
}

#[derive(Debug)]
enum State {
    Building(Workspace),
    Sealed(Arc<Topology>),
}

/// Builds a [`Topology`] from fragments, then seals it.
#[derive(Debug)]
pub struct TopologyAssembler {
    state: State,
}

impl Default for TopologyAssembler {
    fn default() -> Self {
        Self::new(AddressAllocator::default())
    }
}

impl TopologyAssembler {
    pub fn new(allocator: AddressAllocator) -> Self {
        Self {
            state: State::Building(Workspace {
                draft: Topology::default(),
                allocator,
            }),
        }
    }

    pub fn with_base(base: Ipv4Addr) -> Self {
        Self::new(AddressAllocator::new(base))
    }

    fn workspace(&self) -> Result<&Workspace> {
        match &self.state {
            State::Building(ws) => Ok(ws),
            State::Sealed(_) => Err(TopologyError::TopologyAlreadySealed),
        }
    }

    fn workspace_mut(&mut self) -> Result<&mut Workspace> {
        match &mut self.state {
            State::Building(ws) => Ok(ws),
            State::Sealed(_) => Err(TopologyError::TopologyAlreadySealed),
        }
    }

    pub fn is_sealed(&self) -> bool {
        matches!(self.state, State::Sealed(_))
    }

    /// The sealed topology, once `seal` has run.
    pub fn sealed(&self) -> Option<Arc<Topology>> {
        match &self.state {
            State::Sealed(topology) => Some(Arc::clone(topology)),
            State::Building(_) => None,
        }
    }

    /// Look up a node by name in the in-progress or sealed graph.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        let topology = match &self.state {
            State::Building(ws) => &ws.draft,
            State::Sealed(topology) => topology.as_ref(),
        };
        topology.node_by_name(name).map(|n| n.id)
    }

    /// Create a node shared between segments (a switch, a server, an access
    /// point that also sits on an uplink).
    pub fn declare_node(&mut self, name: impl Into<String>, role: NodeRole) -> Result<NodeId> {
        let ws = self.workspace_mut()?;
        let name = name.into();
        if role == NodeRole::BridgeForwarder {
            return Err(TopologyError::BridgeOutsideLan(name));
        }
        let id = ws.draft.add_node(name.clone(), role)?;
        debug!("Declared node {} ({}) as {:?}", name, role, id);
        Ok(id)
    }

    /// Build `spec` and merge the resulting fragment.
    pub fn add_segment(&mut self, spec: &SegmentSpec) -> Result<MergedSegment> {
        self.merge(spec.build())
    }

    /// Merge one fragment and number its devices.
    pub fn merge(&mut self, fragment: Fragment) -> Result<MergedSegment> {
        // Copies the whole workspace; total cost is quadratic in segment count (at most 254).
        let mut staged = self.workspace()?.clone();
        let merged = staged.apply(fragment)?;
        self.state = State::Building(staged);
        Ok(merged)
    }

    /// Freeze the topology. Later `merge`, `declare_node` or `seal` calls fail
    /// with [`TopologyError::TopologyAlreadySealed`].
    pub fn seal(&mut self) -> Result<Arc<Topology>> {
        let ws = std::mem::take(self.workspace_mut()?);
        let mut topology = ws.draft;
        topology.compute_routable();
        info!(
            "Sealed topology: {} nodes ({} routable), {} links, {} subnets",
            topology.nodes().len(),
            topology.routable_nodes().len(),
            topology.links().len(),
            topology.subnets().len()
        );
        let topology = Arc::new(topology);
        self.state = State::Sealed(Arc::clone(&topology));
        Ok(topology)
    }

    /// Merge every fragment in order and seal. Any error discards the whole
    /// assembly.
    pub fn assemble<I>(mut self, fragments: I) -> Result<Arc<Topology>>
    where
        I: IntoIterator<Item = Fragment>,
    {
        for fragment in fragments {
            self.merge(fragment)?;
        }
        self.seal()
    }
}

/// One-shot assembly of self-contained fragments.
pub fn assemble<I>(allocator: AddressAllocator, fragments: I) -> Result<Arc<Topology>>
where
    I: IntoIterator<Item = Fragment>,
{
    TopologyAssembler::new(allocator).assemble(fragments)
}

impl Workspace {
    /// Reject references to nodes, links or attachments the fragment does not
    /// carry, and bridge-forwarders anywhere but the LAN bridge slot.
    fn check_fragment(&self, fragment: &Fragment) -> Result<()> {
        let malformed = |reason: String| TopologyError::MalformedFragment {
            segment: fragment.segment.clone(),
            reason,
        };

        let refs = fragment
            .links
            .iter()
            .flat_map(|l| l.attachments.iter())
            .chain(fragment.bridge.iter())
            .chain(fragment.access_point.iter())
            .chain(fragment.placement.iter().flat_map(|p| p.nodes.iter()));
        for &r in refs {
            match r {
                NodeRef::New(idx) if idx >= fragment.new_nodes.len() => {
                    return Err(malformed(format!(
                        "new node {} out of range ({} new nodes)",
                        idx,
                        fragment.new_nodes.len()
                    )));
                }
                NodeRef::New(_) => {}
                NodeRef::Existing(id) => {
                    self.draft.node(id).ok_or(TopologyError::UnknownNode(id))?;
                }
            }
        }

        for &(link, slot) in &fragment.addressed {
            let in_range = fragment
                .links
                .get(link)
                .is_some_and(|l| slot < l.attachments.len());
            if !in_range {
                return Err(malformed(format!("addressed attachment ({}, {}) does not exist", link, slot)));
            }
        }

        for (idx, new) in fragment.new_nodes.iter().enumerate() {
            if new.role == NodeRole::BridgeForwarder && fragment.bridge != Some(NodeRef::New(idx)) {
                return Err(TopologyError::BridgeOutsideLan(new.name.clone()));
            }
        }
        match fragment.bridge {
            None => {}
            Some(NodeRef::New(idx)) if fragment.new_nodes[idx].role == NodeRole::BridgeForwarder => {}
            Some(NodeRef::New(idx)) => {
                return Err(TopologyError::RoleMismatch {
                    segment: fragment.segment.clone(),
                    node: fragment.new_nodes[idx].name.clone(),
                    expected: NodeRole::BridgeForwarder.to_string(),
                    found: fragment.new_nodes[idx].role,
                });
            }
            Some(NodeRef::Existing(_)) => {
                return Err(malformed("the bridge must be a node of the fragment".to_string()));
            }
        }
        Ok(())
    }

    fn apply(&mut self, fragment: Fragment) -> Result<MergedSegment> {
        let segment = fragment.segment.clone();
        if self.draft.segments().iter().any(|s| s.name == segment) {
            return Err(TopologyError::DuplicateSegment(segment));
        }
        self.check_fragment(&fragment)?;

        for id in fragment.existing_nodes() {
            let node = self.draft.node(id).ok_or(TopologyError::UnknownNode(id))?;
            if node.role == NodeRole::BridgeForwarder {
                return Err(TopologyError::RoleMismatch {
                    segment,
                    node: node.name.clone(),
                    expected: "a routable role".to_string(),
                    found: node.role,
                });
            }
        }

        let mut new_nodes = Vec::with_capacity(fragment.new_nodes.len());
        for new in &fragment.new_nodes {
            new_nodes.push(self.draft.add_node(new.name.clone(), new.role)?);
        }
        let resolve = |r: NodeRef| match r {
            NodeRef::New(idx) => new_nodes[idx],
            NodeRef::Existing(id) => id,
        };

        if let Some(ap) = fragment.access_point {
            let node = &self.draft.nodes()[resolve(ap).0];
            if node.role != NodeRole::AccessPoint {
                return Err(TopologyError::RoleMismatch {
                    segment,
                    node: node.name.clone(),
                    expected: NodeRole::AccessPoint.to_string(),
                    found: node.role,
                });
            }
        }

        // Every node but the bridge joins a segment through exactly one device.
        let bridge = fragment.bridge.map(resolve);
        let mut attached: Vec<NodeId> = Vec::new();
        let mut link_ids = Vec::with_capacity(fragment.links.len());
        let mut link_devices: Vec<Vec<DeviceId>> = Vec::with_capacity(fragment.links.len());
        for flink in &fragment.links {
            let id = LinkId(self.draft.links().len());
            let mut link = Link {
                id,
                kind: flink.kind,
                segment: segment.clone(),
                profile: fragment.profile.clone(),
                ssid: flink.ssid.clone(),
                attachments: Vec::with_capacity(flink.attachments.len()),
            };
            let mut devices = Vec::with_capacity(flink.attachments.len());
            for &r in &flink.attachments {
                let node = resolve(r);
                let repeated = if Some(node) == bridge {
                    link.attachments.iter().any(|a| a.node == node)
                } else {
                    attached.contains(&node)
                };
                if repeated {
                    return Err(TopologyError::DuplicateAttachment {
                        segment,
                        node: self.draft.nodes()[node.0].name.clone(),
                    });
                }
                let device = self.draft.add_device(node, id);
                if Some(node) != bridge {
                    attached.push(node);
                }
                link.attachments.push(Attachment { node, device });
                devices.push(device);
            }
            let access_points = link
                .nodes()
                .filter(|n| self.draft.nodes()[n.0].role == NodeRole::AccessPoint)
                .count();
            if !link.has_valid_shape(access_points) {
                return Err(TopologyError::MalformedLink {
                    segment,
                    kind: link.kind,
                    attachments: link.attachments.len(),
                    access_points,
                });
            }
            self.draft.links.push(link);
            link_ids.push(id);
            link_devices.push(devices);
        }

        if let Some(bridge) = bridge {
            let ports = link_devices
                .iter()
                .flatten()
                .copied()
                .filter(|&d| self.draft.devices()[d.0].node == bridge)
                .collect();
            self.draft.bridges.push(BridgeGroup {
                segment: segment.clone(),
                bridge,
                ports,
            });
        }

        if let Some(placement) = &fragment.placement {
            self.draft.placements.push(PlacementDirective {
                segment: segment.clone(),
                nodes: placement.nodes.iter().map(|&r| resolve(r)).collect(),
                strategy: placement.strategy.clone(),
            });
        }

        let to_address: Vec<DeviceId> = fragment
            .addressed
            .iter()
            .map(|&(link, slot)| link_devices[link][slot])
            .filter(|d| {
                let node = self.draft.devices()[d.0].node;
                self.draft.nodes()[node.0].role.is_routable()
            })
            .collect();

        let (subnet, addresses) = self.number(&segment, &fragment.addressing, &to_address)?;

        let merged = MergedSegment {
            segment: segment.clone(),
            new_nodes,
            links: link_ids.clone(),
            subnet: subnet.map(|idx| self.draft.subnets()[idx].network()),
            addresses: addresses.clone(),
        };
        info!(
            "Merged {} segment '{}': {} new nodes, {} links, {} addresses{}",
            fragment.segment_type,
            segment,
            merged.new_nodes.len(),
            merged.links.len(),
            merged.addresses.len(),
            merged
                .subnet
                .map(|net| format!(" in {}/24", net))
                .unwrap_or_default()
        );
        self.draft.segments.push(SegmentRecord {
            name: segment,
            segment_type: fragment.segment_type,
            links: link_ids,
            subnet,
            addresses,
        });
        Ok(merged)
    }

    /// Number `devices` according to the segment's addressing policy.
    fn number(
        &mut self,
        segment: &str,
        addressing: &Addressing,
        devices: &[DeviceId],
    ) -> Result<(Option<usize>, Vec<(DeviceId, Ipv4Addr)>)> {
        if devices.is_empty() {
            return Ok((None, Vec::new()));
        }

        let (idx, assigned) = match addressing {
            Addressing::Fresh => {
                let mut subnet = self.allocator.allocate_subnet()?;
                let assigned = self.allocator.assign(&mut subnet, devices)?;
                self.draft.subnets.push(subnet);
                (self.draft.subnets.len() - 1, assigned)
            }
            Addressing::Continue(owner) => {
                let idx = self
                    .draft
                    .segment(owner)
                    .and_then(|s| s.subnet)
                    .ok_or_else(|| TopologyError::UnknownSegment(owner.clone()))?;
                debug!("Segment '{}' continues subnet of '{}'", segment, owner);
                let assigned = self.allocator.assign(&mut self.draft.subnets[idx], devices)?;
                (idx, assigned)
            }
        };

        for &(device, addr) in &assigned {
            let registered = self.draft.plan.register(device, addr);
            debug_assert!(registered.is_ok(), "address {} issued twice", addr);
        }
        Ok((Some(idx), assigned))
    }
}
