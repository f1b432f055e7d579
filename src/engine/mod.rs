//! # Simulation engine seam
//!
//! The physical/MAC engine, the mobility service, the global routing service
//! and the application layer are external collaborators. This module fixes
//! the interface they are fed through ([`SimulationBackend`]) and the order in
//! which a sealed topology is handed over ([`drive`]).
//!
//! ## Hand-off order
//!
//! 1. **Nodes**: every node, in id order
//! 2. **Links**: every link with its attachments, in id order
//! 3. **Bridges**: one layer-2 forwarding instance per bridged LAN
//! 4. **Placement**: one directive per wireless cell
//! 5. **Routing**: the routable-node set
//! 6. **Flows**: resolved traffic flows, in declaration order
//!
//! Every call is fire-and-forget: nothing is read back into the topology.
//!
//! ## Export
//!
//! [`ScenarioExporter`] is the backend shipped with the crate. It renders the
//! calls into a [`ScenarioDocument`] that is serialized to YAML for the
//! external engine, while [`address_plan_document`] produces the JSON address
//! plan.

pub mod types;
pub mod export;

use crate::topology::{BridgeGroup, Link, NodeId, PlacementDirective, Topology};
use crate::traffic::ResolvedFlow;

pub use export::{address_plan_document, ScenarioExporter};
pub use types::{
    AddressPlanDocument, AttachmentEntry, BridgeEntry, FlowEntry, HostEntry, LinkEntry, NodeEntry,
    PlacementEntry, RoutingEntry, ScenarioDocument, ScenarioGeneral, SubnetEntry,
};

/// Consumer of a sealed topology.
pub trait SimulationBackend {
    /// Create the engine-side node objects.
    fn create_nodes(&mut self, _topology: &Topology) {}

    /// Install one medium and its devices.
    fn configure_link(&mut self, topology: &Topology, link: &Link);

    /// Install the layer-2 forwarding instance of a bridge-forwarder.
    fn install_bridge(&mut self, topology: &Topology, group: &BridgeGroup);

    /// Hand a wireless cell's nodes to the mobility service.
    fn place_nodes(&mut self, topology: &Topology, directive: &PlacementDirective);

    /// Hand the routable-node set to the global routing service.
    fn populate_routing(&mut self, topology: &Topology, routable: &[NodeId]);

    /// Install one generated flow.
    fn install_flow(&mut self, topology: &Topology, flow: &ResolvedFlow);
}

/// Feed `topology` and `flows` to `backend` in hand-off order.
pub fn drive<B>(topology: &Topology, flows: &[ResolvedFlow], backend: &mut B)
where
    B: SimulationBackend + ?Sized,
{
    backend.create_nodes(topology);
    for link in topology.links() {
        backend.configure_link(topology, link);
    }
    for group in topology.bridges() {
        backend.install_bridge(topology, group);
    }
    for directive in topology.placements() {
        backend.place_nodes(topology, directive);
    }
    backend.populate_routing(topology, topology.routable_nodes());
    for flow in flows {
        backend.install_flow(topology, flow);
    }
    log::debug!(
        "Handed off {} links, {} bridges, {} placements, {} flows",
        topology.links().len(),
        topology.bridges().len(),
        topology.placements().len(),
        flows.len()
    );
}
