//! Scenario export backend.

use std::time::Duration;

use crate::topology::{BridgeGroup, Link, NodeId, PlacementDirective, Topology};
use crate::traffic::ResolvedFlow;

use super::types::{
    AddressPlanDocument, AttachmentEntry, BridgeEntry, FlowEntry, HostEntry, LinkEntry, NodeEntry,
    PlacementEntry, ScenarioDocument, ScenarioGeneral, SubnetEntry,
};
use super::SimulationBackend;

/// Backend that records the hand-off as a serializable document.
#[derive(Debug, Default)]
pub struct ScenarioExporter {
    document: ScenarioDocument,
}

fn node_name(topology: &Topology, id: NodeId) -> String {
    topology
        .node(id)
        .map(|n| n.name.clone())
        .unwrap_or_else(|| format!("node{}", id.0))
}

impl ScenarioExporter {
    pub fn new(stop_time: Duration) -> Self {
        Self {
            document: ScenarioDocument {
                general: ScenarioGeneral { stop_time },
                ..ScenarioDocument::default()
            },
        }
    }

    pub fn document(&self) -> &ScenarioDocument {
        &self.document
    }

    pub fn into_document(self) -> ScenarioDocument {
        self.document
    }
}

impl SimulationBackend for ScenarioExporter {
    fn create_nodes(&mut self, topology: &Topology) {
        self.document.nodes = topology
            .nodes()
            .iter()
            .map(|n| NodeEntry {
                id: n.id.0,
                name: n.name.clone(),
                role: n.role,
            })
            .collect();
    }

    fn configure_link(&mut self, topology: &Topology, link: &Link) {
        let attachments = link
            .attachments
            .iter()
            .map(|a| AttachmentEntry {
                node: node_name(topology, a.node),
                device: a.device.0,
                address: topology.address_of(a.device).map(|addr| addr.to_string()),
            })
            .collect();
        self.document.links.push(LinkEntry {
            id: link.id.0,
            segment: link.segment.clone(),
            kind: link.kind,
            data_rate: link.profile.data_rate.clone(),
            delay: link.profile.delay.clone(),
            ssid: link.ssid.clone(),
            attachments,
        });
    }

    fn install_bridge(&mut self, topology: &Topology, group: &BridgeGroup) {
        self.document.bridges.push(BridgeEntry {
            node: node_name(topology, group.bridge),
            segment: group.segment.clone(),
            ports: group.ports.iter().map(|d| d.0).collect(),
        });
    }

    fn place_nodes(&mut self, topology: &Topology, directive: &PlacementDirective) {
        self.document.placements.push(PlacementEntry {
            segment: directive.segment.clone(),
            nodes: directive.nodes.iter().map(|&n| node_name(topology, n)).collect(),
            strategy: directive.strategy.clone(),
        });
    }

    fn populate_routing(&mut self, topology: &Topology, routable: &[NodeId]) {
        self.document.routing.nodes = routable.iter().map(|&n| node_name(topology, n)).collect();
    }

    fn install_flow(&mut self, _topology: &Topology, flow: &ResolvedFlow) {
        self.document.flows.push(FlowEntry {
            protocol: flow.protocol,
            source: flow.source.to_string(),
            sink: flow.sink.to_string(),
            port: flow.port,
            rate: flow.rate.clone(),
            start: flow.start,
            stop: flow.stop,
        });
    }
}

/// Render the address plan subnet by subnet, hosts in address order.
pub fn address_plan_document(topology: &Topology) -> AddressPlanDocument {
    let mut subnets: Vec<SubnetEntry> = topology
        .subnets()
        .iter()
        .map(|s| SubnetEntry {
            network: s.to_string(),
            netmask: s.netmask().to_string(),
            segments: Vec::new(),
            hosts: Vec::new(),
        })
        .collect();

    for record in topology.segments() {
        let Some(idx) = record.subnet else { continue };
        let entry = &mut subnets[idx];
        entry.segments.push(record.name.clone());
        for &(device, addr) in &record.addresses {
            let node = topology
                .device(device)
                .map(|d| node_name(topology, d.node))
                .unwrap_or_default();
            entry.hosts.push(HostEntry {
                address: addr.to_string(),
                node,
                device: device.0,
                segment: record.name.clone(),
                segment_type: record.segment_type,
            });
        }
    }

    AddressPlanDocument { subnets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::drive;
    use crate::topology::{Endpoint, LinkProfile, NodeRole, SegmentSpec, TopologyAssembler};
    use crate::traffic::{EndpointSpec, FlowProtocol, FlowSpec, TrafficPlan};

    fn scenario() -> std::sync::Arc<Topology> {
        let mut assembler = TopologyAssembler::default();
        let switch = assembler.declare_node("switch", NodeRole::Router).unwrap();
        assembler
            .add_segment(
                &SegmentSpec::bridged_lan("lan", 2, vec![switch])
                    .with_profile(LinkProfile::new("100Mbps", "6560ns")),
            )
            .unwrap();
        assembler
            .add_segment(&SegmentSpec::wireless_cell(
                "wifi1",
                2,
                Endpoint::new("wifi1-ap", NodeRole::AccessPoint),
            ))
            .unwrap();
        let ap = assembler.node_id("wifi1-ap").unwrap();
        assembler
            .add_segment(
                &SegmentSpec::point_to_point("uplink1", ap.into(), switch.into())
                    .sharing_subnet_with("wifi1"),
            )
            .unwrap();
        assembler.seal().unwrap()
    }

    #[test]
    fn test_exported_document() {
        let topology = scenario();
        let mut plan = TrafficPlan::new();
        plan.push(FlowSpec {
            source: EndpointSpec::node("wifi1-sta1"),
            sink: EndpointSpec::node("lan-host1"),
            protocol: FlowProtocol::Udp,
            port: 9,
            rate: "500kb/s".to_string(),
            start: Duration::from_secs(0),
            stop: Duration::from_secs(10),
        });
        let flows = plan.resolve(&topology).unwrap();

        let mut exporter = ScenarioExporter::new(Duration::from_secs(30));
        drive(&topology, &flows, &mut exporter);
        let doc = exporter.into_document();

        assert_eq!(doc.nodes.len(), topology.nodes().len());
        assert_eq!(doc.links.len(), 5);
        assert_eq!(doc.links[0].data_rate.as_deref(), Some("100Mbps"));
        assert_eq!(doc.links[0].attachments[0].address.as_deref(), Some("10.1.1.1"));
        assert_eq!(doc.links[0].attachments[1].address, None);
        assert_eq!(doc.bridges.len(), 1);
        assert_eq!(doc.bridges[0].ports.len(), 3);
        assert_eq!(doc.placements[0].nodes, vec!["wifi1-sta0", "wifi1-sta1", "wifi1-ap"]);
        assert!(!doc.routing.nodes.contains(&"lan-bridge".to_string()));
        assert_eq!(doc.flows[0].source, "10.1.2.2");
        assert_eq!(doc.flows[0].sink, "10.1.1.2");

        let yaml = serde_yaml::to_string(&doc).unwrap();
        assert!(yaml.contains("stop_time:"));
        assert!(yaml.contains("30s"));
        assert!(yaml.contains("kind: wireless_cell"));
        assert!(yaml.contains("ssid: wifi1"));
    }

    #[test]
    fn test_address_plan_document() {
        let topology = scenario();
        let doc = address_plan_document(&topology);

        assert_eq!(doc.subnets.len(), 2);
        assert_eq!(doc.subnets[0].network, "10.1.1.0/24");
        assert_eq!(doc.subnets[0].segments, vec!["lan"]);
        assert_eq!(doc.subnets[0].hosts.len(), 3);
        assert_eq!(doc.subnets[0].hosts[2].node, "switch");

        assert_eq!(doc.subnets[1].segments, vec!["wifi1", "uplink1"]);
        let hosts: Vec<_> = doc.subnets[1]
            .hosts
            .iter()
            .map(|h| (h.address.as_str(), h.node.as_str()))
            .collect();
        assert_eq!(
            hosts,
            vec![
                ("10.1.2.1", "wifi1-sta0"),
                ("10.1.2.2", "wifi1-sta1"),
                ("10.1.2.3", "wifi1-ap"),
                ("10.1.2.4", "wifi1-ap"),
                ("10.1.2.5", "switch"),
            ]
        );

        let json = serde_json::to_string_pretty(&doc).unwrap();
        assert!(json.contains("\"segment_type\": \"point_to_point\""));
    }
}
