//! Scenario orchestrator.
//!
//! This module drives the whole run: it turns a validated [`Config`] into
//! segment specs, assembles and seals the topology, resolves the traffic plan
//! and writes `scenario.yaml` and `address_plan.json`.

use crate::config::{Config, SegmentConfig};
use crate::engine::{address_plan_document, drive, ScenarioExporter};
use crate::topology::{Endpoint, NodeId, NodeRole, SegmentSpec, Topology, TopologyAssembler};
use crate::traffic::{ResolvedFlow, TrafficPlan};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the exported scenario
pub const SCENARIO_FILE: &str = "scenario.yaml";
/// File name of the exported address plan
pub const ADDRESS_PLAN_FILE: &str = "address_plan.json";

/// A sealed topology plus the flows resolved against it
#[derive(Debug, Clone)]
pub struct BuiltScenario {
    pub topology: Arc<Topology>,
    pub flows: Vec<ResolvedFlow>,
}

/// Paths written by [`write_outputs`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub scenario: PathBuf,
    pub address_plan: PathBuf,
}

fn lookup(assembler: &TopologyAssembler, segment: &str, node: &str) -> Result<NodeId> {
    assembler
        .node_id(node)
        .ok_or_else(|| eyre!("Segment '{}': unknown node '{}'", segment, node))
}

/// Translate one configured segment, resolving node names against what has
/// been merged so far.
fn segment_spec(assembler: &TopologyAssembler, segment: &SegmentConfig) -> Result<SegmentSpec> {
    let spec = match segment {
        SegmentConfig::BridgedLan {
            name,
            hosts,
            members,
            layout,
            ..
        } => {
            let members = members
                .iter()
                .map(|m| lookup(assembler, name, m))
                .collect::<Result<Vec<_>>>()?;
            SegmentSpec::bridged_lan(name.clone(), *hosts, members).with_layout(*layout)
        }
        SegmentConfig::PointToPoint { name, endpoints, .. } => {
            let a = lookup(assembler, name, &endpoints[0])?;
            let b = lookup(assembler, name, &endpoints[1])?;
            SegmentSpec::point_to_point(name.clone(), a.into(), b.into())
        }
        SegmentConfig::WirelessCell {
            name,
            stations,
            ssid,
            placement,
            ..
        } => {
            let ap_name = segment
                .access_point_name()
                .unwrap_or_else(|| format!("{}-ap", name));
            let access_point = match assembler.node_id(&ap_name) {
                Some(id) => Endpoint::from(id),
                None => Endpoint::new(ap_name, NodeRole::AccessPoint),
            };
            let mut spec = SegmentSpec::wireless_cell(name.clone(), *stations, access_point);
            if let Some(ssid) = ssid {
                spec = spec.with_ssid(ssid.clone());
            }
            if let Some(strategy) = placement {
                spec = spec.with_placement(strategy.clone());
            }
            spec
        }
    };

    let spec = spec.with_profile(segment.link().clone());
    Ok(match segment.share_subnet_with() {
        Some(owner) => spec.sharing_subnet_with(owner),
        None => spec,
    })
}

/// Assemble and seal the topology described by `config`
pub fn build_topology(config: &Config) -> Result<Arc<Topology>> {
    let mut assembler = TopologyAssembler::with_base(config.addressing.base);

    for node in &config.nodes {
        assembler
            .declare_node(node.name.clone(), node.role)
            .wrap_err_with(|| format!("Failed to declare node '{}'", node.name))?;
    }

    for segment in &config.segments {
        let spec = segment_spec(&assembler, segment)?;
        assembler
            .add_segment(&spec)
            .wrap_err_with(|| format!("Failed to merge segment '{}'", segment.name()))?;
    }

    let topology = assembler.seal()?;
    Ok(topology)
}

/// Assemble the topology and resolve the configured traffic against it
pub fn build_scenario(config: &Config) -> Result<BuiltScenario> {
    let topology = build_topology(config)?;

    let mut plan = TrafficPlan::new();
    for flow in &config.traffic {
        plan.push(flow.to_flow_spec());
    }
    let flows = plan
        .resolve(&topology)
        .wrap_err("Failed to resolve traffic plan")?;

    Ok(BuiltScenario { topology, flows })
}

/// Export the scenario and the address plan into `output_dir`
pub fn write_outputs(config: &Config, scenario: &BuiltScenario, output_dir: &Path) -> Result<OutputFiles> {
    std::fs::create_dir_all(output_dir)
        .wrap_err_with(|| format!("Failed to create output directory '{}'", output_dir.display()))?;

    let mut exporter = ScenarioExporter::new(config.general.stop_time);
    drive(&scenario.topology, &scenario.flows, &mut exporter);

    let scenario_path = output_dir.join(SCENARIO_FILE);
    let scenario_yaml = serde_yaml::to_string(exporter.document())?;
    std::fs::write(&scenario_path, scenario_yaml)
        .wrap_err_with(|| format!("Failed to write {:?}", scenario_path))?;

    let plan_path = output_dir.join(ADDRESS_PLAN_FILE);
    let plan_json = serde_json::to_string_pretty(&address_plan_document(&scenario.topology))?;
    std::fs::write(&plan_path, plan_json)
        .wrap_err_with(|| format!("Failed to write {:?}", plan_path))?;

    log::info!("Wrote {:?} and {:?}", scenario_path, plan_path);

    Ok(OutputFiles {
        scenario: scenario_path,
        address_plan: plan_path,
    })
}

/// Print a human readable summary of the assembled scenario
pub fn print_summary(config: &Config, scenario: &BuiltScenario) {
    let topology = &scenario.topology;

    println!(
        "Assembled topology with {} nodes, {} links and {} devices",
        topology.nodes().len(),
        topology.links().len(),
        topology.devices().len()
    );
    println!("  - Simulation time: {:?}", config.general.stop_time);
    println!("  - Bridge forwarders: {}", topology.bridge_count());
    println!("  - Routable nodes: {}", topology.routable_nodes().len());

    println!("  - Address plan:");
    for (idx, subnet) in topology.subnets().iter().enumerate() {
        let segments: Vec<&str> = topology
            .segments()
            .iter()
            .filter(|s| s.subnet == Some(idx))
            .map(|s| s.name.as_str())
            .collect();
        println!(
            "    - {}: {} addresses ({})",
            subnet,
            subnet.hosts().len(),
            segments.join(", ")
        );
    }
    println!("  - Total addresses assigned: {}", topology.address_plan().len());

    if !scenario.flows.is_empty() {
        println!("  - Flows:");
        for flow in &scenario.flows {
            println!(
                "    - {} -> {}:{} at {} ({:?} to {:?})",
                flow.source, flow.sink, flow.port, flow.rate, flow.start, flow.stop
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const SCENARIO: &str = r#"
nodes:
  - name: switch
    role: router
segments:
  - kind: bridged_lan
    name: lan
    hosts: 3
    members: [switch]
  - kind: wireless_cell
    name: wifi
    stations: 2
    ssid: campus
  - kind: point_to_point
    name: uplink
    endpoints: [wifi-ap, switch]
    share_subnet_with: wifi
traffic:
  - source: wifi-sta1
    sink: lan-host2
    rate: 500kb/s
    stop: 10s
"#;

    fn config() -> Config {
        let config: Config = serde_yaml::from_str(SCENARIO).unwrap();
        config.validate().unwrap();
        config
    }

    #[test]
    fn test_build_scenario() {
        let scenario = build_scenario(&config()).unwrap();
        let topology = &scenario.topology;

        assert_eq!(topology.bridge_count(), 1);
        assert_eq!(topology.subnets().len(), 2);
        assert_eq!(topology.segment_subnet("uplink"), topology.segment_subnet("wifi"));
        assert_eq!(topology.links()[4].ssid.as_deref(), Some("campus"));

        let ap = topology.node_by_name("wifi-ap").unwrap();
        assert_eq!(ap.role, NodeRole::AccessPoint);
        assert_eq!(topology.address_on_segment(ap.id, "uplink"), Some(Ipv4Addr::new(10, 1, 2, 4)));

        assert_eq!(scenario.flows.len(), 1);
        assert_eq!(scenario.flows[0].source, Ipv4Addr::new(10, 1, 2, 2));
        assert_eq!(scenario.flows[0].sink, Ipv4Addr::new(10, 1, 1, 3));
    }

    #[test]
    fn test_custom_base() {
        let mut config = config();
        config.addressing.base = Ipv4Addr::new(192, 168, 10, 0);
        let topology = build_topology(&config).unwrap();
        assert_eq!(topology.subnets()[0].network(), Ipv4Addr::new(192, 168, 10, 0));
        assert_eq!(topology.subnets()[1].network(), Ipv4Addr::new(192, 168, 11, 0));
    }

    #[test]
    fn test_merge_error_names_segment() {
        // A declared host cannot serve as an access point
        let yaml = r#"
nodes:
  - name: ap
    role: host
segments:
  - kind: wireless_cell
    name: cell
    stations: 1
    access_point: ap
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let err = build_topology(&config).unwrap_err();
        assert!(format!("{:?}", err).contains("Failed to merge segment 'cell'"));
    }

    #[test]
    fn test_write_outputs() {
        let config = config();
        let scenario = build_scenario(&config).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let files = write_outputs(&config, &scenario, &dir.path().join("out")).unwrap();
        assert!(files.scenario.ends_with(SCENARIO_FILE));

        let yaml = std::fs::read_to_string(&files.scenario).unwrap();
        assert!(yaml.contains("lan-bridge"));
        assert!(yaml.contains("ssid: campus"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&files.address_plan).unwrap()).unwrap();
        assert_eq!(json["subnets"][0]["network"], "10.1.1.0/24");
        assert_eq!(json["subnets"][1]["segments"][1], "uplink");
    }
}
