#[cfg(test)]
mod topology_scenarios {
    use std::collections::BTreeSet;
    use std::net::Ipv4Addr;
    use std::path::Path;
    use std::sync::Arc;

    use topoplan::config_loader::{apply_overrides, load_config, CliOverrides};
    use topoplan::error::TopologyError;
    use topoplan::ip::{AddressAllocator, HOSTS_PER_SUBNET};
    use topoplan::orchestrator::{build_scenario, write_outputs, ADDRESS_PLAN_FILE, SCENARIO_FILE};
    use topoplan::topology::{
        assemble, Endpoint, NodeRole, SegmentSpec, Topology, TopologyAssembler,
    };

    /// LAN of 10 hosts plus switch and server, an uplink from the switch to
    /// an access point, and a 10-station cell behind that access point.
    fn reference_scenario() -> Arc<Topology> {
        let mut assembler = TopologyAssembler::default();
        let switch = assembler.declare_node("switch", NodeRole::Router).unwrap();
        let server = assembler.declare_node("server", NodeRole::Host).unwrap();
        let ap = assembler.declare_node("ap", NodeRole::AccessPoint).unwrap();

        assembler
            .add_segment(&SegmentSpec::bridged_lan("lan", 10, vec![switch, server]))
            .unwrap();
        assembler
            .add_segment(&SegmentSpec::point_to_point("uplink", switch.into(), ap.into()))
            .unwrap();
        assembler
            .add_segment(&SegmentSpec::wireless_cell("wifi", 10, ap.into()))
            .unwrap();
        assembler.seal().unwrap()
    }

    fn campus_path() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/campus.yaml")
    }

    #[test]
    fn test_reference_scenario_counts() {
        let topology = reference_scenario();

        assert_eq!(topology.bridge_count(), 1);
        assert_eq!(topology.segment("lan").unwrap().addresses.len(), 12);
        assert_eq!(topology.segment("uplink").unwrap().addresses.len(), 2);
        assert_eq!(topology.segment("wifi").unwrap().addresses.len(), 11);

        let prefixes: BTreeSet<Ipv4Addr> = topology.subnets().iter().map(|s| s.network()).collect();
        assert_eq!(prefixes.len(), 3);
        assert_eq!(
            prefixes.into_iter().collect::<Vec<_>>(),
            vec![
                Ipv4Addr::new(10, 1, 1, 0),
                Ipv4Addr::new(10, 1, 2, 0),
                Ipv4Addr::new(10, 1, 3, 0),
            ]
        );
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let first = reference_scenario();
        let second = reference_scenario();

        assert_eq!(first.nodes(), second.nodes());
        assert_eq!(first.links(), second.links());
        assert_eq!(first.devices(), second.devices());
        assert_eq!(first.segments(), second.segments());
        assert_eq!(
            first.address_plan().iter().collect::<Vec<_>>(),
            second.address_plan().iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_addresses_and_prefixes_unique() {
        let topology = reference_scenario();

        let mut seen = BTreeSet::new();
        for (_, addr) in topology.address_plan().iter() {
            assert!(seen.insert(addr), "address {} assigned twice", addr);
        }
        for subnet in topology.subnets() {
            for addr in subnet.hosts() {
                assert!(subnet.contains(*addr));
            }
        }
        assert_eq!(seen.len(), 25);
    }

    #[test]
    fn test_bridges_never_addressed_or_routed() {
        let topology = reference_scenario();

        for (device, _) in topology.address_plan().iter() {
            let node = topology.device(device).unwrap().node;
            assert_ne!(topology.node(node).unwrap().role, NodeRole::BridgeForwarder);
        }

        let expected: Vec<_> = topology
            .nodes()
            .iter()
            .filter(|n| n.role != NodeRole::BridgeForwarder)
            .map(|n| n.id)
            .collect();
        assert_eq!(topology.routable_nodes(), expected.as_slice());
    }

    #[test]
    fn test_address_space_exhaustion() {
        let mut assembler = TopologyAssembler::default();
        let a = assembler.declare_node("a", NodeRole::Router).unwrap();
        let b = assembler.declare_node("b", NodeRole::Router).unwrap();

        for i in 0..254 {
            let name = format!("link{}", i);
            assembler
                .add_segment(&SegmentSpec::point_to_point(name, a.into(), b.into()))
                .unwrap();
        }
        let err = assembler
            .add_segment(&SegmentSpec::point_to_point("link254", a.into(), b.into()))
            .unwrap_err();
        assert!(matches!(err, TopologyError::AddressSpaceExhausted { issued: 254, .. }));

        let topology = assembler.seal().unwrap();
        assert_eq!(topology.subnets().len(), 254);
        assert_eq!(topology.subnets()[253].network(), Ipv4Addr::new(10, 1, 254, 0));
    }

    #[test]
    fn test_subnet_capacity_bounds() {
        let full = SegmentSpec::bridged_lan("full", HOSTS_PER_SUBNET, Vec::new()).build();
        let topology = assemble(AddressAllocator::default(), [full]).unwrap();
        let hosts = topology.subnets()[0].hosts();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts[0], Ipv4Addr::new(10, 1, 1, 1));
        assert_eq!(hosts[253], Ipv4Addr::new(10, 1, 1, 254));

        let over = SegmentSpec::bridged_lan("over", HOSTS_PER_SUBNET + 1, Vec::new()).build();
        let err = assemble(AddressAllocator::default(), [over]).unwrap_err();
        assert!(matches!(err, TopologyError::SubnetOverflow { requested: 255, .. }));
    }

    #[test]
    fn test_sealed_topology_is_frozen() {
        let mut assembler = TopologyAssembler::default();
        assembler
            .add_segment(&SegmentSpec::bridged_lan("lan", 2, Vec::new()))
            .unwrap();
        let sealed = assembler.seal().unwrap();
        let nodes_before = sealed.nodes().to_vec();

        let err = assembler
            .add_segment(&SegmentSpec::wireless_cell(
                "late",
                1,
                Endpoint::new("late-ap", NodeRole::AccessPoint),
            ))
            .unwrap_err();
        assert_eq!(err, TopologyError::TopologyAlreadySealed);
        assert_eq!(sealed.nodes(), nodes_before.as_slice());
        assert!(Arc::ptr_eq(&sealed, &assembler.sealed().unwrap()));
    }

    #[test]
    fn test_campus_scenario() {
        let config = load_config(&campus_path()).unwrap();
        let scenario = build_scenario(&config).unwrap();
        let topology = &scenario.topology;

        // switch, bridge, 10 hosts, 2 x (10 stations + access point)
        assert_eq!(topology.nodes().len(), 34);
        assert_eq!(topology.bridge_count(), 1);
        assert_eq!(topology.subnets().len(), 3);
        assert_eq!(topology.segment_subnet("uplink2"), topology.segment_subnet("wifi2"));

        let switch = topology.node_by_name("switch").unwrap().id;
        assert_eq!(
            topology.address_on_segment(switch, "lan"),
            Some(Ipv4Addr::new(10, 1, 1, 11))
        );
        assert_eq!(
            topology.address_on_segment(switch, "uplink1"),
            Some(Ipv4Addr::new(10, 1, 2, 13))
        );

        assert_eq!(scenario.flows.len(), 1);
        assert_eq!(scenario.flows[0].source, Ipv4Addr::new(10, 1, 3, 6));
        assert_eq!(scenario.flows[0].sink, Ipv4Addr::new(10, 1, 1, 4));
        assert_eq!(scenario.flows[0].port, 9);
    }

    #[test]
    fn test_campus_outputs() {
        let config = load_config(&campus_path()).unwrap();
        let scenario = build_scenario(&config).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let files = write_outputs(&config, &scenario, dir.path()).unwrap();
        assert_eq!(files.scenario, dir.path().join(SCENARIO_FILE));
        assert_eq!(files.address_plan, dir.path().join(ADDRESS_PLAN_FILE));

        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&std::fs::read_to_string(&files.scenario).unwrap()).unwrap();
        assert_eq!(yaml["placements"].as_sequence().unwrap().len(), 2);
        assert_eq!(yaml["bridges"][0]["node"].as_str(), Some("lan-bridge"));
        assert_eq!(yaml["bridges"][0]["ports"].as_sequence().unwrap().len(), 11);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&files.address_plan).unwrap()).unwrap();
        let subnets = json["subnets"].as_array().unwrap();
        assert_eq!(subnets.len(), 3);
        assert_eq!(subnets[0]["hosts"].as_array().unwrap().len(), 11);
        assert_eq!(subnets[1]["hosts"].as_array().unwrap().len(), 13);
        assert_eq!(subnets[2]["network"], "10.1.3.0/24");
    }

    #[test]
    fn test_campus_overrides() {
        let mut config = load_config(&campus_path()).unwrap();

        let overrides = CliOverrides {
            lan_hosts: Some(40),
            stations: None,
        };
        apply_overrides(&mut config, &overrides).unwrap();
        let scenario = build_scenario(&config).unwrap();
        assert_eq!(scenario.topology.segment("lan").unwrap().addresses.len(), 41);

        // The list placements only cover ten stations and the access point
        let overrides = CliOverrides {
            lan_hosts: None,
            stations: Some(12),
        };
        assert!(apply_overrides(&mut config, &overrides).is_err());
    }
}
