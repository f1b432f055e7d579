//! # Topoplan - Topology assembly and address planning for network simulations
//!
//! This library builds the node/link graph of a simulated network out of
//! bridged LANs, point-to-point links and wireless cells, and hands every
//! routable device a conflict-free IPv4 address.
//!
//! ## Overview
//!
//! A scenario is an ordered list of segments. Each segment is materialized
//! into a fragment of nodes, links and devices, merged into one topology and
//! numbered out of its own /24 subnet (or appended to an earlier segment's
//! subnet). Once every segment is merged the topology is sealed and handed to
//! a simulation backend together with the resolved traffic flows.
//!
//! ## Key Features
//!
//! - **Deterministic**: The same segment list always yields the same graph and addresses
//! - **Conflict-free addressing**: One /24 per segment, never reused, never overfilled
//! - **Layer-2 aware**: Bridge forwarders are wired but never addressed or routed
//! - **Atomic merges**: A failed segment leaves the topology and allocator untouched
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `config`: Type-safe scenario configuration and validation
//! - `config_loader`: Configuration file loading and CLI overrides
//! - `ip`: /24 subnet allocation and the device address plan
//! - `topology`: Segment builders, the assembler and the sealed topology
//! - `traffic`: Flow declarations and their resolution to addresses
//! - `engine`: The simulation backend seam and the YAML/JSON exporter
//! - `orchestrator`: High-level orchestration from config to output files
//! - `utils`: Validation helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use topoplan::{config_loader, orchestrator};
//!
//! let config = config_loader::load_config(Path::new("scenarios/campus.yaml"))?;
//! let scenario = orchestrator::build_scenario(&config)?;
//! orchestrator::write_outputs(&config, &scenario, Path::new("topology_output"))?;
//!
//! // topology_output now contains:
//! // - scenario.yaml: nodes, links, bridges, placements, routing and flows
//! // - address_plan.json: every subnet and the hosts numbered in it
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! Segments can also be assembled directly:
//!
//! ```rust
//! use topoplan::topology::{Endpoint, NodeRole, SegmentSpec, TopologyAssembler};
//!
//! let mut assembler = TopologyAssembler::default();
//! let switch = assembler.declare_node("switch", NodeRole::Router)?;
//! assembler.add_segment(&SegmentSpec::bridged_lan("lan", 10, vec![switch]))?;
//! assembler.add_segment(&SegmentSpec::wireless_cell(
//!     "wifi",
//!     10,
//!     Endpoint::new("wifi-ap", NodeRole::AccessPoint),
//! ))?;
//! let topology = assembler.seal()?;
//!
//! assert_eq!(topology.bridge_count(), 1);
//! assert_eq!(topology.subnets().len(), 2);
//! # Ok::<(), topoplan::error::TopologyError>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! general:
//!   stop_time: "30s"
//!   max_segment_size: 250
//!
//! addressing:
//!   base: 10.1.1.0
//!
//! nodes:
//!   - name: switch
//!     role: router
//!
//! segments:
//!   - kind: bridged_lan
//!     name: lan
//!     hosts: 10
//!     members: [switch]
//!     link: { data_rate: 100Mbps, delay: 6560ns }
//!   - kind: wireless_cell
//!     name: wifi1
//!     stations: 10
//!   - kind: point_to_point
//!     name: uplink1
//!     endpoints: [wifi1-ap, switch]
//!     share_subnet_with: wifi1
//!
//! traffic:
//!   - source: wifi1-sta5
//!     sink: lan-host3
//!     rate: 500kb/s
//!     stop: 10s
//! ```
//!
//! ## Error Handling
//!
//! The core modules return typed `thiserror` errors ([`error::TopologyError`],
//! [`traffic::TrafficError`], [`config::ValidationError`]). The loader and the
//! orchestrator wrap them with `color_eyre` context.

pub mod config;
pub mod config_loader;
pub mod engine;
pub mod error;
pub mod ip;
pub mod orchestrator;
pub mod topology;
pub mod traffic;
pub mod utils;
