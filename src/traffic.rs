//! Traffic plan.
//!
//! Flows are declared against node names and resolved to concrete device
//! addresses once the topology is sealed. The application layer only ever
//! sees [`ResolvedFlow`]s.

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::topology::{NodeId, Topology};

/// Transport used by a generated flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowProtocol {
    #[default]
    Udp,
    Tcp,
}

/// A flow endpoint: a node, optionally pinned to one of its segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
}

impl EndpointSpec {
    pub fn node(name: impl Into<String>) -> Self {
        Self {
            node: name.into(),
            segment: None,
        }
    }

    pub fn on_segment(name: impl Into<String>, segment: impl Into<String>) -> Self {
        Self {
            node: name.into(),
            segment: Some(segment.into()),
        }
    }
}

/// Declared flow between two named endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSpec {
    pub source: EndpointSpec,
    pub sink: EndpointSpec,
    pub protocol: FlowProtocol,
    pub port: u16,
    /// Constant send rate, e.g. `500kb/s`
    pub rate: String,
    pub start: Duration,
    pub stop: Duration,
}

/// A flow with both ends resolved to addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFlow {
    pub source_node: NodeId,
    pub source: Ipv4Addr,
    pub sink_node: NodeId,
    pub sink: Ipv4Addr,
    pub protocol: FlowProtocol,
    pub port: u16,
    pub rate: String,
    pub start: Duration,
    pub stop: Duration,
}

/// Errors resolving a traffic plan against a topology.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrafficError {
    #[error("flow {flow}: unknown endpoint node '{node}'")]
    UnknownEndpoint { flow: usize, node: String },
    #[error("flow {flow}: node '{node}' has no address{}", on_segment(.segment))]
    UnaddressedEndpoint {
        flow: usize,
        node: String,
        segment: Option<String>,
    },
    #[error("flow {flow}: stop time {stop:?} is not after start time {start:?}")]
    InvalidWindow {
        flow: usize,
        start: Duration,
        stop: Duration,
    },
}

fn on_segment(segment: &Option<String>) -> String {
    segment
        .as_ref()
        .map(|s| format!(" on segment '{}'", s))
        .unwrap_or_default()
}

/// Ordered set of flows to install once the topology is sealed.
#[derive(Debug, Clone, Default)]
pub struct TrafficPlan {
    flows: Vec<FlowSpec>,
}

impl TrafficPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, flow: FlowSpec) {
        self.flows.push(flow);
    }

    pub fn flows(&self) -> &[FlowSpec] {
        &self.flows
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Resolve every flow against `topology`, in declaration order.
    pub fn resolve(&self, topology: &Topology) -> Result<Vec<ResolvedFlow>, TrafficError> {
        self.flows
            .iter()
            .enumerate()
            .map(|(idx, flow)| resolve_flow(idx, flow, topology))
            .collect()
    }
}

fn resolve_flow(idx: usize, flow: &FlowSpec, topology: &Topology) -> Result<ResolvedFlow, TrafficError> {
    if flow.stop <= flow.start {
        return Err(TrafficError::InvalidWindow {
            flow: idx,
            start: flow.start,
            stop: flow.stop,
        });
    }
    let (source_node, source) = resolve_endpoint(idx, &flow.source, topology)?;
    let (sink_node, sink) = resolve_endpoint(idx, &flow.sink, topology)?;
    log::debug!(
        "Flow {}: {} ({}) -> {} ({}) port {}",
        idx,
        flow.source.node,
        source,
        flow.sink.node,
        sink,
        flow.port
    );
    Ok(ResolvedFlow {
        source_node,
        source,
        sink_node,
        sink,
        protocol: flow.protocol,
        port: flow.port,
        rate: flow.rate.clone(),
        start: flow.start,
        stop: flow.stop,
    })
}

/// Without a segment, a node's first addressed device is used.
fn resolve_endpoint(
    idx: usize,
    endpoint: &EndpointSpec,
    topology: &Topology,
) -> Result<(NodeId, Ipv4Addr), TrafficError> {
    let node = topology
        .node_by_name(&endpoint.node)
        .ok_or_else(|| TrafficError::UnknownEndpoint {
            flow: idx,
            node: endpoint.node.clone(),
        })?;

    let addr = match &endpoint.segment {
        Some(segment) => topology.address_on_segment(node.id, segment),
        None => topology.node_addresses(node.id).first().map(|&(_, addr)| addr),
    };

    addr.map(|addr| (node.id, addr))
        .ok_or_else(|| TrafficError::UnaddressedEndpoint {
            flow: idx,
            node: endpoint.node.clone(),
            segment: endpoint.segment.clone(),
        })
}
