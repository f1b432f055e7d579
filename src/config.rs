use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::ip::DEFAULT_BASE;
use crate::topology::{LanLayout, LinkProfile, NodeRole, PlacementStrategy};
use crate::traffic::{EndpointSpec, FlowProtocol, FlowSpec};
use crate::utils::validation::{
    validate_address_base, validate_data_rate, validate_link_profile, validate_max_segment_size,
    validate_segment_size,
};

/// Default upper bound on generated hosts/stations per segment
pub const DEFAULT_MAX_SEGMENT_SIZE: usize = 250;

/// Scenario configuration as read from YAML
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub addressing: AddressingConfig,
    /// Nodes shared between segments, declared before any segment is built
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeConfig>,
    /// Segments in merge order
    pub segments: Vec<SegmentConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traffic: Vec<FlowConfig>,
}

/// General simulation settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneralConfig {
    #[serde(default = "default_stop_time", with = "humantime_serde")]
    pub stop_time: Duration,
    #[serde(default = "default_max_segment_size")]
    pub max_segment_size: usize,
    /// Default `env_logger` filter; `RUST_LOG` still takes precedence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Where the /24 cursor starts
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AddressingConfig {
    #[serde(default = "default_base")]
    pub base: Ipv4Addr,
}

/// A pre-declared node
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NodeConfig {
    pub name: String,
    pub role: NodeRole,
}

/// One segment, tagged by `kind`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentConfig {
    BridgedLan {
        name: String,
        #[serde(default)]
        hosts: usize,
        /// Existing nodes joining the LAN after the generated hosts
        #[serde(default)]
        members: Vec<String>,
        #[serde(default)]
        layout: LanLayout,
        #[serde(default)]
        link: LinkProfile,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        share_subnet_with: Option<String>,
    },
    PointToPoint {
        name: String,
        endpoints: [String; 2],
        #[serde(default)]
        link: LinkProfile,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        share_subnet_with: Option<String>,
    },
    WirelessCell {
        name: String,
        stations: usize,
        /// Existing access point, or the name of one to create.
        /// Defaults to a new `<name>-ap`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        access_point: Option<String>,
        /// Defaults to the segment name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ssid: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placement: Option<PlacementStrategy>,
        #[serde(default)]
        link: LinkProfile,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        share_subnet_with: Option<String>,
    },
}

impl SegmentConfig {
    pub fn name(&self) -> &str {
        match self {
            SegmentConfig::BridgedLan { name, .. }
            | SegmentConfig::PointToPoint { name, .. }
            | SegmentConfig::WirelessCell { name, .. } => name,
        }
    }

    pub fn link(&self) -> &LinkProfile {
        match self {
            SegmentConfig::BridgedLan { link, .. }
            | SegmentConfig::PointToPoint { link, .. }
            | SegmentConfig::WirelessCell { link, .. } => link,
        }
    }

    pub fn share_subnet_with(&self) -> Option<&str> {
        match self {
            SegmentConfig::BridgedLan { share_subnet_with, .. }
            | SegmentConfig::PointToPoint { share_subnet_with, .. }
            | SegmentConfig::WirelessCell { share_subnet_with, .. } => share_subnet_with.as_deref(),
        }
    }

    /// Name of the access point a wireless cell uses
    pub fn access_point_name(&self) -> Option<String> {
        match self {
            SegmentConfig::WirelessCell { name, access_point, .. } => Some(
                access_point
                    .clone()
                    .unwrap_or_else(|| format!("{}-ap", name)),
            ),
            _ => None,
        }
    }

    /// Names of the nodes this segment creates, assuming `known` already exist
    fn generated_names(&self, known: &BTreeSet<String>) -> Vec<String> {
        match self {
            SegmentConfig::BridgedLan { name, hosts, .. } => {
                let mut names = vec![format!("{}-bridge", name)];
                names.extend((0..*hosts).map(|i| format!("{}-host{}", name, i)));
                names
            }
            SegmentConfig::PointToPoint { .. } => Vec::new(),
            SegmentConfig::WirelessCell { name, stations, .. } => {
                let mut names: Vec<String> =
                    (0..*stations).map(|i| format!("{}-sta{}", name, i)).collect();
                if let Some(ap) = self.access_point_name() {
                    if !known.contains(&ap) {
                        names.push(ap);
                    }
                }
                names
            }
        }
    }
}

/// A traffic flow between two named nodes
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FlowConfig {
    pub source: String,
    /// Pin the source address to one of the node's segments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_segment: Option<String>,
    pub sink: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink_segment: Option<String>,
    #[serde(default)]
    pub protocol: FlowProtocol,
    #[serde(default = "default_port")]
    pub port: u16,
    pub rate: String,
    #[serde(default, with = "humantime_serde")]
    pub start: Duration,
    #[serde(with = "humantime_serde")]
    pub stop: Duration,
}

impl FlowConfig {
    pub fn to_flow_spec(&self) -> FlowSpec {
        FlowSpec {
            source: EndpointSpec {
                node: self.source.clone(),
                segment: self.source_segment.clone(),
            },
            sink: EndpointSpec {
                node: self.sink.clone(),
                segment: self.sink_segment.clone(),
            },
            protocol: self.protocol,
            port: self.port,
            rate: self.rate.clone(),
            start: self.start,
            stop: self.stop,
        }
    }
}

fn default_stop_time() -> Duration {
    Duration::from_secs(30)
}

fn default_max_segment_size() -> usize {
    DEFAULT_MAX_SEGMENT_SIZE
}

fn default_base() -> Ipv4Addr {
    DEFAULT_BASE
}

fn default_port() -> u16 {
    9
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            stop_time: default_stop_time(),
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            log_level: None,
        }
    }
}

impl GeneralConfig {
    /// Filter handed to `env_logger` when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

impl Default for AddressingConfig {
    fn default() -> Self {
        Self { base: DEFAULT_BASE }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid addressing configuration: {0}")]
    InvalidAddressing(String),
    #[error("Invalid node configuration: {0}")]
    InvalidNode(String),
    #[error("Invalid segment configuration: {0}")]
    InvalidSegment(String),
    #[error("Invalid traffic configuration: {0}")]
    InvalidTraffic(String),
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.stop_time.is_zero() {
            return Err(ValidationError::InvalidGeneral(
                "stop_time must be greater than zero".to_string(),
            ));
        }
        validate_max_segment_size(self.general.max_segment_size)
            .map_err(ValidationError::InvalidGeneral)?;
        validate_address_base(self.addressing.base).map_err(ValidationError::InvalidAddressing)?;

        let mut known = self.validate_nodes()?;
        self.validate_segments(&mut known)?;
        self.validate_traffic(&known)?;
        Ok(())
    }

    fn validate_nodes(&self) -> Result<BTreeSet<String>, ValidationError> {
        let mut known = BTreeSet::new();
        for node in &self.nodes {
            if node.name.is_empty() {
                return Err(ValidationError::InvalidNode("node name must not be empty".to_string()));
            }
            if node.role == NodeRole::BridgeForwarder {
                return Err(ValidationError::InvalidNode(format!(
                    "Node '{}': bridge forwarders are created by bridged LAN segments and cannot be declared",
                    node.name
                )));
            }
            if !known.insert(node.name.clone()) {
                return Err(ValidationError::InvalidNode(format!(
                    "Duplicate node name '{}'",
                    node.name
                )));
            }
        }
        Ok(known)
    }

    /// Walk segments in merge order, growing `known` with every generated node.
    fn validate_segments(&self, known: &mut BTreeSet<String>) -> Result<(), ValidationError> {
        if self.segments.is_empty() {
            return Err(ValidationError::InvalidSegment(
                "at least one segment is required".to_string(),
            ));
        }

        let max = self.general.max_segment_size;
        let mut seen_segments: BTreeSet<&str> = BTreeSet::new();

        for segment in &self.segments {
            let name = segment.name();
            let invalid = |msg: String| ValidationError::InvalidSegment(format!("Segment '{}': {}", name, msg));

            if name.is_empty() {
                return Err(ValidationError::InvalidSegment(
                    "segment name must not be empty".to_string(),
                ));
            }
            if seen_segments.contains(name) {
                return Err(ValidationError::InvalidSegment(format!(
                    "Duplicate segment name '{}'",
                    name
                )));
            }
            if let Some(owner) = segment.share_subnet_with() {
                if !seen_segments.contains(owner) {
                    return Err(invalid(format!(
                        "share_subnet_with '{}' must name an earlier segment",
                        owner
                    )));
                }
            }
            validate_link_profile(segment.link()).map_err(invalid)?;

            match segment {
                SegmentConfig::BridgedLan { hosts, members, .. } => {
                    validate_segment_size("hosts", *hosts, max).map_err(invalid)?;
                    for member in members {
                        if !known.contains(member) {
                            return Err(invalid(format!("unknown member node '{}'", member)));
                        }
                    }
                }
                SegmentConfig::PointToPoint { endpoints, .. } => {
                    for endpoint in endpoints {
                        if !known.contains(endpoint) {
                            return Err(invalid(format!("unknown endpoint node '{}'", endpoint)));
                        }
                    }
                }
                SegmentConfig::WirelessCell {
                    stations,
                    ssid,
                    placement,
                    ..
                } => {
                    validate_segment_size("stations", *stations, max).map_err(invalid)?;
                    if ssid.as_deref() == Some("") {
                        return Err(invalid("ssid must not be empty".to_string()));
                    }
                    if let Some(PlacementStrategy::List { positions }) = placement {
                        if positions.len() < stations + 1 {
                            return Err(invalid(format!(
                                "list placement has {} positions for {} nodes",
                                positions.len(),
                                stations + 1
                            )));
                        }
                    }
                }
            }

            for generated in segment.generated_names(known) {
                if !known.insert(generated.clone()) {
                    return Err(invalid(format!(
                        "generated node name '{}' clashes with an existing node",
                        generated
                    )));
                }
            }
            seen_segments.insert(name);
        }
        Ok(())
    }

    fn validate_traffic(&self, known: &BTreeSet<String>) -> Result<(), ValidationError> {
        for (idx, flow) in self.traffic.iter().enumerate() {
            let invalid = |msg: String| ValidationError::InvalidTraffic(format!("Flow {}: {}", idx, msg));

            for node in [&flow.source, &flow.sink] {
                if !known.contains(node) {
                    return Err(invalid(format!("unknown node '{}'", node)));
                }
            }
            for segment in [&flow.source_segment, &flow.sink_segment].into_iter().flatten() {
                if !self.segments.iter().any(|s| s.name() == segment.as_str()) {
                    return Err(invalid(format!("unknown segment '{}'", segment)));
                }
            }
            validate_data_rate(&flow.rate).map_err(invalid)?;
            if flow.port == 0 {
                return Err(invalid("port must be non-zero".to_string()));
            }
            if flow.stop <= flow.start {
                return Err(invalid(format!(
                    "stop time {:?} is not after start time {:?}",
                    flow.stop, flow.start
                )));
            }
            if flow.stop > self.general.stop_time {
                log::warn!(
                    "Flow {} stops after the simulation ends ({:?} > {:?})",
                    idx, flow.stop, self.general.stop_time
                );
            }
        }
        Ok(())
    }
}
