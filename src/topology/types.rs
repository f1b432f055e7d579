//! Topology type definitions.
//!
//! Nodes, links and devices live in arenas owned by the assembler and are
//! referenced everywhere through the id newtypes below.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Node handle (arena index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

/// Link handle (arena index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LinkId(pub usize);

/// Device handle (arena index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DeviceId(pub usize);

/// Role a node plays in the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// End host (LAN host, server, wireless station)
    Host,
    /// Layer-2 relay; never addressed, never routable
    BridgeForwarder,
    /// Wireless access point
    AccessPoint,
    /// Switch or router joining segments at layer 3
    Router,
}

impl NodeRole {
    /// Whether nodes of this role take part in the global routing view.
    pub fn is_routable(self) -> bool {
        !matches!(self, NodeRole::BridgeForwarder)
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeRole::Host => "host",
            NodeRole::BridgeForwarder => "bridge_forwarder",
            NodeRole::AccessPoint => "access_point",
            NodeRole::Router => "router",
        };
        f.write_str(name)
    }
}

/// Medium kind of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    SharedMedium,
    PointToPoint,
    WirelessCell,
}

/// Bandwidth and latency settings, passed through to the simulation engine
/// untouched (e.g. `100Mbps` / `6560ns`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
}

impl LinkProfile {
    pub fn new(data_rate: impl Into<String>, delay: impl Into<String>) -> Self {
        Self {
            data_rate: Some(data_rate.into()),
            delay: Some(delay.into()),
        }
    }
}

/// A participant in the topology.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub role: NodeRole,
    /// Devices owned by this node, one per link it joins, in creation order.
    pub devices: Vec<DeviceId>,
}

/// The endpoint a node owns on exactly one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    pub id: DeviceId,
    pub node: NodeId,
    pub link: LinkId,
}

/// One (node, device) pair on a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub node: NodeId,
    pub device: DeviceId,
}

/// A shared or point-to-point medium.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub kind: LinkKind,
    /// Name of the segment that created this link
    pub segment: String,
    pub profile: LinkProfile,
    /// Network name, wireless cells only
    pub ssid: Option<String>,
    /// Attachments in attachment order
    pub attachments: Vec<Attachment>,
}

impl Link {
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.attachments.iter().map(|a| a.node)
    }

    pub fn devices(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.attachments.iter().map(|a| a.device)
    }

    /// Check the attachment count against the link kind. `access_points` is
    /// the number of attached access-point nodes.
    pub fn has_valid_shape(&self, access_points: usize) -> bool {
        match self.kind {
            LinkKind::PointToPoint => self.attachments.len() == 2,
            LinkKind::SharedMedium => self.attachments.len() >= 2,
            LinkKind::WirelessCell => access_points == 1,
        }
    }
}

/// The layer-2 forwarding instance of one bridge-forwarder node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeGroup {
    pub segment: String,
    pub bridge: NodeId,
    /// Bridge ports in attachment order
    pub ports: Vec<DeviceId>,
}

/// A point in the simulation plane, metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position(pub f64, pub f64, pub f64);

/// Rectangle bounding a random walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// How the mobility collaborator should place the nodes of a wireless cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Fixed coordinates, one per node in directive order
    List { positions: Vec<Position> },
    /// Row-major grid
    Grid {
        min_x: f64,
        min_y: f64,
        delta_x: f64,
        delta_y: f64,
        grid_width: u32,
    },
    /// Random walk constrained to a rectangle
    RandomWalk { bounds: Bounds },
}

impl Default for PlacementStrategy {
    fn default() -> Self {
        PlacementStrategy::Grid {
            min_x: 0.0,
            min_y: 0.0,
            delta_x: 5.0,
            delta_y: 10.0,
            grid_width: 3,
        }
    }
}

/// Nodes of one wireless cell plus the strategy used to place them.
/// Positions are never read back.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementDirective {
    pub segment: String,
    /// Stations first, then the access point
    pub nodes: Vec<NodeId>,
    pub strategy: PlacementStrategy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_is_not_routable() {
        assert!(!NodeRole::BridgeForwarder.is_routable());
        assert!(NodeRole::Host.is_routable());
        assert!(NodeRole::AccessPoint.is_routable());
        assert!(NodeRole::Router.is_routable());
    }

    #[test]
    fn test_placement_yaml() {
        let yaml = r#"
type: list
positions:
  - [-50.0, 45.0, 0.0]
  - [-60.0, 45.0, 0.0]
"#;
        let strategy: PlacementStrategy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            strategy,
            PlacementStrategy::List {
                positions: vec![Position(-50.0, 45.0, 0.0), Position(-60.0, 45.0, 0.0)]
            }
        );

        let yaml = r#"
type: random_walk
bounds: { min_x: -100.0, max_x: 100.0, min_y: -100.0, max_y: 100.0 }
"#;
        let strategy: PlacementStrategy = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(strategy, PlacementStrategy::RandomWalk { .. }));
    }

    #[test]
    fn test_link_shape() {
        let mut link = Link {
            id: LinkId(0),
            kind: LinkKind::PointToPoint,
            segment: "uplink".to_string(),
            profile: LinkProfile::default(),
            ssid: None,
            attachments: vec![Attachment {
                node: NodeId(0),
                device: DeviceId(0),
            }],
        };
        assert!(!link.has_valid_shape(0));
        link.attachments.push(Attachment {
            node: NodeId(1),
            device: DeviceId(1),
        });
        assert!(link.has_valid_shape(0));
    }
}
