//! Segment construction.
//!
//! A [`SegmentSpec`] describes one building block of the network (bridged
//! LAN, point-to-point link or wireless cell). [`SegmentSpec::build`] turns
//! it into a [`Fragment`]: the nodes it creates, the links it lays down and
//! which attachments need an address. Fragments never own shared nodes;
//! those are carried as [`NodeRef::Existing`] so the assembler can merge
//! them by identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{LinkKind, LinkProfile, NodeId, NodeRole, PlacementStrategy};

/// A node as seen from inside a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    /// Index into [`Fragment::new_nodes`]
    New(usize),
    /// Node that already exists in the assembler
    Existing(NodeId),
}

/// A node the fragment creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNode {
    pub name: String,
    pub role: NodeRole,
}

/// Endpoint input for point-to-point links and access points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Existing(NodeId),
    New { name: String, role: NodeRole },
}

impl Endpoint {
    pub fn new(name: impl Into<String>, role: NodeRole) -> Self {
        Endpoint::New {
            name: name.into(),
            role,
        }
    }
}

impl From<NodeId> for Endpoint {
    fn from(id: NodeId) -> Self {
        Endpoint::Existing(id)
    }
}

/// How the participants of a bridged LAN reach the bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanLayout {
    /// One private shared-medium link per participant
    #[default]
    Star,
    /// A single shared medium carrying every participant and the bridge
    Bus,
}

/// Where a segment's addresses come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Addressing {
    /// Allocate a fresh /24
    #[default]
    Fresh,
    /// Keep numbering inside the subnet of an earlier segment
    Continue(String),
}

/// Segment kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    BridgedLan,
    PointToPoint,
    WirelessCell,
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentType::BridgedLan => "bridged_lan",
            SegmentType::PointToPoint => "point_to_point",
            SegmentType::WirelessCell => "wireless_cell",
        };
        f.write_str(name)
    }
}

/// Kind-specific segment parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    BridgedLan {
        /// Plain hosts to create
        hosts: usize,
        /// Existing nodes joining the LAN after the hosts, in order
        members: Vec<NodeId>,
        layout: LanLayout,
    },
    PointToPoint {
        endpoints: [Endpoint; 2],
    },
    WirelessCell {
        stations: usize,
        access_point: Endpoint,
        ssid: String,
        placement: PlacementStrategy,
    },
}

/// Declarative description of one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpec {
    pub name: String,
    pub kind: SegmentKind,
    pub profile: LinkProfile,
    pub addressing: Addressing,
}

/// One link of a fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentLink {
    pub kind: LinkKind,
    pub ssid: Option<String>,
    /// One device per entry, in attachment order
    pub attachments: Vec<NodeRef>,
}

/// Placement request recorded for a wireless cell.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentPlacement {
    pub nodes: Vec<NodeRef>,
    pub strategy: PlacementStrategy,
}

/// Graph fragment produced by one segment build.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub segment: String,
    pub segment_type: SegmentType,
    pub profile: LinkProfile,
    pub new_nodes: Vec<NewNode>,
    pub links: Vec<FragmentLink>,
    /// Devices to address as (link index, attachment index), in address order
    pub addressed: Vec<(usize, usize)>,
    /// The bridge-forwarder of a bridged LAN
    pub bridge: Option<NodeRef>,
    /// The access point of a wireless cell
    pub access_point: Option<NodeRef>,
    pub placement: Option<FragmentPlacement>,
    pub addressing: Addressing,
}

impl Fragment {
    fn empty(spec: &SegmentSpec) -> Self {
        Self {
            segment: spec.name.clone(),
            segment_type: spec.segment_type(),
            profile: spec.profile.clone(),
            new_nodes: Vec::new(),
            links: Vec::new(),
            addressed: Vec::new(),
            bridge: None,
            access_point: None,
            placement: None,
            addressing: spec.addressing.clone(),
        }
    }

    fn create(&mut self, name: String, role: NodeRole) -> NodeRef {
        self.new_nodes.push(NewNode { name, role });
        NodeRef::New(self.new_nodes.len() - 1)
    }

    fn resolve(&mut self, endpoint: &Endpoint) -> NodeRef {
        match endpoint {
            Endpoint::Existing(id) => NodeRef::Existing(*id),
            Endpoint::New { name, role } => self.create(name.clone(), *role),
        }
    }

    fn add_link(&mut self, kind: LinkKind, ssid: Option<String>, attachments: Vec<NodeRef>) -> usize {
        self.links.push(FragmentLink {
            kind,
            ssid,
            attachments,
        });
        self.links.len() - 1
    }

    /// External nodes this fragment references, in first-use order.
    pub fn existing_nodes(&self) -> Vec<NodeId> {
        let mut seen = Vec::new();
        for link in &self.links {
            for node in &link.attachments {
                if let NodeRef::Existing(id) = node {
                    if !seen.contains(id) {
                        seen.push(*id);
                    }
                }
            }
        }
        seen
    }

    /// Number of devices the fragment lays down.
    pub fn device_count(&self) -> usize {
        self.links.iter().map(|l| l.attachments.len()).sum()
    }
}

impl SegmentSpec {
    /// A bridged LAN of `hosts` new hosts plus the given existing members.
    pub fn bridged_lan(name: impl Into<String>, hosts: usize, members: Vec<NodeId>) -> Self {
        Self {
            name: name.into(),
            kind: SegmentKind::BridgedLan {
                hosts,
                members,
                layout: LanLayout::Star,
            },
            profile: LinkProfile::default(),
            addressing: Addressing::Fresh,
        }
    }

    pub fn point_to_point(name: impl Into<String>, a: Endpoint, b: Endpoint) -> Self {
        Self {
            name: name.into(),
            kind: SegmentKind::PointToPoint { endpoints: [a, b] },
            profile: LinkProfile::default(),
            addressing: Addressing::Fresh,
        }
    }

    /// A wireless cell; the SSID defaults to the segment name.
    pub fn wireless_cell(name: impl Into<String>, stations: usize, access_point: Endpoint) -> Self {
        let name = name.into();
        Self {
            kind: SegmentKind::WirelessCell {
                stations,
                access_point,
                ssid: name.clone(),
                placement: PlacementStrategy::default(),
            },
            name,
            profile: LinkProfile::default(),
            addressing: Addressing::Fresh,
        }
    }

    pub fn with_profile(mut self, profile: LinkProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Number this segment inside the subnet of `segment`.
    pub fn sharing_subnet_with(mut self, segment: impl Into<String>) -> Self {
        self.addressing = Addressing::Continue(segment.into());
        self
    }

    /// Set the LAN layout. Ignored for other kinds.
    pub fn with_layout(mut self, new_layout: LanLayout) -> Self {
        if let SegmentKind::BridgedLan { layout, .. } = &mut self.kind {
            *layout = new_layout;
        }
        self
    }

    /// Set the cell SSID. Ignored for other kinds.
    pub fn with_ssid(mut self, new_ssid: impl Into<String>) -> Self {
        if let SegmentKind::WirelessCell { ssid, .. } = &mut self.kind {
            *ssid = new_ssid.into();
        }
        self
    }

    /// Set the cell placement strategy. Ignored for other kinds.
    pub fn with_placement(mut self, strategy: PlacementStrategy) -> Self {
        if let SegmentKind::WirelessCell { placement, .. } = &mut self.kind {
            *placement = strategy;
        }
        self
    }

    pub fn segment_type(&self) -> SegmentType {
        match self.kind {
            SegmentKind::BridgedLan { .. } => SegmentType::BridgedLan,
            SegmentKind::PointToPoint { .. } => SegmentType::PointToPoint,
            SegmentKind::WirelessCell { .. } => SegmentType::WirelessCell,
        }
    }

    /// Materialize the segment into a graph fragment.
    pub fn build(&self) -> Fragment {
        let mut fragment = Fragment::empty(self);
        match &self.kind {
            SegmentKind::BridgedLan {
                hosts,
                members,
                layout,
            } => build_bridged_lan(&mut fragment, *hosts, members, *layout),
            SegmentKind::PointToPoint { endpoints } => build_point_to_point(&mut fragment, endpoints),
            SegmentKind::WirelessCell {
                stations,
                access_point,
                ssid,
                placement,
            } => build_wireless_cell(&mut fragment, *stations, access_point, ssid, placement),
        }
        fragment
    }
}

fn build_bridged_lan(fragment: &mut Fragment, hosts: usize, members: &[NodeId], layout: LanLayout) {
    let bridge = fragment.create(format!("{}-bridge", fragment.segment), NodeRole::BridgeForwarder);
    fragment.bridge = Some(bridge);

    let mut participants = Vec::with_capacity(hosts + members.len());
    for i in 0..hosts {
        participants.push(fragment.create(format!("{}-host{}", fragment.segment, i), NodeRole::Host));
    }
    participants.extend(members.iter().map(|&id| NodeRef::Existing(id)));

    if participants.is_empty() {
        return;
    }

    match layout {
        LanLayout::Star => {
            for participant in participants {
                let link = fragment.add_link(LinkKind::SharedMedium, None, vec![participant, bridge]);
                fragment.addressed.push((link, 0));
            }
        }
        LanLayout::Bus => {
            let count = participants.len();
            let mut attachments = participants;
            attachments.push(bridge);
            let link = fragment.add_link(LinkKind::SharedMedium, None, attachments);
            fragment.addressed.extend((0..count).map(|slot| (link, slot)));
        }
    }
}

fn build_point_to_point(fragment: &mut Fragment, endpoints: &[Endpoint; 2]) {
    let a = fragment.resolve(&endpoints[0]);
    let b = fragment.resolve(&endpoints[1]);
    let link = fragment.add_link(LinkKind::PointToPoint, None, vec![a, b]);
    fragment.addressed.extend([(link, 0), (link, 1)]);
}

fn build_wireless_cell(
    fragment: &mut Fragment,
    stations: usize,
    access_point: &Endpoint,
    ssid: &str,
    placement: &PlacementStrategy,
) {
    let mut attachments = Vec::with_capacity(stations + 1);
    for i in 0..stations {
        attachments.push(fragment.create(format!("{}-sta{}", fragment.segment, i), NodeRole::Host));
    }
    let ap = fragment.resolve(access_point);
    attachments.push(ap);
    fragment.access_point = Some(ap);

    let count = attachments.len();
    fragment.placement = Some(FragmentPlacement {
        nodes: attachments.clone(),
        strategy: placement.clone(),
    });
    let link = fragment.add_link(LinkKind::WirelessCell, Some(ssid.to_string()), attachments);
    fragment.addressed.extend((0..count).map(|slot| (link, slot)));
}
