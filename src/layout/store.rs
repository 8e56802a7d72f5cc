use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use tracing::warn;

use super::config::LayoutConfig;
use super::territory::Territory;

const INITIAL_SPIRAL_RADIUS: f32 = 10.0;

/// One entity handed to the engine on load.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSeed {
    pub id: String,
    /// Drives the display radius through [`RadiusScale`].
    pub size: f32,
    /// Where the node starts; unseeded nodes are placed on a spiral.
    pub position: Option<Vec2>,
}

impl NodeSeed {
    pub fn new(id: impl Into<String>, size: f32) -> Self {
        Self {
            id: id.into(),
            size,
            position: None,
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = Some(position);
        self
    }
}

/// A named cluster of node ids handed to the engine on load.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSeed {
    pub name: String,
    pub members: Vec<String>,
}

impl GroupSeed {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

/// Square-root scale from the size domain `[0, max size]` onto the
/// configured radius range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusScale {
    max_size: f32,
    min_radius: f32,
    max_radius: f32,
}

impl RadiusScale {
    pub fn new(max_size: f32, config: &LayoutConfig) -> Self {
        Self {
            max_size: if max_size.is_finite() { max_size } else { 0.0 },
            min_radius: config.min_radius,
            max_radius: config.max_radius,
        }
    }

    pub fn from_sizes<'a>(sizes: impl IntoIterator<Item = &'a f32>, config: &LayoutConfig) -> Self {
        let max_size = sizes
            .into_iter()
            .copied()
            .filter(|size| size.is_finite())
            .fold(0.0_f32, f32::max);
        Self::new(max_size, config)
    }

    pub fn radius(&self, size: f32) -> f32 {
        if self.max_size <= 0.0 || !size.is_finite() {
            return self.min_radius;
        }

        let t = (size.max(0.0) / self.max_size).sqrt();
        self.min_radius + (self.max_radius - self.min_radius) * t
    }
}

#[derive(Clone, Debug)]
pub struct NodeState {
    pub id: String,
    pub position: Vec2,
    pub velocity: Vec2,
    /// When set, integration holds the node here.
    pub pin: Option<Vec2>,
    pub size: f32,
    pub radius: f32,
    /// Indices of the groups listing this node, ascending.
    pub groups: Vec<usize>,
}

impl NodeState {
    pub fn is_member_of(&self, group: usize) -> bool {
        self.groups.binary_search(&group).is_ok()
    }

    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct GroupState {
    pub name: String,
    pub member_ids: Vec<String>,
    /// Members that resolved against the current node set.
    pub members: Vec<usize>,
    /// Recomputed after every integration step.
    pub territory: Option<Territory>,
}

impl GroupState {
    pub fn centroid(&self) -> Option<Vec2> {
        self.territory.as_ref().map(|territory| territory.centroid)
    }

    pub fn outline(&self) -> Option<&[Vec2]> {
        self.territory
            .as_ref()
            .map(|territory| territory.outline.as_slice())
    }
}

/// Owns every node and group of the current load.
#[derive(Clone, Debug, Default)]
pub struct NodeStore {
    pub(super) nodes: Vec<NodeState>,
    pub(super) groups: Vec<GroupState>,
    index_by_id: HashMap<String, usize>,
}

fn spiral_position(index: usize) -> Vec2 {
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    let radius = INITIAL_SPIRAL_RADIUS * (0.5 + index as f32).sqrt();
    let angle = index as f32 * golden_angle;
    vec2(angle.cos(), angle.sin()) * radius
}

impl NodeStore {
    pub fn build(nodes: Vec<NodeSeed>, groups: Vec<GroupSeed>, config: &LayoutConfig) -> Self {
        let scale = RadiusScale::from_sizes(nodes.iter().map(|seed| &seed.size), config);

        let mut index_by_id = HashMap::with_capacity(nodes.len());
        let mut states = Vec::with_capacity(nodes.len());
        for seed in nodes {
            if index_by_id.contains_key(&seed.id) {
                warn!(id = %seed.id, "duplicate node id, keeping the first occurrence");
                continue;
            }

            let index = states.len();
            index_by_id.insert(seed.id.clone(), index);
            let position = seed
                .position
                .filter(|position| position.x.is_finite() && position.y.is_finite())
                .unwrap_or_else(|| spiral_position(index));
            states.push(NodeState {
                radius: scale.radius(seed.size),
                id: seed.id,
                position,
                velocity: Vec2::ZERO,
                pin: None,
                size: seed.size,
                groups: Vec::new(),
            });
        }

        let mut group_states = Vec::with_capacity(groups.len());
        for (group_index, seed) in groups.into_iter().enumerate() {
            let mut members = Vec::with_capacity(seed.members.len());
            for member_id in &seed.members {
                let Some(&node_index) = index_by_id.get(member_id) else {
                    continue;
                };
                if members.contains(&node_index) {
                    continue;
                }
                members.push(node_index);
                states[node_index].groups.push(group_index);
            }

            group_states.push(GroupState {
                name: seed.name,
                member_ids: seed.members,
                members,
                territory: None,
            });
        }

        Self {
            nodes: states,
            groups: group_states,
            index_by_id,
        }
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn nodes(&self) -> &[NodeState] {
        &self.nodes
    }

    pub fn groups(&self) -> &[GroupState] {
        &self.groups
    }

    pub fn node(&self, id: &str) -> Option<&NodeState> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn group(&self, name: &str) -> Option<&GroupState> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
