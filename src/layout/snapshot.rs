use serde::Serialize;

use super::store::NodeStore;

/// Per-tick output of the engine, shaped for renderers and JSON export.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    pub alpha: f32,
    pub ticks: u64,
    pub nodes: Vec<NodeSnapshot>,
    pub groups: Vec<GroupSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub pinned: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupSnapshot {
    pub name: String,
    /// Members that resolved against the loaded nodes.
    pub members: usize,
    /// Absent when the group has no territory this tick.
    pub centroid: Option<[f32; 2]>,
    pub hull: Option<Vec<[f32; 2]>>,
}

impl LayoutSnapshot {
    pub(super) fn capture(store: &NodeStore, alpha: f32, ticks: u64) -> Self {
        let nodes = store
            .nodes()
            .iter()
            .map(|node| NodeSnapshot {
                id: node.id.clone(),
                x: node.position.x,
                y: node.position.y,
                radius: node.radius,
                pinned: node.is_pinned(),
            })
            .collect();

        let groups = store
            .groups()
            .iter()
            .map(|group| GroupSnapshot {
                name: group.name.clone(),
                members: group.members.len(),
                centroid: group.centroid().map(|point| [point.x, point.y]),
                hull: group
                    .outline()
                    .map(|outline| outline.iter().map(|point| [point.x, point.y]).collect()),
            })
            .collect();

        Self {
            alpha,
            ticks,
            nodes,
            groups,
        }
    }

    pub fn group(&self, name: &str) -> Option<&GroupSnapshot> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn node(&self, id: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|node| node.id == id)
    }
}
