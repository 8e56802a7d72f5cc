use eframe::egui::{Vec2, vec2};
use tracing::trace;

use super::config::LayoutConfig;
use super::geometry::{HullVertex, area_centroid, convex_hull, polygon_contains, push_outward};
use super::store::{NodeState, NodeStore};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TerritoryShape {
    /// Single member; the outline is the four axis points at `radius`.
    Diamond { radius: f32 },
    /// Padded convex hull of two or more members.
    Hull,
}

/// The region a group currently claims.
#[derive(Clone, Debug, PartialEq)]
pub struct Territory {
    pub centroid: Vec2,
    pub outline: Vec<Vec2>,
    pub shape: TerritoryShape,
}

impl Territory {
    fn diamond(center: Vec2, radius: f32) -> Self {
        Self {
            centroid: center,
            outline: vec![
                center - vec2(radius, 0.0),
                center + vec2(radius, 0.0),
                center - vec2(0.0, radius),
                center + vec2(0.0, radius),
            ],
            shape: TerritoryShape::Diamond { radius },
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        match self.shape {
            TerritoryShape::Diamond { radius } => {
                let offset = point - self.centroid;
                offset.x.abs() + offset.y.abs() < radius
            }
            TerritoryShape::Hull => polygon_contains(&self.outline, point),
        }
    }
}

fn padded_radius(nodes: &[NodeState], index: usize, config: &LayoutConfig) -> f32 {
    nodes
        .get(index)
        .map(|node| node.radius)
        .unwrap_or(config.fallback_radius)
        + config.territory_margin
}

pub(super) fn territory_for(
    nodes: &[NodeState],
    members: &[usize],
    config: &LayoutConfig,
) -> Option<Territory> {
    let resolved = members
        .iter()
        .copied()
        .filter(|&index| index < nodes.len())
        .collect::<Vec<_>>();

    match resolved.as_slice() {
        [] => None,
        &[only] => Some(Territory::diamond(
            nodes[only].position,
            padded_radius(nodes, only, config),
        )),
        _ => {
            let vertices = resolved
                .iter()
                .map(|&index| HullVertex {
                    position: nodes[index].position,
                    node: index,
                })
                .collect::<Vec<_>>();

            let hull = convex_hull(&vertices);
            if hull.len() < 3 {
                return None;
            }

            let corners = hull.iter().map(|vertex| vertex.position).collect::<Vec<_>>();
            let centroid = area_centroid(&corners)?;
            let outline = hull
                .iter()
                .map(|vertex| {
                    push_outward(
                        centroid,
                        vertex.position,
                        padded_radius(nodes, vertex.node, config),
                    )
                })
                .collect();

            Some(Territory {
                centroid,
                outline,
                shape: TerritoryShape::Hull,
            })
        }
    }
}

/// Rederives every group's territory from current positions.
pub(super) fn update_territories(store: &mut NodeStore, config: &LayoutConfig) {
    let NodeStore { nodes, groups, .. } = store;

    for group in groups.iter_mut() {
        let next = territory_for(nodes, &group.members, config);
        if next.is_none() && group.territory.is_some() {
            trace!(group = %group.name, "territory became undefined");
        }
        group.territory = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::store::{GroupSeed, NodeSeed};

    fn store_with(nodes: Vec<NodeSeed>, groups: Vec<GroupSeed>) -> NodeStore {
        NodeStore::build(nodes, groups, &LayoutConfig::default())
    }

    #[test]
    fn single_member_territory_is_axis_diamond() {
        let config = LayoutConfig::default();
        let mut store = store_with(
            vec![NodeSeed::new("solo", 0.0).at(vec2(0.0, 0.0))],
            vec![GroupSeed::new("alone", ["solo"])],
        );
        store.nodes[0].radius = 20.0;

        update_territories(&mut store, &config);
        let territory = store.groups()[0].territory.as_ref().unwrap();

        assert_eq!(territory.centroid, vec2(0.0, 0.0));
        assert_eq!(
            territory.outline,
            vec![
                vec2(-35.0, 0.0),
                vec2(35.0, 0.0),
                vec2(0.0, -35.0),
                vec2(0.0, 35.0)
            ]
        );
        assert!(territory.contains(vec2(10.0, 10.0)));
        assert!(territory.contains(vec2(-20.0, 0.0)));
        assert!(!territory.contains(vec2(30.0, 30.0)));
    }

    #[test]
    fn hull_is_padded_per_vertex_from_area_centroid() {
        let config = LayoutConfig::default();
        let mut store = store_with(
            vec![
                NodeSeed::new("a", 0.0).at(vec2(-100.0, -100.0)),
                NodeSeed::new("b", 0.0).at(vec2(100.0, -100.0)),
                NodeSeed::new("c", 0.0).at(vec2(100.0, 100.0)),
                NodeSeed::new("d", 0.0).at(vec2(-100.0, 100.0)),
                NodeSeed::new("inner", 0.0).at(vec2(10.0, 5.0)),
            ],
            vec![GroupSeed::new("square", ["a", "b", "c", "d", "inner"])],
        );
        store.nodes[2].radius = 40.0;

        update_territories(&mut store, &config);
        let territory = store.groups()[0].territory.as_ref().unwrap();

        assert_eq!(territory.shape, TerritoryShape::Hull);
        assert!(territory.centroid.length() < 1e-3);
        assert_eq!(territory.outline.len(), 4);

        let diagonal = std::f32::consts::FRAC_1_SQRT_2;
        let padded_c = vec2(100.0, 100.0) + vec2(diagonal, diagonal) * 55.0;
        let padded_a = vec2(-100.0, -100.0) - vec2(diagonal, diagonal) * 30.0;
        assert!(territory.outline.iter().any(|p| (*p - padded_c).length() < 1e-2));
        assert!(territory.outline.iter().any(|p| (*p - padded_a).length() < 1e-2));
        assert!(territory.contains(vec2(110.0, 0.0)));
        assert!(!territory.contains(vec2(200.0, 0.0)));
    }

    #[test]
    fn two_members_or_collinear_members_have_no_territory() {
        let config = LayoutConfig::default();
        let mut store = store_with(
            vec![
                NodeSeed::new("a", 0.0).at(vec2(0.0, 0.0)),
                NodeSeed::new("b", 0.0).at(vec2(10.0, 0.0)),
                NodeSeed::new("c", 0.0).at(vec2(20.0, 0.0)),
            ],
            vec![GroupSeed::new("pair", ["a", "b"]), GroupSeed::new("line", ["a", "b", "c"])],
        );

        update_territories(&mut store, &config);
        assert!(store.groups()[0].territory.is_none());
        assert!(store.groups()[1].territory.is_none());
    }

    #[test]
    fn stale_territory_is_cleared_when_hull_degenerates() {
        let config = LayoutConfig::default();
        let mut store = store_with(
            vec![
                NodeSeed::new("a", 0.0).at(vec2(0.0, 0.0)),
                NodeSeed::new("b", 0.0).at(vec2(10.0, 0.0)),
                NodeSeed::new("c", 0.0).at(vec2(0.0, 10.0)),
            ],
            vec![GroupSeed::new("tri", ["a", "b", "c"])],
        );

        update_territories(&mut store, &config);
        assert!(store.groups()[0].territory.is_some());

        store.nodes[2].position = vec2(20.0, 0.0);
        update_territories(&mut store, &config);
        assert!(store.groups()[0].territory.is_none());
        assert!(store.groups()[0].centroid().is_none());
    }

    #[test]
    fn group_without_resolvable_members_has_no_territory() {
        let config = LayoutConfig::default();
        let mut store = store_with(
            vec![NodeSeed::new("a", 0.0)],
            vec![GroupSeed::new("ghosts", ["x", "y"])],
        );
        update_territories(&mut store, &config);
        assert!(store.groups()[0].territory.is_none());
    }
}
