use eframe::egui::{Vec2, vec2};

use super::config::LayoutConfig;
use super::quadtree::QuadNode;
use super::store::{GroupState, NodeState};

/// Squared distances below this count as coincident.
const COINCIDENT_DISTANCE_SQ: f32 = 1e-12;

/// Read-only view of one tick's inputs. Positions are copied out of the
/// store before any force runs, so every term sees the same snapshot.
pub(super) struct TickInput<'a> {
    pub(super) nodes: &'a [NodeState],
    pub(super) groups: &'a [GroupState],
    pub(super) positions: &'a [Vec2],
    pub(super) collision_radii: &'a [f32],
    pub(super) tree: Option<&'a QuadNode>,
    pub(super) config: &'a LayoutConfig,
    pub(super) alpha: f32,
}

/// The velocity contributions evaluated every tick, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceTerm {
    BodyRepulsion,
    Collision,
    HullContainment,
    ClusterRepulsion,
}

impl ForceTerm {
    pub const ORDERED: [Self; 4] = [
        Self::BodyRepulsion,
        Self::Collision,
        Self::HullContainment,
        Self::ClusterRepulsion,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::BodyRepulsion => "body repulsion",
            Self::Collision => "collision",
            Self::HullContainment => "hull containment",
            Self::ClusterRepulsion => "cluster repulsion",
        }
    }

    /// Adds this term's velocity deltas into `deltas`, one slot per node.
    pub(super) fn apply(self, input: &TickInput<'_>, deltas: &mut [Vec2]) {
        match self {
            Self::BodyRepulsion => apply_body_repulsion(input, deltas),
            Self::Collision => apply_collision(input, deltas),
            Self::HullContainment => apply_hull_containment(input, deltas),
            Self::ClusterRepulsion => apply_cluster_repulsion(input, deltas),
        }
    }
}

fn fallback_direction(seed: usize) -> Vec2 {
    let angle = ((seed as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Velocity delta on `point` from a body of `mass` at `source`.
fn repulsion_from(point: Vec2, source: Vec2, mass: f32, strength: f32, seed: usize) -> Vec2 {
    let offset = source - point;
    let distance_sq = offset.length_sq();
    if distance_sq < COINCIDENT_DISTANCE_SQ {
        return fallback_direction(seed) * (-strength * mass);
    }
    offset * (strength * mass / distance_sq.max(1.0))
}

fn accumulate_repulsion(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    theta: f32,
    delta: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other != index {
                *delta += repulsion_from(point, positions[other], 1.0, strength, index);
            }
        }
        return;
    }

    let distance = (node.center_of_mass - point).length().max(1e-3);
    let far_enough = !node.bounds.contains(point)
        && (node.bounds.side_length() / distance) < theta
        && node.mass > 1.0;

    if far_enough {
        *delta += repulsion_from(point, node.center_of_mass, node.mass, strength, index);
        return;
    }

    for child in node.children() {
        accumulate_repulsion(child, index, positions, strength, theta, delta);
    }
}

fn apply_body_repulsion(input: &TickInput<'_>, deltas: &mut [Vec2]) {
    let Some(tree) = input.tree else {
        return;
    };

    let strength = input.config.charge * input.alpha;
    for (index, delta) in deltas.iter_mut().enumerate() {
        accumulate_repulsion(tree, index, input.positions, strength, input.config.theta, delta);
    }
}

#[derive(Clone, Copy)]
struct CollisionParams {
    strength: f32,
    max_reach_sq: f32,
}

fn collide_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let reach = radii[from] + radii[to];
    let offset = positions[from] - positions[to];
    let distance_sq = offset.length_sq();
    if distance_sq >= reach * reach {
        return;
    }

    let distance = distance_sq.sqrt();
    let direction = if distance_sq < COINCIDENT_DISTANCE_SQ {
        fallback_direction(from.wrapping_mul(31) ^ to)
    } else {
        offset / distance
    };

    let push = direction * ((reach - distance) * params.strength);
    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let share = if from_sq + to_sq > 0.0 {
        to_sq / (from_sq + to_sq)
    } else {
        0.5
    };

    deltas[from] += push * share;
    deltas[to] -= push * (1.0 - share);
}

fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    input: &TickInput<'_>,
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_reach_sq {
        return;
    }

    let positions = input.positions;
    let radii = input.collision_radii;

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    collide_pair(from, to, positions, radii, params, deltas);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    collide_pair(from, to, positions, radii, params, deltas);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (first, child_a) in children.iter().enumerate() {
            accumulate_collision_pairs(child_a, child_a, true, input, params, deltas);
            for child_b in &children[first + 1..] {
                accumulate_collision_pairs(child_a, child_b, false, input, params, deltas);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children() {
            accumulate_collision_pairs(child, node_b, false, input, params, deltas);
        }
    } else {
        for child in node_b.children() {
            accumulate_collision_pairs(node_a, child, false, input, params, deltas);
        }
    }
}

fn apply_collision(input: &TickInput<'_>, deltas: &mut [Vec2]) {
    let Some(tree) = input.tree else {
        return;
    };

    let max_radius = input.collision_radii.iter().copied().fold(0.0_f32, f32::max);
    if max_radius <= 0.0 {
        return;
    }

    let max_reach = max_radius * 2.0;
    let params = CollisionParams {
        strength: input.config.collision_strength * input.alpha,
        max_reach_sq: max_reach * max_reach,
    };
    accumulate_collision_pairs(tree, tree, true, input, params, deltas);
}

/// Pushes non-members out of territories they sit inside, away from the
/// territory centroid.
fn apply_hull_containment(input: &TickInput<'_>, deltas: &mut [Vec2]) {
    let strength = input.config.hull_strength * input.alpha;

    for (group_index, group) in input.groups.iter().enumerate() {
        let Some(territory) = group.territory.as_ref() else {
            continue;
        };

        for (index, node) in input.nodes.iter().enumerate() {
            if node.is_member_of(group_index) {
                continue;
            }

            let position = input.positions[index];
            if !territory.contains(position) {
                continue;
            }

            let offset = position - territory.centroid;
            let length = offset.length();
            let distance = if length > 0.0 { length } else { 1.0 };
            deltas[index] += offset / distance * strength;
        }
    }
}

/// Separates territories whose centroids sit closer than the threshold.
/// The impulse is split evenly over each group's resolved members.
fn apply_cluster_repulsion(input: &TickInput<'_>, deltas: &mut [Vec2]) {
    let config = input.config;
    let centered = input
        .groups
        .iter()
        .filter_map(|group| {
            group
                .centroid()
                .filter(|_| !group.members.is_empty())
                .map(|centroid| (group, centroid))
        })
        .collect::<Vec<_>>();

    for (first, &(group_a, centroid_a)) in centered.iter().enumerate() {
        for &(group_b, centroid_b) in &centered[first + 1..] {
            let offset = centroid_b - centroid_a;
            let length = offset.length();
            let distance = if length > 0.0 { length } else { 1.0 };
            if distance >= config.cluster_threshold {
                continue;
            }

            let overlap = config.cluster_threshold - distance;
            let impulse = offset / distance * (overlap * config.cluster_strength * input.alpha);

            let share_a = impulse / group_a.members.len() as f32;
            for &member in &group_a.members {
                deltas[member] -= share_a;
            }

            let share_b = impulse / group_b.members.len() as f32;
            for &member in &group_b.members {
                deltas[member] += share_b;
            }
        }
    }
}
