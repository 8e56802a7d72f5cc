//! Force-directed layout with group territories.
//!
//! Every tick runs the force terms against the positions and territories
//! left by the previous tick, integrates, then rederives each group's
//! territory from the new positions. Territories therefore lag the forces
//! that read them by exactly one tick.

mod config;
mod forces;
pub mod geometry;
mod integrator;
mod quadtree;
mod snapshot;
mod store;
mod territory;

use eframe::egui::Vec2;
use tracing::debug;

pub use config::{ConfigError, LayoutConfig};
pub use forces::ForceTerm;
pub use integrator::Temperature;
pub use snapshot::{GroupSnapshot, LayoutSnapshot, NodeSnapshot};
pub use store::{GroupSeed, GroupState, NodeSeed, NodeState, NodeStore, RadiusScale};
pub use territory::{Territory, TerritoryShape};

use forces::TickInput;
use integrator::integrate;
use quadtree::QuadNode;
use territory::update_territories;

#[derive(Default)]
struct TickScratch {
    deltas: Vec<Vec2>,
    positions: Vec<Vec2>,
    collision_radii: Vec<f32>,
}

impl TickScratch {
    fn clear(&mut self) {
        self.deltas.clear();
        self.positions.clear();
        self.collision_radii.clear();
    }
}

pub struct Layout {
    store: NodeStore,
    config: LayoutConfig,
    temperature: Temperature,
    forces: Vec<ForceTerm>,
    scratch: TickScratch,
    ticks: u64,
}

impl Layout {
    pub fn new(nodes: Vec<NodeSeed>, groups: Vec<GroupSeed>, config: LayoutConfig) -> Self {
        let mut layout = Self {
            store: NodeStore::default(),
            temperature: Temperature::new(&config),
            config,
            forces: ForceTerm::ORDERED.to_vec(),
            scratch: TickScratch::default(),
            ticks: 0,
        };
        layout.load(nodes, groups);
        layout
    }

    /// Replaces the evaluated force terms. They still run in the given order.
    pub fn with_forces(mut self, forces: impl IntoIterator<Item = ForceTerm>) -> Self {
        self.forces = forces.into_iter().collect();
        debug!(
            forces = ?self.forces.iter().map(|term| term.label()).collect::<Vec<_>>(),
            "force terms replaced"
        );
        self
    }

    /// Swaps in a new node and group set and restarts the simulation.
    ///
    /// Nothing from the previous load survives: pins, velocities, pending
    /// deltas and territories are all dropped.
    pub fn load(&mut self, nodes: Vec<NodeSeed>, groups: Vec<GroupSeed>) {
        self.store = NodeStore::build(nodes, groups, &self.config);
        self.scratch.clear();
        self.temperature = Temperature::new(&self.config);
        self.ticks = 0;

        debug!(
            nodes = self.store.nodes().len(),
            groups = self.store.groups().len(),
            "layout loaded"
        );
    }

    /// Advances one tick at the given temperature.
    pub fn step(&mut self, alpha: f32) {
        let node_count = self.store.nodes.len();
        let TickScratch {
            deltas,
            positions,
            collision_radii,
        } = &mut self.scratch;

        deltas.clear();
        deltas.resize(node_count, Vec2::ZERO);
        positions.clear();
        positions.extend(self.store.nodes.iter().map(|node| node.position));
        collision_radii.clear();
        collision_radii.extend(
            self.store
                .nodes
                .iter()
                .map(|node| node.radius + self.config.collision_margin),
        );

        let positions = positions.as_slice();
        let collision_radii = collision_radii.as_slice();
        let tree = QuadNode::build(positions);
        let input = TickInput {
            nodes: &self.store.nodes,
            groups: &self.store.groups,
            positions,
            collision_radii,
            tree: tree.as_ref(),
            config: &self.config,
            alpha,
        };
        for term in &self.forces {
            term.apply(&input, deltas);
        }

        integrate(&mut self.store.nodes, deltas, &self.config);
        update_territories(&mut self.store, &self.config);
        self.ticks += 1;
    }

    /// Cools the temperature one step and advances at the new alpha.
    /// Returns whether the layout is still running afterwards.
    pub fn tick(&mut self) -> bool {
        let alpha = self.temperature.cool();
        self.step(alpha);
        self.temperature.is_running()
    }

    /// Ticks until the temperature reaches rest or `max_ticks` have run.
    pub fn run_until_rest(&mut self, max_ticks: usize) -> usize {
        let mut ran = 0;
        while ran < max_ticks && self.temperature.is_running() {
            self.tick();
            ran += 1;
        }

        debug!(ticks = ran, alpha = self.temperature.alpha, "layout settled");
        ran
    }

    /// Pins a node and wakes the simulation. Unknown ids are ignored.
    pub fn start_pin(&mut self, id: &str, position: Vec2) -> bool {
        let Some(index) = self.store.index_of(id) else {
            return false;
        };

        self.store.nodes[index].pin = Some(position);
        self.temperature.target = self.config.drag_alpha_target;
        debug!(id, x = position.x, y = position.y, "pin started");
        true
    }

    pub fn move_pin(&mut self, id: &str, position: Vec2) -> bool {
        let Some(index) = self.store.index_of(id) else {
            return false;
        };

        let node = &mut self.store.nodes[index];
        if node.pin.is_none() {
            return false;
        }
        node.pin = Some(position);
        true
    }

    /// Releases a pin. The temperature target drops back to zero once no
    /// node is pinned any more.
    pub fn end_pin(&mut self, id: &str) -> bool {
        let Some(index) = self.store.index_of(id) else {
            return false;
        };

        let released = self.store.nodes[index].pin.take().is_some();
        if !self.store.nodes.iter().any(NodeState::is_pinned) {
            self.temperature.target = 0.0;
        }
        if released {
            debug!(id, "pin released");
        }
        released
    }

    /// Raises alpha back to the configured start value.
    pub fn reheat(&mut self) {
        self.temperature.reheat(self.config.alpha);
    }

    pub fn is_running(&self) -> bool {
        self.temperature.is_running()
    }

    pub fn alpha(&self) -> f32 {
        self.temperature.alpha
    }

    pub fn temperature(&self) -> &Temperature {
        &self.temperature
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn forces(&self) -> &[ForceTerm] {
        &self.forces
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn nodes(&self) -> &[NodeState] {
        self.store.nodes()
    }

    pub fn groups(&self) -> &[GroupState] {
        self.store.groups()
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot::capture(&self.store, self.temperature.alpha, self.ticks)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    fn two_clusters() -> Layout {
        Layout::new(
            vec![
                NodeSeed::new("a1", 10.0).at(vec2(-60.0, 0.0)),
                NodeSeed::new("a2", 5.0).at(vec2(-80.0, 30.0)),
                NodeSeed::new("a3", 1.0).at(vec2(-90.0, -20.0)),
                NodeSeed::new("b1", 3.0).at(vec2(60.0, 0.0)),
                NodeSeed::new("b2", 8.0).at(vec2(80.0, 25.0)),
                NodeSeed::new("b3", 2.0).at(vec2(95.0, -30.0)),
                NodeSeed::new("solo", 4.0).at(vec2(0.0, 120.0)),
            ],
            vec![
                GroupSeed::new("A", ["a1", "a2", "a3"]),
                GroupSeed::new("B", ["b1", "b2", "b3"]),
                GroupSeed::new("S", ["solo"]),
            ],
            LayoutConfig::default(),
        )
    }

    #[test]
    fn territories_appear_after_first_tick() {
        let mut layout = two_clusters();
        assert!(layout.groups().iter().all(|group| group.territory.is_none()));

        layout.tick();
        assert!(layout.groups().iter().all(|group| group.territory.is_some()));

        let solo = layout.store().group("S").unwrap();
        let node = layout.store().node("solo").unwrap();
        assert_eq!(solo.centroid(), Some(node.position));
    }

    #[test]
    fn containment_reads_previous_tick_geometry() {
        // Intruder starts inside group A's hull. Only the contact force is
        // active, so the first tick cannot move it: no territory exists yet.
        let mut layout = Layout::new(
            vec![
                NodeSeed::new("a1", 0.0).at(vec2(-100.0, -100.0)),
                NodeSeed::new("a2", 0.0).at(vec2(100.0, -100.0)),
                NodeSeed::new("a3", 0.0).at(vec2(0.0, 100.0)),
                NodeSeed::new("intruder", 0.0).at(vec2(10.0, -20.0)),
            ],
            vec![GroupSeed::new("A", ["a1", "a2", "a3"])],
            LayoutConfig::default(),
        )
        .with_forces([ForceTerm::HullContainment]);

        layout.step(0.5);
        assert_eq!(layout.store().node("intruder").unwrap().position, vec2(10.0, -20.0));
        assert!(layout.groups()[0].territory.is_some());

        layout.step(0.5);
        let moved = layout.store().node("intruder").unwrap().position;
        assert!(moved != vec2(10.0, -20.0));
        let centroid = layout.groups()[0].centroid().unwrap();
        assert!((moved - centroid).length() > (vec2(10.0, -20.0) - centroid).length());
    }

    #[test]
    fn members_are_never_pushed_by_their_own_territory() {
        let mut layout = Layout::new(
            vec![
                NodeSeed::new("a1", 0.0).at(vec2(-100.0, -100.0)),
                NodeSeed::new("a2", 0.0).at(vec2(100.0, -100.0)),
                NodeSeed::new("a3", 0.0).at(vec2(0.0, 100.0)),
                NodeSeed::new("a4", 0.0).at(vec2(0.0, -10.0)),
            ],
            vec![GroupSeed::new("A", ["a1", "a2", "a3", "a4"])],
            LayoutConfig::default(),
        )
        .with_forces([ForceTerm::HullContainment]);

        layout.step(1.0);
        layout.step(1.0);
        assert!(layout.groups()[0].territory.as_ref().unwrap().contains(vec2(0.0, -10.0)));
        assert_eq!(layout.store().node("a4").unwrap().position, vec2(0.0, -10.0));
        assert_eq!(layout.store().node("a1").unwrap().position, vec2(-100.0, -100.0));
    }

    #[test]
    fn pins_hold_position_and_raise_target() {
        let mut layout = two_clusters();
        layout.run_until_rest(1000);
        assert!(!layout.is_running());

        assert!(layout.start_pin("a1", vec2(300.0, 300.0)));
        assert!(layout.is_running());
        assert_eq!(layout.temperature().target, 0.3);

        for _ in 0..5 {
            layout.tick();
        }
        assert_eq!(layout.store().node("a1").unwrap().position, vec2(300.0, 300.0));
        assert!(layout.alpha() > layout.temperature().min);

        assert!(layout.move_pin("a1", vec2(310.0, 290.0)));
        layout.tick();
        assert_eq!(layout.store().node("a1").unwrap().position, vec2(310.0, 290.0));

        assert!(layout.end_pin("a1"));
        assert_eq!(layout.temperature().target, 0.0);
        assert!(!layout.store().node("a1").unwrap().is_pinned());
    }

    #[test]
    fn target_stays_elevated_while_any_pin_is_held() {
        let mut layout = two_clusters();
        layout.start_pin("a1", vec2(0.0, 0.0));
        layout.start_pin("b1", vec2(10.0, 0.0));
        layout.end_pin("a1");
        assert_eq!(layout.temperature().target, 0.3);
        layout.end_pin("b1");
        assert_eq!(layout.temperature().target, 0.0);
    }

    #[test]
    fn unknown_pins_are_ignored() {
        let mut layout = two_clusters();
        assert!(!layout.start_pin("nobody", vec2(0.0, 0.0)));
        assert!(!layout.move_pin("nobody", vec2(0.0, 0.0)));
        assert!(!layout.end_pin("nobody"));
        assert!(!layout.move_pin("a1", vec2(0.0, 0.0)));
        assert_eq!(layout.temperature().target, 0.0);
    }

    #[test]
    fn pinned_node_still_repels_others() {
        let mut layout = Layout::new(
            vec![
                NodeSeed::new("anchor", 0.0).at(vec2(0.0, 0.0)),
                NodeSeed::new("free", 0.0).at(vec2(20.0, 0.0)),
            ],
            Vec::new(),
            LayoutConfig::default(),
        );
        layout.start_pin("anchor", vec2(0.0, 0.0));
        layout.step(0.5);

        assert_eq!(layout.store().node("anchor").unwrap().position, vec2(0.0, 0.0));
        assert!(layout.store().node("free").unwrap().position.x > 20.0);
    }

    #[test]
    fn reload_replaces_everything() {
        let mut layout = two_clusters();
        layout.start_pin("a1", vec2(1.0, 1.0));
        layout.run_until_rest(20);

        layout.load(
            vec![NodeSeed::new("x", 1.0), NodeSeed::new("y", 1.0)],
            vec![GroupSeed::new("X", ["x", "y"])],
        );

        assert_eq!(layout.nodes().len(), 2);
        assert_eq!(layout.ticks(), 0);
        assert_eq!(layout.alpha(), 1.0);
        assert_eq!(layout.temperature().target, 0.0);
        assert!(layout.nodes().iter().all(|node| !node.is_pinned()));
        assert!(layout.groups()[0].territory.is_none());
        assert!(layout.store().index_of("a1").is_none());

        layout.tick();
        // Two members never form a hull.
        assert!(layout.groups()[0].territory.is_none());
    }

    #[test]
    fn group_emptied_by_reload_loses_territory() {
        let mut layout = two_clusters();
        layout.tick();
        assert!(layout.store().group("S").unwrap().territory.is_some());

        layout.load(
            vec![NodeSeed::new("a1", 1.0)],
            vec![GroupSeed::new("S", ["solo"])],
        );
        layout.tick();
        assert!(layout.store().group("S").unwrap().territory.is_none());
        let snapshot = layout.snapshot();
        let group = snapshot.group("S").unwrap();
        assert!(group.centroid.is_none() && group.hull.is_none());
    }

    #[test]
    fn run_until_rest_settles_and_keeps_everything_finite() {
        let mut layout = two_clusters();
        let ran = layout.run_until_rest(10_000);
        assert!(ran > 0 && ran < 10_000);
        assert!(!layout.is_running());

        for node in layout.nodes() {
            assert!(node.position.x.is_finite() && node.position.y.is_finite());
        }
        let snapshot = layout.snapshot();
        assert_eq!(snapshot.nodes.len(), 7);
        assert_eq!(snapshot.ticks, ran as u64);
        assert!(snapshot.group("S").unwrap().hull.as_ref().unwrap().len() == 4);
    }

    #[test]
    fn empty_layout_ticks_without_panicking() {
        let mut layout = Layout::new(Vec::new(), Vec::new(), LayoutConfig::default());
        assert!(layout.tick());
        layout.run_until_rest(500);
        assert!(layout.snapshot().nodes.is_empty());
    }
}
