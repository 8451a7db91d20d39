mod forces;
mod quadtree;

use std::time::Instant;

use eframe::egui::{Vec2, vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::network::{GraphEdge, GraphNode};
use crate::taxonomy::RelationKind;
use crate::util::stable_seed;
use forces::{Link, Particle, Simulation};

/// Tuning of the force simulation. Every field has a default so partial TOML
/// tables deserialize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub iterations: usize,
    pub reheat_iterations: usize,
    pub reheat_alpha: f32,
    pub alpha_min: f32,
    pub velocity_decay: f32,
    /// Width or height change (px) that forces a full relayout.
    pub relayout_threshold: f32,
    pub padding: f32,
    pub link_strength: f32,
    pub essential_link_distance: f32,
    pub optional_link_distance: f32,
    /// Many-body strength indexed by hop distance (center first).
    pub charge_by_hop: [f32; 4],
    pub collision_radius_by_hop: [f32; 4],
    pub collision_strength: f32,
    /// Ring radius of hops 1..=3 as a fraction of `min(width, height)`.
    pub ring_fractions: [f32; 3],
    pub radial_strength: f32,
    pub seed_radius_min: f32,
    pub seed_radius_max: f32,
    pub theta: f32,
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 300,
            reheat_iterations: 150,
            reheat_alpha: 0.5,
            alpha_min: 0.001,
            velocity_decay: 0.4,
            relayout_threshold: 50.0,
            padding: 50.0,
            link_strength: 0.1,
            essential_link_distance: 70.0,
            optional_link_distance: 100.0,
            charge_by_hop: [-500.0, -250.0, -150.0, -100.0],
            collision_radius_by_hop: [70.0, 55.0, 40.0, 30.0],
            collision_strength: 1.0,
            ring_fractions: [0.15, 0.32, 0.45],
            radial_strength: 0.9,
            seed_radius_min: 50.0,
            seed_radius_max: 150.0,
            theta: 0.9,
            seed: 0x5eed_1a7e,
        }
    }
}

impl LayoutConfig {
    fn hop(distance: u8) -> usize {
        usize::from(distance.min(3))
    }

    fn link_distance(&self, relation: RelationKind) -> f32 {
        match relation {
            RelationKind::Essential => self.essential_link_distance,
            RelationKind::Optional => self.optional_link_distance,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutPass {
    Full,
    Reheat,
    /// Positions from the previous pass were kept; only the center is
    /// re-pinned to the middle of the current canvas.
    Reused,
    Skipped,
}

impl LayoutPass {
    pub fn label(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Reheat => "reheat",
            Self::Reused => "reused",
            Self::Skipped => "skipped",
        }
    }

    pub fn executed(self) -> bool {
        matches!(self, Self::Full | Self::Reheat)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutStatus {
    pub is_running: bool,
    pub pass: LayoutPass,
}

/// What the previous executed pass was computed for.
#[derive(Clone, Debug, PartialEq)]
struct LayoutKey {
    node_ids: Vec<String>,
    edge_ids: Vec<String>,
    width: f32,
    height: f32,
    center_id: String,
}

impl LayoutKey {
    fn new(nodes: &[GraphNode], edges: &[GraphEdge], width: f32, height: f32, center_id: &str) -> Self {
        let mut node_ids = nodes.iter().map(|node| node.id.clone()).collect::<Vec<_>>();
        node_ids.sort_unstable();
        let mut edge_ids = edges.iter().map(|edge| edge.id.clone()).collect::<Vec<_>>();
        edge_ids.sort_unstable();
        Self {
            node_ids,
            edge_ids,
            width,
            height,
            center_id: center_id.to_owned(),
        }
    }

    fn dimensions_changed(&self, width: f32, height: f32, threshold: f32) -> bool {
        (self.width - width).abs() > threshold || (self.height - height).abs() > threshold
    }

    fn matches(&self, other: &Self, threshold: f32) -> bool {
        self.center_id == other.center_id
            && self.node_ids == other.node_ids
            && self.edge_ids == other.edge_ids
            && !self.dimensions_changed(other.width, other.height, threshold)
    }
}

/// Synchronous force-directed layout over a [`GraphNode`] slice.
///
/// Positions are written back into the nodes; the engine remembers the
/// node/edge id sets, dimensions and center of its last pass so an unchanged
/// graph is not laid out twice.
#[derive(Debug, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
    last: Option<LayoutKey>,
    /// Latest valid canvas, which may differ from `last` by less than the
    /// relayout threshold.
    canvas: Option<(f32, f32)>,
    running: bool,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            last: None,
            canvas: None,
            running: false,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Forgets the previous pass so the next `layout` call runs in full.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn layout(
        &mut self,
        nodes: &mut [GraphNode],
        edges: &[GraphEdge],
        width: f32,
        height: f32,
        center_id: &str,
        on_complete: impl FnOnce(),
    ) -> LayoutStatus {
        if !valid_dimension(width) || !valid_dimension(height) || nodes.is_empty() {
            return self.status(LayoutPass::Skipped);
        }

        let key = LayoutKey::new(nodes, edges, width, height, center_id);
        let threshold = self.config.relayout_threshold;
        if self
            .last
            .as_ref()
            .is_some_and(|last| last.matches(&key, threshold))
        {
            pin_center(nodes, center_id, width, height);
            self.canvas = Some((width, height));
            return self.status(LayoutPass::Reused);
        }

        let reseed_all = self
            .last
            .as_ref()
            .is_some_and(|last| last.dimensions_changed(width, height, threshold));
        self.run_pass(
            nodes,
            edges,
            &key,
            PassParams {
                kind: LayoutPass::Full,
                alpha: 1.0,
                steps: self.config.iterations,
                reseed_all,
            },
        );
        self.last = Some(key);
        self.canvas = Some((width, height));
        self.finish(on_complete, LayoutPass::Full)
    }

    /// Reruns a shorter, cooler pass from the current positions for the last
    /// laid-out center and dimensions.
    pub fn reheat(
        &mut self,
        nodes: &mut [GraphNode],
        edges: &[GraphEdge],
        on_complete: impl FnOnce(),
    ) -> LayoutStatus {
        let Some(last) = self.last.as_ref() else {
            return self.status(LayoutPass::Skipped);
        };
        if nodes.is_empty() {
            return self.status(LayoutPass::Skipped);
        }

        let (width, height) = self.canvas.unwrap_or((last.width, last.height));
        let key = LayoutKey::new(nodes, edges, width, height, &last.center_id);
        self.run_pass(
            nodes,
            edges,
            &key,
            PassParams {
                kind: LayoutPass::Reheat,
                alpha: self.config.reheat_alpha,
                steps: self.config.reheat_iterations,
                reseed_all: false,
            },
        );
        self.last = Some(key);
        self.finish(on_complete, LayoutPass::Reheat)
    }

    fn status(&self, pass: LayoutPass) -> LayoutStatus {
        LayoutStatus {
            is_running: self.running,
            pass,
        }
    }

    fn finish(&mut self, on_complete: impl FnOnce(), pass: LayoutPass) -> LayoutStatus {
        self.running = false;
        on_complete();
        self.status(pass)
    }

    fn run_pass(&mut self, nodes: &mut [GraphNode], edges: &[GraphEdge], key: &LayoutKey, params: PassParams) {
        self.running = true;
        let started = Instant::now();
        let config = &self.config;

        let center = vec2(key.width * 0.5, key.height * 0.5);
        let ring_base = key.width.min(key.height);
        let mut rng = StdRng::seed_from_u64(config.seed ^ stable_seed(&key.center_id));
        let center_index = nodes
            .iter()
            .position(|node| node.id == key.center_id)
            .or_else(|| nodes.iter().position(|node| node.distance == 0));

        let mut particles = Vec::with_capacity(nodes.len());
        for (index, node) in nodes.iter_mut().enumerate() {
            let hop = LayoutConfig::hop(node.distance);
            let is_center = Some(index) == center_index;

            let position = if is_center {
                center
            } else {
                match node.position() {
                    Some((x, y)) if !params.reseed_all && x.is_finite() && y.is_finite() => {
                        vec2(x, y)
                    }
                    _ => seed_position(&mut rng, center, config),
                }
            };

            if is_center {
                node.fx = Some(center.x);
                node.fy = Some(center.y);
            } else {
                node.fx = None;
                node.fy = None;
            }

            particles.push(Particle {
                position,
                velocity: Vec2::ZERO,
                pinned: is_center.then_some(center),
                charge: config.charge_by_hop[hop],
                radius: config.collision_radius_by_hop[hop],
                ring_radius: hop
                    .checked_sub(1)
                    .map_or(0.0, |ring| config.ring_fractions[ring] * ring_base),
                ring_strength: if hop == 0 { 0.0 } else { config.radial_strength },
            });
        }

        let links = build_links(nodes, edges, config);
        let mut simulation = Simulation::new(config, particles, links, key.width, key.height, params.alpha);
        simulation.run(params.steps);

        for (node, particle) in nodes.iter_mut().zip(&simulation.particles) {
            node.x = Some(particle.position.x);
            node.y = Some(particle.position.y);
            node.vx = Some(particle.velocity.x);
            node.vy = Some(particle.velocity.y);
        }

        debug!(
            pass = params.kind.label(),
            nodes = nodes.len(),
            edges = edges.len(),
            steps = params.steps,
            alpha = simulation.alpha(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "layout pass finished"
        );
    }
}

struct PassParams {
    kind: LayoutPass,
    alpha: f32,
    steps: usize,
    reseed_all: bool,
}

/// Moves the center to the middle of a canvas that changed too little to
/// warrant a relayout. Other nodes keep their positions.
fn pin_center(nodes: &mut [GraphNode], center_id: &str, width: f32, height: f32) {
    let Some(center) = nodes.iter_mut().find(|node| node.id == center_id) else {
        return;
    };
    let (x, y) = (width * 0.5, height * 0.5);
    center.x = Some(x);
    center.y = Some(y);
    center.fx = Some(x);
    center.fy = Some(y);
    center.vx = Some(0.0);
    center.vy = Some(0.0);
}

fn valid_dimension(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn seed_position(rng: &mut StdRng, center: Vec2, config: &LayoutConfig) -> Vec2 {
    let min_radius = config.seed_radius_min.max(0.0);
    let max_radius = config.seed_radius_max.max(min_radius);
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let radius = if max_radius > min_radius {
        rng.gen_range(min_radius..max_radius)
    } else {
        min_radius
    };
    center + vec2(angle.cos(), angle.sin()) * radius
}

fn build_links(nodes: &[GraphNode], edges: &[GraphEdge], config: &LayoutConfig) -> Vec<Link> {
    let index_by_id = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.as_str(), index))
        .collect::<std::collections::HashMap<_, _>>();

    let pairs = edges
        .iter()
        .filter_map(|edge| {
            let source = *index_by_id.get(edge.source.as_str())?;
            let target = *index_by_id.get(edge.target.as_str())?;
            (source != target).then_some((source, target, config.link_distance(edge.relation_type)))
        })
        .collect::<Vec<_>>();

    let mut counts = vec![0usize; nodes.len()];
    for &(source, target, _) in &pairs {
        counts[source] += 1;
        counts[target] += 1;
    }

    pairs
        .into_iter()
        .map(|(source, target, rest_length)| Link::with_bias(source, target, rest_length, &counts))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::network::{GraphState, Limits, build_graph};
    use crate::taxonomy::{Entity, EntityKind, Relation, TaxonomyData};

    fn star() -> GraphState {
        let skills = (0..12)
            .map(|index| {
                Entity::new(
                    format!("s{index}"),
                    format!("S{index}"),
                    format!("skill {index}"),
                    EntityKind::Skill,
                )
            })
            .collect::<Vec<_>>();
        let relations = (0..12)
            .map(|index| {
                let kind = if index % 2 == 0 {
                    RelationKind::Essential
                } else {
                    RelationKind::Optional
                };
                Relation::new("o1", format!("s{index}"), kind)
            })
            .chain([Relation::new("o2", "s0", RelationKind::Essential)])
            .collect::<Vec<_>>();
        let data = TaxonomyData::new(
            [
                Entity::new("o1", "1", "root", EntityKind::Occupation),
                Entity::new("o2", "2", "other", EntityKind::Occupation),
            ],
            skills,
            relations,
        );
        build_graph("o1", EntityKind::Occupation, &data, None, Limits::default())
    }

    fn positions(state: &GraphState) -> Vec<(f32, f32)> {
        state
            .nodes
            .iter()
            .filter_map(GraphNode::position)
            .collect::<Vec<_>>()
    }

    #[test]
    fn full_pass_pins_center_and_clamps_everything_else() {
        let mut state = star();
        let mut engine = LayoutEngine::default();
        let calls = Cell::new(0);

        let status = engine.layout(&mut state.nodes, &state.edges, 800.0, 600.0, "o1", || {
            calls.set(calls.get() + 1)
        });
        assert_eq!(status.pass, LayoutPass::Full);
        assert!(!status.is_running);
        assert!(!engine.is_running());
        assert_eq!(calls.get(), 1);

        let center = state.center().unwrap();
        assert_eq!(center.position(), Some((400.0, 300.0)));
        assert_eq!((center.fx, center.fy), (Some(400.0), Some(300.0)));
        for node in state.nodes.iter().filter(|node| node.distance > 0) {
            let (x, y) = node.position().unwrap();
            assert!((50.0..=750.0).contains(&x), "{} x={x}", node.id);
            assert!((50.0..=550.0).contains(&y), "{} y={y}", node.id);
            assert!(!node.is_fixed());
        }
    }

    #[test]
    fn same_seed_gives_same_layout() {
        let mut first = star();
        let mut second = star();
        LayoutEngine::default().layout(&mut first.nodes, &first.edges, 900.0, 700.0, "o1", || {});
        LayoutEngine::default().layout(&mut second.nodes, &second.edges, 900.0, 700.0, "o1", || {});
        assert_eq!(positions(&first), positions(&second));
    }

    #[test]
    fn unchanged_graph_is_reused_without_callback() {
        let outer = |state: &GraphState| {
            state
                .nodes
                .iter()
                .filter(|node| node.distance > 0)
                .filter_map(GraphNode::position)
                .collect::<Vec<_>>()
        };
        let mut state = star();
        let mut engine = LayoutEngine::default();
        engine.layout(&mut state.nodes, &state.edges, 800.0, 600.0, "o1", || {});
        let before = outer(&state);

        let called = Cell::new(false);
        let status = engine.layout(&mut state.nodes, &state.edges, 830.0, 620.0, "o1", || {
            called.set(true)
        });
        assert_eq!(status.pass, LayoutPass::Reused);
        assert!(!called.get());
        assert_eq!(outer(&state), before);
        let center = state.center().unwrap();
        assert_eq!(center.position(), Some((415.0, 310.0)));
        assert_eq!((center.fx, center.fy), (Some(415.0), Some(310.0)));

        let status = engine.layout(&mut state.nodes, &state.edges, 900.0, 600.0, "o1", || {});
        assert_eq!(status.pass, LayoutPass::Full);
    }

    #[test]
    fn reheat_after_small_resize_uses_the_current_canvas() {
        let mut state = star();
        let mut engine = LayoutEngine::default();
        engine.layout(&mut state.nodes, &state.edges, 800.0, 600.0, "o1", || {});
        let status = engine.layout(&mut state.nodes, &state.edges, 840.0, 640.0, "o1", || {});
        assert_eq!(status.pass, LayoutPass::Reused);

        let status = engine.reheat(&mut state.nodes, &state.edges, || {});
        assert_eq!(status.pass, LayoutPass::Reheat);
        assert_eq!(state.center().unwrap().position(), Some((420.0, 320.0)));
        for node in state.nodes.iter().filter(|node| node.distance > 0) {
            let (x, y) = node.position().unwrap();
            assert!((50.0..=790.0).contains(&x), "{} x={x}", node.id);
            assert!((50.0..=590.0).contains(&y), "{} y={y}", node.id);
        }
    }

    #[test]
    fn edge_set_change_forces_relayout() {
        let mut state = star();
        let mut engine = LayoutEngine::default();
        engine.layout(&mut state.nodes, &state.edges, 800.0, 600.0, "o1", || {});

        state.edges.pop();
        let status = engine.layout(&mut state.nodes, &state.edges, 800.0, 600.0, "o1", || {});
        assert_eq!(status.pass, LayoutPass::Full);
    }

    #[test]
    fn invalid_input_is_skipped() {
        let mut state = star();
        let mut engine = LayoutEngine::default();
        let called = Cell::new(false);
        for (width, height) in [(0.0, 600.0), (800.0, -1.0), (f32::NAN, 600.0), (f32::INFINITY, 1.0)] {
            let status = engine.layout(&mut state.nodes, &state.edges, width, height, "o1", || {
                called.set(true)
            });
            assert_eq!(status.pass, LayoutPass::Skipped);
        }
        let status = engine.layout(&mut [], &[], 800.0, 600.0, "o1", || called.set(true));
        assert_eq!(status.pass, LayoutPass::Skipped);
        assert!(!called.get());
        assert!(state.nodes.iter().all(|node| node.position().is_none()));
    }

    #[test]
    fn reheat_needs_a_previous_pass() {
        let mut state = star();
        let mut engine = LayoutEngine::default();
        let status = engine.reheat(&mut state.nodes, &state.edges, || {});
        assert_eq!(status.pass, LayoutPass::Skipped);

        engine.layout(&mut state.nodes, &state.edges, 800.0, 600.0, "o1", || {});
        let called = Cell::new(false);
        let status = engine.reheat(&mut state.nodes, &state.edges, || called.set(true));
        assert_eq!(status.pass, LayoutPass::Reheat);
        assert!(called.get());
        assert_eq!(state.center().unwrap().position(), Some((400.0, 300.0)));
    }

    #[test]
    fn existing_positions_seed_the_next_pass() {
        let mut state = star();
        state.nodes[1].x = Some(120.0);
        state.nodes[1].y = Some(140.0);
        let mut seeded = LayoutEngine::default();
        seeded.layout(&mut state.nodes, &state.edges, 800.0, 600.0, "o1", || {});

        let mut fresh = star();
        LayoutEngine::default().layout(&mut fresh.nodes, &fresh.edges, 800.0, 600.0, "o1", || {});
        assert_ne!(positions(&state), positions(&fresh));
    }
}
