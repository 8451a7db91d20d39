use eframe::egui::{Vec2, vec2};

use super::LayoutConfig;
use super::quadtree::QuadNode;

const MIN_DISTANCE_SQ: f32 = 1.0;

pub(super) struct Particle {
    pub(super) position: Vec2,
    pub(super) velocity: Vec2,
    pub(super) pinned: Option<Vec2>,
    pub(super) charge: f32,
    pub(super) radius: f32,
    pub(super) ring_radius: f32,
    pub(super) ring_strength: f32,
}

pub(super) struct Link {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) rest_length: f32,
    pub(super) bias: f32,
}

impl Link {
    /// Splits the correction so the better-connected endpoint moves less.
    pub(super) fn with_bias(source: usize, target: usize, rest_length: f32, counts: &[usize]) -> Self {
        let source_count = counts.get(source).copied().unwrap_or(1).max(1) as f32;
        let target_count = counts.get(target).copied().unwrap_or(1).max(1) as f32;
        Self {
            source,
            target,
            rest_length,
            bias: source_count / (source_count + target_count),
        }
    }
}

/// Direction used when two points coincide.
fn separation_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

pub(super) struct Simulation<'c> {
    config: &'c LayoutConfig,
    pub(super) particles: Vec<Particle>,
    links: Vec<Link>,
    center: Vec2,
    min_bound: Vec2,
    max_bound: Vec2,
    alpha: f32,
    alpha_decay: f32,
    positions: Vec<Vec2>,
    charges: Vec<f32>,
    corrections: Vec<Vec2>,
}

impl<'c> Simulation<'c> {
    pub(super) fn new(
        config: &'c LayoutConfig,
        particles: Vec<Particle>,
        links: Vec<Link>,
        width: f32,
        height: f32,
        alpha: f32,
    ) -> Self {
        let padding = config.padding.clamp(0.0, width.min(height) * 0.5);
        let iterations = config.iterations.max(1) as f32;
        let alpha_decay = 1.0 - config.alpha_min.clamp(1e-6, 1.0).powf(1.0 / iterations);
        let node_count = particles.len();

        Self {
            config,
            particles,
            links,
            center: vec2(width * 0.5, height * 0.5),
            min_bound: vec2(padding, padding),
            max_bound: vec2(width - padding, height - padding),
            alpha,
            alpha_decay,
            positions: Vec::with_capacity(node_count),
            charges: Vec::with_capacity(node_count),
            corrections: vec![Vec2::ZERO; node_count],
        }
    }

    pub(super) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(super) fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    pub(super) fn step(&mut self) {
        self.alpha += -self.alpha * self.alpha_decay;

        self.apply_links();
        self.apply_charges();
        self.apply_collisions();
        self.apply_radial();
        self.integrate();
    }

    fn apply_links(&mut self) {
        let strength = self.config.link_strength;
        for link in &self.links {
            let (source, target) = (link.source, link.target);
            let source_next = self.particles[source].position + self.particles[source].velocity;
            let target_next = self.particles[target].position + self.particles[target].velocity;

            let mut delta = target_next - source_next;
            let mut distance = delta.length();
            if distance <= 1e-4 {
                delta = separation_direction(source, target) * 1e-3;
                distance = delta.length();
            }

            let scale = (distance - link.rest_length) / distance * self.alpha * strength;
            let correction = delta * scale;
            self.particles[target].velocity -= correction * link.bias;
            self.particles[source].velocity += correction * (1.0 - link.bias);
        }
    }

    fn apply_charges(&mut self) {
        self.positions.clear();
        self.charges.clear();
        for particle in &self.particles {
            self.positions.push(particle.position);
            self.charges.push(particle.charge);
        }

        let Some(tree) = QuadNode::build(&self.positions, &self.charges) else {
            return;
        };

        let theta_sq = self.config.theta * self.config.theta;
        for index in 0..self.particles.len() {
            let mut force = Vec2::ZERO;
            accumulate_charge(
                &tree,
                index,
                &self.positions,
                &self.charges,
                theta_sq,
                &mut force,
            );
            self.particles[index].velocity += force * self.alpha;
        }
    }

    fn apply_collisions(&mut self) {
        self.positions.clear();
        let mut max_radius = 0.0_f32;
        for particle in &self.particles {
            self.positions.push(particle.position + particle.velocity);
            max_radius = max_radius.max(particle.radius);
        }
        if max_radius <= 0.0 {
            return;
        }

        let Some(tree) = QuadNode::build(&self.positions, &self.charges) else {
            return;
        };

        let radii = self.particles.iter().map(|particle| particle.radius).collect::<Vec<_>>();
        self.corrections.clear();
        self.corrections.resize(self.particles.len(), Vec2::ZERO);
        let reach = max_radius * 2.0;
        let params = CollisionParams {
            strength: self.config.collision_strength,
            max_distance_sq: reach * reach,
        };
        accumulate_collision_pairs(
            &tree,
            &tree,
            true,
            &self.positions,
            &radii,
            params,
            &mut self.corrections,
        );

        for (particle, correction) in self.particles.iter_mut().zip(&self.corrections) {
            particle.velocity += *correction;
        }
    }

    fn apply_radial(&mut self) {
        for particle in &mut self.particles {
            if particle.ring_strength <= 0.0 {
                continue;
            }
            let mut offset = particle.position - self.center;
            if offset.length_sq() <= 1e-12 {
                offset = vec2(1e-6, 0.0);
            }
            let radius = offset.length();
            let scale = (particle.ring_radius - radius) * particle.ring_strength * self.alpha / radius;
            particle.velocity += offset * scale;
        }
    }

    fn integrate(&mut self) {
        let decay = 1.0 - self.config.velocity_decay.clamp(0.0, 1.0);
        for particle in &mut self.particles {
            if let Some(pinned) = particle.pinned {
                particle.position = pinned;
                particle.velocity = Vec2::ZERO;
                continue;
            }

            particle.velocity *= decay;
            particle.position += particle.velocity;
            particle.position = particle.position.clamp(self.min_bound, self.max_bound);
        }
    }
}

fn accumulate_charge(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    charges: &[f32],
    theta_sq: f32,
    force: &mut Vec2,
) {
    if node.charge == 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            let mut delta = positions[other] - point;
            if delta.length_sq() <= 1e-12 {
                delta = separation_direction(index, other) * 1e-3;
            }
            let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
            *force += delta * (charges[other] / distance_sq);
        }
        return;
    }

    let delta = node.center - point;
    let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
    let side = node.bounds.side_length();
    if !node.bounds.contains(point) && (side * side / distance_sq) < theta_sq {
        *force += delta * (node.charge / distance_sq);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_charge(child, index, positions, charges, theta_sq, force);
    }
}

#[derive(Clone, Copy)]
struct CollisionParams {
    strength: f32,
    max_distance_sq: f32,
}

fn resolve_overlap(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    corrections: &mut [Vec2],
) {
    let reach = radii[from] + radii[to];
    let mut delta = positions[from] - positions[to];
    let mut distance_sq = delta.length_sq();
    if distance_sq >= reach * reach {
        return;
    }
    if distance_sq <= 1e-12 {
        delta = separation_direction(from, to) * 1e-3;
        distance_sq = delta.length_sq();
    }

    let distance = distance_sq.sqrt();
    let push = delta * ((reach - distance) / distance * strength);
    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let total = (from_sq + to_sq).max(f32::EPSILON);
    corrections[from] += push * (to_sq / total);
    corrections[to] -= push * (from_sq / total);
}

fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    corrections: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    resolve_overlap(from, to, positions, radii, params.strength, corrections);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    resolve_overlap(from, to, positions, radii, params.strength, corrections);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_deref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, corrections);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_deref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a, child_b, false, positions, radii, params, corrections,
                );
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
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, corrections);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, corrections);
        }
    }
}
