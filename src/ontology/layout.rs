use egui::{pos2, vec2, Pos2, Vec2};
use egui_graphs::{DisplayEdge, DisplayNode, Graph, Layout, LayoutState};
use petgraph::stable_graph::{IndexType, NodeIndex};
use petgraph::EdgeType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceParams {
    pub link_strength: f32,
    pub link_distance: f32,
    pub charge_strength: f32,
    pub center_strength: f32,
    pub collision_strength: f32,
    pub collision_padding: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    pub velocity_decay: f32,
    pub cooldown_ticks: u32,
    pub drag_alpha_target: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            link_strength: 0.2,
            link_distance: 80.0,
            charge_strength: -400.0,
            center_strength: 0.05,
            collision_strength: 0.8,
            collision_padding: 10.0,
            alpha_decay: 0.01,
            alpha_min: 0.001,
            velocity_decay: 0.4,
            cooldown_ticks: 300,
            drag_alpha_target: 0.3,
        }
    }
}

/// A node as the simulation sees it, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Half of the measured label box; drives the collision radius.
    pub half_extent: Vec2,
    pub pinned: bool,
}

impl Body {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            half_extent: vec2(50.0, 15.0),
            pinned: false,
        }
    }

    fn collision_radius(&self, padding: f32) -> f32 {
        self.half_extent.x.max(self.half_extent.y) + padding
    }
}

/// Cooling schedule and velocities carried from one frame to the next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceState {
    pub params: ForceParams,
    alpha: f32,
    alpha_target: f32,
    ticks_since_heat: u32,
    dragging: bool,
    velocities: Vec<[f32; 2]>,
}

impl Default for ForceState {
    fn default() -> Self {
        Self {
            params: ForceParams::default(),
            alpha: 1.0,
            alpha_target: 0.0,
            ticks_since_heat: 0,
            dragging: false,
            velocities: Vec::new(),
        }
    }
}

impl LayoutState for ForceState {}

impl ForceState {
    pub fn is_active(&self) -> bool {
        self.alpha_target > 0.0
            || (self.alpha >= self.params.alpha_min
                && self.ticks_since_heat < self.params.cooldown_ticks)
    }

    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
        self.ticks_since_heat = 0;
    }

    /// Holds the simulation warm while a node is held. Releasing starts a
    /// fresh cooldown from the current alpha.
    pub fn set_dragging(&mut self, dragging: bool) {
        if dragging == self.dragging {
            return;
        }
        self.dragging = dragging;
        self.alpha_target = if dragging {
            self.params.drag_alpha_target
        } else {
            0.0
        };
        self.ticks_since_heat = 0;
    }

    /// Advances the simulation one step. Returns false once cooled down.
    pub fn step(&mut self, bodies: &mut [Body], links: &[(usize, usize)]) -> bool {
        if !self.is_active() {
            return false;
        }
        self.restore_velocities(bodies);
        self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
        self.ticks_since_heat = self.ticks_since_heat.saturating_add(1);

        self.apply_links(bodies, links);
        self.apply_charge(bodies);
        self.apply_collisions(bodies);

        let keep = 1.0 - self.params.velocity_decay;
        for body in bodies.iter_mut() {
            if body.pinned {
                body.velocity = Vec2::ZERO;
            } else {
                body.velocity *= keep;
                body.position += body.velocity;
            }
        }

        self.apply_centering(bodies);
        self.velocities = bodies.iter().map(|body| [body.velocity.x, body.velocity.y]).collect();
        true
    }

    fn restore_velocities(&self, bodies: &mut [Body]) {
        if self.velocities.len() != bodies.len() {
            return;
        }
        for (body, [x, y]) in bodies.iter_mut().zip(&self.velocities) {
            body.velocity = vec2(*x, *y);
        }
    }

    fn apply_links(&self, bodies: &mut [Body], links: &[(usize, usize)]) {
        let ForceParams {
            link_strength,
            link_distance,
            ..
        } = self.params;
        let mut degree = vec![0usize; bodies.len()];
        for &(source, target) in links {
            degree[source] += 1;
            degree[target] += 1;
        }

        for (index, &(source, target)) in links.iter().enumerate() {
            let (s, t) = (&bodies[source], &bodies[target]);
            let mut delta = (t.position + t.velocity) - (s.position + s.velocity);
            if delta.length_sq() == 0.0 {
                delta = jiggle(index);
            }
            let length = delta.length();
            let scale = (length - link_distance) / length * self.alpha * link_strength;
            let pull = delta * scale;

            let (ds, dt) = (degree[source] as f32, degree[target] as f32);
            let bias = ds / (ds + dt);
            bodies[target].velocity -= pull * bias;
            bodies[source].velocity += pull * (1.0 - bias);
        }
    }

    fn apply_charge(&self, bodies: &mut [Body]) {
        let strength = self.params.charge_strength * self.alpha;
        let count = bodies.len();
        for i in 0..count {
            for j in (i + 1)..count {
                let mut delta = bodies[j].position - bodies[i].position;
                if delta.length_sq() == 0.0 {
                    delta = jiggle(i * count + j);
                }
                let distance_sq = delta.length_sq().max(1.0);
                let push = delta * (strength / distance_sq);
                bodies[i].velocity += push;
                bodies[j].velocity -= push;
            }
        }
    }

    fn apply_collisions(&self, bodies: &mut [Body]) {
        let ForceParams {
            collision_strength,
            collision_padding,
            ..
        } = self.params;
        let count = bodies.len();
        for i in 0..count {
            for j in (i + 1)..count {
                let ri = bodies[i].collision_radius(collision_padding);
                let rj = bodies[j].collision_radius(collision_padding);
                let reach = ri + rj;
                let (a, b) = (&bodies[i], &bodies[j]);
                let mut delta = (a.position + a.velocity) - (b.position + b.velocity);
                let mut distance_sq = delta.length_sq();
                if distance_sq >= reach * reach {
                    continue;
                }
                if distance_sq == 0.0 {
                    delta = jiggle(i * count + j);
                    distance_sq = delta.length_sq();
                }
                let distance = distance_sq.sqrt();
                let push = delta * ((reach - distance) / distance * collision_strength);
                let share = (rj * rj) / (ri * ri + rj * rj);
                bodies[i].velocity += push * share;
                bodies[j].velocity -= push * (1.0 - share);
            }
        }
    }

    fn apply_centering(&self, bodies: &mut [Body]) {
        let free = bodies.iter().filter(|body| !body.pinned).count();
        if free == 0 {
            return;
        }
        let mean = bodies
            .iter()
            .filter(|body| !body.pinned)
            .fold(Vec2::ZERO, |sum, body| sum + body.position)
            / free as f32;
        let shift = mean * self.params.center_strength;
        for body in bodies.iter_mut().filter(|body| !body.pinned) {
            body.position -= shift;
        }
    }
}

/// Force layout driven by `GraphView` once per frame. The node being dragged
/// is pinned where the pointer put it.
#[derive(Debug, Default)]
pub struct ForceLayout {
    state: ForceState,
}

impl Layout<ForceState> for ForceLayout {
    fn from_state(state: ForceState) -> impl Layout<ForceState> {
        Self { state }
    }

    fn next<N, E, Ty, Ix, Dn, De>(&mut self, g: &mut Graph<N, E, Ty, Ix, Dn, De>, ui: &egui::Ui)
    where
        N: Clone,
        E: Clone,
        Ty: EdgeType,
        Ix: IndexType,
        Dn: DisplayNode<N, E, Ty, Ix>,
        De: DisplayEdge<N, E, Ty, Ix, Dn>,
    {
        let mut indices = Vec::new();
        let mut bodies = Vec::new();
        for index in g.g().node_indices() {
            let Some(node) = g.node(index) else {
                continue;
            };
            let center = node.location();
            let right = node.display().closest_boundary_point(Vec2::X) - center;
            let down = node.display().closest_boundary_point(Vec2::Y) - center;
            indices.push(index);
            bodies.push(Body {
                position: center.to_vec2(),
                velocity: Vec2::ZERO,
                half_extent: vec2(right.x.abs(), down.y.abs()),
                pinned: node.dragged(),
            });
        }

        let slot: HashMap<NodeIndex<Ix>, usize> =
            indices.iter().enumerate().map(|(slot, &index)| (index, slot)).collect();
        let links: Vec<(usize, usize)> = g
            .g()
            .edge_indices()
            .filter_map(|edge| g.g().edge_endpoints(edge))
            .filter_map(|(source, target)| Some((*slot.get(&source)?, *slot.get(&target)?)))
            .filter(|(source, target)| source != target)
            .collect();

        self.state.set_dragging(bodies.iter().any(|body| body.pinned));
        if !self.state.step(&mut bodies, &links) {
            return;
        }
        for (&index, body) in indices.iter().zip(&bodies) {
            if body.pinned {
                continue;
            }
            if let Some(node) = g.node_mut(index) {
                node.set_location(body.position.to_pos2());
            }
        }
        ui.ctx().request_repaint();
    }

    fn state(&self) -> ForceState {
        self.state.clone()
    }
}

/// Deterministic phyllotaxis placement, so the first frames already spread out.
pub fn spiral_position(index: usize) -> Pos2 {
    let radius = 10.0 * (0.5 + index as f32).sqrt();
    let angle = index as f32 * PI * (3.0 - 5.0_f32.sqrt());
    pos2(radius * angle.cos(), radius * angle.sin())
}

fn jiggle(seed: usize) -> Vec2 {
    let angle = seed as f32 * 2.399_963;
    vec2(angle.cos(), angle.sin()) * 1e-3
}
