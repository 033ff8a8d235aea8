//! Physics engine contract and its `force_graph` backed implementation.
//!
//! The rest of the crate talks to the simulation only through
//! [`PhysicsEngine`]: named forces with per-node callbacks, an alpha/alpha
//! target energy model, pins, and a read-only position side table. Node data
//! itself is never annotated with positions.
//!
//! [`ForceGraphEngine`] delegates integration (velocity, damping, spring
//! cohesion along edges) to `force_graph` and applies the registered link,
//! charge, radial and collide forces as alpha-scaled position corrections
//! after each integration step. Charge is approximated with a quadtree and
//! collision only checks neighboring grid cells, so neither adds a pass over
//! every node pair.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::spatial::{NeighborGrid, QuadTree, separation};
use crate::catalog::{Edge, Endpoint, GraphData, Node, NodeHandle};

/// Per-node callback consulted by radial and collide forces.
pub type NodeAccessor = Rc<dyn Fn(&Node) -> f64>;

/// Name under which a force is registered; registering replaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForceKind {
	/// Spring along each edge.
	Link,
	/// Pairwise repulsion.
	Charge,
	/// Pull toward a ring.
	Radial,
	/// Overlap separation.
	Collide,
}

/// A force installed on the engine.
#[derive(Clone)]
pub enum Force {
	/// Spring rest length and stiffness along every edge.
	Link { distance: f64, strength: f64 },
	/// Pairwise repulsion (negative strength) ignored beyond `distance_max`.
	Charge { strength: f64, distance_max: f64 },
	/// Pull toward a circle of per-node radius around the origin.
	Radial { radius: NodeAccessor, strength: f64 },
	/// Minimum center distance: the sum of both nodes' radii.
	Collide { radius: NodeAccessor, strength: f64 },
}

impl Force {
	/// Registry key of this force.
	pub fn kind(&self) -> ForceKind {
		match self {
			Force::Link { .. } => ForceKind::Link,
			Force::Charge { .. } => ForceKind::Charge,
			Force::Radial { .. } => ForceKind::Radial,
			Force::Collide { .. } => ForceKind::Collide,
		}
	}

	/// Strength as configured.
	pub fn strength(&self) -> f64 {
		match self {
			Force::Link { strength, .. }
			| Force::Charge { strength, .. }
			| Force::Radial { strength, .. }
			| Force::Collide { strength, .. } => *strength,
		}
	}

	/// Per-node radius for radial and collide forces.
	pub fn radius_of(&self, node: &Node) -> Option<f64> {
		match self {
			Force::Radial { radius, .. } | Force::Collide { radius, .. } => Some(radius(node)),
			_ => None,
		}
	}
}

impl fmt::Debug for Force {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Force::Link { distance, strength } => f
				.debug_struct("Link")
				.field("distance", distance)
				.field("strength", strength)
				.finish(),
			Force::Charge {
				strength,
				distance_max,
			} => f
				.debug_struct("Charge")
				.field("strength", strength)
				.field("distance_max", distance_max)
				.finish(),
			Force::Radial { strength, .. } => f.debug_struct("Radial").field("strength", strength).finish_non_exhaustive(),
			Force::Collide { strength, .. } => f.debug_struct("Collide").field("strength", strength).finish_non_exhaustive(),
		}
	}
}

/// World position of one node, plus its pin when fixed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodePosition {
	/// World coordinates.
	pub x: f64,
	pub y: f64,
	/// Pinned coordinates while dragged.
	pub fx: Option<f64>,
	pub fy: Option<f64>,
}

impl NodePosition {
	/// Whether `fx`/`fy` hold the node.
	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

/// Axis-aligned bounds of a set of positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	/// Smallest corner.
	pub min_x: f64,
	pub min_y: f64,
	/// Largest corner.
	pub max_x: f64,
	pub max_y: f64,
}

impl Bounds {
	/// Horizontal extent.
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	/// Vertical extent.
	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	/// Midpoint of the box.
	pub fn center(&self) -> (f64, f64) {
		((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
	}
}

/// Node id -> position side table, owned by the engine.
#[derive(Clone, Debug, Default)]
pub struct PositionTable {
	slots: HashMap<String, usize>,
	entries: Vec<NodePosition>,
}

impl PositionTable {
	/// Position of a node id.
	pub fn get(&self, id: &str) -> Option<&NodePosition> {
		self.slots.get(id).map(|&slot| &self.entries[slot])
	}

	/// Engine slot of a node id.
	pub fn slot(&self, id: &str) -> Option<usize> {
		self.slots.get(id).copied()
	}

	/// Number of simulated nodes.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// No simulated nodes.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Bounds of every position, `None` when empty.
	pub fn bounds(&self) -> Option<Bounds> {
		let first = self.entries.first()?;
		let init = Bounds {
			min_x: first.x,
			min_y: first.y,
			max_x: first.x,
			max_y: first.y,
		};
		Some(self.entries.iter().fold(init, |b, p| Bounds {
			min_x: b.min_x.min(p.x),
			min_y: b.min_y.min(p.y),
			max_x: b.max_x.max(p.x),
			max_y: b.max_y.max(p.y),
		}))
	}

	fn insert(&mut self, id: &str, position: NodePosition) {
		self.slots.insert(id.to_string(), self.entries.len());
		self.entries.push(position);
	}
}

/// What a call to [`PhysicsEngine::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickEvent {
	/// Positions advanced.
	Ticked,
	/// Alpha fell below the floor on this tick; the simulation is now idle.
	Stopped,
	/// Nothing to do (stopped or empty).
	Idle,
}

/// The simulation surface consumed by layout, labels and interaction.
pub trait PhysicsEngine {
	/// Discard all simulation state (positions, pins, forces, energy) and
	/// seed `graph`'s nodes afresh. Forces must be registered again.
	fn reset(&mut self, graph: &GraphData);
	/// Install `force`, replacing any force of the same kind.
	fn register_force(&mut self, force: Force);
	fn remove_force(&mut self, kind: ForceKind);
	fn force(&self, kind: ForceKind) -> Option<&Force>;
	fn alpha(&self) -> f64;
	fn alpha_target(&self) -> f64;
	fn set_alpha_target(&mut self, target: f64);
	/// Resume ticking if stopped; alpha then moves toward its target.
	fn restart(&mut self);
	fn is_running(&self) -> bool;
	fn tick(&mut self, dt: f64) -> TickEvent;
	fn positions(&self) -> &PositionTable;
	/// Fix a node at a world position until [`PhysicsEngine::unpin`].
	fn pin(&mut self, id: &str, x: f64, y: f64);
	fn unpin(&mut self, id: &str);
	fn nodes(&self) -> &[Node];
	/// Links with endpoints hydrated into engine handles.
	fn links(&self) -> &[Edge];
}

/// Below this, the simulation stops.
const ALPHA_MIN: f64 = 0.001;
/// Per-tick approach of alpha toward its target; settles in ~300 ticks.
const ALPHA_DECAY: f64 = 0.0228;
/// Barnes-Hut opening angle for charge.
const CHARGE_THETA: f64 = 0.9;
/// Spacing of the seeded phyllotaxis spiral.
const SEED_RADIUS: f64 = 10.0;

fn simulation_parameters() -> SimulationParameters {
	SimulationParameters {
		force_charge: 0.0,
		force_spring: 0.01,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	}
}

/// Deterministic spiral seed for slot `i`.
fn seed_position(i: usize) -> (f64, f64) {
	let angle = i as f64 * PI * (3.0 - 5f64.sqrt());
	let radius = SEED_RADIUS * (0.5 + i as f64).sqrt();
	(radius * angle.cos(), radius * angle.sin())
}

/// [`PhysicsEngine`] over a `force_graph` simulation.
pub struct ForceGraphEngine {
	graph: ForceGraph<usize, ()>,
	handles: Vec<DefaultNodeIdx>,
	nodes: Vec<Node>,
	links: Vec<Edge>,
	forces: HashMap<ForceKind, Force>,
	positions: PositionTable,
	alpha: f64,
	alpha_target: f64,
	running: bool,
}

impl Default for ForceGraphEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl ForceGraphEngine {
	/// An empty, idle engine.
	pub fn new() -> Self {
		Self {
			graph: ForceGraph::new(simulation_parameters()),
			handles: Vec::new(),
			nodes: Vec::new(),
			links: Vec::new(),
			forces: HashMap::new(),
			positions: PositionTable::default(),
			alpha: 1.0,
			alpha_target: 0.0,
			running: false,
		}
	}

	/// Engine seeded with `graph`.
	#[cfg(test)]
	pub(crate) fn with_graph(graph: &GraphData) -> Self {
		let mut engine = Self::new();
		engine.reset(graph);
		engine
	}

	fn snapshot(&self) -> (Vec<(f64, f64)>, Vec<bool>) {
		let n = self.nodes.len();
		let mut pos = vec![(0.0, 0.0); n];
		let mut pinned = vec![false; n];
		self.graph.visit_nodes(|node| {
			let slot = node.data.user_data;
			pos[slot] = (node.x() as f64, node.y() as f64);
			pinned[slot] = node.data.is_anchor;
		});
		(pos, pinned)
	}

	/// Summed position corrections of every registered force.
	fn constraint_deltas(&self, pos: &[(f64, f64)]) -> Vec<(f64, f64)> {
		let n = pos.len();
		let alpha = self.alpha;
		let mut delta = vec![(0.0, 0.0); n];

		if let Some(Force::Link { distance, strength }) = self.forces.get(&ForceKind::Link) {
			for link in &self.links {
				let (Endpoint::Ref(s), Endpoint::Ref(t)) = (&link.source, &link.target) else {
					continue;
				};
				let (dx, dy) = separation(pos[s.slot], pos[t.slot], t.slot);
				let len = (dx * dx + dy * dy).sqrt();
				let k = (len - distance) / len * alpha * strength * 0.5;
				delta[s.slot].0 += dx * k;
				delta[s.slot].1 += dy * k;
				delta[t.slot].0 -= dx * k;
				delta[t.slot].1 -= dy * k;
			}
		}

		if let Some(Force::Radial { radius, strength }) = self.forces.get(&ForceKind::Radial) {
			for (slot, node) in self.nodes.iter().enumerate() {
				let (x, y) = pos[slot];
				let r = (x * x + y * y).sqrt();
				if r < 1e-9 {
					continue;
				}
				let k = (radius(node) - r) * strength * alpha / r;
				delta[slot].0 += x * k;
				delta[slot].1 += y * k;
			}
		}

		if let Some(Force::Charge {
			strength,
			distance_max,
		}) = self.forces.get(&ForceKind::Charge)
		{
			let tree = QuadTree::new(pos);
			for (slot, d) in delta.iter_mut().enumerate() {
				tree.for_each_body(slot, pos, CHARGE_THETA, *distance_max, |dx, dy, weight| {
					let k = strength * alpha * weight / (dx * dx + dy * dy).max(1.0);
					d.0 += dx * k;
					d.1 += dy * k;
				});
			}
		}

		if let Some(Force::Collide { radius, strength }) = self.forces.get(&ForceKind::Collide) {
			let radii: Vec<f64> = self.nodes.iter().map(|n| radius(n)).collect();
			let reach = 2.0 * radii.iter().copied().fold(0.0, f64::max);
			if reach > 0.0 {
				NeighborGrid::new(pos, reach).for_each_pair(pos, |i, j| {
					let (dx, dy) = separation(pos[i], pos[j], j);
					let dist = (dx * dx + dy * dy).sqrt();
					let min = radii[i] + radii[j];
					if dist < min {
						let k = (min - dist) / dist * strength * 0.5;
						delta[i].0 -= dx * k;
						delta[i].1 -= dy * k;
						delta[j].0 += dx * k;
						delta[j].1 += dy * k;
					}
				});
			}
		}
		delta
	}

	fn sync_positions(&mut self) {
		let entries = &mut self.positions.entries;
		self.graph.visit_nodes(|node| {
			let entry = &mut entries[node.data.user_data];
			entry.x = node.x() as f64;
			entry.y = node.y() as f64;
		});
	}

	fn set_anchor(&mut self, slot: usize, at: Option<(f64, f64)>) {
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data == slot {
				node.data.is_anchor = at.is_some();
				if let Some((x, y)) = at {
					node.data.x = x as f32;
					node.data.y = y as f32;
				}
			}
		});
	}
}

impl PhysicsEngine for ForceGraphEngine {
	fn reset(&mut self, graph: &GraphData) {
		self.graph = ForceGraph::new(simulation_parameters());
		self.handles.clear();
		self.nodes = graph.nodes.clone();
		self.forces.clear();
		self.positions = PositionTable::default();

		for (slot, node) in self.nodes.iter().enumerate() {
			let (x, y) = seed_position(slot);
			let handle = self.graph.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: slot,
			});
			self.handles.push(handle);
			self.positions.insert(
				&node.id,
				NodePosition {
					x,
					y,
					..Default::default()
				},
			);
		}

		self.links = graph
			.links
			.iter()
			.filter_map(|link| {
				let s = self.positions.slot(link.source_id())?;
				let t = self.positions.slot(link.target_id())?;
				self.graph
					.add_edge(self.handles[s], self.handles[t], EdgeData::default());
				Some(Edge {
					source: Endpoint::Ref(NodeHandle {
						id: link.source_id().to_string(),
						slot: s,
					}),
					target: Endpoint::Ref(NodeHandle {
						id: link.target_id().to_string(),
						slot: t,
					}),
					edge_type: link.edge_type,
				})
			})
			.collect();
		if self.links.len() < graph.links.len() {
			log::warn!(
				"book-globe: dropped {} links with unknown endpoints",
				graph.links.len() - self.links.len()
			);
		}

		self.alpha = 1.0;
		self.alpha_target = 0.0;
		self.running = !self.nodes.is_empty();
	}

	fn register_force(&mut self, force: Force) {
		self.forces.insert(force.kind(), force);
	}

	fn remove_force(&mut self, kind: ForceKind) {
		self.forces.remove(&kind);
	}

	fn force(&self, kind: ForceKind) -> Option<&Force> {
		self.forces.get(&kind)
	}

	fn alpha(&self) -> f64 {
		self.alpha
	}

	fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.clamp(0.0, 1.0);
	}

	fn restart(&mut self) {
		self.running = !self.nodes.is_empty();
	}

	fn is_running(&self) -> bool {
		self.running
	}

	fn tick(&mut self, dt: f64) -> TickEvent {
		if !self.running {
			return TickEvent::Idle;
		}
		self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
		if self.alpha < ALPHA_MIN {
			self.running = false;
			return TickEvent::Stopped;
		}

		self.graph.update(dt as f32);

		let (pos, pinned) = self.snapshot();
		let delta = self.constraint_deltas(&pos);
		self.graph.visit_nodes_mut(|node| {
			let slot = node.data.user_data;
			if pinned[slot] {
				return;
			}
			node.data.x += delta[slot].0 as f32;
			node.data.y += delta[slot].1 as f32;
		});
		self.sync_positions();
		TickEvent::Ticked
	}

	fn positions(&self) -> &PositionTable {
		&self.positions
	}

	fn pin(&mut self, id: &str, x: f64, y: f64) {
		let Some(slot) = self.positions.slot(id) else {
			return;
		};
		self.set_anchor(slot, Some((x, y)));
		self.positions.entries[slot] = NodePosition {
			x,
			y,
			fx: Some(x),
			fy: Some(y),
		};
	}

	fn unpin(&mut self, id: &str) {
		let Some(slot) = self.positions.slot(id) else {
			return;
		};
		self.set_anchor(slot, None);
		let entry = &mut self.positions.entries[slot];
		entry.fx = None;
		entry.fy = None;
	}

	fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	fn links(&self) -> &[Edge] {
		&self.links
	}
}
