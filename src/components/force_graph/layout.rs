//! Radial "globe" constraints supplied to the physics engine.
//!
//! Each node type gets a ring (a target distance from the origin) and a
//! separation radius. Both depend only on the viewport size, the node type and
//! the current selection, so reapplying with the same inputs installs forces
//! that behave identically.
//!
//! The supplier also owns the drag reheat protocol: the engine is kept warm
//! while a node is dragged so neighbors follow, then allowed to cool.

use std::rc::Rc;

use super::config::LayoutConfig;
use super::engine::{Force, PhysicsEngine};
use crate::catalog::{Node, NodeType, Selection, Tab};

/// Ring fraction of the usable radius for `node_type` under `selection`.
pub fn ring_ratio(config: &LayoutConfig, node_type: NodeType, selection: &Selection) -> f64 {
	match selection.tab {
		Tab::All => config.rings.ratio(node_type),
		Tab::Facet(_) if node_type.is_book() => config.filtered_rings.book,
		Tab::Facet(selected) if selected == node_type => config.filtered_rings.selected,
		Tab::Facet(_) => config.filtered_rings.other,
	}
}

/// Minimum center-to-center half distance for `node_type`.
pub fn collide_radius(config: &LayoutConfig, node_type: NodeType) -> f64 {
	if node_type.is_book() {
		config.collide_book_radius
	} else {
		config.collide_attribute_radius
	}
}

/// Computes and installs layout forces.
#[derive(Clone, Debug, Default)]
pub struct LayoutSupplier {
	config: LayoutConfig,
}

impl LayoutSupplier {
	/// Supplier for a layout configuration.
	pub fn new(config: LayoutConfig) -> Self {
		Self { config }
	}

	/// Configuration forces are built from.
	pub fn config(&self) -> &LayoutConfig {
		&self.config
	}

	/// Usable radius for a viewport, or `None` before it has been measured.
	pub fn usable_radius(&self, width: f64, height: f64) -> Option<f64> {
		let measured = |v: f64| v.is_finite() && v > 0.0;
		if !measured(width) || !measured(height) {
			return None;
		}
		Some((width.min(height) / 2.0 - self.config.padding).max(self.config.radius_min))
	}

	/// Target ring radius for a node type.
	pub fn ring_radius(&self, radius: f64, node_type: NodeType, selection: &Selection) -> f64 {
		radius * ring_ratio(&self.config, node_type, selection)
	}

	/// Register link, charge, radial and collide forces for this viewport and
	/// selection, replacing whatever was installed, and restart the engine.
	///
	/// Returns `false` without touching the engine while the viewport has no
	/// size yet.
	pub fn apply_layout<E: PhysicsEngine + ?Sized>(
		&self,
		engine: &mut E,
		width: f64,
		height: f64,
		selection: &Selection,
	) -> bool {
		let Some(radius) = self.usable_radius(width, height) else {
			log::debug!("book-globe: layout skipped, viewport {}x{} not measured", width, height);
			return false;
		};
		let config = &self.config;

		engine.register_force(Force::Link {
			distance: config.link_distance,
			strength: config.link_strength,
		});
		engine.register_force(Force::Charge {
			strength: config.charge_strength,
			distance_max: config.charge_distance_max,
		});

		let rings = config.clone();
		let selection = selection.clone();
		engine.register_force(Force::Radial {
			radius: Rc::new(move |node: &Node| radius * ring_ratio(&rings, node.node_type, &selection)),
			strength: config.radial_strength,
		});

		let radii = config.clone();
		engine.register_force(Force::Collide {
			radius: Rc::new(move |node: &Node| collide_radius(&radii, node.node_type)),
			strength: config.collide_strength,
		});

		engine.restart();
		true
	}

	/// Inject energy as a drag begins so the perturbation spreads.
	pub fn drag_started<E: PhysicsEngine + ?Sized>(&self, engine: &mut E) {
		engine.set_alpha_target(self.config.drag_alpha_target);
		engine.restart();
	}

	/// Keep the engine warm for as long as the drag lasts.
	pub fn drag_continued<E: PhysicsEngine + ?Sized>(&self, engine: &mut E) {
		if engine.alpha_target() < self.config.drag_alpha_target {
			engine.set_alpha_target(self.config.drag_alpha_target);
		}
		engine.restart();
	}

	/// Let the energy dissipate after release instead of stopping dead.
	pub fn drag_ended<E: PhysicsEngine + ?Sized>(&self, engine: &mut E) {
		engine.set_alpha_target(0.0);
		engine.restart();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::{BookRecord, GraphData, build_graph};
	use crate::components::force_graph::engine::{ForceGraphEngine, ForceKind, TickEvent};

	fn sample() -> GraphData {
		build_graph(&[BookRecord {
			author: Some("A".into()),
			genre: Some("SF".into()),
			division: Some("번역".into()),
			..BookRecord::new("1", "T")
		}])
	}

	fn radial_radius(engine: &ForceGraphEngine, id: &str) -> f64 {
		let node = engine.nodes().iter().find(|n| n.id == id).unwrap();
		engine.force(ForceKind::Radial).unwrap().radius_of(node).unwrap()
	}

	#[test]
	fn test_zero_viewport_registers_nothing() {
		let mut engine = ForceGraphEngine::with_graph(&sample());
		let supplier = LayoutSupplier::default();
		assert!(!supplier.apply_layout(&mut engine, 0.0, 0.0, &Selection::all()));
		assert!(!supplier.apply_layout(&mut engine, 800.0, 0.0, &Selection::all()));
		assert!(!supplier.apply_layout(&mut engine, f64::NAN, 600.0, &Selection::all()));
		for kind in [ForceKind::Link, ForceKind::Charge, ForceKind::Radial, ForceKind::Collide] {
			assert!(engine.force(kind).is_none());
		}
	}

	#[test]
	fn test_usable_radius_has_floor() {
		let supplier = LayoutSupplier::default();
		assert_eq!(supplier.usable_radius(1000.0, 800.0), Some(400.0 - 48.0));
		assert_eq!(supplier.usable_radius(100.0, 100.0), Some(120.0));
		assert_eq!(supplier.usable_radius(-5.0, 100.0), None);
	}

	#[test]
	fn test_unfiltered_rings_follow_table() {
		let mut engine = ForceGraphEngine::with_graph(&sample());
		let supplier = LayoutSupplier::default();
		assert!(supplier.apply_layout(&mut engine, 1000.0, 800.0, &Selection::all()));

		let r = 352.0;
		assert!((radial_radius(&engine, "book:1") - r * 0.45).abs() < 1e-9);
		assert!((radial_radius(&engine, "author:A") - r * 0.64).abs() < 1e-9);
		assert!((radial_radius(&engine, "division:번역서") - r * 0.18).abs() < 1e-9);
		assert!(radial_radius(&engine, "genre:SF") > radial_radius(&engine, "author:A"));
	}

	#[test]
	fn test_filtered_rings_collapse_to_three_bands() {
		let config = LayoutConfig::default();
		let selection = Selection::chip(NodeType::Genre, "SF");
		assert_eq!(ring_ratio(&config, NodeType::Book, &selection), 0.55);
		assert_eq!(ring_ratio(&config, NodeType::Genre, &selection), 0.18);
		assert_eq!(ring_ratio(&config, NodeType::Author, &selection), 0.95);
		assert_eq!(ring_ratio(&config, NodeType::Division, &selection), 0.95);
	}

	#[test]
	fn test_collide_radius_larger_for_books() {
		let mut engine = ForceGraphEngine::with_graph(&sample());
		LayoutSupplier::default().apply_layout(&mut engine, 600.0, 600.0, &Selection::all());
		let collide = engine.force(ForceKind::Collide).unwrap();
		let book = engine.nodes().iter().find(|n| n.node_type.is_book()).unwrap();
		let author = engine.nodes().iter().find(|n| n.node_type == NodeType::Author).unwrap();
		assert!(collide.radius_of(book).unwrap() > collide.radius_of(author).unwrap());
		assert_eq!(collide.strength(), 0.7);
	}

	#[test]
	fn test_reapply_is_idempotent() {
		let mut engine = ForceGraphEngine::with_graph(&sample());
		let supplier = LayoutSupplier::default();
		let selection = Selection::facet(NodeType::Author);
		supplier.apply_layout(&mut engine, 900.0, 700.0, &selection);
		let before: Vec<f64> = engine.nodes().iter().map(|n| radial_radius_of(&engine, n)).collect();
		supplier.apply_layout(&mut engine, 900.0, 700.0, &selection);
		let after: Vec<f64> = engine.nodes().iter().map(|n| radial_radius_of(&engine, n)).collect();
		assert_eq!(before, after);
	}

	fn radial_radius_of(engine: &ForceGraphEngine, node: &Node) -> f64 {
		engine.force(ForceKind::Radial).unwrap().radius_of(node).unwrap()
	}

	#[test]
	fn test_apply_restarts_stopped_engine() {
		let mut engine = ForceGraphEngine::with_graph(&sample());
		while engine.tick(0.016) != TickEvent::Stopped {}
		assert!(!engine.is_running());
		LayoutSupplier::default().apply_layout(&mut engine, 800.0, 600.0, &Selection::all());
		assert!(engine.is_running());
	}

	#[test]
	fn test_reheat_protocol() {
		let mut engine = ForceGraphEngine::with_graph(&sample());
		let supplier = LayoutSupplier::default();
		while engine.tick(0.016) != TickEvent::Stopped {}

		supplier.drag_started(&mut engine);
		assert!(engine.is_running());
		assert_eq!(engine.alpha_target(), 0.3);
		let alpha_at_start = engine.alpha();
		for _ in 0..30 {
			supplier.drag_continued(&mut engine);
			engine.tick(0.016);
		}
		assert!(engine.alpha() > alpha_at_start);

		supplier.drag_ended(&mut engine);
		assert_eq!(engine.alpha_target(), 0.0);
		assert!(engine.is_running());
		assert_eq!(engine.tick(0.016), TickEvent::Ticked);
	}
}
