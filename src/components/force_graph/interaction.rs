//! Pointer gestures on nodes.
//!
//! A press becomes a drag once the pointer travels past the threshold;
//! otherwise release counts as a tap. Book nodes navigate on a second tap
//! within the double-tap window and preview on the first; attribute nodes
//! always preview. The controller is the only writer of pins.

use super::config::InteractionConfig;
use super::engine::PhysicsEngine;
use super::layout::LayoutSupplier;
use super::state::ViewTransform;
use crate::catalog::Node;

/// Outcome of a finished gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
	/// Show the preview card for a node.
	Preview { node_id: String },
	/// Leave for a book's page.
	Navigate { href: String },
	/// A dragged node was released.
	DragEnded { node_id: String },
}

#[derive(Clone, Debug, Default, PartialEq)]
enum Gesture {
	#[default]
	Idle,
	Pressed {
		node_id: String,
		origin: (f64, f64),
	},
	Dragging {
		node_id: String,
	},
}

/// Tap/drag state machine for one pointer.
#[derive(Clone, Debug, Default)]
pub struct InteractionController {
	config: InteractionConfig,
	gesture: Gesture,
	/// Last book tap, for double-tap detection.
	last_tap: Option<(String, f64)>,
}

impl InteractionController {
	/// Idle controller.
	pub fn new(config: InteractionConfig) -> Self {
		Self {
			config,
			..Default::default()
		}
	}

	/// Whether a node gesture owns the pointer.
	pub fn is_engaged(&self) -> bool {
		self.gesture != Gesture::Idle
	}

	/// Node under an active drag.
	pub fn dragged_node(&self) -> Option<&str> {
		match &self.gesture {
			Gesture::Dragging { node_id } => Some(node_id),
			_ => None,
		}
	}

	/// Press on `node_id` at a screen point.
	pub fn pointer_down(&mut self, node_id: &str, screen: (f64, f64)) {
		self.gesture = Gesture::Pressed {
			node_id: node_id.to_string(),
			origin: screen,
		};
	}

	/// Follow the pointer. `world` is the pointer in world coordinates.
	pub fn pointer_move<E: PhysicsEngine + ?Sized>(
		&mut self,
		engine: &mut E,
		supplier: &LayoutSupplier,
		screen: (f64, f64),
		world: (f64, f64),
	) {
		match &self.gesture {
			Gesture::Idle => {}
			Gesture::Pressed { node_id, origin } => {
				let travel = (screen.0 - origin.0).hypot(screen.1 - origin.1);
				if travel <= self.config.drag_threshold {
					return;
				}
				let node_id = node_id.clone();
				engine.pin(&node_id, world.0, world.1);
				supplier.drag_started(engine);
				log::debug!("book-globe: drag started on {}", node_id);
				self.gesture = Gesture::Dragging { node_id };
			}
			Gesture::Dragging { node_id } => {
				engine.pin(node_id, world.0, world.1);
				supplier.drag_continued(engine);
			}
		}
	}

	/// Release the pointer at time `now_ms`.
	pub fn pointer_up<E: PhysicsEngine + ?Sized>(
		&mut self,
		engine: &mut E,
		supplier: &LayoutSupplier,
		now_ms: f64,
	) -> Option<InteractionEvent> {
		match std::mem::take(&mut self.gesture) {
			Gesture::Idle => None,
			Gesture::Dragging { node_id } => {
				engine.unpin(&node_id);
				supplier.drag_ended(engine);
				self.last_tap = None;
				Some(InteractionEvent::DragEnded { node_id })
			}
			Gesture::Pressed { node_id, .. } => {
				let node = engine.nodes().iter().find(|n| n.id == node_id)?;
				Some(self.tap(node, now_ms))
			}
		}
	}

	/// Abandon the gesture without a tap, releasing any pin.
	pub fn cancel<E: PhysicsEngine + ?Sized>(&mut self, engine: &mut E, supplier: &LayoutSupplier) {
		if let Gesture::Dragging { node_id } = std::mem::take(&mut self.gesture) {
			engine.unpin(&node_id);
			supplier.drag_ended(engine);
		}
	}

	fn tap(&mut self, node: &Node, now_ms: f64) -> InteractionEvent {
		let book_id = node.book_id.as_deref().filter(|_| node.node_type.is_book());
		if let Some(book_id) = book_id {
			let repeat = self.last_tap.as_ref().is_some_and(|(id, at)| {
				*id == node.id && now_ms - at <= self.config.double_tap_ms
			});
			if repeat {
				self.last_tap = None;
				return InteractionEvent::Navigate {
					href: format!("{}{}", self.config.book_route, book_id),
				};
			}
			self.last_tap = Some((node.id.clone(), now_ms));
		} else {
			self.last_tap = None;
		}
		InteractionEvent::Preview {
			node_id: node.id.clone(),
		}
	}
}

/// Screen anchor for a node's tooltip. If the camera cannot map the point,
/// the raw world coordinates are used instead.
pub fn tooltip_position<E: PhysicsEngine + ?Sized>(
	engine: &E,
	transform: &ViewTransform,
	node_id: &str,
) -> Option<(f64, f64)> {
	let p = engine.positions().get(node_id)?;
	Some(transform.world_to_screen(p.x, p.y).unwrap_or_else(|err| {
		log::debug!("book-globe: tooltip falls back to world space: {}", err);
		(p.x, p.y)
	}))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::{BookRecord, build_graph};
	use crate::components::force_graph::engine::{ForceGraphEngine, TickEvent};

	fn setup() -> (ForceGraphEngine, LayoutSupplier, InteractionController) {
		let graph = build_graph(&[BookRecord {
			author: Some("A".into()),
			..BookRecord::new("7", "T")
		}]);
		let mut engine = ForceGraphEngine::with_graph(&graph);
		while engine.tick(0.016) != TickEvent::Stopped {}
		(engine, LayoutSupplier::default(), InteractionController::default())
	}

	#[test]
	fn test_small_travel_is_a_tap() {
		let (mut engine, supplier, mut ctl) = setup();
		ctl.pointer_down("author:A", (100.0, 100.0));
		ctl.pointer_move(&mut engine, &supplier, (102.0, 103.0), (0.0, 0.0));
		assert!(ctl.dragged_node().is_none());
		assert!(!engine.positions().get("author:A").unwrap().is_pinned());
		assert_eq!(
			ctl.pointer_up(&mut engine, &supplier, 0.0),
			Some(InteractionEvent::Preview { node_id: "author:A".into() })
		);
		assert!(!ctl.is_engaged());
	}

	#[test]
	fn test_drag_pins_reheats_and_releases() {
		let (mut engine, supplier, mut ctl) = setup();
		assert!(!engine.is_running());
		ctl.pointer_down("book:7", (100.0, 100.0));
		ctl.pointer_move(&mut engine, &supplier, (110.0, 100.0), (30.0, 40.0));
		assert_eq!(ctl.dragged_node(), Some("book:7"));
		assert!(engine.is_running());
		assert_eq!(engine.alpha_target(), 0.3);
		let p = engine.positions().get("book:7").unwrap();
		assert_eq!((p.fx, p.fy), (Some(30.0), Some(40.0)));

		ctl.pointer_move(&mut engine, &supplier, (120.0, 100.0), (35.0, 40.0));
		assert_eq!(engine.positions().get("book:7").unwrap().fx, Some(35.0));

		assert_eq!(
			ctl.pointer_up(&mut engine, &supplier, 10.0),
			Some(InteractionEvent::DragEnded { node_id: "book:7".into() })
		);
		assert!(!engine.positions().get("book:7").unwrap().is_pinned());
		assert_eq!(engine.alpha_target(), 0.0);
	}

	#[test]
	fn test_double_tap_on_book_navigates() {
		let (mut engine, supplier, mut ctl) = setup();
		ctl.pointer_down("book:7", (0.0, 0.0));
		assert_eq!(
			ctl.pointer_up(&mut engine, &supplier, 1000.0),
			Some(InteractionEvent::Preview { node_id: "book:7".into() })
		);
		ctl.pointer_down("book:7", (0.0, 0.0));
		assert_eq!(
			ctl.pointer_up(&mut engine, &supplier, 1300.0),
			Some(InteractionEvent::Navigate { href: "/books/7".into() })
		);
	}

	#[test]
	fn test_slow_second_tap_previews_again() {
		let (mut engine, supplier, mut ctl) = setup();
		for at in [0.0, 500.0, 1100.0] {
			ctl.pointer_down("book:7", (0.0, 0.0));
			assert!(matches!(
				ctl.pointer_up(&mut engine, &supplier, at),
				Some(InteractionEvent::Preview { .. })
			));
		}
	}

	#[test]
	fn test_attribute_never_navigates() {
		let (mut engine, supplier, mut ctl) = setup();
		for at in [0.0, 100.0] {
			ctl.pointer_down("author:A", (0.0, 0.0));
			assert!(matches!(
				ctl.pointer_up(&mut engine, &supplier, at),
				Some(InteractionEvent::Preview { .. })
			));
		}
	}

	#[test]
	fn test_tap_after_other_node_resets_window() {
		let (mut engine, supplier, mut ctl) = setup();
		ctl.pointer_down("book:7", (0.0, 0.0));
		ctl.pointer_up(&mut engine, &supplier, 0.0);
		ctl.pointer_down("author:A", (0.0, 0.0));
		ctl.pointer_up(&mut engine, &supplier, 100.0);
		ctl.pointer_down("book:7", (0.0, 0.0));
		assert!(matches!(
			ctl.pointer_up(&mut engine, &supplier, 200.0),
			Some(InteractionEvent::Preview { .. })
		));
	}

	#[test]
	fn test_cancel_releases_pin() {
		let (mut engine, supplier, mut ctl) = setup();
		ctl.pointer_down("book:7", (0.0, 0.0));
		ctl.pointer_move(&mut engine, &supplier, (50.0, 0.0), (10.0, 10.0));
		ctl.cancel(&mut engine, &supplier);
		assert!(!ctl.is_engaged());
		assert!(!engine.positions().get("book:7").unwrap().is_pinned());
		assert!(ctl.pointer_up(&mut engine, &supplier, 0.0).is_none());
	}

	#[test]
	fn test_tooltip_falls_back_to_world() {
		let (engine, _, _) = setup();
		let p = *engine.positions().get("book:7").unwrap();
		let ready = ViewTransform { x: 100.0, y: 50.0, k: 2.0 };
		assert_eq!(
			tooltip_position(&engine, &ready, "book:7"),
			Some((p.x * 2.0 + 100.0, p.y * 2.0 + 50.0))
		);
		assert_eq!(
			tooltip_position(&engine, &ViewTransform::default(), "book:7"),
			Some((p.x, p.y))
		);
		assert!(tooltip_position(&engine, &ready, "book:404").is_none());
	}
}
