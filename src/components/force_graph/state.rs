//! Globe view state and camera.
//!
//! [`GlobeState`] owns everything the frame loop mutates: the physics engine
//! seeded with the active (filtered) graph, the pan/zoom transform, hover
//! highlight, the gesture controller and the per-frame label policy. It holds
//! no browser handles, so the whole pipeline from records to label placements
//! runs natively in tests.

use std::collections::HashMap;

use thiserror::Error;

use super::config::GlobeConfig;
use super::engine::{Bounds, ForceGraphEngine, PhysicsEngine, TickEvent};
use super::interaction::{InteractionController, InteractionEvent, tooltip_position};
use super::labels::{LabelCandidate, LabelDeclutter, LabelPlacement};
use super::layout::LayoutSupplier;
use super::scale::ScaledValues;
use crate::catalog::{
	BookRecord, EmptyState, FacetIndex, GraphData, Node, NodeType, Selection, Tab, build_graph,
	extract_facets, filter_graph,
};

/// A camera that cannot map between world and screen space.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TransformError {
	/// Zoom is zero, negative or not finite.
	#[error("zoom factor {0} is not usable")]
	InvalidZoom(f64),
	/// A coordinate came out non-finite.
	#[error("camera offset is not finite")]
	NonFinite,
}

/// Pan and zoom applied to the whole view.
///
/// The default transform has `k = 0` and is not ready until the viewport
/// has been measured.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewTransform {
	/// Screen offset of the world origin.
	pub x: f64,
	pub y: f64,
	/// Zoom factor, clamped to the configured range by every camera move.
	pub k: f64,
}

impl ViewTransform {
	/// Identity zoom with the world origin at the viewport center.
	pub fn centered(width: f64, height: f64) -> Self {
		Self {
			x: width / 2.0,
			y: height / 2.0,
			k: 1.0,
		}
	}

	fn check(&self) -> Result<(), TransformError> {
		if !self.k.is_finite() || self.k <= 0.0 {
			return Err(TransformError::InvalidZoom(self.k));
		}
		if !self.x.is_finite() || !self.y.is_finite() {
			return Err(TransformError::NonFinite);
		}
		Ok(())
	}

	/// World point to canvas pixels.
	pub fn world_to_screen(&self, x: f64, y: f64) -> Result<(f64, f64), TransformError> {
		self.check()?;
		Ok((x * self.k + self.x, y * self.k + self.y))
	}

	/// Canvas pixels to world point.
	pub fn screen_to_world(&self, sx: f64, sy: f64) -> Result<(f64, f64), TransformError> {
		self.check()?;
		Ok(((sx - self.x) / self.k, (sy - self.y) / self.k))
	}

	/// Scale by `factor` keeping the screen point `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64, min_k: f64, max_k: f64) {
		if self.check().is_err() {
			return;
		}
		let k = (self.k * factor).clamp(min_k, max_k);
		let ratio = k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = k;
	}

	/// Camera showing `bounds` inside the viewport with `padding` pixels to
	/// spare. Fitting never magnifies past 1.0.
	pub fn fit(bounds: &Bounds, width: f64, height: f64, padding: f64, min_k: f64) -> Option<Self> {
		let (avail_w, avail_h) = (width - 2.0 * padding, height - 2.0 * padding);
		if avail_w <= 0.0 || avail_h <= 0.0 {
			return None;
		}
		let k = (avail_w / bounds.width().max(1.0))
			.min(avail_h / bounds.height().max(1.0))
			.clamp(min_k, 1.0);
		let (cx, cy) = bounds.center();
		Some(Self {
			x: width / 2.0 - cx * k,
			y: height / 2.0 - cy * k,
			k,
		})
	}
}

/// Background drag in progress.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	/// Whether a background pan is in progress.
	pub active: bool,
	origin: (f64, f64),
	camera_origin: (f64, f64),
}

/// Per-node highlight level with a hold timer.
#[derive(Clone, Copy, Debug, Default)]
struct Fade {
	intensity: f64,
	hold: f64,
}

/// Seconds a highlight is held before it may fade, so skimming past a node
/// does not flash.
const MIN_HOLD_TIME: f64 = 0.12;
const FADE_IN_SPEED: f64 = 6.0;
const FADE_OUT_SPEED: f64 = 4.0;

/// Smoothed hover highlight for the hovered node and its neighbors.
#[derive(Clone, Debug, Default)]
pub struct HighlightState {
	hovered: Option<String>,
	targets: Vec<String>,
	fades: HashMap<String, Fade>,
	max: f64,
}

impl HighlightState {
	/// Node under the pointer, if any.
	pub fn hovered(&self) -> Option<&str> {
		self.hovered.as_deref()
	}

	/// Change the hovered node; its neighbors are read from `graph`.
	pub fn set_hover(&mut self, node: Option<&str>, graph: &GraphData) {
		if self.hovered.as_deref() == node {
			return;
		}
		self.hovered = node.map(str::to_string);
		self.targets.clear();
		let Some(id) = node else {
			return;
		};
		self.targets.push(id.to_string());
		for link in graph.links.iter().filter(|l| l.touches(id)) {
			let other = if link.source_id() == id {
				link.target_id()
			} else {
				link.source_id()
			};
			self.targets.push(other.to_string());
		}
		for target in &self.targets {
			self.fades.entry(target.clone()).or_default().hold = MIN_HOLD_TIME;
		}
	}

	/// Exponential ease toward 1 for targets and toward 0 for the rest.
	pub fn tick(&mut self, dt: f64) {
		let rise = 1.0 - (-FADE_IN_SPEED * dt).exp();
		let decay = (-FADE_OUT_SPEED * dt).exp();
		let targets = &self.targets;
		let mut max: f64 = 0.0;
		self.fades.retain(|id, fade| {
			if targets.contains(id) {
				fade.intensity += (1.0 - fade.intensity) * rise;
			} else if fade.hold > 0.0 {
				fade.hold -= dt;
			} else {
				fade.intensity *= decay;
			}
			max = max.max(fade.intensity);
			targets.contains(id) || fade.intensity > 0.005
		});
		self.max = max;
	}

	/// Current highlight of a node, 0 to 1.
	pub fn intensity(&self, id: &str) -> f64 {
		self.fades.get(id).map_or(0.0, |f| f.intensity)
	}

	/// Geometric mean of the endpoint intensities.
	pub fn edge_intensity(&self, a: &str, b: &str) -> f64 {
		(self.intensity(a) * self.intensity(b)).sqrt()
	}

	/// Strongest highlight in view, used to dim everything else.
	pub fn max_intensity(&self) -> f64 {
		self.max
	}

	/// Drop the hover and every fade.
	pub fn clear(&mut self) {
		*self = Self::default();
	}
}

/// Everything the canvas mutates frame to frame.
pub struct GlobeState {
	/// Configuration the state was built with.
	pub config: GlobeConfig,
	/// Simulation over the active graph.
	pub engine: ForceGraphEngine,
	/// Camera.
	pub transform: ViewTransform,
	/// Background drag in progress.
	pub pan: PanState,
	/// Hover and fade state.
	pub highlight: HighlightState,
	/// Node drag and tap gestures.
	pub interaction: InteractionController,
	/// Viewport size in CSS pixels.
	pub width: f64,
	pub height: f64,
	base: GraphData,
	facets: FacetIndex,
	selection: Selection,
	active: GraphData,
	supplier: LayoutSupplier,
	labels: LabelDeclutter,
	preview: Option<String>,
	fit_pending: bool,
}

impl GlobeState {
	/// Empty state for a viewport; books arrive through `set_books`.
	pub fn new(config: GlobeConfig, width: f64, height: f64) -> Self {
		Self {
			engine: ForceGraphEngine::new(),
			transform: ViewTransform::centered(width, height),
			pan: PanState::default(),
			highlight: HighlightState::default(),
			interaction: InteractionController::new(config.interaction.clone()),
			width,
			height,
			base: GraphData::default(),
			facets: FacetIndex::default(),
			selection: Selection::all(),
			active: GraphData::default(),
			supplier: LayoutSupplier::new(config.layout.clone()),
			labels: LabelDeclutter::new(config.label.clone()),
			preview: None,
			fit_pending: false,
			config,
		}
	}

	/// Replace the catalog. The current selection is kept and re-applied.
	pub fn set_books(&mut self, books: &[BookRecord]) {
		self.base = build_graph(books);
		self.facets = extract_facets(books);
		log::info!(
			"book-globe: built {} nodes, {} links from {} records",
			self.base.nodes.len(),
			self.base.links.len(),
			books.len()
		);
		self.select(self.selection.clone());
	}

	/// Filter the catalog, reseed the engine and reapply the layout.
	pub fn select(&mut self, selection: Selection) {
		log::debug!("book-globe: selection {:?}", selection);
		self.active = filter_graph(&self.base, &selection);
		self.selection = selection;
		self.engine.reset(&self.active);
		self.supplier
			.apply_layout(&mut self.engine, self.width, self.height, &self.selection);
		self.highlight.clear();
		self.preview = None;
		self.fit_pending = !self.active.is_empty();
	}

	/// Current tab and chip.
	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Chip values of the base graph.
	pub fn facets(&self) -> &FacetIndex {
		&self.facets
	}

	/// The unfiltered catalog graph.
	pub fn base(&self) -> &GraphData {
		&self.base
	}

	/// The graph currently simulated and drawn.
	pub fn active(&self) -> &GraphData {
		&self.active
	}

	/// What to draw when there is nothing to simulate.
	pub fn empty_state(&self) -> Option<EmptyState> {
		EmptyState::of(&self.base, &self.active)
	}

	/// Track a new viewport size; the camera keeps its world center and any
	/// pending auto-fit is dropped. Returns whether the layout was reapplied.
	pub fn resize(&mut self, width: f64, height: f64) -> bool {
		if self.transform.k > 0.0 {
			self.transform.x += (width - self.width) / 2.0;
			self.transform.y += (height - self.height) / 2.0;
		} else {
			self.transform = ViewTransform::centered(width, height);
		}
		self.width = width;
		self.height = height;
		self.fit_pending = false;
		self.supplier
			.apply_layout(&mut self.engine, width, height, &self.selection)
	}

	/// Advance physics and highlight by one frame.
	pub fn tick(&mut self, dt: f64) -> TickEvent {
		let event = self.engine.tick(dt);
		self.highlight.tick(dt);
		if event == TickEvent::Stopped && self.fit_pending {
			self.fit_to_nodes();
		}
		event
	}

	/// Whether the camera still waits to be fitted to a fresh graph.
	pub fn fit_pending(&self) -> bool {
		self.fit_pending
	}

	/// Point the camera at the current node bounds. Returns whether it moved.
	pub fn fit_to_nodes(&mut self) -> bool {
		self.fit_pending = false;
		let Some(bounds) = self.engine.positions().bounds() else {
			return false;
		};
		let fitted = ViewTransform::fit(
			&bounds,
			self.width,
			self.height,
			self.config.timing.fit_padding,
			self.config.interaction.min_zoom,
		);
		match fitted {
			Some(transform) => {
				self.transform = transform;
				true
			}
			None => false,
		}
	}

	/// Sizes for the current zoom.
	pub fn scaled(&self) -> ScaledValues {
		ScaledValues::new(&self.config.scale, self.transform.k)
	}

	/// Topmost node under a screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<&Node> {
		let (gx, gy) = self.transform.screen_to_world(sx, sy).ok()?;
		let scale = self.scaled();
		let positions = self.engine.positions();
		self.engine.nodes().iter().rev().find(|node| {
			positions.get(&node.id).is_some_and(|p| {
				let reach = scale.hit_radius * scale.size_of(node.node_type);
				(p.x - gx).powi(2) + (p.y - gy).powi(2) < reach * reach
			})
		})
	}

	/// Press on a node starts a gesture, anywhere else starts a pan.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		if let Some(id) = self.node_at_position(sx, sy).map(|n| n.id.clone()) {
			self.interaction.pointer_down(&id, (sx, sy));
		} else {
			self.preview = None;
			self.fit_pending = false;
			self.pan = PanState {
				active: true,
				origin: (sx, sy),
				camera_origin: (self.transform.x, self.transform.y),
			};
		}
	}

	/// Drag, pan or hover, depending on the gesture in progress.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if self.interaction.is_engaged() {
			let Ok(world) = self.transform.screen_to_world(sx, sy) else {
				return;
			};
			self.interaction
				.pointer_move(&mut self.engine, &self.supplier, (sx, sy), world);
			if let Some(id) = self.interaction.dragged_node() {
				self.highlight.set_hover(Some(id), &self.active);
			}
		} else if self.pan.active {
			self.transform.x = self.pan.camera_origin.0 + (sx - self.pan.origin.0);
			self.transform.y = self.pan.camera_origin.1 + (sy - self.pan.origin.1);
		} else {
			let hovered = self.node_at_position(sx, sy).map(|n| n.id.clone());
			self.highlight.set_hover(hovered.as_deref(), &self.active);
		}
	}

	/// Finish the gesture; a preview is remembered for [`Self::preview`].
	pub fn pointer_up(&mut self, now_ms: f64) -> Option<InteractionEvent> {
		self.pan.active = false;
		let event = self
			.interaction
			.pointer_up(&mut self.engine, &self.supplier, now_ms);
		if let Some(InteractionEvent::Preview { node_id }) = &event {
			self.preview = Some(node_id.clone());
		}
		event
	}

	/// Pointer left the canvas: drop hover and any pan.
	pub fn pointer_leave(&mut self) {
		self.pan.active = false;
		self.interaction.cancel(&mut self.engine, &self.supplier);
		self.highlight.set_hover(None, &self.active);
	}

	/// Wheel zoom around the cursor.
	pub fn zoom(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let (min, max) = (self.config.interaction.min_zoom, self.config.interaction.max_zoom);
		self.transform.zoom_at(sx, sy, factor, min, max);
		self.fit_pending = false;
	}

	/// Close the preview card.
	pub fn clear_preview(&mut self) {
		self.preview = None;
	}

	/// The previewed node and where its card goes.
	pub fn preview(&self) -> Option<(&Node, (f64, f64))> {
		let id = self.preview.as_deref()?;
		let node = self.engine.nodes().iter().find(|n| n.id == id)?;
		let at = tooltip_position(&self.engine, &self.transform, id)?;
		Some((node, at))
	}

	/// Ring radii to draw as guides for the current selection.
	pub fn ring_radii(&self) -> Vec<f64> {
		let Some(radius) = self.supplier.usable_radius(self.width, self.height) else {
			return Vec::new();
		};
		let types: Vec<NodeType> = match self.selection.tab {
			Tab::All => NodeType::ALL.to_vec(),
			Tab::Facet(selected) => vec![NodeType::Book, selected, other_than(selected)],
		};
		let mut radii: Vec<f64> = types
			.into_iter()
			.map(|t| self.supplier.ring_radius(radius, t, &self.selection))
			.collect();
		radii.sort_by(f64::total_cmp);
		radii.dedup_by(|a, b| (*a - *b).abs() < 0.5);
		radii
	}

	/// Decide this frame's labels.
	pub fn place_labels(&mut self) -> Vec<LabelPlacement> {
		let scale = ScaledValues::new(&self.config.scale, self.transform.k);
		let k = self.transform.k;
		let hovered = self.highlight.hovered().map(str::to_string);
		let positions = self.engine.positions();
		let transform = &self.transform;
		let labels = &mut self.labels;
		labels.begin_frame();

		self.engine
			.nodes()
			.iter()
			.filter_map(|node| {
				let world = positions.get(&node.id).map(|p| (p.x, p.y));
				let candidate = LabelCandidate {
					node,
					world,
					screen: world.and_then(|(x, y)| transform.world_to_screen(x, y).ok()),
					radius: scale.radius_of(node.node_type) * k,
					hovered: hovered.as_deref() == Some(node.id.as_str()),
				};
				labels.place(&candidate, k)
			})
			.collect()
	}
}

/// Any attribute type other than `selected`, for the shared outer band.
fn other_than(selected: NodeType) -> NodeType {
	NodeType::ATTRIBUTES
		.into_iter()
		.find(|&t| t != selected)
		.unwrap_or(NodeType::Author)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn books() -> Vec<BookRecord> {
		let book = |id: &str, author: &str| BookRecord {
			author: Some(author.into()),
			genre: Some("SF".into()),
			..BookRecord::new(id, "T")
		};
		vec![book("1", "A"), book("2", "A"), book("3", "B")]
	}

	fn settled() -> GlobeState {
		let mut state = GlobeState::new(GlobeConfig::default(), 800.0, 600.0);
		state.set_books(&books());
		while state.tick(0.016) != TickEvent::Stopped {}
		state
	}

	fn screen_of(state: &GlobeState, id: &str) -> (f64, f64) {
		let p = state.engine.positions().get(id).unwrap();
		state.transform.world_to_screen(p.x, p.y).unwrap()
	}

	#[test]
	fn test_transform_round_trip_and_errors() {
		let t = ViewTransform { x: 10.0, y: 20.0, k: 2.0 };
		assert_eq!(t.world_to_screen(5.0, 5.0), Ok((20.0, 30.0)));
		assert_eq!(t.screen_to_world(20.0, 30.0), Ok((5.0, 5.0)));
		assert_eq!(
			ViewTransform::default().world_to_screen(1.0, 1.0),
			Err(TransformError::InvalidZoom(0.0))
		);
		let broken = ViewTransform { x: f64::NAN, y: 0.0, k: 1.0 };
		assert_eq!(broken.screen_to_world(0.0, 0.0), Err(TransformError::NonFinite));
	}

	#[test]
	fn test_zoom_keeps_cursor_fixed() {
		let mut t = ViewTransform::centered(800.0, 600.0);
		let before = t.screen_to_world(100.0, 100.0).unwrap();
		t.zoom_at(100.0, 100.0, 1.1, 0.1, 10.0);
		let after = t.screen_to_world(100.0, 100.0).unwrap();
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);

		for _ in 0..100 {
			t.zoom_at(0.0, 0.0, 1.1, 0.1, 10.0);
		}
		assert_eq!(t.k, 10.0);
	}

	#[test]
	fn test_fit_centers_bounds() {
		let bounds = Bounds { min_x: -100.0, min_y: -50.0, max_x: 300.0, max_y: 150.0 };
		let t = ViewTransform::fit(&bounds, 800.0, 600.0, 40.0, 0.1).unwrap();
		let (cx, cy) = t.world_to_screen(100.0, 50.0).unwrap();
		assert!((cx - 400.0).abs() < 1e-9 && (cy - 300.0).abs() < 1e-9);
		assert!(t.k <= 1.0);
		assert!(ViewTransform::fit(&bounds, 60.0, 60.0, 40.0, 0.1).is_none());
	}

	#[test]
	fn test_set_books_builds_and_lays_out() {
		let state = settled();
		assert_eq!(state.base().nodes.len(), 6);
		assert_eq!(state.active().nodes.len(), 6);
		assert_eq!(state.engine.positions().len(), 6);
		assert_eq!(state.facets().book_count(NodeType::Author, "A"), 2);
		assert_eq!(state.facets().book_count(NodeType::Genre, "SF"), 3);
		assert_eq!(state.facets().values(NodeType::Author), ["A", "B"]);
		assert!(state.empty_state().is_none());
	}

	#[test]
	fn test_select_reseeds_engine() {
		let mut state = settled();
		state.select(Selection::chip(NodeType::Author, "A"));
		let mut ids: Vec<&str> = state.engine.nodes().iter().map(|n| n.id.as_str()).collect();
		ids.sort();
		assert_eq!(ids, ["author:A", "book:1", "book:2"]);
		assert!(state.engine.is_running());

		state.select(Selection::chip(NodeType::Author, "Z"));
		assert_eq!(state.empty_state(), Some(EmptyState::NoResults));
	}

	#[test]
	fn test_empty_catalog_reports_no_data() {
		let mut state = GlobeState::new(GlobeConfig::default(), 800.0, 600.0);
		state.set_books(&[]);
		assert_eq!(state.empty_state(), Some(EmptyState::NoData));
		assert_eq!(state.tick(0.016), TickEvent::Idle);
		assert!(state.place_labels().is_empty());
	}

	#[test]
	fn test_unmeasured_viewport_then_resize() {
		let mut state = GlobeState::new(GlobeConfig::default(), 0.0, 0.0);
		state.set_books(&books());
		assert!(state.ring_radii().is_empty());
		assert!(state.resize(800.0, 600.0));
		assert_eq!(state.ring_radii().len(), 8);
	}

	#[test]
	fn test_filtered_rings_collapse() {
		let mut state = settled();
		state.select(Selection::facet(NodeType::Genre));
		assert_eq!(state.ring_radii().len(), 3);
	}

	#[test]
	fn test_hit_test_finds_node() {
		let state = settled();
		let (sx, sy) = screen_of(&state, "book:3");
		assert_eq!(state.node_at_position(sx, sy).map(|n| n.id.as_str()), Some("book:3"));
		assert!(state.node_at_position(-500.0, -500.0).is_none());
	}

	#[test]
	fn test_background_drag_pans() {
		let mut state = settled();
		state.pointer_down(-500.0, -500.0);
		assert!(state.pan.active);
		let before = state.transform.clone();
		state.pointer_move(-480.0, -490.0);
		assert_eq!(state.transform.x, before.x + 20.0);
		assert_eq!(state.transform.y, before.y + 10.0);
		assert!(state.pointer_up(0.0).is_none());
		assert!(!state.pan.active);
	}

	#[test]
	fn test_tap_previews_node() {
		let mut state = settled();
		let (sx, sy) = screen_of(&state, "author:A");
		state.pointer_down(sx, sy);
		let event = state.pointer_up(100.0);
		assert_eq!(
			event,
			Some(InteractionEvent::Preview { node_id: "author:A".into() })
		);
		let (node, _) = state.preview().unwrap();
		assert_eq!(node.label, "A");

		state.select(Selection::all());
		assert!(state.preview().is_none());
	}

	#[test]
	fn test_hover_highlights_neighbors() {
		let mut state = settled();
		let (sx, sy) = screen_of(&state, "author:B");
		state.pointer_move(sx, sy);
		assert_eq!(state.highlight.hovered(), Some("author:B"));
		for _ in 0..30 {
			state.tick(0.016);
		}
		assert!(state.highlight.intensity("book:3") > 0.9);
		assert_eq!(state.highlight.intensity("book:1"), 0.0);

		state.pointer_leave();
		for _ in 0..200 {
			state.highlight.tick(0.016);
		}
		assert_eq!(state.highlight.max_intensity(), 0.0);
	}

	#[test]
	fn test_hovered_label_is_emphasized() {
		let mut state = settled();
		let (sx, sy) = screen_of(&state, "genre:SF");
		state.pointer_move(sx, sy);
		let labels = state.place_labels();
		let sf = labels.iter().find(|l| l.node_id == "genre:SF").unwrap();
		assert!(sf.emphasized);
		assert!(labels.iter().filter(|l| l.node_id.starts_with("book:")).count() == 3);
	}

	#[test]
	fn test_auto_fit_cancelled_by_resize() {
		let mut state = GlobeState::new(GlobeConfig::default(), 800.0, 600.0);
		state.set_books(&books());
		state.resize(1024.0, 768.0);
		let camera = state.transform.clone();
		while state.tick(0.016) != TickEvent::Stopped {}
		assert_eq!(state.transform, camera);
		assert!(state.fit_to_nodes());
		assert!(state.transform.k <= 1.0);
	}
}
