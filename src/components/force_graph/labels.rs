//! Per-frame label visibility and declutter.
//!
//! Labels are placed in screen space. Anchors are quantized into a square
//! grid; within one frame the first label to land in a cell claims it and
//! later non-exempt labels in that cell are suppressed. Which label wins a
//! contested cell therefore depends on iteration order.

use std::collections::HashSet;

use super::config::LabelConfig;
use crate::catalog::Node;

/// Horizontal text alignment relative to the anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelAlign {
	/// Text extends rightward from the anchor.
	Left,
	/// Text ends at the anchor.
	Right,
}

/// A label the renderer should draw this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelPlacement {
	/// Node the label belongs to.
	pub node_id: String,
	/// Possibly truncated display text.
	pub text: String,
	/// Anchor in screen pixels.
	pub x: f64,
	/// Baseline in world units.
	pub y: f64,
	/// Side of the node the text sits on.
	pub align: LabelAlign,
	/// Font size in screen pixels.
	pub font_size: f64,
	/// Hovered labels draw on a stronger plate.
	pub emphasized: bool,
}

/// One node offered to the policy.
#[derive(Clone, Copy, Debug)]
pub struct LabelCandidate<'a> {
	/// Node to label.
	pub node: &'a Node,
	/// World position, `None` until the engine has placed the node.
	pub world: Option<(f64, f64)>,
	/// Screen position matching `world`.
	pub screen: Option<(f64, f64)>,
	/// Drawn node radius in screen pixels.
	pub radius: f64,
	/// Hovered labels skip the zoom gate and the grid.
	pub hovered: bool,
}

/// Character budget for a zoom level.
pub fn char_budget(config: &LabelConfig, k: f64) -> usize {
	let k = k.max(f64::EPSILON);
	let budget = (config.base_chars / k.powf(config.chars_exponent)).floor();
	(budget.max(0.0) as usize).max(config.min_chars)
}

/// Shorten `label` to at most `budget` characters plus the ellipsis.
pub fn truncate_label(label: &str, budget: usize, ellipsis: &str) -> String {
	match label.char_indices().nth(budget) {
		Some((cut, _)) => format!("{}{}", &label[..cut], ellipsis),
		None => label.to_string(),
	}
}

/// Label font size in screen pixels for a zoom level.
pub fn font_size(config: &LabelConfig, k: f64) -> f64 {
	let k = k.max(f64::EPSILON);
	(config.base_font / k.powf(config.font_exponent)).max(config.min_font)
}

/// Frame-scoped label declutter state.
#[derive(Clone, Debug, Default)]
pub struct LabelDeclutter {
	config: LabelConfig,
	occupied: HashSet<(i64, i64)>,
}

impl LabelDeclutter {
	/// Declutter with a label configuration.
	pub fn new(config: LabelConfig) -> Self {
		Self {
			config,
			occupied: HashSet::new(),
		}
	}

	/// Label configuration in use.
	pub fn config(&self) -> &LabelConfig {
		&self.config
	}

	/// Forget every claimed cell. Call once before placing a frame's labels.
	pub fn begin_frame(&mut self) {
		self.occupied.clear();
	}

	/// Whether the node's label is wanted at zoom `k`, before decluttering.
	pub fn wants_label(&self, candidate: &LabelCandidate<'_>, k: f64) -> bool {
		candidate.hovered || candidate.node.node_type.is_book() || k >= self.config.zoom_threshold
	}

	fn cell(&self, x: f64, y: f64) -> (i64, i64) {
		let size = self.config.cell_size.max(1.0);
		((x / size).floor() as i64, (y / size).floor() as i64)
	}

	/// Decide the label for one node; `None` when hidden or suppressed.
	pub fn place(&mut self, candidate: &LabelCandidate<'_>, k: f64) -> Option<LabelPlacement> {
		let ((wx, wy), (sx, sy)) = (candidate.world?, candidate.screen?);
		if !self.wants_label(candidate, k) {
			return None;
		}

		let text = truncate_label(
			&candidate.node.label,
			char_budget(&self.config, k),
			self.config.ellipsis,
		);

		let angle = wy.atan2(wx);
		let offset = candidate.radius + self.config.gap;
		let (ax, ay) = (sx + angle.cos() * offset, sy + angle.sin() * offset);

		let exempt = candidate.hovered || candidate.node.node_type.is_book();
		if !exempt && !self.occupied.insert(self.cell(ax, ay)) {
			return None;
		}

		Some(LabelPlacement {
			node_id: candidate.node.id.clone(),
			text,
			x: ax,
			y: ay,
			align: if angle.cos() >= 0.0 {
				LabelAlign::Left
			} else {
				LabelAlign::Right
			},
			font_size: font_size(&self.config, k),
			emphasized: candidate.hovered,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::{BookRecord, NodeType, build_graph};

	fn attribute(value: &str) -> Node {
		Node::attribute(NodeType::Genre, value)
	}

	fn book() -> Node {
		build_graph(&[BookRecord::new("1", "A rather long book title here")])
			.nodes
			.remove(0)
	}

	fn at<'a>(node: &'a Node, x: f64, y: f64) -> LabelCandidate<'a> {
		LabelCandidate {
			node,
			world: Some((x, y)),
			screen: Some((400.0 + x, 300.0 + y)),
			radius: 5.0,
			hovered: false,
		}
	}

	#[test]
	fn test_unplaced_node_is_skipped() {
		let node = book();
		let mut labels = LabelDeclutter::default();
		let candidate = LabelCandidate {
			world: None,
			screen: None,
			..at(&node, 0.0, 0.0)
		};
		assert!(labels.place(&candidate, 5.0).is_none());
	}

	#[test]
	fn test_attribute_labels_need_zoom() {
		let node = attribute("SF");
		let mut labels = LabelDeclutter::default();
		assert!(labels.place(&at(&node, 50.0, 0.0), 1.0).is_none());
		labels.begin_frame();
		assert!(labels.place(&at(&node, 50.0, 0.0), 1.2).is_some());

		labels.begin_frame();
		let hovered = LabelCandidate {
			hovered: true,
			..at(&node, 50.0, 0.0)
		};
		let placed = labels.place(&hovered, 0.5).unwrap();
		assert!(placed.emphasized);
	}

	#[test]
	fn test_books_always_labeled() {
		let node = book();
		let mut labels = LabelDeclutter::default();
		assert!(labels.place(&at(&node, 50.0, 0.0), 0.2).is_some());
	}

	#[test]
	fn test_anchor_is_radially_offset() {
		let node = attribute("SF");
		let mut labels = LabelDeclutter::default();
		let right = labels.place(&at(&node, 100.0, 0.0), 2.0).unwrap();
		assert!((right.x - (500.0 + 9.0)).abs() < 1e-9);
		assert!((right.y - 300.0).abs() < 1e-9);
		assert_eq!(right.align, LabelAlign::Left);

		let left = labels.place(&at(&node, -100.0, 0.0), 2.0).unwrap();
		assert!((left.x - (300.0 - 9.0)).abs() < 1e-9);
		assert_eq!(left.align, LabelAlign::Right);
	}

	#[test]
	fn test_shared_cell_suppresses_second_label() {
		let a = attribute("SF");
		let b = attribute("판타지");
		let mut labels = LabelDeclutter::default();
		assert!(labels.place(&at(&a, 100.0, 0.0), 2.0).is_some());
		assert!(labels.place(&at(&b, 101.0, 1.0), 2.0).is_none());

		labels.begin_frame();
		assert!(labels.place(&at(&b, 101.0, 1.0), 2.0).is_some());
	}

	#[test]
	fn test_exempt_labels_ignore_occupancy() {
		let a = attribute("SF");
		let b = book();
		let mut labels = LabelDeclutter::default();
		assert!(labels.place(&at(&a, 100.0, 0.0), 2.0).is_some());
		assert!(labels.place(&at(&b, 100.0, 0.0), 2.0).is_some());
		let hovered = LabelCandidate {
			hovered: true,
			..at(&a, 100.0, 0.0)
		};
		assert!(labels.place(&hovered, 2.0).is_some());
	}

	#[test]
	fn test_truncation_budget_shrinks_with_zoom() {
		let config = LabelConfig::default();
		assert_eq!(char_budget(&config, 1.0), 18);
		assert!(char_budget(&config, 4.0) < 18);
		assert!(char_budget(&config, 0.5) > 18);
		assert_eq!(char_budget(&config, 1e9), config.min_chars);

		assert_eq!(truncate_label("가나다라마", 3, "…"), "가나다…");
		assert_eq!(truncate_label("가나다", 3, "…"), "가나다");
		assert_eq!(truncate_label("", 3, "…"), "");
	}

	#[test]
	fn test_font_shrinks_slowly_with_floor() {
		let config = LabelConfig::default();
		assert_eq!(font_size(&config, 1.0), 12.0);
		let zoomed = font_size(&config, 2.0);
		assert!(zoomed < 12.0 && zoomed > 10.0);
		assert_eq!(font_size(&config, 1000.0), config.min_font);
	}
}
