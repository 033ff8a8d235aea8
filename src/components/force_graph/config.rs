//! Tunable constants for layout, labels and interaction.
//!
//! One immutable [`GlobeConfig`] is built at mount time and handed to each
//! component; tests construct their own with struct update syntax.

use super::scale::ScaleConfig;
use crate::catalog::NodeType;

/// Ring fractions of the usable radius for the unfiltered view.
#[derive(Clone, Debug)]
pub struct RingTable {
	/// Fractions of the ring base radius, per type.
	pub book: f64,
	pub author: f64,
	pub translator: f64,
	pub category: f64,
	pub subject: f64,
	pub genre: f64,
	pub level: f64,
	pub division: f64,
}

impl RingTable {
	/// Ring fraction for a node type.
	pub fn ratio(&self, node_type: NodeType) -> f64 {
		match node_type {
			NodeType::Book => self.book,
			NodeType::Author => self.author,
			NodeType::Translator => self.translator,
			NodeType::Category => self.category,
			NodeType::Subject => self.subject,
			NodeType::Genre => self.genre,
			NodeType::Level => self.level,
			NodeType::Division => self.division,
		}
	}
}

/// Ring fractions once a facet tab is active.
#[derive(Clone, Debug)]
pub struct FilteredRings {
	/// Ring of books under a filter.
	pub book: f64,
	/// The facet currently selected, pulled toward the center.
	pub selected: f64,
	/// Every other type, pushed to the rim.
	pub other: f64,
}

/// Forces handed to the physics engine.
#[derive(Clone, Debug)]
pub struct LayoutConfig {
	/// Smallest usable radius, in world units.
	pub radius_min: f64,
	/// Margin between the outer ring and the viewport edge.
	pub padding: f64,
	/// Ring fractions for the full catalog.
	pub rings: RingTable,
	/// Ring fractions while a facet is selected.
	pub filtered_rings: FilteredRings,
	/// Pull toward the ring, per tick.
	pub radial_strength: f64,
	/// Collision radius of book nodes.
	pub collide_book_radius: f64,
	/// Collision radius of attribute nodes.
	pub collide_attribute_radius: f64,
	/// How much of an overlap is undone per tick.
	pub collide_strength: f64,
	/// Spring rest length.
	pub link_distance: f64,
	/// Spring stiffness, 0 to 1.
	pub link_strength: f64,
	/// Negative values repel.
	pub charge_strength: f64,
	/// Repulsion is ignored beyond this distance.
	pub charge_distance_max: f64,
	/// Alpha target held while a node is dragged.
	pub drag_alpha_target: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			radius_min: 120.0,
			padding: 48.0,
			rings: RingTable {
				division: 0.18,
				book: 0.45,
				author: 0.64,
				translator: 0.72,
				level: 0.78,
				category: 0.84,
				subject: 0.90,
				genre: 0.96,
			},
			filtered_rings: FilteredRings {
				book: 0.55,
				selected: 0.18,
				other: 0.95,
			},
			radial_strength: 0.1,
			collide_book_radius: 14.0,
			collide_attribute_radius: 9.0,
			collide_strength: 0.7,
			link_distance: 46.0,
			link_strength: 0.35,
			charge_strength: -140.0,
			charge_distance_max: 420.0,
			drag_alpha_target: 0.3,
		}
	}
}

/// Label visibility, truncation and declutter grid.
#[derive(Clone, Debug)]
pub struct LabelConfig {
	/// Attribute labels appear at or above this zoom.
	pub zoom_threshold: f64,
	/// Characters shown at zoom 1.
	pub base_chars: f64,
	/// How fast the character budget shrinks with zoom.
	pub chars_exponent: f64,
	/// Floor on the character budget.
	pub min_chars: usize,
	/// Appended to truncated text.
	pub ellipsis: &'static str,
	/// Screen pixels between the node edge and the label anchor.
	pub gap: f64,
	/// Side of a declutter grid cell in screen pixels.
	pub cell_size: f64,
	/// Font size at zoom 1, in screen pixels.
	pub base_font: f64,
	/// How fast the font shrinks with zoom.
	pub font_exponent: f64,
	/// Floor on the font size.
	pub min_font: f64,
	/// Padding of the translucent plate behind the text.
	pub plate_padding: f64,
}

impl Default for LabelConfig {
	fn default() -> Self {
		Self {
			zoom_threshold: 1.2,
			base_chars: 18.0,
			chars_exponent: 0.3,
			min_chars: 4,
			ellipsis: "…",
			gap: 4.0,
			cell_size: 28.0,
			base_font: 12.0,
			font_exponent: 0.15,
			min_font: 9.0,
			plate_padding: 3.0,
		}
	}
}

/// Pointer gesture thresholds.
#[derive(Clone, Debug)]
pub struct InteractionConfig {
	/// A second tap on the same book within this window navigates.
	pub double_tap_ms: f64,
	/// Pointer travel (screen px) that turns a press into a drag.
	pub drag_threshold: f64,
	/// Route prefix for book navigation.
	pub book_route: &'static str,
	/// Wheel zoom bounds.
	pub min_zoom: f64,
	pub max_zoom: f64,
}

impl Default for InteractionConfig {
	fn default() -> Self {
		Self {
			double_tap_ms: 450.0,
			drag_threshold: 4.0,
			book_route: "/books/",
			min_zoom: 0.1,
			max_zoom: 10.0,
		}
	}
}

/// Timers around the frame loop.
#[derive(Clone, Debug)]
pub struct TimingConfig {
	/// Trailing delay coalescing a burst of resize events.
	pub resize_debounce_ms: i32,
	/// Delay after a graph reset before the camera fits the nodes.
	pub auto_fit_ms: i32,
	/// Margin kept around the fitted node bounds, in screen pixels.
	pub fit_padding: f64,
	/// Fixed simulation step per animation frame, in seconds.
	pub frame_dt: f64,
}

impl Default for TimingConfig {
	fn default() -> Self {
		Self {
			resize_debounce_ms: 150,
			auto_fit_ms: 600,
			fit_padding: 40.0,
			frame_dt: 0.016,
		}
	}
}

/// Complete configuration for the globe view.
#[derive(Clone, Debug, Default)]
pub struct GlobeConfig {
	/// Ring placement and force strengths.
	pub layout: LayoutConfig,
	/// Label budget and fonts.
	pub label: LabelConfig,
	/// Drag and zoom thresholds.
	pub interaction: InteractionConfig,
	/// Timers and frame step.
	pub timing: TimingConfig,
	/// Zoom scaling of drawn sizes.
	pub scale: ScaleConfig,
}
