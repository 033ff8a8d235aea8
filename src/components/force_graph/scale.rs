//! Zoom-dependent sizes for canvas drawing.
//!
//! Nodes and edges are drawn after the camera transform, so every size here
//! is returned in world units. A size that should look constant on screen is
//! divided by the zoom factor `k`; a clamped size follows the world but never
//! shrinks below a screen-pixel floor, which keeps far-out nodes clickable.

use crate::catalog::NodeType;

/// How a size reacts to zoom.
#[derive(Clone, Debug, PartialEq)]
pub enum ScaleBehavior {
	/// Fixed in world units; grows on screen when zooming in.
	World,
	/// Fixed in screen pixels.
	Screen,
	/// World units, bounded in screen pixels.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// World-space value for `base` at zoom `k`.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Node disc and hit area.
#[derive(Clone, Debug)]
pub struct NodeScaleConfig {
	/// Disc radius before scaling.
	pub radius: f64,
	/// How the disc radius follows zoom.
	pub radius_behavior: ScaleBehavior,
	/// Pointer hit radius before scaling.
	pub hit_radius: f64,
	/// How the hit radius follows zoom.
	pub hit_behavior: ScaleBehavior,
	/// Size multipliers per node class.
	pub book_size: f64,
	/// Size multiplier for attribute nodes.
	pub attribute_size: f64,
}

/// Zoom scaling for every drawn element.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	/// Node disc and hit area.
	pub node: NodeScaleConfig,
	/// Base link width in screen pixels, before the per-type theme width.
	pub edge_width: f64,
	/// How link width follows zoom.
	pub edge_behavior: ScaleBehavior,
	/// Ring guide stroke in screen pixels.
	pub guide_width: f64,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node: NodeScaleConfig {
				radius: 5.0,
				radius_behavior: ScaleBehavior::Clamped {
					min_screen: 3.0,
					max_screen: f64::INFINITY,
				},
				hit_radius: 10.0,
				hit_behavior: ScaleBehavior::Clamped {
					min_screen: 6.0,
					max_screen: f64::INFINITY,
				},
				book_size: 1.4,
				attribute_size: 1.0,
			},
			edge_width: 1.0,
			edge_behavior: ScaleBehavior::Screen,
			guide_width: 1.0,
		}
	}
}

/// Sizes resolved for one zoom level; build once per frame.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	/// Zoom these values were resolved for.
	pub k: f64,
	/// Disc radius in world units.
	pub node_radius: f64,
	/// Hit radius in world units.
	pub hit_radius: f64,
	/// Link width in world units.
	pub edge_width: f64,
	/// Ring guide stroke in world units.
	pub guide_width: f64,
	book_size: f64,
	attribute_size: f64,
}

impl ScaledValues {
	/// Resolve every size for zoom `k`; unusable zooms count as 1.
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let k = if k.is_finite() && k > 0.0 { k } else { 1.0 };
		Self {
			k,
			node_radius: config.node.radius_behavior.apply(config.node.radius, k),
			hit_radius: config.node.hit_behavior.apply(config.node.hit_radius, k),
			edge_width: config.edge_behavior.apply(config.edge_width, k),
			guide_width: ScaleBehavior::Screen.apply(config.guide_width, k),
			book_size: config.node.book_size,
			attribute_size: config.node.attribute_size,
		}
	}

	/// Size multiplier for a node class.
	pub fn size_of(&self, node_type: NodeType) -> f64 {
		if node_type.is_book() {
			self.book_size
		} else {
			self.attribute_size
		}
	}

	/// Drawn radius of a node in world units.
	pub fn radius_of(&self, node_type: NodeType) -> f64 {
		self.node_radius * self.size_of(node_type)
	}
}
