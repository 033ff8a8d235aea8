//! Colors and per-type styles for the globe.

use crate::catalog::NodeType;

/// RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Alpha, 0 to 1.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with alpha.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same color with a new alpha.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Multiply the current alpha.
	pub fn fade(self, factor: f64) -> Self {
		Self {
			a: (self.a * factor).clamp(0.0, 1.0),
			..self
		}
	}

	/// Mix toward white (0.0 = unchanged, 1.0 = white).
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		let up = |c: u8| (c as f64 + (255.0 - c as f64) * f) as u8;
		Self {
			r: up(self.r),
			g: up(self.g),
			b: up(self.b),
			a: self.a,
		}
	}

	/// Hex when opaque, `rgba()` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Stroke of the links of one attribute type.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkStyle {
	/// Stroke color of links.
	pub color: Color,
	/// Multiplier on the zoom-scaled base width.
	pub width: f64,
	/// `(dash, gap)` in screen pixels; solid when `None`.
	pub dash: Option<(f64, f64)>,
}

/// Label plates and empty-state text.
#[derive(Clone, Debug)]
pub struct TextStyle {
	/// Label fill.
	pub color: Color,
	/// Backdrop behind hovered labels.
	pub plate: Color,
	/// Plate behind the hovered label.
	pub plate_emphasized: Color,
	/// Label font, without the size.
	pub font_family: &'static str,
	/// Color of the empty-state message.
	pub empty_color: Color,
	/// Font of the empty-state message.
	pub empty_font: &'static str,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Canvas fill.
	pub background: Color,
	/// Ring guide circles.
	pub guide: Color,
	/// Fill per node type.
	pub book: Color,
	pub author: Color,
	pub translator: Color,
	pub category: Color,
	pub subject: Color,
	pub genre: Color,
	pub level: Color,
	pub division: Color,
	/// Outline of the hovered or dragged node.
	pub hover_ring: Color,
	/// Opacity left to elements outside the hover neighborhood.
	pub dim_alpha: f64,
	/// Label and message styling.
	pub text: TextStyle,
}

impl Theme {
	/// Fill for a node type.
	pub fn node_color(&self, node_type: NodeType) -> Color {
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

	/// Links take the attribute's hue; people are solid, classifications
	/// dashed.
	pub fn link_style(&self, edge_type: NodeType) -> LinkStyle {
		let color = self.node_color(edge_type).with_alpha(0.45);
		let (width, dash) = match edge_type {
			NodeType::Author | NodeType::Translator => (1.2, None),
			NodeType::Category | NodeType::Subject | NodeType::Genre => (1.0, Some((4.0, 3.0))),
			NodeType::Level | NodeType::Division => (0.8, Some((1.5, 3.0))),
			NodeType::Book => (1.0, None),
		};
		LinkStyle { color, width, dash }
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: Color::rgb(22, 27, 34),
			guide: Color::rgba(140, 160, 180, 0.12),
			book: Color::rgb(236, 239, 244),
			author: Color::rgb(94, 129, 172),
			translator: Color::rgb(129, 161, 193),
			category: Color::rgb(163, 190, 140),
			subject: Color::rgb(143, 188, 187),
			genre: Color::rgb(180, 142, 173),
			level: Color::rgb(235, 203, 139),
			division: Color::rgb(208, 135, 112),
			hover_ring: Color::rgba(255, 255, 255, 0.8),
			dim_alpha: 0.3,
			text: TextStyle {
				color: Color::rgba(255, 255, 255, 0.9),
				plate: Color::rgba(22, 27, 34, 0.6),
				plate_emphasized: Color::rgba(22, 27, 34, 0.85),
				font_family: "sans-serif",
				empty_color: Color::rgba(200, 210, 220, 0.8),
				empty_font: "15px sans-serif",
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_css_output() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(Color::rgba(1, 2, 3, 0.5).to_css(), "rgba(1, 2, 3, 0.5)");
		assert_eq!(Color::rgb(0, 0, 0).lighten(1.0), Color::rgb(255, 255, 255));
		assert_eq!(Color::rgba(0, 0, 0, 0.8).fade(0.5).a, 0.4);
	}

	#[test]
	fn test_every_type_has_distinct_color() {
		let theme = Theme::default();
		let colors: Vec<Color> = NodeType::ALL.iter().map(|&t| theme.node_color(t)).collect();
		for (i, a) in colors.iter().enumerate() {
			assert!(colors[i + 1..].iter().all(|b| b != a));
		}
	}

	#[test]
	fn test_link_styles_follow_attribute() {
		let theme = Theme::default();
		assert!(theme.link_style(NodeType::Author).dash.is_none());
		assert!(theme.link_style(NodeType::Genre).dash.is_some());
		assert_eq!(theme.link_style(NodeType::Level).color.a, 0.45);
	}
}
