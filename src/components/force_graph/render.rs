//! Canvas rendering for the globe.
//!
//! Passes, back to front:
//! 1. Background (screen space)
//! 2. Ring guides, links, then nodes (world space, under the camera)
//! 3. Label plates and text, then the empty-state message (screen space)
//!
//! Nodes in the hover neighborhood are drawn after the rest so they sit on
//! top.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::engine::PhysicsEngine;
use super::labels::{LabelAlign, LabelPlacement};
use super::scale::ScaledValues;
use super::state::GlobeState;
use super::theme::Theme;
use crate::catalog::Node;

fn smooth_step(t: f64) -> f64 {
	t * t * (3.0 - 2.0 * t)
}

/// Opacity for an element at highlight level `t` while the strongest
/// highlight in view is `max_t`.
fn emphasis(t: f64, max_t: f64, dim: f64) -> f64 {
	let rest = 1.0 - (1.0 - dim) * max_t;
	rest + (1.0 - rest) * t
}

/// Draw one frame.
pub fn render(state: &GlobeState, ctx: &CanvasRenderingContext2d, theme: &Theme, labels: &[LabelPlacement]) {
	let scale = state.scaled();

	ctx.set_fill_style_str(&theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	if let Some(empty) = state.empty_state() {
		draw_empty(state, ctx, theme, empty.message());
		return;
	}

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(scale.k, scale.k);

	draw_guides(state, ctx, &scale, theme);
	draw_links(state, ctx, &scale, theme);
	draw_nodes(state, ctx, &scale, theme);

	ctx.restore();

	draw_labels(ctx, theme, labels, state.config.label.plate_padding);
}

fn draw_guides(state: &GlobeState, ctx: &CanvasRenderingContext2d, scale: &ScaledValues, theme: &Theme) {
	ctx.set_stroke_style_str(&theme.guide.to_css());
	ctx.set_line_width(scale.guide_width);
	for radius in state.ring_radii() {
		ctx.begin_path();
		let _ = ctx.arc(0.0, 0.0, radius, 0.0, 2.0 * PI);
		ctx.stroke();
	}
}

fn draw_links(state: &GlobeState, ctx: &CanvasRenderingContext2d, scale: &ScaledValues, theme: &Theme) {
	let positions = state.engine.positions();
	let max_t = smooth_step(state.highlight.max_intensity());

	for link in state.engine.links() {
		let (Some(a), Some(b)) = (positions.get(link.source_id()), positions.get(link.target_id())) else {
			continue;
		};
		let style = theme.link_style(link.edge_type);
		let t = smooth_step(state.highlight.edge_intensity(link.source_id(), link.target_id()));
		let alpha = emphasis(t, max_t, theme.dim_alpha);

		ctx.set_stroke_style_str(&style.color.fade(alpha).lighten(0.3 * t).to_css());
		ctx.set_line_width(scale.edge_width * style.width * (1.0 + 0.5 * t));
		let dash = js_sys::Array::new();
		if let Some((on, off)) = style.dash {
			dash.push(&JsValue::from_f64(on / scale.k));
			dash.push(&JsValue::from_f64(off / scale.k));
		}
		let _ = ctx.set_line_dash(&dash);

		ctx.begin_path();
		ctx.move_to(a.x, a.y);
		ctx.line_to(b.x, b.y);
		ctx.stroke();
	}

	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &GlobeState, ctx: &CanvasRenderingContext2d, scale: &ScaledValues, theme: &Theme) {
	let max_t = smooth_step(state.highlight.max_intensity());
	let (lit, rest): (Vec<&Node>, Vec<&Node>) = state
		.engine
		.nodes()
		.iter()
		.partition(|n| state.highlight.intensity(&n.id) > 0.001);

	for node in rest.into_iter().chain(lit) {
		let Some(p) = state.engine.positions().get(&node.id) else {
			continue;
		};
		let t = smooth_step(state.highlight.intensity(&node.id));
		let alpha = emphasis(t, max_t, theme.dim_alpha);
		let radius = scale.radius_of(node.node_type) * (1.0 + 0.25 * t);

		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&theme.node_color(node.node_type).fade(alpha).to_css());
		ctx.fill();

		if p.is_pinned() || state.highlight.hovered() == Some(node.id.as_str()) {
			ctx.begin_path();
			let _ = ctx.arc(p.x, p.y, radius + 2.0 / scale.k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&theme.hover_ring.fade(t).to_css());
			ctx.set_line_width(1.5 / scale.k);
			ctx.stroke();
		}
	}
}

fn draw_labels(ctx: &CanvasRenderingContext2d, theme: &Theme, labels: &[LabelPlacement], padding: f64) {
	ctx.set_text_baseline("middle");
	for label in labels {
		ctx.set_font(&format!("{}px {}", label.font_size, theme.text.font_family));
		let width = ctx
			.measure_text(&label.text)
			.map(|m| m.width())
			.unwrap_or(label.font_size * label.text.chars().count() as f64 * 0.6);

		let left = match label.align {
			LabelAlign::Left => label.x,
			LabelAlign::Right => label.x - width,
		};
		let plate = if label.emphasized {
			theme.text.plate_emphasized
		} else {
			theme.text.plate
		};
		ctx.set_fill_style_str(&plate.to_css());
		ctx.fill_rect(
			left - padding,
			label.y - label.font_size / 2.0 - padding,
			width + 2.0 * padding,
			label.font_size + 2.0 * padding,
		);

		ctx.set_fill_style_str(&theme.text.color.to_css());
		ctx.set_text_align(match label.align {
			LabelAlign::Left => "left",
			LabelAlign::Right => "right",
		});
		let _ = ctx.fill_text(&label.text, label.x, label.y);
	}
}

fn draw_empty(state: &GlobeState, ctx: &CanvasRenderingContext2d, theme: &Theme, message: &str) {
	ctx.set_font(theme.text.empty_font);
	ctx.set_fill_style_str(&theme.text.empty_color.to_css());
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(message, state.width / 2.0, state.height / 2.0);
}
