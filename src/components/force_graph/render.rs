use std::collections::HashMap;
use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::derive::SceneNode;
use super::state::ForceGraphState;

const BACKGROUND: &str = "#0f172a";

fn rgba((r, g, b): (u8, u8, u8), a: f64) -> String {
	format!("rgba({r}, {g}, {b}, {a})")
}

/// Fill the canvas with the background only.
pub fn clear(ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	clear(ctx, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (dash, gap, arrow_size) = (8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let positions = state.positions();
	let mut radii = HashMap::with_capacity(positions.len());
	state.graph.visit_nodes(|node| {
		let data = &node.data.user_data;
		radii.insert(node.index(), data.ring_radius.unwrap_or(data.radius));
	});

	for edge in &state.edges {
		let (Some(&(x1, y1)), Some(&(x2, y2))) =
			(positions.get(&edge.source), positions.get(&edge.target))
		else {
			continue;
		};
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let attrs = &edge.attrs;
		let r1 = radii.get(&edge.source).copied().unwrap_or(0.0);
		let r2 = radii.get(&edge.target).copied().unwrap_or(0.0);
		let (ux, uy) = (dx / dist, dy / dist);

		ctx.set_stroke_style_str(&rgba(attrs.color, attrs.opacity));
		ctx.set_line_width(attrs.width / k.max(0.5));
		if attrs.dashed {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		} else {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		let head = if attrs.is_hub_edge { 0.0 } else { arrow_size };
		ctx.begin_path();
		ctx.move_to(x1 + ux * r1, y1 + uy * r1);
		ctx.line_to(x2 - ux * (r2 + head), y2 - uy * (r2 + head));
		ctx.stroke();

		if attrs.is_hub_edge {
			continue;
		}
		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&rgba(attrs.color, (attrs.opacity + 0.2).min(1.0)));
		let (tip_x, tip_y) = (x2 - ux * r2, y2 - uy * r2);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_glow(ctx: &CanvasRenderingContext2d, x: f64, y: f64, node: &SceneNode, color: &str) {
	let glow_radius = node.ring_radius.unwrap_or(node.radius) * 1.8;
	let Ok(gradient) = ctx.create_radial_gradient(x, y, node.radius * 0.5, x, y, glow_radius)
	else {
		return;
	};
	let _ = gradient.add_color_stop(0.0, color);
	let _ = gradient.add_color_stop(1.0, "rgba(0, 0, 0, 0)");
	ctx.set_global_alpha(0.35 * node.opacity);
	ctx.begin_path();
	let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let ring_dash = js_sys::Array::of2(&JsValue::from_f64(6.0 / k), &JsValue::from_f64(4.0 / k));

	state.graph.visit_nodes(|node| {
		let (x, y) = (node.x() as f64, node.y() as f64);
		let data = &node.data.user_data;

		if let Some(color) = data.glow {
			draw_glow(ctx, x, y, data, color);
		}

		ctx.set_global_alpha(data.opacity);
		if let Some(ring) = data.ring_radius {
			let _ = ctx.set_line_dash(&ring_dash);
			ctx.set_line_dash_offset(-state.flow_time * 10.0);
			ctx.begin_path();
			let _ = ctx.arc(x, y, ring, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(data.color);
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		ctx.begin_path();
		let _ = ctx.arc(x, y, data.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(data.color);
		ctx.fill();

		if let Some(stroke) = &data.stroke {
			ctx.set_stroke_style_str(stroke.color);
			ctx.set_line_width(stroke.width / k.max(0.5));
			ctx.stroke();
		}

		if state.is_hovered(node.index()) {
			ctx.begin_path();
			let _ = ctx.arc(x, y, data.radius + 3.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.7)");
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		ctx.set_fill_style_str("rgba(255, 255, 255, 0.85)");
		ctx.set_font(&format!("{}px sans-serif", 11.0 / k.max(0.5)));
		let _ = ctx.fill_text(&data.label, x + data.radius + 4.0, y + 4.0);
		ctx.set_global_alpha(1.0);
	});
}
