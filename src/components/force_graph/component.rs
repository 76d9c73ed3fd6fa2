use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::derive::derive_scene;
use super::render;
use super::state::{CLICK_SLOP, ForceGraphState};
use super::types::{GraphView, LayoutConfig};
use crate::model::GraphData;

type Shared<T> = Rc<RefCell<Option<T>>>;

fn viewport_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn canvas_size(
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		if let Some(size) = web_sys::window().as_ref().and_then(viewport_size) {
			return size;
		}
	}
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| parent.as_ref().map(|p| p.client_width() as f64).unwrap_or(800.0)),
		height.unwrap_or_else(|| parent.as_ref().map(|p| p.client_height() as f64).unwrap_or(600.0)),
	)
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn set_cursor(canvas_ref: NodeRef<leptos::html::Canvas>, cursor: &str) {
	if let Some(canvas) = canvas_ref.get() {
		let canvas: HtmlCanvasElement = canvas.into();
		let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
	}
}

/// Force-directed entity graph drawn on a canvas.
///
/// The scene is re-derived from `data` and `view` whenever either changes; the
/// running simulation is replaced, carrying over positions of surviving nodes.
/// Clicking a node reports it through `on_select` (clicking it again or the
/// background reports `None`).
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(into)] view: Signal<GraphView>,
	#[prop(optional, into)] on_select: Option<Callback<Option<String>>>,
	#[prop(default = LayoutConfig::default())] config: LayoutConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Shared<ForceGraphState> = Rc::new(RefCell::new(None));
	let animate: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let resize_cb: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));

	on_cleanup({
		let alive = alive.clone();
		move || alive.store(false, Ordering::Relaxed)
	});

	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());
	Effect::new(move |_| {
		let (data, view) = (data.get(), view.get());
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			warn!("No window; graph not rendered");
			return;
		};
		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("2d canvas context unavailable; graph not rendered");
			return;
		};

		let (w, h) = canvas_size(&canvas, fullscreen, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let scene = derive_scene(&data, &view);
		debug!(
			"Rebuilding graph: {} nodes, {} edges",
			scene.nodes.len(),
			scene.edges.len()
		);
		{
			let mut slot = state_init.borrow_mut();
			let previous = slot.take();
			*slot = if scene.is_empty() {
				render::clear(&ctx, w, h);
				None
			} else {
				let next = ForceGraphState::new(scene, w, h, config, previous.as_ref());
				debug!("Simulation ready with {} bodies", next.node_count());
				Some(next)
			};
		}

		if resize_cb_init.borrow().is_none() {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let (nw, nh) = canvas_size(&canvas_resize, fullscreen, width, height);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		if animate_init.borrow().is_some() {
			return;
		}
		let (state_anim, animate_inner, resize_inner, alive) = (
			state_init.clone(),
			animate_init.clone(),
			resize_cb_init.clone(),
			alive.clone(),
		);
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let Some(win) = web_sys::window() else {
				return;
			};
			if !alive.load(Ordering::Relaxed) {
				state_anim.borrow_mut().take();
				if let Some(cb) = resize_inner.borrow_mut().take() {
					let _ =
						win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
				// The loop closure owns a handle to its own slot; empty the slot and
				// drop the closure from a later task, once this call has returned.
				if let Some(finished) = animate_inner.borrow_mut().take() {
					let release = Closure::once_into_js(move || drop(finished));
					let _ = win.set_timeout_with_callback(release.unchecked_ref());
				}
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.animation_running {
					s.tick(0.016);
				}
				render::render(s, &ctx);
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.moved = false;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
						s.drag.node_start_y = node.y();
					}
				});
			} else {
				s.pan.active = true;
				s.pan.moved = false;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let mut hovering = false;
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if !s.drag.active {
				let hovered = s.node_at_position(x, y);
				hovering = hovered.is_some();
				s.set_hover(hovered);
			}

			if s.drag.active {
				let (dx, dy) = (x - s.drag.start_x, y - s.drag.start_y);
				if dx.hypot(dy) > CLICK_SLOP {
					s.drag.moved = true;
				}
				if let (Some(idx), true) = (s.drag.node_idx, s.drag.moved) {
					let (nx, ny) = (
						s.drag.node_start_x + (dx / s.transform.k) as f32,
						s.drag.node_start_y + (dy / s.transform.k) as f32,
					);
					s.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.y = ny;
							node.data.is_anchor = true;
						}
					});
				}
			} else if s.pan.active {
				let (dx, dy) = (x - s.pan.start_x, y - s.pan.start_y);
				if dx.hypot(dy) > CLICK_SLOP {
					s.pan.moved = true;
				}
				s.transform.x = s.pan.transform_start_x + dx;
				s.transform.y = s.pan.transform_start_y + dy;
			}
		}
		set_cursor(canvas_ref, if hovering { "pointer" } else { "grab" });
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		// Some(None) is a background click, Some(Some(id)) a node click.
		let mut clicked: Option<Option<String>> = None;
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			if s.drag.active && !s.drag.moved {
				clicked = Some(s.drag.node_idx.and_then(|idx| s.id_of(idx)));
			} else if s.pan.active && !s.pan.moved {
				clicked = Some(None);
			}
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}
		let (Some(clicked), Some(on_select)) = (clicked, on_select) else {
			return;
		};
		let current = view.with_untracked(|v| v.selected.clone());
		let next = match clicked {
			Some(id) if current.as_deref() == Some(id.as_str()) => None,
			other => other,
		};
		if next != current {
			on_select.run(next);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			s.set_hover(None);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
