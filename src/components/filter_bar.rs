//! Search box, entity type toggles and the trace-mode switch.

use leptos::prelude::*;

use crate::components::force_graph::GraphView;
use crate::model::EntityType;

#[component]
fn TypeToggle(entity_type: EntityType, view: RwSignal<GraphView>) -> impl IntoView {
	let is_active = move || view.with(|v| v.active_types.contains(&entity_type));
	let toggle = move |_| {
		view.update(|v| {
			if !v.active_types.remove(&entity_type) {
				v.active_types.insert(entity_type);
			}
		})
	};

	view! {
		<button
			class=move || if is_active() { "type-toggle active" } else { "type-toggle" }
			style:border-color=entity_type.color()
			style:color=move || if is_active() { entity_type.color() } else { "#71717a" }
			on:click=toggle
		>
			{entity_type.label()}
		</button>
	}
}

/// Controls that edit the interaction state of a graph.
#[component]
pub fn FilterBar(view: RwSignal<GraphView>) -> impl IntoView {
	let on_search = move |ev: web_sys::Event| {
		let term = event_target_value(&ev);
		view.update(|v| v.search = term);
	};
	let toggle_trace = move |_| view.update(|v| v.trace_mode = !v.trace_mode);
	let bridge_count = move || view.with(|v| v.cross_refs.len());

	view! {
		<div class="filter-bar">
			<input
				type="search"
				placeholder="Search entities"
				prop:value=move || view.with(|v| v.search.clone())
				on:input=on_search
			/>
			<div class="type-toggles">
				{EntityType::FILTERABLE
					.into_iter()
					.map(|t| view! { <TypeToggle entity_type=t view=view /> })
					.collect_view()}
			</div>
			<button
				class=move || {
					if view.with(|v| v.trace_mode) { "trace-toggle active" } else { "trace-toggle" }
				}
				on:click=toggle_trace
			>
				{move || format!("Trace network ({})", bridge_count())}
			</button>
		</div>
	}
}
