use std::collections::BTreeSet;

use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_query_map;

use super::use_studies;
use crate::components::filter_bar::FilterBar;
use crate::components::force_graph::{ForceGraphCanvas, GraphView, TRACE_HUB_ID};
use crate::matching::{find_cross_references, is_match, studies_mentioning};
use crate::model::{Entity, GraphData, Relation, StudyItem, StudyStatus};

/// What the detail panel shows for the current selection.
#[derive(Clone, Debug, PartialEq)]
enum Detail {
	Nexus(Vec<String>),
	Entity {
		entity: Entity,
		studies: Vec<String>,
		relations: Vec<Relation>,
	},
}

fn describe(studies: &[StudyItem], included: &BTreeSet<String>, view: &GraphView) -> Option<Detail> {
	let selected = view.selected.as_deref()?;
	if selected == TRACE_HUB_ID {
		return Some(Detail::Nexus(view.cross_refs.clone()));
	}
	let in_scope: Vec<&StudyItem> = studies.iter().filter(|s| included.contains(&s.id)).collect();
	let entity = in_scope
		.iter()
		.flat_map(|s| s.package.entities.iter())
		.find(|e| is_match(&e.name, selected))
		.cloned()
		// Relation endpoints that were never extracted still get a panel.
		.unwrap_or_else(|| Entity {
			name: selected.to_string(),
			..Default::default()
		});
	let relations = in_scope
		.iter()
		.flat_map(|s| s.package.relations.iter())
		.filter(|r| is_match(&r.source, selected) || is_match(&r.target, selected))
		.cloned()
		.collect();
	let studies = studies_mentioning(studies, selected)
		.into_iter()
		.map(|s| s.title.clone())
		.collect();
	Some(Detail::Entity {
		entity,
		studies,
		relations,
	})
}

#[component]
fn DetailPanel(detail: Detail) -> impl IntoView {
	match detail {
		Detail::Nexus(bridges) => view! {
			<aside class="detail-panel">
				<h2>"Cross-study nexus"</h2>
				<p>{format!("{} entities appear in more than one study", bridges.len())}</p>
				<ul>{bridges.into_iter().map(|b| view! { <li>{b}</li> }).collect_view()}</ul>
			</aside>
		}
		.into_any(),
		Detail::Entity {
			entity,
			studies,
			relations,
		} => view! {
			<aside class="detail-panel">
				<h2>{entity.name}</h2>
				<p class="entity-type" style:color=entity.entity_type.color()>
					{entity.entity_type.label()}
					{entity.confidence.map(|c| format!(" · {:.0}% confidence", c * 100.0))}
				</p>
				{entity.description.map(|d| view! { <p class="description">{d}</p> })}
				<h3>"Mentioned in"</h3>
				<ul>{studies.into_iter().map(|t| view! { <li>{t}</li> }).collect_view()}</ul>
				<h3>"Relations"</h3>
				<ul>
					{relations
						.into_iter()
						.map(|r| {
							view! {
								<li>
									{format!(
										"{} —{}→ {} ({:.0}%)",
										r.source,
										r.relation_type,
										r.target,
										r.confidence * 100.0,
									)}
								</li>
							}
						})
						.collect_view()}
				</ul>
			</aside>
		}
		.into_any(),
	}
}

/// Graph workbench over the selected studies.
#[component]
pub fn Analysis() -> impl IntoView {
	let studies = use_studies();
	let query = use_query_map();

	let initial: BTreeSet<String> = match query.with_untracked(|q| q.get("study")) {
		Some(id) => BTreeSet::from([id]),
		None => studies
			.0
			.iter()
			.filter(|s| s.status != StudyStatus::Archived)
			.map(|s| s.id.clone())
			.collect(),
	};
	let included = RwSignal::new(initial);
	let view_state = RwSignal::new(GraphView {
		cross_refs: find_cross_references(&studies.0),
		..Default::default()
	});

	let graph_studies = studies.clone();
	let graph = Signal::derive(move || {
		included.with(|ids| {
			GraphData::merge_studies(graph_studies.0.iter().filter(|s| ids.contains(&s.id)))
		})
	});
	let on_select = Callback::new(move |selected: Option<String>| {
		view_state.update(|v| v.selected = selected);
	});

	let detail_studies = studies.clone();
	let detail = move || {
		included.with(|ids| view_state.with(|v| describe(&detail_studies.0, ids, v)))
	};
	let insight_studies = studies.clone();
	let insights = move || {
		included.with(|ids| {
			insight_studies
				.0
				.iter()
				.filter(|s| ids.contains(&s.id))
				.flat_map(|s| s.package.insights.iter().cloned())
				.collect::<Vec<_>>()
		})
	};

	let toggles = studies
		.0
		.iter()
		.map(|s| {
			let id = s.id.clone();
			let checked_id = id.clone();
			view! {
				<label class="study-toggle">
					<input
						type="checkbox"
						prop:checked=move || included.with(|ids| ids.contains(&checked_id))
						on:change=move |_| {
							included
								.update(|ids| {
									if !ids.remove(&id) {
										ids.insert(id.clone());
									}
								})
						}
					/>
					{s.title.clone()}
				</label>
			}
		})
		.collect_view();

	view! {
		<main class="analysis">
			<nav class="study-list">
				<A href="/">"← Feed"</A>
				{toggles}
			</nav>
			<section class="workbench">
				<FilterBar view=view_state />
				<div class="graph-frame">
					<ForceGraphCanvas data=graph view=view_state on_select=on_select />
				</div>
				<ul class="insights">
					{move || insights().into_iter().map(|i| view! { <li>{i}</li> }).collect_view()}
				</ul>
			</section>
			{move || detail().map(|d| view! { <DetailPanel detail=d /> })}
		</main>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::fallback_studies;

	fn all_ids(studies: &[StudyItem]) -> BTreeSet<String> {
		studies.iter().map(|s| s.id.clone()).collect()
	}

	#[test]
	fn nothing_selected_has_no_detail() {
		let studies = fallback_studies();
		assert_eq!(describe(&studies, &all_ids(&studies), &GraphView::default()), None);
	}

	#[test]
	fn hub_selection_lists_bridges() {
		let studies = fallback_studies();
		let view = GraphView {
			selected: Some(TRACE_HUB_ID.into()),
			cross_refs: vec!["Project Zephyr".into()],
			..Default::default()
		};
		assert_eq!(
			describe(&studies, &all_ids(&studies), &view),
			Some(Detail::Nexus(vec!["Project Zephyr".into()]))
		);
	}

	#[test]
	fn entity_detail_collects_studies_and_relations() {
		let studies = fallback_studies();
		let view = GraphView {
			selected: Some("Project Zephyr".into()),
			..Default::default()
		};
		let Some(Detail::Entity {
			entity,
			studies: titles,
			relations,
		}) = describe(&studies, &all_ids(&studies), &view)
		else {
			panic!("expected entity detail");
		};
		assert_eq!(entity.id, "f1-1");
		assert_eq!(titles.len(), 2);
		assert_eq!(relations.len(), 2);
	}

	#[test]
	fn unextracted_endpoint_gets_placeholder() {
		let studies = fallback_studies();
		let view = GraphView {
			selected: Some("Nobody Known".into()),
			..Default::default()
		};
		let Some(Detail::Entity { entity, relations, .. }) =
			describe(&studies, &all_ids(&studies), &view)
		else {
			panic!("expected entity detail");
		};
		assert_eq!(entity.name, "Nobody Known");
		assert!(relations.is_empty());
	}
}
