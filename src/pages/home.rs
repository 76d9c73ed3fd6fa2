use leptos::prelude::*;
use leptos_router::components::A;

use super::use_studies;
use crate::matching::{find_cross_references, matches_any};
use crate::model::{StudyItem, StudyStatus};

/// Feed card figures for one study.
#[derive(Clone, Debug, PartialEq)]
struct StudyCard {
	id: String,
	title: String,
	tags: Vec<String>,
	entities: usize,
	relations: usize,
	insights: usize,
	bridges: usize,
}

/// Group studies by status in display order, dropping empty groups.
fn feed_groups(studies: &[StudyItem]) -> Vec<(StudyStatus, Vec<StudyCard>)> {
	let cross_refs = find_cross_references(studies);
	StudyStatus::ALL
		.into_iter()
		.map(|status| {
			let cards = studies
				.iter()
				.filter(|s| s.status == status)
				.map(|s| StudyCard {
					id: s.id.clone(),
					title: s.title.clone(),
					tags: s.tags.clone(),
					entities: s.package.entities.len(),
					relations: s.package.relations.len(),
					insights: s.package.insights.len(),
					bridges: s
						.package
						.entities
						.iter()
						.filter(|e| matches_any(&e.name, &cross_refs))
						.count(),
				})
				.collect::<Vec<_>>();
			(status, cards)
		})
		.filter(|(_, cards)| !cards.is_empty())
		.collect()
}

#[component]
fn Card(card: StudyCard) -> impl IntoView {
	let href = format!("/analysis?study={}", card.id);
	view! {
		<article class="study-card">
			<h3>
				<A href=href>{card.title}</A>
			</h3>
			<p class="counts">
				{format!(
					"{} entities · {} relations · {} insights",
					card.entities,
					card.relations,
					card.insights,
				)}
			</p>
			{(card.bridges > 0)
				.then(|| {
					view! { <p class="bridges">{format!("{} cross-study links", card.bridges)}</p> }
				})}
			<ul class="tags">
				{card.tags.into_iter().map(|t| view! { <li>{t}</li> }).collect_view()}
			</ul>
		</article>
	}
}

/// Study feed grouped by review status.
#[component]
pub fn Home() -> impl IntoView {
	let studies = use_studies();
	let groups = feed_groups(&studies.0);

	view! {
		<main class="feed">
			<header>
				<h1>"Intelligence feed"</h1>
				<A href="/analysis">"Open analysis workbench"</A>
			</header>
			{groups
				.into_iter()
				.map(|(status, cards)| {
					view! {
						<section class="feed-group">
							<h2>{format!("{} ({})", status.label(), cards.len())}</h2>
							{cards.into_iter().map(|card| view! { <Card card=card /> }).collect_view()}
						</section>
					}
				})
				.collect_view()}
		</main>
	}
}
