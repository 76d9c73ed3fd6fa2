//! Study loading with an in-memory fallback.

use std::collections::HashSet;

use log::{error, info};
use thiserror::Error;

use crate::model::{Entity, EntityType, IntelligencePackage, Relation, StudyItem, StudyStatus};

/// Studies bundled with the app.
pub const BUNDLED_STUDIES: &str = include_str!("../data/studies.json");

/// Why a study document could not be used.
#[derive(Debug, Error)]
pub enum DataError {
	#[error("malformed study document: {0}")]
	Parse(#[from] serde_json::Error),
	#[error("duplicate study id `{0}`")]
	DuplicateStudy(String),
}

/// Parse a JSON array of studies.
pub fn parse_studies(raw: &str) -> Result<Vec<StudyItem>, DataError> {
	let studies: Vec<StudyItem> = serde_json::from_str(raw)?;
	let mut ids = HashSet::new();
	for study in &studies {
		if !ids.insert(study.id.as_str()) {
			return Err(DataError::DuplicateStudy(study.id.clone()));
		}
	}
	Ok(studies)
}

/// Parse `raw`, falling back to [`fallback_studies`] on failure.
pub fn load_or_fallback(raw: &str) -> Vec<StudyItem> {
	match parse_studies(raw) {
		Ok(studies) => {
			info!("Loaded {} studies", studies.len());
			studies
		}
		Err(e) => {
			error!("Failed to load studies, using defaults: {e}");
			fallback_studies()
		}
	}
}

/// Minimal built-in data set so the UI never renders blank.
pub fn fallback_studies() -> Vec<StudyItem> {
	let relation = |source: &str, target: &str, confidence: f64| Relation {
		source: source.into(),
		target: target.into(),
		relation_type: "ASSOCIATED_WITH".into(),
		confidence,
	};
	vec![
		StudyItem {
			id: "fallback-1".into(),
			title: "Harbor logistics".into(),
			status: StudyStatus::Active,
			tags: vec!["maritime".into()],
			created_at: None,
			package: IntelligencePackage {
				entities: vec![
					Entity::new("f1-1", "Project Zephyr", EntityType::Asset),
					Entity::new("f1-2", "Port of Varna", EntityType::Location),
				],
				relations: vec![relation("Project Zephyr", "Port of Varna", 0.7)],
				insights: vec!["Shipments routed through Varna.".into()],
				graph: None,
			},
		},
		StudyItem {
			id: "fallback-2".into(),
			title: "Shell company review".into(),
			status: StudyStatus::Review,
			tags: vec!["finance".into()],
			created_at: None,
			package: IntelligencePackage {
				entities: vec![
					Entity::new("f2-1", "project zephyr", EntityType::Asset),
					Entity::new("f2-2", "Blue Meridian Ltd", EntityType::Organization),
				],
				relations: vec![relation("Blue Meridian Ltd", "project zephyr", 0.6)],
				insights: vec!["Blue Meridian finances Zephyr.".into()],
				graph: None,
			},
		},
	]
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::matching::find_cross_references;

	#[test]
	fn bundled_studies_parse() {
		let studies = parse_studies(BUNDLED_STUDIES).unwrap();
		assert!(studies.len() >= 3);
		assert!(!find_cross_references(&studies).is_empty());
	}

	#[test]
	fn malformed_input_falls_back() {
		assert!(matches!(parse_studies("{not json"), Err(DataError::Parse(_))));
		assert_eq!(load_or_fallback("{not json"), fallback_studies());
	}

	#[test]
	fn duplicate_ids_are_rejected() {
		let raw = r#"[{"id": "s1", "title": "One"}, {"id": "s1", "title": "Two"}]"#;
		assert!(matches!(parse_studies(raw), Err(DataError::DuplicateStudy(id)) if id == "s1"));
	}

	#[test]
	fn fallback_studies_bridge_each_other() {
		let bridges = find_cross_references(&fallback_studies());
		assert_eq!(bridges, vec!["Project Zephyr".to_string()]);
	}
}
