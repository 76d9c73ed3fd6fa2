//! Cross-document entity resolution by normalized name comparison.
//!
//! Two mentions are considered the same entity when their normalized names are
//! equal or one contains the other. This is a cheap containment heuristic, not a
//! similarity score: short names such as "Ali" will also match "Abu Ali" and
//! "Ali Corp".

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::StudyItem;

/// Lowercase, map punctuation to spaces and collapse whitespace runs.
pub fn normalize(name: &str) -> String {
	let mapped: String = name
		.chars()
		.map(|c| if c.is_alphanumeric() { c } else { ' ' })
		.collect::<String>()
		.to_lowercase();
	mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether two entity names refer to the same real-world entity.
///
/// Empty names (after normalization) never match anything, including each other.
pub fn is_match(a: &str, b: &str) -> bool {
	keys_match(&normalize(a), &normalize(b))
}

fn keys_match(a: &str, b: &str) -> bool {
	if a.is_empty() || b.is_empty() {
		return false;
	}
	a == b || a.contains(b) || b.contains(a)
}

/// Whether `name` matches any of the given names.
pub fn matches_any<S: AsRef<str>>(name: &str, names: &[S]) -> bool {
	names.iter().any(|n| is_match(name, n.as_ref()))
}

/// Entity names that also appear in at least one other study.
///
/// Names are deduplicated by their normalized form, keeping the first spelling
/// seen, and sorted so the list is stable across reloads.
pub fn find_cross_references(studies: &[StudyItem]) -> Vec<String> {
	let mut bridges: BTreeMap<String, String> = BTreeMap::new();
	for (i, study) in studies.iter().enumerate() {
		for entity in &study.package.entities {
			let key = normalize(&entity.name);
			if bridges.contains_key(&key) {
				continue;
			}
			let seen_elsewhere = studies.iter().enumerate().any(|(j, other)| {
				j != i
					&& other
						.package
						.entities
						.iter()
						.any(|e| keys_match(&key, &normalize(&e.name)))
			});
			if seen_elsewhere {
				bridges.insert(key, entity.name.clone());
			}
		}
	}
	let mut names: Vec<String> = bridges.into_values().collect();
	names.sort();
	names
}

/// Studies that mention an entity matching `name`.
pub fn studies_mentioning<'a>(studies: &'a [StudyItem], name: &str) -> Vec<&'a StudyItem> {
	studies
		.iter()
		.filter(|s| s.package.entities.iter().any(|e| is_match(&e.name, name)))
		.collect()
}

#[derive(Clone, Debug)]
struct Canonical {
	name: String,
	key: String,
	study: usize,
}

/// Canonicalization table used when merging several studies into one graph.
///
/// Names are linked one study at a time. Inside a study every distinct
/// normalized name stays its own entity; containment matching only links a
/// name to an entity first registered by another study, and each such entity
/// can be claimed by one name per study.
#[derive(Clone, Debug, Default)]
pub struct EntityLinker {
	canonical: Vec<Canonical>,
}

impl EntityLinker {
	/// Create an empty linker.
	pub fn new() -> Self {
		Self::default()
	}

	/// Resolve every name mentioned by one study, registering unseen ones.
	///
	/// Returns a map from each raw name to its canonical form. Exact normalized
	/// hits are resolved before any containment match is tried, so "Orlov" can't
	/// take "Viktor Orlov" away from a study that also spells the full name.
	pub fn link_study<'n>(
		&mut self,
		study: usize,
		names: impl IntoIterator<Item = &'n str>,
	) -> HashMap<String, String> {
		let names: Vec<&str> = names.into_iter().collect();
		let mut keyed: Vec<(&str, String)> = Vec::new();
		let mut seen = HashSet::new();
		for &name in &names {
			let key = normalize(name);
			if seen.insert(key.clone()) {
				keyed.push((name, key));
			}
		}

		let mut by_key: HashMap<String, String> = HashMap::new();
		let mut claimed = HashSet::new();
		for (_, key) in &keyed {
			if key.is_empty() {
				continue;
			}
			if let Some(i) = self.canonical.iter().position(|c| &c.key == key) {
				claimed.insert(i);
				by_key.insert(key.clone(), self.canonical[i].name.clone());
			}
		}
		for (name, key) in &keyed {
			if key.is_empty() || by_key.contains_key(key) {
				continue;
			}
			let fuzzy = self
				.canonical
				.iter()
				.enumerate()
				.find(|(i, c)| c.study != study && !claimed.contains(i) && keys_match(&c.key, key))
				.map(|(i, _)| i);
			let canonical = match fuzzy {
				Some(i) => {
					claimed.insert(i);
					self.canonical[i].name.clone()
				}
				None => {
					claimed.insert(self.canonical.len());
					self.canonical.push(Canonical {
						name: name.to_string(),
						key: key.clone(),
						study,
					});
					name.to_string()
				}
			};
			by_key.insert(key.clone(), canonical);
		}

		names
			.into_iter()
			.map(|name| {
				let canonical = by_key.get(&normalize(name)).cloned().unwrap_or_else(|| name.to_string());
				(name.to_string(), canonical)
			})
			.collect()
	}

	/// Number of canonical entities.
	pub fn len(&self) -> usize {
		self.canonical.len()
	}

	/// Whether nothing has been registered.
	pub fn is_empty(&self) -> bool {
		self.canonical.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{Entity, EntityType, IntelligencePackage, StudyItem};

	fn study(id: &str, names: &[&str]) -> StudyItem {
		StudyItem {
			id: id.into(),
			title: format!("Study {id}"),
			package: IntelligencePackage {
				entities: names
					.iter()
					.enumerate()
					.map(|(i, n)| Entity::new(format!("{id}-{i}"), *n, EntityType::Person))
					.collect(),
				..Default::default()
			},
			..Default::default()
		}
	}

	#[test]
	fn normalization_ignores_case_and_spacing() {
		assert!(is_match("Project Zephyr", "  project zephyr "));
		assert_eq!(normalize("  Al-Qaeda\t Network "), "al qaeda network");
	}

	#[test]
	fn match_is_symmetric() {
		let names = ["Ali", "Abu Ali", "Ali Corp", "ESMA", "", "  ", "Project Zephyr", "zephyr"];
		for a in names {
			for b in names {
				assert_eq!(is_match(a, b), is_match(b, a), "{a:?} vs {b:?}");
			}
		}
	}

	#[test]
	fn match_is_reflexive_for_non_empty() {
		for a in ["x", "Project Zephyr", "Ωmega Group", "O'Neil"] {
			assert!(is_match(a, a));
		}
		assert!(!is_match("", ""));
		assert!(!is_match("--", "--"));
	}

	#[test]
	fn containment_is_accepted_including_short_names() {
		assert!(is_match("Zephyr", "Project Zephyr"));
		// Known false positive of the containment heuristic.
		assert!(is_match("Ali", "Ali Corp"));
		assert!(!is_match("ESMA", "Project Zephyr"));
	}

	#[test]
	fn cross_references_require_another_study() {
		let studies = vec![
			study("a", &["Project Zephyr", "ESMA", "ESMA"]),
			study("b", &["project zephyr ", "Viktor Orlov"]),
			study("c", &["Harbor 9"]),
		];
		let bridges = find_cross_references(&studies);
		assert_eq!(bridges, vec!["Project Zephyr".to_string()]);
		assert!(find_cross_references(&studies[..1]).is_empty());
	}

	#[test]
	fn studies_mentioning_uses_fuzzy_names() {
		let studies = vec![study("a", &["Project Zephyr"]), study("b", &["ESMA"])];
		let hits = studies_mentioning(&studies, "zephyr");
		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].id, "a");
	}

	#[test]
	fn cross_references_keep_one_spelling_per_entity() {
		let studies = vec![
			study("a", &["viktor orlov", "ESMA"]),
			study("b", &["Viktor Orlov", "Viktor  ORLOV"]),
			study("c", &["esma"]),
		];
		assert_eq!(find_cross_references(&studies), vec!["ESMA".to_string(), "viktor orlov".to_string()]);
	}

	#[test]
	fn linker_keeps_first_seen_name() {
		let mut linker = EntityLinker::new();
		let a = linker.link_study(0, ["Project Zephyr", "ESMA"]);
		assert_eq!(a["Project Zephyr"], "Project Zephyr");
		let b = linker.link_study(1, ["PROJECT  zephyr", "Zephyr", "Viktor"]);
		assert_eq!(b["PROJECT  zephyr"], "Project Zephyr");
		// Already claimed in this study by the exact spelling.
		assert_eq!(b["Zephyr"], "Zephyr");
		assert_eq!(b["Viktor"], "Viktor");
		assert_eq!(linker.len(), 4);
	}

	#[test]
	fn linker_keeps_names_within_one_study_distinct() {
		let mut linker = EntityLinker::new();
		let names = linker.link_study(0, ["Viktor Orlov", "Orlov", "orlov"]);
		assert_eq!(names["Viktor Orlov"], "Viktor Orlov");
		assert_eq!(names["Orlov"], "Orlov");
		assert_eq!(names["orlov"], "Orlov");
		assert_eq!(linker.len(), 2);
	}

	#[test]
	fn linker_fuzzy_links_across_studies_once_per_study() {
		let mut linker = EntityLinker::new();
		linker.link_study(0, ["Viktor Orlov"]);
		let names = linker.link_study(1, ["Orlov", "V. Orlov"]);
		assert_eq!(names["Orlov"], "Viktor Orlov");
		assert_eq!(names["V. Orlov"], "V. Orlov");
		assert!(linker.link_study(2, [""])[""].is_empty());
	}
}
