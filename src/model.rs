//! Intelligence package wire shapes and the derived graph view.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::matching::EntityLinker;

/// Scale applied to relation confidence to get an edge weight.
pub const EDGE_WEIGHT_SCALE: f64 = 5.0;

/// Kind of an extracted entity. Unknown kinds decode as [`EntityType::Misc`].
#[derive(
	Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
	Person,
	Organization,
	Location,
	Asset,
	Event,
	Date,
	/// Synthetic node added by trace mode, never extracted from documents.
	Hub,
	#[default]
	#[serde(other)]
	Misc,
}

impl EntityType {
	/// Types an analyst can toggle in the filter bar.
	pub const FILTERABLE: [EntityType; 6] = [
		EntityType::Person,
		EntityType::Organization,
		EntityType::Location,
		EntityType::Asset,
		EntityType::Event,
		EntityType::Date,
	];

	/// Kinds that survive any type filter.
	pub fn always_visible(self) -> bool {
		matches!(self, EntityType::Misc | EntityType::Hub)
	}

	/// Numeric group used in [`GraphNode::group`].
	pub fn group(self) -> u32 {
		self as u32
	}

	/// Human-readable label.
	pub fn label(self) -> &'static str {
		match self {
			EntityType::Person => "Person",
			EntityType::Organization => "Organization",
			EntityType::Location => "Location",
			EntityType::Asset => "Asset",
			EntityType::Event => "Event",
			EntityType::Date => "Date",
			EntityType::Misc => "Misc",
			EntityType::Hub => "Hub",
		}
	}

	/// Fill color on the canvas.
	pub fn color(self) -> &'static str {
		match self {
			EntityType::Person => "#3b82f6",
			EntityType::Organization => "#a855f7",
			EntityType::Location => "#10b981",
			EntityType::Asset => "#f59e0b",
			EntityType::Event => "#f43f5e",
			EntityType::Date => "#06b6d4",
			EntityType::Misc => "#71717a",
			EntityType::Hub => "#facc15",
		}
	}
}

/// An entity mention extracted from one intelligence package.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
	#[serde(default)]
	pub id: String,
	pub name: String,
	#[serde(rename = "type", default)]
	pub entity_type: EntityType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub confidence: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

impl Entity {
	/// Entity with no confidence or description.
	pub fn new(id: impl Into<String>, name: impl Into<String>, entity_type: EntityType) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			entity_type,
			confidence: None,
			description: None,
		}
	}
}

fn default_confidence() -> f64 {
	1.0
}

/// A directed relation between two entity names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relation {
	pub source: String,
	pub target: String,
	#[serde(rename = "type", default)]
	pub relation_type: String,
	#[serde(default = "default_confidence")]
	pub confidence: f64,
}

impl Relation {
	/// Edge weight for this relation.
	pub fn weight(&self) -> f64 {
		self.confidence.clamp(0.0, 1.0) * EDGE_WEIGHT_SCALE
	}
}

/// A node of the derived graph. `id` is the entity name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	pub id: String,
	pub group: u32,
	#[serde(rename = "type")]
	pub node_type: EntityType,
}

impl GraphNode {
	/// Node for an entity name of the given kind.
	pub fn new(id: impl Into<String>, node_type: EntityType) -> Self {
		Self {
			id: id.into(),
			group: node_type.group(),
			node_type,
		}
	}
}

/// An edge of the derived graph between two node ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
	pub source: String,
	pub target: String,
	pub value: f64,
}

/// Denormalized node/edge view built from entities and relations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}

impl GraphData {
	/// Build the graph for one package.
	///
	/// Duplicate entity names keep their first occurrence. Relation endpoints
	/// that were never extracted as entities become `MISC` nodes.
	pub fn from_parts(entities: &[Entity], relations: &[Relation]) -> Self {
		let mut seen = HashSet::new();
		let mut nodes = Vec::with_capacity(entities.len());
		for entity in entities {
			if seen.insert(entity.name.clone()) {
				nodes.push(GraphNode::new(entity.name.clone(), entity.entity_type));
			}
		}

		let mut edges = Vec::with_capacity(relations.len());
		for rel in relations {
			for endpoint in [&rel.source, &rel.target] {
				if seen.insert(endpoint.clone()) {
					nodes.push(GraphNode::new(endpoint.clone(), EntityType::Misc));
				}
			}
			edges.push(GraphEdge {
				source: rel.source.clone(),
				target: rel.target.clone(),
				value: rel.weight(),
			});
		}

		Self { nodes, edges }
	}

	/// Merge several studies into one graph, resolving entity names across
	/// documents. Distinct names inside one study stay distinct nodes. Parallel
	/// edges collapse into one carrying the largest weight.
	pub fn merge_studies<'a>(studies: impl IntoIterator<Item = &'a StudyItem>) -> Self {
		let mut linker = EntityLinker::new();
		let mut entities: Vec<Entity> = Vec::new();
		let mut relations: Vec<Relation> = Vec::new();
		for (i, study) in studies.into_iter().enumerate() {
			let package = &study.package;
			let names = package.entities.iter().map(|e| e.name.as_str()).chain(
				package
					.relations
					.iter()
					.flat_map(|r| [r.source.as_str(), r.target.as_str()]),
			);
			let resolved = linker.link_study(i, names);
			let canonical = |name: &str| resolved.get(name).cloned().unwrap_or_else(|| name.to_string());
			entities.extend(package.entities.iter().map(|e| Entity {
				name: canonical(&e.name),
				..e.clone()
			}));
			relations.extend(package.relations.iter().map(|r| Relation {
				source: canonical(&r.source),
				target: canonical(&r.target),
				..r.clone()
			}));
		}

		let mut graph = Self::from_parts(&entities, &relations);
		let mut strongest: HashMap<(String, String), usize> = HashMap::new();
		let mut edges: Vec<GraphEdge> = Vec::with_capacity(graph.edges.len());
		for edge in graph.edges.drain(..) {
			let key = (edge.source.clone(), edge.target.clone());
			match strongest.get(&key) {
				Some(&i) => edges[i].value = edges[i].value.max(edge.value),
				None => {
					strongest.insert(key, edges.len());
					edges.push(edge);
				}
			}
		}
		graph.edges = edges;
		graph
	}

	/// Whether there is nothing to draw.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

/// Review state of a study.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudyStatus {
	#[default]
	Active,
	Review,
	Archived,
}

impl StudyStatus {
	/// Display order on the feed.
	pub const ALL: [StudyStatus; 3] = [StudyStatus::Active, StudyStatus::Review, StudyStatus::Archived];

	/// Human-readable label.
	pub fn label(self) -> &'static str {
		match self {
			StudyStatus::Active => "Active",
			StudyStatus::Review => "In review",
			StudyStatus::Archived => "Archived",
		}
	}
}

/// Entities, relations and insights produced for one study.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntelligencePackage {
	#[serde(default)]
	pub entities: Vec<Entity>,
	#[serde(default)]
	pub relations: Vec<Relation>,
	#[serde(default)]
	pub insights: Vec<String>,
	/// Precomputed graph shipped with older packages.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub graph: Option<GraphData>,
}

impl IntelligencePackage {
	/// Graph for this package, rebuilt from entities and relations. Falls back
	/// to the shipped graph only when the package carries no entity data.
	pub fn graph_data(&self) -> GraphData {
		match &self.graph {
			Some(graph) if self.entities.is_empty() && self.relations.is_empty() => graph.clone(),
			_ => GraphData::from_parts(&self.entities, &self.relations),
		}
	}
}

/// One analyst study and its intelligence package.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyItem {
	pub id: String,
	pub title: String,
	#[serde(default)]
	pub status: StudyStatus,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<String>,
	#[serde(default)]
	pub package: IntelligencePackage,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rel(source: &str, target: &str, confidence: f64) -> Relation {
		Relation {
			source: source.into(),
			target: target.into(),
			relation_type: "LINKED_TO".into(),
			confidence,
		}
	}

	#[test]
	fn missing_endpoints_become_misc_nodes() {
		let entities = vec![
			Entity::new("1", "A", EntityType::Person),
			Entity::new("2", "B", EntityType::Organization),
		];
		let graph = GraphData::from_parts(&entities, &[rel("A", "C", 0.8)]);

		let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["A", "B", "C"]);
		assert_eq!(graph.nodes[2].node_type, EntityType::Misc);
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(graph.edges[0].source, "A");
		assert_eq!(graph.edges[0].target, "C");
		assert!((graph.edges[0].value - 4.0).abs() < 1e-9);
	}

	#[test]
	fn both_dangling_endpoints_are_synthesized() {
		let graph = GraphData::from_parts(&[], &[rel("X", "Y", 1.5)]);
		assert_eq!(graph.nodes.len(), 2);
		assert!(graph.nodes.iter().all(|n| n.node_type == EntityType::Misc));
		assert_eq!(graph.edges[0].value, EDGE_WEIGHT_SCALE);
	}

	#[test]
	fn duplicate_names_keep_first_entity() {
		let entities = vec![
			Entity::new("1", "ESMA", EntityType::Organization),
			Entity::new("2", "ESMA", EntityType::Location),
		];
		let graph = GraphData::from_parts(&entities, &[]);
		assert_eq!(graph.nodes.len(), 1);
		assert_eq!(graph.nodes[0].node_type, EntityType::Organization);
	}

	#[test]
	fn wire_shape_uses_type_keys() {
		let json = r#"{
			"entities": [{"id": "e1", "name": "Project Zephyr", "type": "ASSET"},
			             {"name": "Someone", "type": "ALIAS"}],
			"relations": [{"source": "Someone", "target": "Project Zephyr", "type": "FUNDS", "confidence": 0.5}]
		}"#;
		let package: IntelligencePackage = serde_json::from_str(json).unwrap();
		assert_eq!(package.entities[0].entity_type, EntityType::Asset);
		assert_eq!(package.entities[1].entity_type, EntityType::Misc);

		let value = serde_json::to_value(package.graph_data()).unwrap();
		assert_eq!(value["nodes"][0]["type"], "ASSET");
		assert_eq!(value["nodes"][0]["id"], "Project Zephyr");
		assert_eq!(value["edges"][0]["value"], 2.5);
	}

	#[test]
	fn unknown_type_decodes_as_misc_and_hub_round_trips() {
		let entity: Entity = serde_json::from_str(r#"{"name": "X", "type": "VEHICLE"}"#).unwrap();
		assert_eq!(entity.entity_type, EntityType::Misc);
		let untyped: Entity = serde_json::from_str(r#"{"name": "Y"}"#).unwrap();
		assert_eq!(untyped.entity_type, EntityType::Misc);

		assert_eq!(serde_json::to_value(EntityType::Hub).unwrap(), "HUB");
		assert_eq!(serde_json::to_value(EntityType::Misc).unwrap(), "MISC");
		let hub: EntityType = serde_json::from_str(r#""HUB""#).unwrap();
		assert_eq!(hub, EntityType::Hub);
		assert_ne!(EntityType::Hub.group(), EntityType::Misc.group());
	}

	#[test]
	fn shipped_graph_used_only_without_entities() {
		let shipped = GraphData {
			nodes: vec![GraphNode::new("Only", EntityType::Event)],
			edges: vec![],
		};
		let mut package = IntelligencePackage {
			graph: Some(shipped.clone()),
			..Default::default()
		};
		assert_eq!(package.graph_data(), shipped);

		package.entities.push(Entity::new("1", "Other", EntityType::Person));
		assert_eq!(package.graph_data().nodes[0].id, "Other");
	}

	#[test]
	fn merge_links_names_across_studies() {
		let a = StudyItem {
			id: "a".into(),
			package: IntelligencePackage {
				entities: vec![
					Entity::new("a1", "Project Zephyr", EntityType::Asset),
					Entity::new("a2", "Viktor Orlov", EntityType::Person),
				],
				relations: vec![rel("Viktor Orlov", "Project Zephyr", 0.4)],
				..Default::default()
			},
			..Default::default()
		};
		let b = StudyItem {
			id: "b".into(),
			package: IntelligencePackage {
				entities: vec![
					Entity::new("b1", "project zephyr ", EntityType::Asset),
					Entity::new("b2", "viktor orlov", EntityType::Person),
				],
				relations: vec![rel("viktor orlov", "project zephyr ", 0.9)],
				..Default::default()
			},
			..Default::default()
		};
		let graph = GraphData::merge_studies(&[a, b]);
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(graph.edges[0].source, "Viktor Orlov");
		assert!((graph.edges[0].value - 4.5).abs() < 1e-9);
	}

	#[test]
	fn merge_keeps_names_within_one_study_distinct() {
		let study = StudyItem {
			id: "a".into(),
			package: IntelligencePackage {
				entities: vec![
					Entity::new("a1", "Viktor Orlov", EntityType::Person),
					Entity::new("a2", "Orlov", EntityType::Organization),
				],
				relations: vec![rel("Viktor Orlov", "Orlov", 0.6)],
				..Default::default()
			},
			..Default::default()
		};
		let merged = GraphData::merge_studies([&study]);
		assert_eq!(merged, study.package.graph_data());
		assert_eq!(merged.nodes.len(), 2);
		assert_ne!(merged.edges[0].source, merged.edges[0].target);
	}

	#[test]
	fn merge_links_short_name_to_other_study_only_once() {
		let a = StudyItem {
			id: "a".into(),
			package: IntelligencePackage {
				entities: vec![Entity::new("a1", "Viktor Orlov", EntityType::Person)],
				..Default::default()
			},
			..Default::default()
		};
		let b = StudyItem {
			id: "b".into(),
			package: IntelligencePackage {
				entities: vec![
					Entity::new("b1", "Orlov", EntityType::Person),
					Entity::new("b2", "viktor orlov", EntityType::Person),
				],
				relations: vec![rel("Orlov", "viktor orlov", 0.5)],
				..Default::default()
			},
			..Default::default()
		};
		let graph = GraphData::merge_studies(&[a, b]);
		let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["Viktor Orlov", "Orlov"]);
		assert_eq!(graph.edges[0].source, "Orlov");
		assert_eq!(graph.edges[0].target, "Viktor Orlov");
	}
}
