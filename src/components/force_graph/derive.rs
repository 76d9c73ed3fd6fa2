//! Visual-state derivation.
//!
//! Turns graph data plus the current [`GraphView`] into a [`Scene`]: the set of
//! nodes and edges to lay out, each carrying the opacity, stroke, glow and size
//! it should be drawn with. This is a pure function of its inputs and is rerun
//! wholesale whenever any of them changes.

use std::collections::{HashMap, HashSet};

use super::types::{GraphView, TRACE_HUB_ID, TRACE_HUB_LABEL};
use crate::matching::matches_any;
use crate::model::{EntityType, GraphData};

pub const BASE_RADIUS: f64 = 14.0;
pub const DEGREE_RADIUS_STEP: f64 = 2.0;
pub const DEGREE_RADIUS_CAP: f64 = 20.0;
pub const SELECTED_RADIUS_BONUS: f64 = 5.0;
pub const HUB_CORE_RADIUS: f64 = 40.0;
pub const HUB_RING_RADIUS: f64 = 50.0;
pub const HUB_EDGE_VALUE: f64 = 2.0;

const TRACE_DIM: f64 = 0.25;
const FOCUS_DIM: f64 = 0.15;
const SEARCH_DIM: f64 = 0.2;

const EDGE_BASE: f64 = 0.6;
const EDGE_LIT: f64 = 0.9;
const EDGE_DIM: f64 = 0.08;
const EDGE_TRACE_DIM: f64 = 0.1;

pub const EDGE_COLOR: (u8, u8, u8) = (100, 180, 255);
pub const HUB_EDGE_COLOR: (u8, u8, u8) = (250, 204, 21);
pub const BRIDGE_COLOR: &str = "#fbbf24";
pub const MATCH_GLOW: &str = "#ffffff";
pub const SELECTED_STROKE: &str = "#ffffff";

/// Outline drawn around a node.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
	pub color: &'static str,
	pub width: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
	pub id: String,
	pub label: String,
	pub node_type: EntityType,
	pub degree: usize,
	pub radius: f64,
	/// Outer ring, only drawn for the hub.
	pub ring_radius: Option<f64>,
	pub color: &'static str,
	pub opacity: f64,
	pub stroke: Option<Stroke>,
	pub glow: Option<&'static str>,
	pub is_bridge: bool,
	pub is_match: bool,
	pub is_selected: bool,
}

impl SceneNode {
	pub fn is_hub(&self) -> bool {
		self.node_type == EntityType::Hub
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneEdge {
	pub source: String,
	pub target: String,
	pub value: f64,
	pub width: f64,
	pub opacity: f64,
	pub color: (u8, u8, u8),
	/// Dashed with animated flow.
	pub dashed: bool,
	pub is_hub_edge: bool,
}

/// Everything the layout and renderer need for one pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub nodes: Vec<SceneNode>,
	pub edges: Vec<SceneEdge>,
}

impl Scene {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&SceneNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}

/// Radius for a node with `degree` connections.
pub fn node_radius(degree: usize, selected: bool) -> f64 {
	let bonus = if selected { SELECTED_RADIUS_BONUS } else { 0.0 };
	BASE_RADIUS + (degree as f64 * DEGREE_RADIUS_STEP).min(DEGREE_RADIUS_CAP) + bonus
}

/// Derive the scene for `data` under `view`.
pub fn derive_scene(data: &GraphData, view: &GraphView) -> Scene {
	// 1. type filter
	let mut ids = HashSet::new();
	let visible: Vec<_> = data
		.nodes
		.iter()
		.filter(|n| n.node_type.always_visible() || view.active_types.contains(&n.node_type))
		.filter(|n| ids.insert(n.id.as_str()))
		.collect();
	if visible.is_empty() {
		return Scene::default();
	}

	// 2. dangling edges
	let edges: Vec<_> = data
		.edges
		.iter()
		.filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
		.collect();

	let mut degree: HashMap<&str, usize> = HashMap::new();
	for e in &edges {
		*degree.entry(e.source.as_str()).or_default() += 1;
		if e.target != e.source {
			*degree.entry(e.target.as_str()).or_default() += 1;
		}
	}

	let bridges: HashSet<&str> = visible
		.iter()
		.filter(|n| n.node_type != EntityType::Hub && matches_any(&n.id, &view.cross_refs))
		.map(|n| n.id.as_str())
		.collect();

	// 3. trace hub
	let mut links: Vec<(&str, &str, f64, bool)> = edges
		.iter()
		.map(|e| (e.source.as_str(), e.target.as_str(), e.value, false))
		.collect();
	if view.trace_mode {
		links.extend(
			visible
				.iter()
				.filter(|n| bridges.contains(n.id.as_str()))
				.map(|n| (TRACE_HUB_ID, n.id.as_str(), HUB_EDGE_VALUE, true)),
		);
	}

	let mut neighbors: HashMap<&str, Vec<&str>> = HashMap::new();
	for &(s, t, _, _) in &links {
		neighbors.entry(s).or_default().push(t);
		neighbors.entry(t).or_default().push(s);
	}
	let with_neighbors = |seeds: &HashSet<&str>| -> HashSet<String> {
		seeds
			.iter()
			.flat_map(|&id| {
				std::iter::once(id).chain(neighbors.get(id).into_iter().flatten().copied())
			})
			.map(str::to_string)
			.collect()
	};

	// 4. highlight sets
	let term = view.search.trim().to_lowercase();
	let searching = !term.is_empty();
	let matched: HashSet<&str> = if searching {
		visible
			.iter()
			.filter(|n| n.id.to_lowercase().contains(&term))
			.map(|n| n.id.as_str())
			.collect()
	} else {
		HashSet::new()
	};
	let search_set = with_neighbors(&matched);

	let selected = view
		.selected
		.as_deref()
		.filter(|id| ids.contains(id) || (view.trace_mode && *id == TRACE_HUB_ID));
	let focusing = selected.is_some();
	let focus_set = with_neighbors(&selected.into_iter().collect());

	let lit = |id: &str| focus_set.contains(id) || search_set.contains(id);
	let node_opacity = |id: &str, is_bridge: bool| -> f64 {
		if view.trace_mode {
			if is_bridge { 1.0 } else { TRACE_DIM }
		} else if focusing || searching {
			match (lit(id), focusing) {
				(true, _) => 1.0,
				(false, true) => FOCUS_DIM,
				(false, false) => SEARCH_DIM,
			}
		} else {
			1.0
		}
	};

	let mut nodes: Vec<SceneNode> = visible
		.iter()
		.map(|n| {
			let id = n.id.as_str();
			let degree = degree.get(id).copied().unwrap_or(0);
			let is_bridge = bridges.contains(id);
			let is_match = matched.contains(id);
			let is_selected = selected == Some(id);
			let stroke = if is_selected {
				Some(Stroke { color: SELECTED_STROKE, width: 3.0 })
			} else if is_bridge {
				Some(Stroke { color: BRIDGE_COLOR, width: 2.0 })
			} else {
				None
			};
			let glow = if is_match {
				Some(MATCH_GLOW)
			} else if is_bridge {
				Some(BRIDGE_COLOR)
			} else {
				None
			};
			SceneNode {
				id: n.id.clone(),
				label: n.id.clone(),
				node_type: n.node_type,
				degree,
				radius: node_radius(degree, is_selected),
				ring_radius: None,
				color: n.node_type.color(),
				opacity: node_opacity(id, is_bridge),
				stroke,
				glow,
				is_bridge,
				is_match,
				is_selected,
			}
		})
		.collect();

	if view.trace_mode {
		let is_selected = selected == Some(TRACE_HUB_ID);
		nodes.push(SceneNode {
			id: TRACE_HUB_ID.to_string(),
			label: TRACE_HUB_LABEL.to_string(),
			node_type: EntityType::Hub,
			degree: bridges.len(),
			radius: HUB_CORE_RADIUS,
			ring_radius: Some(HUB_RING_RADIUS),
			color: EntityType::Hub.color(),
			opacity: 1.0,
			stroke: is_selected.then_some(Stroke { color: SELECTED_STROKE, width: 3.0 }),
			glow: Some(BRIDGE_COLOR),
			is_bridge: false,
			is_match: false,
			is_selected,
		});
	}

	// 5. edge attributes
	let edges = links
		.into_iter()
		.map(|(source, target, value, is_hub_edge)| {
			let opacity = if view.trace_mode {
				if is_hub_edge { EDGE_LIT } else { EDGE_TRACE_DIM }
			} else if focusing || searching {
				if lit(source) && lit(target) { EDGE_LIT } else { EDGE_DIM }
			} else {
				EDGE_BASE
			};
			SceneEdge {
				source: source.to_string(),
				target: target.to_string(),
				value,
				width: value.max(1.0),
				opacity,
				color: if is_hub_edge { HUB_EDGE_COLOR } else { EDGE_COLOR },
				dashed: is_hub_edge,
				is_hub_edge,
			}
		})
		.collect();

	Scene { nodes, edges }
}
