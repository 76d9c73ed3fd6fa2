use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData};

use super::derive::{Scene, SceneEdge, SceneNode};
use super::layout::{self, Body, Link};
use super::types::LayoutConfig;

/// Pixels the pointer may travel before a press stops counting as a click.
pub const CLICK_SLOP: f64 = 3.0;
const SEED_RADIUS: f64 = 100.0;

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// An edge with its endpoints resolved to simulation indices.
#[derive(Clone, Debug)]
pub struct LaidEdge {
	pub source: DefaultNodeIdx,
	pub target: DefaultNodeIdx,
	pub attrs: SceneEdge,
}

/// Where a node was left by a previous simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeSnapshot {
	pub x: f32,
	pub y: f32,
	pub pinned: bool,
}

/// Live simulation for one derived scene.
pub struct ForceGraphState {
	pub graph: ForceGraph<SceneNode, ()>,
	pub edges: Vec<LaidEdge>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: Option<DefaultNodeIdx>,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	config: LayoutConfig,
	index: HashMap<String, DefaultNodeIdx>,
}

impl ForceGraphState {
	/// Build a simulation for `scene`. Nodes that also existed in `previous`
	/// start where they were left; new nodes are seeded on a circle.
	pub fn new(
		scene: Scene,
		width: f64,
		height: f64,
		config: LayoutConfig,
		previous: Option<&ForceGraphState>,
	) -> Self {
		let mut graph = ForceGraph::new(config.simulation_parameters());
		let mut index = HashMap::new();
		let count = scene.nodes.len().max(1) as f64;

		for (i, node) in scene.nodes.into_iter().enumerate() {
			let snapshot = previous.and_then(|p| p.snapshot(&node.id));
			let (x, y, pinned) = match snapshot {
				Some(s) => (s.x, s.y, s.pinned),
				None if node.is_hub() => (0.0, 0.0, false),
				None => {
					let angle = (i as f64) * 2.0 * PI / count;
					(
						(SEED_RADIUS * angle.cos()) as f32,
						(SEED_RADIUS * angle.sin()) as f32,
						false,
					)
				}
			};
			let mass = if node.is_hub() { config.hub_mass } else { config.node_mass };
			let id = node.id.clone();
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass,
				is_anchor: pinned,
				user_data: node,
			});
			index.insert(id, idx);
		}

		let mut edges = Vec::with_capacity(scene.edges.len());
		for edge in scene.edges {
			if let (Some(&src), Some(&tgt)) = (index.get(&edge.source), index.get(&edge.target)) {
				graph.add_edge(src, tgt, EdgeData::default());
				edges.push(LaidEdge {
					source: src,
					target: tgt,
					attrs: edge,
				});
			}
		}

		let transform = previous.map(|p| p.transform.clone()).unwrap_or(ViewTransform {
			x: width / 2.0,
			y: height / 2.0,
			k: 1.0,
		});

		Self {
			graph,
			edges,
			transform,
			drag: DragState::default(),
			pan: PanState::default(),
			hover: None,
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
			config,
			index,
		}
	}

	pub fn node_count(&self) -> usize {
		self.index.len()
	}

	pub fn index_of(&self, id: &str) -> Option<DefaultNodeIdx> {
		self.index.get(id).copied()
	}

	pub fn snapshot(&self, id: &str) -> Option<NodeSnapshot> {
		let idx = self.index_of(id)?;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some(NodeSnapshot {
					x: node.x(),
					y: node.y(),
					pinned: node.data.is_anchor,
				});
			}
		});
		found
	}

	/// Current world-space position of every node.
	pub fn positions(&self) -> HashMap<DefaultNodeIdx, (f64, f64)> {
		let mut out = HashMap::with_capacity(self.index.len());
		self.graph.visit_nodes(|node| {
			out.insert(node.index(), (node.x() as f64, node.y() as f64));
		});
		out
	}

	pub fn id_of(&self, idx: DefaultNodeIdx) -> Option<String> {
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some(node.data.user_data.id.clone());
			}
		});
		found
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost node under a screen position.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			let r = node.data.user_data.ring_radius.unwrap_or(node.data.user_data.radius);
			if (dx * dx + dy * dy).sqrt() < r {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		self.hover = node;
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover == Some(idx)
	}

	/// Advance the simulation by `dt` seconds.
	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;
		self.relax();
	}

	fn relax(&mut self) {
		let mut slots = HashMap::with_capacity(self.index.len());
		let mut bodies = Vec::with_capacity(self.index.len());
		self.graph.visit_nodes(|node| {
			slots.insert(node.index(), bodies.len());
			bodies.push(Body {
				x: node.x() as f64,
				y: node.y() as f64,
				radius: node.data.user_data.radius,
				fixed: node.data.is_anchor,
			});
		});

		let links: Vec<Link> = self
			.edges
			.iter()
			.filter_map(|e| {
				Some(Link {
					a: *slots.get(&e.source)?,
					b: *slots.get(&e.target)?,
					distance: if e.attrs.is_hub_edge {
						self.config.hub_link_distance
					} else {
						self.config.link_distance
					},
				})
			})
			.collect();

		layout::relax_links(&mut bodies, &links, self.config.link_strength);
		layout::resolve_collisions(
			&mut bodies,
			self.config.collision_padding,
			self.config.collision_strength,
		);
		layout::recenter(&mut bodies, self.config.center_strength);

		self.graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			if let Some(b) = slots.get(&node.index()).map(|&i| bodies[i]) {
				node.data.x = b.x as f32;
				node.data.y = b.y as f32;
			}
		});
	}

	/// Track a new viewport size, keeping the graph origin centered.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.transform.x += (width - self.width) / 2.0;
		self.transform.y += (height - self.height) / 2.0;
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::derive::derive_scene;
	use crate::components::force_graph::types::{GraphView, TRACE_HUB_ID};
	use crate::model::{EntityType, GraphData, GraphEdge, GraphNode};

	fn scene(trace_mode: bool) -> Scene {
		let data = GraphData {
			nodes: vec![
				GraphNode::new("A", EntityType::Person),
				GraphNode::new("B", EntityType::Location),
				GraphNode::new("C", EntityType::Misc),
			],
			edges: vec![
				GraphEdge {
					source: "A".into(),
					target: "B".into(),
					value: 3.0,
				},
				GraphEdge {
					source: "B".into(),
					target: "C".into(),
					value: 1.0,
				},
			],
		};
		let view = GraphView {
			trace_mode,
			cross_refs: vec!["A".into(), "C".into()],
			..Default::default()
		};
		derive_scene(&data, &view)
	}

	#[test]
	fn builds_nodes_and_edges_from_scene() {
		let state = ForceGraphState::new(scene(true), 800.0, 600.0, LayoutConfig::default(), None);
		assert_eq!(state.node_count(), 4);
		assert_eq!(state.edges.len(), 4);
		assert_eq!(state.edges.iter().filter(|e| e.attrs.is_hub_edge).count(), 2);
		assert_eq!(state.snapshot(TRACE_HUB_ID).map(|s| (s.x, s.y)), Some((0.0, 0.0)));
		assert_eq!((state.transform.x, state.transform.y), (400.0, 300.0));
	}

	#[test]
	fn ticking_stays_finite_and_separates_nodes() {
		let mut state =
			ForceGraphState::new(scene(true), 800.0, 600.0, LayoutConfig::default(), None);
		for _ in 0..300 {
			state.tick(0.016);
		}
		let positions: Vec<(f64, f64)> = state.positions().into_values().collect();
		assert!(positions.iter().all(|(x, y)| x.is_finite() && y.is_finite()));
		for (i, a) in positions.iter().enumerate() {
			for b in &positions[i + 1..] {
				let d = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
				assert!(d > 1.0);
			}
		}
	}

	#[test]
	fn rebuild_keeps_previous_positions_and_pins() {
		let mut first =
			ForceGraphState::new(scene(false), 800.0, 600.0, LayoutConfig::default(), None);
		for _ in 0..20 {
			first.tick(0.016);
		}
		let a = first.index_of("A").unwrap();
		first.graph.visit_nodes_mut(|node| {
			if node.index() == a {
				node.data.x = 42.0;
				node.data.y = -7.0;
				node.data.is_anchor = true;
			}
		});
		first.transform.k = 2.5;

		let second =
			ForceGraphState::new(scene(true), 800.0, 600.0, LayoutConfig::default(), Some(&first));
		assert_eq!(
			second.snapshot("A"),
			Some(NodeSnapshot {
				x: 42.0,
				y: -7.0,
				pinned: true
			})
		);
		assert_eq!(second.snapshot("B"), first.snapshot("B"));
		assert_eq!(second.transform.k, 2.5);
	}

	#[test]
	fn hit_testing_uses_node_radius() {
		let state = ForceGraphState::new(scene(false), 800.0, 600.0, LayoutConfig::default(), None);
		let a = state.index_of("A").unwrap();
		let s = state.snapshot("A").unwrap();
		let (sx, sy) = (s.x as f64 + 400.0, s.y as f64 + 300.0);
		assert_eq!(state.node_at_position(sx + 5.0, sy), Some(a));
		assert_eq!(state.id_of(a).as_deref(), Some("A"));
		assert_eq!(state.node_at_position(5000.0, 5000.0), None);
	}

	#[test]
	fn resize_keeps_origin_centered() {
		let mut state =
			ForceGraphState::new(scene(false), 800.0, 600.0, LayoutConfig::default(), None);
		state.resize(1000.0, 400.0);
		assert_eq!((state.transform.x, state.transform.y), (500.0, 200.0));
		assert_eq!((state.width, state.height), (1000.0, 400.0));
	}
}
