use std::collections::BTreeSet;

use force_graph::SimulationParameters;

use crate::model::EntityType;

/// Node id of the synthetic hub added in trace mode.
pub const TRACE_HUB_ID: &str = "__trace_hub__";
/// Label drawn on the trace hub.
pub const TRACE_HUB_LABEL: &str = "CROSS-STUDY NEXUS";

/// Interaction state that drives visual attributes. Never touches the data.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphView {
	pub search: String,
	pub selected: Option<String>,
	pub active_types: BTreeSet<EntityType>,
	pub trace_mode: bool,
	/// Entity names present in more than one study.
	pub cross_refs: Vec<String>,
}

impl Default for GraphView {
	fn default() -> Self {
		Self {
			search: String::new(),
			selected: None,
			active_types: EntityType::FILTERABLE.into_iter().collect(),
			trace_mode: false,
			cross_refs: Vec::new(),
		}
	}
}

/// Physics tuning for the layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
	/// Mass of an ordinary node; repulsion scales with the product of masses.
	pub node_mass: f32,
	pub hub_mass: f32,
	pub link_distance: f64,
	pub hub_link_distance: f64,
	pub link_strength: f64,
	pub collision_padding: f64,
	pub collision_strength: f64,
	pub center_strength: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			node_mass: 10.0,
			hub_mass: 60.0,
			link_distance: 90.0,
			hub_link_distance: 180.0,
			link_strength: 0.3,
			collision_padding: 4.0,
			collision_strength: 0.7,
			center_strength: 0.05,
		}
	}
}

impl LayoutConfig {
	/// Parameters for the underlying `force_graph` simulation.
	pub fn simulation_parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		}
	}
}
