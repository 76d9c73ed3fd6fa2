//! Canvas force-directed graph with filtering, focus, search and trace modes.

mod component;
pub mod derive;
pub mod layout;
mod render;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use derive::{Scene, SceneEdge, SceneNode, derive_scene, node_radius};
pub use types::{GraphView, LayoutConfig, TRACE_HUB_ID, TRACE_HUB_LABEL};
