//! Reusable UI components.

pub mod filter_bar;
pub mod force_graph;
