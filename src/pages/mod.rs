//! Top-level pages and the study context they share.

use std::sync::Arc;

use leptos::prelude::*;

use crate::data;
use crate::model::StudyItem;

pub mod analysis;
pub mod home;
pub mod not_found;

/// Studies shared by every page.
#[derive(Clone, Debug)]
pub struct Studies(pub Arc<Vec<StudyItem>>);

impl Studies {
	/// Bundled studies, or the built-in defaults if they fail to load.
	pub fn load() -> Self {
		Self(Arc::new(data::load_or_fallback(data::BUNDLED_STUDIES)))
	}
}

/// Studies from context, loading them if no ancestor provided any.
pub fn use_studies() -> Studies {
	use_context::<Studies>().unwrap_or_else(Studies::load)
}
