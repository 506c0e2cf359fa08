use std::path::PathBuf;
use std::time::Duration;

use facetree_widgets::WidgetSpec;
use url::Url;

mod errors;
mod sources;
mod summary;
mod validation;

pub(crate) use errors::ConfigError;
pub(crate) use sources::{ConfigSources, SettingSource};

/// Application-ready configuration derived from user input, config files and
/// defaults.
#[derive(Debug)]
pub struct ResolvedConfig {
	pub root_index: String,
	pub records: PathBuf,
	pub base_url: Option<Url>,
	/// Routed URL whose state seeds the search.
	pub url: Option<String>,
	pub stalled_delay: Duration,
	pub timeout: Duration,
	pub widgets: Vec<WidgetSpec>,
}

impl ResolvedConfig {
	pub(super) fn validate(&self, sources: &ConfigSources) -> Result<(), ConfigError> {
		validation::validate(self, sources)
	}

	/// Print a human readable summary of the effective configuration.
	pub fn print_summary(&self) {
		summary::print_summary(self);
	}
}
