use super::{ConfigError, ConfigSources, ResolvedConfig};

pub(super) fn validate(
	config: &ResolvedConfig,
	sources: &ConfigSources,
) -> Result<(), ConfigError> {
	if config.root_index.trim().is_empty() {
		return Err(ConfigError::invalid(
			"search.root_index",
			config.root_index.clone(),
			sources.source_for_root_index(),
			"must not be empty",
		));
	}

	if config.timeout.is_zero() {
		return Err(ConfigError::invalid(
			"search.timeout_ms",
			"0",
			sources.source_for_timeout(),
			"must be greater than zero",
		));
	}

	if !config.records.is_file() {
		return Err(ConfigError::invalid(
			"search.records",
			config.records.display().to_string(),
			sources.source_for_records(),
			"is not a readable file",
		));
	}

	Ok(())
}
