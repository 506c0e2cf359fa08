use std::fmt;

/// Where a setting came from, for error messages.
#[derive(Debug, Clone)]
pub(crate) enum SettingSource {
	CliFlag(&'static str),
	Environment(&'static str),
	ConfigKey(&'static str),
}

impl fmt::Display for SettingSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::CliFlag(flag) => write!(f, "CLI flag `{flag}`"),
			Self::Environment(var) => write!(f, "environment variable `{var}`"),
			Self::ConfigKey(key) => write!(f, "configuration key `{key}`"),
		}
	}
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ConfigSources {
	pub(crate) records: Option<SettingSource>,
	pub(crate) root_index: Option<SettingSource>,
	pub(crate) base_url: Option<SettingSource>,
	pub(crate) timeout: Option<SettingSource>,
}

impl ConfigSources {
	pub(crate) fn source_for_records(&self) -> SettingSource {
		self.records
			.clone()
			.unwrap_or(SettingSource::ConfigKey("search.records"))
	}

	/// An unset root index is derived from the records file.
	pub(crate) fn source_for_root_index(&self) -> SettingSource {
		self.root_index
			.clone()
			.unwrap_or_else(|| self.source_for_records())
	}

	pub(crate) fn source_for_base_url(&self) -> SettingSource {
		self.base_url
			.clone()
			.unwrap_or(SettingSource::ConfigKey("search.base_url"))
	}

	pub(crate) fn source_for_timeout(&self) -> SettingSource {
		self.timeout
			.clone()
			.unwrap_or(SettingSource::ConfigKey("search.timeout_ms"))
	}
}
