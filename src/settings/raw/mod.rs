use std::env;

use anyhow::Result;
use serde::Deserialize;

use crate::cli::CliArgs;

use super::resolved::{ConfigSources, ResolvedConfig, SettingSource};

mod layout;
mod search;

use layout::LayoutSection;
use search::SearchSection;

/// Mirror of the configuration file representation before CLI overrides and
/// validation are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct RawConfig {
    search: SearchSection,
    layout: LayoutSection,
}

impl RawConfig {
    /// Apply CLI overrides on top of the raw configuration values.
    pub(super) fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        self.search.apply_cli_overrides(cli);
    }

    /// Convert the raw configuration into a [`ResolvedConfig`], validating and
    /// filling defaults where required.
    pub(super) fn resolve(self, cli: &CliArgs) -> Result<ResolvedConfig> {
        let sources = ConfigSources {
            records: detect_source(
                cli.records.is_some(),
                self.search.records.is_some(),
                "FACETREE__SEARCH__RECORDS",
                "--records",
                "search.records",
            ),
            root_index: detect_source(
                cli.root_index.is_some(),
                self.search.root_index.is_some(),
                "FACETREE__SEARCH__ROOT_INDEX",
                "--root-index",
                "search.root_index",
            ),
            base_url: detect_source(
                false,
                self.search.base_url.is_some(),
                "FACETREE__SEARCH__BASE_URL",
                "",
                "search.base_url",
            ),
            timeout: detect_source(
                false,
                self.search.timeout_ms.is_some(),
                "FACETREE__SEARCH__TIMEOUT_MS",
                "",
                "search.timeout_ms",
            ),
        };

        let search = self.search.resolve(&sources)?;
        let config = ResolvedConfig {
            root_index: search.root_index,
            records: search.records,
            base_url: search.base_url,
            url: search.url,
            stalled_delay: search.stalled_delay,
            timeout: search.timeout,
            widgets: self.layout.widgets,
        };

        config.validate(&sources)?;

        Ok(config)
    }
}

fn detect_source(
    cli_present: bool,
    value_present: bool,
    env_var: &'static str,
    cli_flag: &'static str,
    key: &'static str,
) -> Option<SettingSource> {
    if !value_present {
        return None;
    }

    if cli_present {
        return Some(SettingSource::CliFlag(cli_flag));
    }

    if env::var_os(env_var).is_some() {
        return Some(SettingSource::Environment(env_var));
    }

    Some(SettingSource::ConfigKey(key))
}

#[cfg(test)]
mod tests;
