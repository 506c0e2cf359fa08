use std::path::PathBuf;
use std::time::Duration;

use facetree_core::tree::DEFAULT_STALLED_DELAY;
use serde::Deserialize;
use url::Url;

use crate::cli::CliArgs;

use super::super::resolved::{ConfigError, ConfigSources};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `[search]` values as they are read from disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct SearchSection {
    pub(super) root_index: Option<String>,
    pub(super) records: Option<PathBuf>,
    pub(super) base_url: Option<String>,
    pub(super) url: Option<String>,
    pub(super) stalled_delay_ms: Option<u64>,
    pub(super) timeout_ms: Option<u64>,
}

/// `[search]` after defaults are filled in.
pub(super) struct ResolvedSearch {
    pub(super) root_index: String,
    pub(super) records: PathBuf,
    pub(super) base_url: Option<Url>,
    pub(super) url: Option<String>,
    pub(super) stalled_delay: Duration,
    pub(super) timeout: Duration,
}

impl SearchSection {
    pub(super) fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        if let Some(records) = cli.records.clone() {
            self.records = Some(records);
        }
        if let Some(root_index) = cli.root_index.clone() {
            self.root_index = Some(root_index);
        }
        if let Some(url) = cli.url.clone() {
            self.url = Some(url);
        }
    }

    /// Fill defaults. The root index falls back to the records file stem.
    pub(super) fn resolve(self, sources: &ConfigSources) -> Result<ResolvedSearch, ConfigError> {
        let records = self.records.ok_or_else(|| {
            ConfigError::invalid(
                "search.records",
                "(unset)",
                sources.source_for_records(),
                "a records file is required; pass --records or set search.records",
            )
        })?;

        let root_index = match self.root_index {
            Some(root_index) => root_index,
            None => records
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    ConfigError::invalid(
                        "search.root_index",
                        "(unset)",
                        sources.source_for_root_index(),
                        "cannot be derived from the records file name",
                    )
                })?,
        };

        let base_url = self
            .base_url
            .map(|raw| {
                Url::parse(&raw).map_err(|err| {
                    ConfigError::invalid(
                        "search.base_url",
                        raw.clone(),
                        sources.source_for_base_url(),
                        err.to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(ResolvedSearch {
            root_index,
            records,
            base_url,
            url: self.url,
            stalled_delay: self
                .stalled_delay_ms
                .map_or(DEFAULT_STALLED_DELAY, Duration::from_millis),
            timeout: self.timeout_ms.map_or(DEFAULT_TIMEOUT, Duration::from_millis),
        })
    }
}
