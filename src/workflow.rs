use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use facetree_core::{
    EngineEvent, MemoryClient, RenderState, RouteCodec, SearchOptions, SearchTree, UiState,
};
use serde_json::Value;

use crate::settings::ResolvedConfig;

/// Result of one search cycle.
#[derive(Debug)]
pub(crate) struct SearchOutcome {
    pub(crate) url: String,
    pub(crate) ui_state: UiState,
    pub(crate) render_state: Arc<RenderState>,
    pub(crate) indices: Vec<IndexSummary>,
}

/// Per-index view of the latest results, in tree order.
#[derive(Debug)]
pub(crate) struct IndexSummary {
    pub(crate) key: String,
    pub(crate) index_name: String,
    pub(crate) nb_hits: Option<usize>,
    pub(crate) error: Option<String>,
}

/// Mounts the configured layout over the record set and runs it to completion.
pub(crate) struct SearchWorkflow {
    config: ResolvedConfig,
}

impl SearchWorkflow {
    pub(crate) fn from_config(config: ResolvedConfig) -> Result<Self> {
        if config.widgets.is_empty() {
            tracing::warn!("layout has no widgets; only the root index will be queried");
        }
        Ok(Self { config })
    }

    pub(crate) fn run(self) -> Result<SearchOutcome> {
        let ResolvedConfig {
            root_index,
            records,
            base_url,
            url,
            stalled_delay,
            timeout,
            widgets,
        } = self.config;

        let indices = load_records(&records, &root_index)?;
        let mut routes = RouteCodec::new();
        if let Some(base_url) = base_url {
            routes = routes.with_base_url(base_url);
        }
        let initial_ui_state = url
            .as_deref()
            .map(|url| routes.parse_url(url))
            .unwrap_or_default();

        let mut tree = SearchTree::new(
            root_index,
            MemoryClient::spawn(indices),
            SearchOptions {
                initial_ui_state,
                stalled_delay,
                routes,
                ..SearchOptions::default()
            },
        );
        let events = tree.subscribe();
        tree.add_widgets(tree.root(), facetree_widgets::build_all(widgets))
            .context("failed to mount the widget layout")?;

        tree.start();
        tree.settle(timeout)
            .context("search did not settle before the timeout")?;

        for event in events.try_iter() {
            match event {
                EngineEvent::WidgetHookFailed { .. } | EngineEvent::QueryFailed { .. } => {
                    tracing::warn!(?event, "search reported a failure");
                }
                other => tracing::debug!(event = ?other, "engine event"),
            }
        }

        Ok(collect_outcome(&tree))
    }
}

fn collect_outcome(tree: &SearchTree) -> SearchOutcome {
    let render_state = tree.render_state();
    let indices = render_state
        .keys()
        .filter_map(|key| tree.node_by_key(key))
        .map(|node| IndexSummary {
            key: node.state_key().to_string(),
            index_name: node.index_name().to_string(),
            nb_hits: node.results().map(|results| results.nb_hits),
            error: node.error().map(ToString::to_string),
        })
        .collect();

    SearchOutcome {
        url: tree.url(),
        ui_state: tree.ui_state(),
        render_state,
        indices,
    }
}

/// Read records keyed by index name.
///
/// A bare array belongs to `root_index`; an object maps index names to arrays.
fn load_records(path: &Path, root_index: &str) -> Result<HashMap<String, Vec<Value>>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read records from {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    match value {
        Value::Array(records) => Ok(HashMap::from([(root_index.to_string(), records)])),
        Value::Object(indices) => indices
            .into_iter()
            .map(|(name, records)| match records {
                Value::Array(records) => Ok((name, records)),
                _ => bail!("index `{name}` in {} must hold an array of records", path.display()),
            })
            .collect(),
        _ => bail!(
            "{} must contain an array of records or an object of arrays",
            path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use facetree_widgets::WidgetSpec;
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    fn write_records(dir: &Path, contents: &Value) -> PathBuf {
        let path = dir.join("products.json");
        fs::write(&path, contents.to_string()).expect("write records");
        path
    }

    fn config(records: PathBuf, url: Option<&str>, widgets: Value) -> ResolvedConfig {
        ResolvedConfig {
            root_index: "products".into(),
            records,
            base_url: None,
            url: url.map(str::to_string),
            stalled_delay: Duration::from_millis(200),
            timeout: Duration::from_secs(5),
            widgets: serde_json::from_value::<Vec<WidgetSpec>>(widgets).expect("layout"),
        }
    }

    #[test]
    fn bare_arrays_belong_to_the_root_index() {
        let dir = tempdir().expect("tempdir");
        let path = write_records(dir.path(), &json!([{ "objectID": "1" }]));
        let records = load_records(&path, "products").expect("records");
        assert_eq!(records["products"].len(), 1);
    }

    #[test]
    fn objects_must_hold_arrays() {
        let dir = tempdir().expect("tempdir");
        let path = write_records(dir.path(), &json!({ "products": { "objectID": "1" } }));
        let err = load_records(&path, "products").expect_err("not an array");
        assert!(err.to_string().contains("`products`"));
    }

    #[test]
    fn routed_state_drives_the_search() {
        let dir = tempdir().expect("tempdir");
        let path = write_records(
            dir.path(),
            &json!([
                { "objectID": "1", "name": "iPhone", "brand": "Apple" },
                { "objectID": "2", "name": "Galaxy", "brand": "Samsung" },
                { "objectID": "3", "name": "AirPods", "brand": "Apple" },
            ]),
        );
        let config = config(
            path,
            Some("?products%5BrefinementList%5D%5Bbrand%5D%5B0%5D=Apple"),
            json!([
                { "type": "searchBox" },
                { "type": "refinementList", "attribute": "brand" },
                { "type": "hits" },
            ]),
        );

        let outcome = SearchWorkflow::from_config(config)
            .expect("workflow")
            .run()
            .expect("search runs");

        assert_eq!(outcome.indices.len(), 1);
        assert_eq!(outcome.indices[0].key, "products");
        assert_eq!(outcome.indices[0].nb_hits, Some(2));
        assert_eq!(
            outcome
                .ui_state
                .get("products")
                .map(|state| state.refinement_list["brand"].clone()),
            Some(vec!["Apple".to_string()])
        );
        assert!(outcome.url.contains("Apple"));
        assert!(outcome.render_state.get("products").is_some());
    }
}
