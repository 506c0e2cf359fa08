use facetree_core::translate::{FacetTranslator, SortByFacet};
use facetree_core::{RenderStateOptions, SearchParameters};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::connector::{Connector, Refinement};

/// One index (or replica) a [`SortBy`] can switch to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortByItem {
    pub value: String,
    pub label: String,
}

/// Switches the index queried by its node.
///
/// The first item is the initial index: the UI state only records a sort
/// when it differs from it.
#[derive(Debug, Clone)]
pub struct SortBy {
    facet: SortByFacet,
    items: Vec<SortByItem>,
}

impl SortBy {
    #[must_use]
    pub fn new(items: Vec<SortByItem>) -> Self {
        let initial = items.first().map(|item| item.value.clone()).unwrap_or_default();
        Self {
            facet: SortByFacet::new(initial),
            items,
        }
    }

    #[must_use]
    pub fn with_initial_index(mut self, index: impl Into<String>) -> Self {
        self.facet = SortByFacet::new(index);
        self
    }

    pub fn refine(index: impl Into<String>) -> Refinement {
        let index = index.into();
        Box::new(move |params| params.with_index(index).with_page(None))
    }
}

impl Connector for SortBy {
    fn widget_type(&self) -> &'static str {
        "sortBy"
    }

    fn widget_params(&self) -> Value {
        json!({ "items": self.items })
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert(
            "currentRefinement".into(),
            Value::from(options.parameters.index()),
        );
        data.insert("options".into(), json!(self.items));
        data.insert(
            "hasNoResults".into(),
            Value::from(options.results.is_none_or(|results| results.nb_hits == 0)),
        );
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(params.clone().with_index(self.facet.initial_index.clone()))
    }
}
