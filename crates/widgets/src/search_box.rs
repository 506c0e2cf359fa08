use facetree_core::translate::{FacetTranslator, QueryFacet};
use facetree_core::{RenderStateOptions, SearchParameters};
use serde_json::{Map, Value, json};

use crate::connector::{Connector, Refinement};

/// Free-text query input.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchBox {
    facet: QueryFacet,
}

impl SearchBox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the query and go back to the first page.
    pub fn refine(query: impl Into<String>) -> Refinement {
        let query = query.into();
        Box::new(move |params| params.with_query(query).with_page(None))
    }
}

impl Connector for SearchBox {
    fn widget_type(&self) -> &'static str {
        "searchBox"
    }

    fn widget_params(&self) -> Value {
        json!({})
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("query".into(), Value::from(options.parameters.query()));
        data.insert(
            "isSearchStalled".into(),
            Value::from(options.metadata.is_search_stalled),
        );
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(params.clone().with_query(""))
    }
}
