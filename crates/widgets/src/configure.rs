use facetree_core::translate::{ConfigureFacet, FacetTranslator};
use facetree_core::{RenderStateOptions, SearchParameters};
use serde_json::{Map, Value};

use crate::connector::{Connector, Refinement};

/// Block of raw search parameters applied to its index.
///
/// The live value of each configured key is mirrored into the `configure`
/// slot of the UI state; the parameters given at construction are exposed as
/// the widget params of its render state.
#[derive(Debug, Clone, Default)]
pub struct Configure {
    facet: ConfigureFacet,
}

impl Configure {
    #[must_use]
    pub fn new(parameters: Map<String, Value>) -> Self {
        Self {
            facet: ConfigureFacet::new(parameters),
        }
    }

    #[must_use]
    pub fn parameters(&self) -> &Map<String, Value> {
        &self.facet.parameters
    }

    /// Merge `parameters` into the ones applied by the widget.
    pub fn refine(parameters: Map<String, Value>) -> Refinement {
        Box::new(move |params| params.with_plain_parameters(&parameters))
    }
}

impl Connector for Configure {
    fn widget_type(&self) -> &'static str {
        "configure"
    }

    fn widget_params(&self) -> Value {
        Value::Object(self.facet.parameters.clone())
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, _options: &RenderStateOptions<'_>) -> Map<String, Value> {
        Map::new()
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        let base = SearchParameters::new(params.index());
        Some(
            params
                .clone()
                .without_plain_parameters(&self.facet.parameters, &base),
        )
    }
}
