use facetree_core::translate::{FacetTranslator, ToggleFacet};
use facetree_core::{RenderStateOptions, SearchParameters};
use serde_json::{Map, Value, json};

use crate::connector::{Connector, Refinement};

/// On/off switch for one attribute value.
#[derive(Debug, Clone)]
pub struct ToggleRefinement {
    facet: ToggleFacet,
}

impl ToggleRefinement {
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            facet: ToggleFacet::new(attribute),
        }
    }

    /// Values refined when the toggle is on and, optionally, off.
    #[must_use]
    pub fn with_values(mut self, on: impl Into<String>, off: Option<String>) -> Self {
        self.facet = self.facet.with_values(on, off);
        self
    }

    /// Flip the toggle.
    pub fn toggle(&self) -> Refinement {
        let facet = self.facet.clone();
        Box::new(move |params| {
            let on = !facet.is_on(&params);
            facet.with_state(params, on).with_page(None)
        })
    }
}

impl Connector for ToggleRefinement {
    fn widget_type(&self) -> &'static str {
        "toggleRefinement"
    }

    fn attribute(&self) -> Option<&str> {
        Some(&self.facet.attribute)
    }

    fn widget_params(&self) -> Value {
        json!({
            "attribute": self.facet.attribute,
            "on": self.facet.on,
            "off": self.facet.off,
        })
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let count = |value: &str| {
            options.results.and_then(|results| {
                results
                    .facet_values(&self.facet.attribute)
                    .find(|(candidate, _)| *candidate == value)
                    .map(|(_, count)| count)
            })
        };
        let is_refined = self.facet.is_on(options.parameters);

        let mut data = Map::new();
        data.insert(
            "value".into(),
            json!({
                "name": self.facet.attribute,
                "isRefined": is_refined,
                "count": count(&self.facet.on),
                "onFacetValue": { "count": count(&self.facet.on) },
                "offFacetValue": {
                    "count": self.facet.off.as_deref().map_or_else(
                        || options.results.map(|results| results.nb_hits),
                        count,
                    ),
                },
            }),
        );
        let can_refine = is_refined || count(&self.facet.on).is_some_and(|count| count > 0);
        data.insert("canRefine".into(), Value::from(can_refine));
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(params.clone().clear_disjunctive_refinements(&self.facet.attribute))
    }
}
