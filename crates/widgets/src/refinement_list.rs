use facetree_core::translate::{FacetTranslator, RefinementListFacet, RefinementOperator};
use facetree_core::{RenderStateOptions, SearchParameters};
use serde_json::{Map, Value, json};

use crate::connector::{Connector, Refinement};

pub const DEFAULT_LIMIT: usize = 10;

/// Checkbox list over the values of one attribute.
#[derive(Debug, Clone)]
pub struct RefinementList {
    facet: RefinementListFacet,
    limit: usize,
}

impl RefinementList {
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            facet: RefinementListFacet::new(attribute, RefinementOperator::default()),
            limit: DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_operator(mut self, operator: RefinementOperator) -> Self {
        self.facet.operator = operator;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Select `value` if it is not refined yet, unselect it otherwise.
    pub fn toggle(&self, value: impl Into<String>) -> Refinement {
        let facet = self.facet.clone();
        let value = value.into();
        Box::new(move |params| toggled(&facet, params, &value))
    }
}

fn toggled(facet: &RefinementListFacet, params: SearchParameters, value: &str) -> SearchParameters {
    let mut values = facet.refined(&params).to_vec();
    match values.iter().position(|refined| refined == value) {
        Some(position) => {
            values.remove(position);
        }
        None => values.push(value.to_string()),
    }
    values.iter().fold(
        facet.cleared(params).with_page(None),
        |params, value| facet.with_value(params, value),
    )
}

impl Connector for RefinementList {
    fn widget_type(&self) -> &'static str {
        "refinementList"
    }

    fn attribute(&self) -> Option<&str> {
        Some(&self.facet.attribute)
    }

    fn widget_params(&self) -> Value {
        json!({
            "attribute": self.facet.attribute,
            "operator": self.facet.operator,
            "limit": self.limit,
        })
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let refined = self.facet.refined(options.parameters);
        let mut values: Vec<(String, usize)> = options
            .results
            .map(|results| {
                results
                    .facet_values(&self.facet.attribute)
                    .map(|(value, count)| (value.to_string(), count))
                    .collect()
            })
            .unwrap_or_default();
        for value in refined {
            if !values.iter().any(|(known, _)| known == value) {
                values.push((value.clone(), 0));
            }
        }
        values.sort_by_key(|(value, _)| !refined.contains(value));
        values.truncate(self.limit);

        let items: Vec<Value> = values
            .into_iter()
            .map(|(value, count)| {
                let url = options.create_url_for(
                    |params| toggled(&self.facet, params, &value),
                    |params, state| self.facet.to_ui_state(params, state),
                );
                json!({
                    "value": value,
                    "label": value,
                    "count": count,
                    "isRefined": refined.contains(&value),
                    "url": url,
                })
            })
            .collect();

        let mut data = Map::new();
        data.insert("canRefine".into(), Value::from(!items.is_empty()));
        data.insert("items".into(), Value::Array(items));
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(self.facet.cleared(params.clone()))
    }
}
