use facetree_core::translate::{FacetTranslator, NumericMenuFacet, RangeFacet, RatingMenuFacet};
use facetree_core::{NumericBounds, RenderStateOptions, SearchParameters};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::connector::{Connector, Refinement};

/// One predefined option of a [`NumericMenu`]; no bound at all means "All".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericMenuItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

impl NumericMenuItem {
    /// Encoded value of the option: `""`, a bare number or `"<min>:<max>"`.
    #[must_use]
    pub fn encoded(&self) -> String {
        match (self.start, self.end) {
            (None, None) => String::new(),
            (Some(start), Some(end)) if start == end => start.to_string(),
            (start, end) => NumericBounds::new(start, end).to_string(),
        }
    }
}

/// Menu of predefined numeric ranges.
#[derive(Debug, Clone)]
pub struct NumericMenu {
    facet: NumericMenuFacet,
    items: Vec<NumericMenuItem>,
}

impl NumericMenu {
    #[must_use]
    pub fn new(attribute: impl Into<String>, items: Vec<NumericMenuItem>) -> Self {
        Self {
            facet: NumericMenuFacet::new(attribute),
            items,
        }
    }

    /// Apply an encoded option; the empty string clears the refinement.
    pub fn refine(&self, encoded: impl Into<String>) -> Refinement {
        let facet = self.facet.clone();
        let encoded = encoded.into();
        Box::new(move |params| facet.with_encoded(params, Some(&encoded)).with_page(None))
    }
}

impl Connector for NumericMenu {
    fn widget_type(&self) -> &'static str {
        "numericMenu"
    }

    fn attribute(&self) -> Option<&str> {
        Some(&self.facet.attribute)
    }

    fn widget_params(&self) -> Value {
        json!({ "attribute": self.facet.attribute, "items": self.items })
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let current = self.facet.encoded(options.parameters).unwrap_or_default();
        let items: Vec<Value> = self
            .items
            .iter()
            .map(|item| {
                let value = item.encoded();
                json!({
                    "label": item.label,
                    "value": value,
                    "isRefined": value == current,
                })
            })
            .collect();
        let has_no_results = options.results.is_none_or(|results| results.nb_hits == 0);

        let mut data = Map::new();
        data.insert("items".into(), Value::Array(items));
        data.insert("hasNoResults".into(), Value::from(has_no_results));
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(params.clone().clear_numeric_refinements(&self.facet.attribute))
    }
}

pub const DEFAULT_MAX_RATING: u32 = 5;

/// Minimum star rating.
#[derive(Debug, Clone)]
pub struct RatingMenu {
    facet: RatingMenuFacet,
    max: u32,
}

impl RatingMenu {
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            facet: RatingMenuFacet::new(attribute),
            max: DEFAULT_MAX_RATING,
        }
    }

    #[must_use]
    pub fn with_max(mut self, max: u32) -> Self {
        self.max = max;
        self
    }

    /// Require at least `rating` stars; selecting the current rating clears it.
    pub fn refine(&self, rating: u32) -> Refinement {
        let facet = self.facet.clone();
        Box::new(move |params| {
            let next = (facet.rating(&params) != Some(rating)).then_some(rating);
            facet.with_rating(params, next).with_page(None)
        })
    }
}

impl Connector for RatingMenu {
    fn widget_type(&self) -> &'static str {
        "ratingMenu"
    }

    fn attribute(&self) -> Option<&str> {
        Some(&self.facet.attribute)
    }

    fn widget_params(&self) -> Value {
        json!({ "attribute": self.facet.attribute, "max": self.max })
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let current = self.facet.rating(options.parameters);
        let counts: Vec<(f64, usize)> = options
            .results
            .into_iter()
            .flat_map(|results| results.facet_values(&self.facet.attribute))
            .filter_map(|(value, count)| value.parse::<f64>().ok().map(|value| (value, count)))
            .collect();
        let items: Vec<Value> = (1..self.max)
            .rev()
            .map(|rating| {
                let count: usize = counts
                    .iter()
                    .filter(|(value, _)| *value >= f64::from(rating))
                    .map(|(_, count)| count)
                    .sum();
                let stars: Vec<bool> = (0..self.max).map(|star| star < rating).collect();
                json!({
                    "value": rating.to_string(),
                    "label": rating.to_string(),
                    "stars": stars,
                    "count": count,
                    "isRefined": current == Some(rating),
                })
            })
            .collect();

        let mut data = Map::new();
        data.insert("items".into(), Value::Array(items));
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(params.clone().clear_numeric_refinements(&self.facet.attribute))
    }
}

/// Continuous numeric range with optional fixed outer bounds.
#[derive(Debug, Clone)]
pub struct Range {
    facet: RangeFacet,
    min: Option<f64>,
    max: Option<f64>,
}

impl Range {
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            facet: RangeFacet::new(attribute),
            min: None,
            max: None,
        }
    }

    /// Fix the outer bounds instead of reading them from facet stats.
    #[must_use]
    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Refine to `[min, max]`, clamped to the configured outer bounds.
    pub fn refine(&self, min: Option<f64>, max: Option<f64>) -> Refinement {
        let facet = self.facet.clone();
        let bounds = NumericBounds::new(
            clamp(min, self.min, self.max),
            clamp(max, self.min, self.max),
        );
        Box::new(move |params| facet.with_bounds(params, bounds).with_page(None))
    }
}

fn clamp(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> Option<f64> {
    let value = value?;
    let value = min.map_or(value, |min| value.max(min));
    Some(max.map_or(value, |max| value.min(max)))
}

impl Connector for Range {
    fn widget_type(&self) -> &'static str {
        "range"
    }

    fn attribute(&self) -> Option<&str> {
        Some(&self.facet.attribute)
    }

    fn widget_params(&self) -> Value {
        json!({ "attribute": self.facet.attribute, "min": self.min, "max": self.max })
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let stats = options
            .results
            .and_then(|results| results.facets_stats.get(&self.facet.attribute));
        let min = self.min.or(stats.map(|stats| stats.min));
        let max = self.max.or(stats.map(|stats| stats.max));
        let current = self.facet.bounds(options.parameters);

        let mut data = Map::new();
        data.insert("range".into(), json!({ "min": min, "max": max }));
        data.insert(
            "start".into(),
            json!([current.min.or(min), current.max.or(max)]),
        );
        data.insert(
            "canRefine".into(),
            Value::from(matches!((min, max), (Some(min), Some(max)) if min < max)),
        );
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(params.clone().clear_numeric_refinements(&self.facet.attribute))
    }
}
