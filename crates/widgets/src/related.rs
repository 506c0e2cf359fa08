use std::fmt;

use facetree_core::{Capabilities, RenderStateOptions, SearchParameters, SearchParametersOptions};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::connector::Connector;

/// Weight given to hits sharing the seed hit's value of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingPattern {
    pub score: u32,
}

/// Final adjustment applied to the parameters the widget derived.
pub type ParameterTransform = Box<dyn Fn(SearchParameters) -> SearchParameters>;

/// Turns its index into a "related items" list for one seed hit.
///
/// Every matching pattern becomes optional filters scored by the pattern,
/// and the seed hit itself is filtered out by `objectID`.
pub struct ConfigureRelatedItems {
    hit: Value,
    matching_patterns: IndexMap<String, MatchingPattern>,
    transform: Option<ParameterTransform>,
}

impl ConfigureRelatedItems {
    #[must_use]
    pub fn new(hit: Value, matching_patterns: IndexMap<String, MatchingPattern>) -> Self {
        Self {
            hit,
            matching_patterns,
            transform: None,
        }
    }

    #[must_use]
    pub fn with_transform(
        mut self,
        transform: impl Fn(SearchParameters) -> SearchParameters + 'static,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// `attribute:value<score=N>` for every value of every matching attribute.
    #[must_use]
    pub fn optional_filters(&self) -> Vec<String> {
        let mut filters = Vec::new();
        for (attribute, pattern) in &self.matching_patterns {
            let values = match lookup(&self.hit, attribute) {
                Some(Value::Array(items)) => items.iter().filter_map(scalar).collect(),
                Some(value) => scalar(value).into_iter().collect(),
                None => {
                    tracing::debug!(%attribute, "seed hit has no value for matching pattern");
                    Vec::new()
                }
            };
            filters.extend(
                values
                    .into_iter()
                    .map(|value| format!("{attribute}:{value}<score={}>", pattern.score)),
            );
        }
        filters
    }

    fn exclusion(&self) -> Option<String> {
        self.hit
            .get("objectID")
            .and_then(scalar)
            .map(|id| format!("NOT objectID:{id}"))
    }
}

fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |value, key| value.get(key))
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// `filters` with `clause` ANDed in once.
fn with_clause(filters: Option<&str>, clause: &str) -> String {
    match without_clause(filters, clause) {
        Some(rest) => format!("{rest} AND {clause}"),
        None => clause.to_string(),
    }
}

fn without_clause(filters: Option<&str>, clause: &str) -> Option<String> {
    let rest: Vec<&str> = filters?
        .split(" AND ")
        .filter(|existing| !existing.is_empty() && *existing != clause)
        .collect();
    (!rest.is_empty()).then(|| rest.join(" AND "))
}

impl Connector for ConfigureRelatedItems {
    fn widget_type(&self) -> &'static str {
        "configureRelatedItems"
    }

    fn widget_params(&self) -> Value {
        json!({
            "hit": self.hit.get("objectID"),
            "matchingPatterns": self.matching_patterns,
        })
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::INIT
            | Capabilities::RENDER
            | Capabilities::DISPOSE
            | Capabilities::RENDER_STATE
            | Capabilities::SEARCH_PARAMETERS
    }

    fn search_parameters(
        &self,
        params: SearchParameters,
        _options: &SearchParametersOptions<'_>,
    ) -> SearchParameters {
        let filters = match self.exclusion() {
            Some(exclusion) => Some(with_clause(params.filters(), &exclusion)),
            None => params.filters().map(str::to_string),
        };
        let params = params
            .with_optional_filters(self.optional_filters())
            .with_filters(filters);
        match &self.transform {
            Some(transform) => transform(params),
            None => params,
        }
    }

    fn render_data(&self, _options: &RenderStateOptions<'_>) -> Map<String, Value> {
        Map::new()
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        let filters = match self.exclusion() {
            Some(exclusion) => without_clause(params.filters(), &exclusion),
            None => params.filters().map(str::to_string),
        };
        Some(
            params
                .clone()
                .with_optional_filters(Vec::new())
                .with_filters(filters),
        )
    }
}

impl fmt::Debug for ConfigureRelatedItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigureRelatedItems")
            .field("hit", &self.hit)
            .field("matching_patterns", &self.matching_patterns)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_patterns_become_scored_optional_filters() {
        let widget = ConfigureRelatedItems::new(
            json!({ "objectID": "1", "brand": "Apple", "categories": ["Phones", "Smart"] }),
            IndexMap::from([
                ("brand".to_string(), MatchingPattern { score: 3 }),
                ("categories".to_string(), MatchingPattern { score: 2 }),
                ("missing".to_string(), MatchingPattern { score: 1 }),
            ]),
        );
        assert_eq!(
            widget.optional_filters(),
            vec![
                "brand:Apple<score=3>",
                "categories:Phones<score=2>",
                "categories:Smart<score=2>",
            ]
        );
        assert_eq!(widget.exclusion().as_deref(), Some("NOT objectID:1"));
    }
}
