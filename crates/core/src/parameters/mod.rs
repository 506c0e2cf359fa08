//! Query parameter value object consumed by the search client.
//!
//! [`SearchParameters`] is immutable from the outside: every update consumes
//! the value and returns the new one, so widgets can be handed the current
//! parameters and express their contribution as a pure transformation.

mod numeric;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::{BoundingBox, LatLng};

pub use numeric::NumericOperator;

/// Default separator between the levels of a hierarchical facet value.
pub const DEFAULT_HIERARCHICAL_SEPARATOR: &str = " > ";

/// Declaration of a hierarchical facet spanning one attribute per level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalFacet {
    pub name: String,
    pub attributes: Vec<String>,
    pub separator: String,
}

impl HierarchicalFacet {
    #[must_use]
    pub fn new(attributes: Vec<String>, separator: impl Into<String>) -> Self {
        let name = attributes.first().cloned().unwrap_or_default();
        Self {
            name,
            attributes,
            separator: separator.into(),
        }
    }
}

/// Filters, pagination and sorting for one index query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParameters {
    index: String,
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hits_per_page: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    facets: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    disjunctive_facets: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hierarchical_facets: Vec<HierarchicalFacet>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    facets_refinements: IndexMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    disjunctive_facets_refinements: IndexMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    hierarchical_facets_refinements: IndexMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    numeric_refinements: IndexMap<String, IndexMap<NumericOperator, Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inside_bounding_box: Option<BoundingBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    around_lat_lng: Option<LatLng>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    optional_words: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    optional_filters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<String>,
    #[serde(flatten)]
    extra: IndexMap<String, Value>,
}

impl SearchParameters {
    #[must_use]
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn index(&self) -> &str {
        &self.index
    }

    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Zero-based page, `None` when never set.
    #[must_use]
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    #[must_use]
    pub fn with_page(mut self, page: Option<u32>) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn hits_per_page(&self) -> Option<u32> {
        self.hits_per_page
    }

    #[must_use]
    pub fn with_hits_per_page(mut self, hits_per_page: Option<u32>) -> Self {
        self.hits_per_page = hits_per_page;
        self
    }

    #[must_use]
    pub fn facets(&self) -> &[String] {
        &self.facets
    }

    #[must_use]
    pub fn disjunctive_facets(&self) -> &[String] {
        &self.disjunctive_facets
    }

    #[must_use]
    pub fn hierarchical_facets(&self) -> &[HierarchicalFacet] {
        &self.hierarchical_facets
    }

    #[must_use]
    pub fn hierarchical_facet(&self, name: &str) -> Option<&HierarchicalFacet> {
        self.hierarchical_facets
            .iter()
            .find(|facet| facet.name == name)
    }

    #[must_use]
    pub fn add_facet(mut self, attribute: impl Into<String>) -> Self {
        push_unique(&mut self.facets, attribute.into());
        self
    }

    #[must_use]
    pub fn add_disjunctive_facet(mut self, attribute: impl Into<String>) -> Self {
        push_unique(&mut self.disjunctive_facets, attribute.into());
        self
    }

    /// Declare a hierarchical facet, replacing any declaration with the same name.
    #[must_use]
    pub fn add_hierarchical_facet(mut self, facet: HierarchicalFacet) -> Self {
        match self
            .hierarchical_facets
            .iter_mut()
            .find(|existing| existing.name == facet.name)
        {
            Some(existing) => *existing = facet,
            None => self.hierarchical_facets.push(facet),
        }
        self
    }

    #[must_use]
    pub fn facet_refinements(&self, attribute: &str) -> &[String] {
        refinements_for(&self.facets_refinements, attribute)
    }

    #[must_use]
    pub fn disjunctive_refinements(&self, attribute: &str) -> &[String] {
        refinements_for(&self.disjunctive_facets_refinements, attribute)
    }

    /// Full path currently selected for the hierarchical facet `name`.
    #[must_use]
    pub fn hierarchical_refinement(&self, name: &str) -> Option<&str> {
        self.hierarchical_facets_refinements
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn all_facet_refinements(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.facets_refinements
            .iter()
            .map(|(attribute, values)| (attribute.as_str(), values.as_slice()))
    }

    pub fn all_disjunctive_refinements(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.disjunctive_facets_refinements
            .iter()
            .map(|(attribute, values)| (attribute.as_str(), values.as_slice()))
    }

    pub fn all_hierarchical_refinements(&self) -> impl Iterator<Item = (&str, &str)> {
        self.hierarchical_facets_refinements
            .iter()
            .filter_map(|(name, values)| Some((name.as_str(), values.first()?.as_str())))
    }

    #[must_use]
    pub fn is_facet_refined(&self, attribute: &str, value: &str) -> bool {
        self.facet_refinements(attribute)
            .iter()
            .any(|refined| refined == value)
    }

    #[must_use]
    pub fn is_disjunctive_refined(&self, attribute: &str, value: &str) -> bool {
        self.disjunctive_refinements(attribute)
            .iter()
            .any(|refined| refined == value)
    }

    #[must_use]
    pub fn add_facet_refinement(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let values = self.facets_refinements.entry(attribute.into()).or_default();
        push_unique(values, value.into());
        self
    }

    #[must_use]
    pub fn clear_facet_refinements(mut self, attribute: &str) -> Self {
        self.facets_refinements.shift_remove(attribute);
        self
    }

    #[must_use]
    pub fn add_disjunctive_refinement(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let values = self
            .disjunctive_facets_refinements
            .entry(attribute.into())
            .or_default();
        push_unique(values, value.into());
        self
    }

    #[must_use]
    pub fn clear_disjunctive_refinements(mut self, attribute: &str) -> Self {
        self.disjunctive_facets_refinements.shift_remove(attribute);
        self
    }

    #[must_use]
    pub fn with_hierarchical_refinement(mut self, name: &str, path: Option<String>) -> Self {
        match path {
            Some(path) => {
                self.hierarchical_facets_refinements
                    .insert(name.to_string(), vec![path]);
            }
            None => {
                self.hierarchical_facets_refinements.shift_remove(name);
            }
        }
        self
    }

    #[must_use]
    pub fn numeric_refinements(&self, attribute: &str) -> Option<&IndexMap<NumericOperator, Vec<f64>>> {
        self.numeric_refinements.get(attribute)
    }

    pub fn all_numeric_refinements(
        &self,
    ) -> impl Iterator<Item = (&str, &IndexMap<NumericOperator, Vec<f64>>)> {
        self.numeric_refinements
            .iter()
            .map(|(attribute, operators)| (attribute.as_str(), operators))
    }

    /// First value registered for `operator` on `attribute`.
    #[must_use]
    pub fn numeric_value(&self, attribute: &str, operator: NumericOperator) -> Option<f64> {
        self.numeric_refinements
            .get(attribute)
            .and_then(|operators| operators.get(&operator))
            .and_then(|values| values.first())
            .copied()
    }

    #[must_use]
    pub fn add_numeric_refinement(
        mut self,
        attribute: impl Into<String>,
        operator: NumericOperator,
        value: f64,
    ) -> Self {
        let values = self
            .numeric_refinements
            .entry(attribute.into())
            .or_default()
            .entry(operator)
            .or_default();
        if !values.contains(&value) {
            values.push(value);
        }
        self
    }

    #[must_use]
    pub fn clear_numeric_refinements(mut self, attribute: &str) -> Self {
        self.numeric_refinements.shift_remove(attribute);
        self
    }

    /// Remove every kind of refinement registered for `attribute`.
    #[must_use]
    pub fn clear_refinements(self, attribute: &str) -> Self {
        self.clear_facet_refinements(attribute)
            .clear_disjunctive_refinements(attribute)
            .with_hierarchical_refinement(attribute, None)
            .clear_numeric_refinements(attribute)
    }

    #[must_use]
    pub fn inside_bounding_box(&self) -> Option<&BoundingBox> {
        self.inside_bounding_box.as_ref()
    }

    #[must_use]
    pub fn with_inside_bounding_box(mut self, bounding_box: Option<BoundingBox>) -> Self {
        self.inside_bounding_box = bounding_box;
        self
    }

    #[must_use]
    pub fn around_lat_lng(&self) -> Option<&LatLng> {
        self.around_lat_lng.as_ref()
    }

    #[must_use]
    pub fn with_around_lat_lng(mut self, position: Option<LatLng>) -> Self {
        self.around_lat_lng = position;
        self
    }

    #[must_use]
    pub fn optional_words(&self) -> &[String] {
        &self.optional_words
    }

    #[must_use]
    pub fn with_optional_words(mut self, words: Vec<String>) -> Self {
        self.optional_words = words;
        self
    }

    #[must_use]
    pub fn optional_filters(&self) -> &[String] {
        &self.optional_filters
    }

    #[must_use]
    pub fn with_optional_filters(mut self, filters: Vec<String>) -> Self {
        self.optional_filters = filters;
        self
    }

    #[must_use]
    pub fn filters(&self) -> Option<&str> {
        self.filters.as_deref()
    }

    #[must_use]
    pub fn with_filters(mut self, filters: Option<String>) -> Self {
        self.filters = filters;
        self
    }

    /// Read a parameter by its serialized (camelCase) name.
    #[must_use]
    pub fn query_parameter(&self, key: &str) -> Option<Value> {
        match key {
            "index" => Some(Value::from(self.index.clone())),
            "query" => Some(Value::from(self.query.clone())),
            "page" => self.page.map(Value::from),
            "hitsPerPage" => self.hits_per_page.map(Value::from),
            "optionalWords" => non_empty(&self.optional_words),
            "optionalFilters" => non_empty(&self.optional_filters),
            "filters" => self.filters.clone().map(Value::from),
            "aroundLatLng" => self.around_lat_lng.map(|p| Value::from(p.to_string())),
            "insideBoundingBox" => self.inside_bounding_box.map(|b| Value::from(b.to_string())),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Set a parameter by its serialized (camelCase) name. `null` resets it.
    ///
    /// Values of the wrong shape for a known parameter are ignored.
    #[must_use]
    pub fn with_query_parameter(mut self, key: &str, value: Value) -> Self {
        match key {
            "index" => {
                if let Some(index) = value.as_str() {
                    self.index = index.to_string();
                }
            }
            "query" => self.query = value.as_str().unwrap_or_default().to_string(),
            "page" => self.page = as_u32(&value),
            "hitsPerPage" => self.hits_per_page = as_u32(&value),
            "optionalWords" => self.optional_words = string_list(&value),
            "optionalFilters" => self.optional_filters = string_list(&value),
            "filters" => self.filters = value.as_str().map(str::to_string),
            "aroundLatLng" => {
                self.around_lat_lng = value.as_str().and_then(|raw| raw.parse().ok());
            }
            "insideBoundingBox" => {
                self.inside_bounding_box = value.as_str().and_then(|raw| raw.parse().ok());
            }
            other => {
                if value.is_null() {
                    self.extra.shift_remove(other);
                } else {
                    self.extra.insert(other.to_string(), value);
                }
            }
        }
        self
    }

    /// Apply every entry of a plain parameter object in order.
    #[must_use]
    pub fn with_plain_parameters(self, plain: &Map<String, Value>) -> Self {
        plain
            .iter()
            .fold(self, |params, (key, value)| {
                params.with_query_parameter(key, value.clone())
            })
    }

    /// Reset every key of `plain` to what `base` holds for it.
    #[must_use]
    pub fn without_plain_parameters(self, plain: &Map<String, Value>, base: &Self) -> Self {
        plain.keys().fold(self, |params, key| {
            let restored = base.query_parameter(key).unwrap_or(Value::Null);
            params.with_query_parameter(key, restored)
        })
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

fn refinements_for<'a>(map: &'a IndexMap<String, Vec<String>>, attribute: &str) -> &'a [String] {
    map.get(attribute).map(Vec::as_slice).unwrap_or_default()
}

fn non_empty(values: &[String]) -> Option<Value> {
    (!values.is_empty()).then(|| Value::from(values.to_vec()))
}

fn as_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|raw| u32::try_from(raw).ok())
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Value::String(raw) => raw.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests;
