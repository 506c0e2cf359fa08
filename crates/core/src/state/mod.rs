//! Serializable UI state and per-pass render state.

pub mod grammar;
mod render;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use grammar::{BoundingBox, LatLng, NumericBounds};
pub use render::{IndexRenderState, RenderContribution, RenderEntry, RenderState, WidgetRenderState};

/// Geo search refinement; `bounding_box` uses the `"lat1,lng1,lat2,lng2"` encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoSearchState {
    pub bounding_box: String,
}

/// Places refinement; `position` uses the `"lat,lng"` encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacesState {
    pub query: String,
    pub position: String,
}

/// Flat, serializable state of one index.
///
/// Absent facets mean "no refinement of that kind". Keys not known to this
/// type are preserved in [`custom`](Self::custom).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexUiState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub refinement_list: IndexMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub menu: IndexMap<String, String>,
    /// Cumulative levels per hierarchical facet, e.g. `["Audio", "Audio > Headphones"]`.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub hierarchical_menu: IndexMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub numeric_menu: IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub rating_menu: IndexMap<String, u32>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub range: IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub toggle: IndexMap<String, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_search: Option<GeoSearchState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// One-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hits_per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configure: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub places: Option<PlacesState>,
    #[serde(flatten)]
    pub custom: IndexMap<String, Value>,
}

impl IndexUiState {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `top` laid over `self`: facets and attributes present in `top` win.
    #[must_use]
    pub fn overlaid_with(mut self, top: IndexUiState) -> Self {
        self.query = top.query.or(self.query);
        self.refinement_list.extend(top.refinement_list);
        self.menu.extend(top.menu);
        self.hierarchical_menu.extend(top.hierarchical_menu);
        self.numeric_menu.extend(top.numeric_menu);
        self.rating_menu.extend(top.rating_menu);
        self.range.extend(top.range);
        self.toggle.extend(top.toggle);
        self.geo_search = top.geo_search.or(self.geo_search);
        self.sort_by = top.sort_by.or(self.sort_by);
        self.page = top.page.or(self.page);
        self.hits_per_page = top.hits_per_page.or(self.hits_per_page);
        self.configure = match (self.configure, top.configure) {
            (Some(mut configure), Some(top)) => {
                configure.extend(top);
                Some(configure)
            }
            (configure, top) => top.or(configure),
        };
        self.places = top.places.or(self.places);
        self.custom.extend(top.custom);
        self
    }
}

/// UI state of a whole tree, keyed by index state key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UiState(IndexMap<String, IndexUiState>);

impl UiState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&IndexUiState> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, state: IndexUiState) -> Option<IndexUiState> {
        self.0.insert(key.into(), state)
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, state: IndexUiState) -> Self {
        self.insert(key, state);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<IndexUiState> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexUiState)> {
        self.0.iter().map(|(key, state)| (key.as_str(), state))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, IndexUiState)> for UiState {
    fn from_iter<I: IntoIterator<Item = (String, IndexUiState)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for UiState {
    type Item = (String, IndexUiState);
    type IntoIter = indexmap::map::IntoIter<String, IndexUiState>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_facets_are_not_serialized() {
        let state = IndexUiState {
            query: Some("phone".into()),
            ..IndexUiState::default()
        };
        assert_eq!(serde_json::to_value(&state).expect("serialize"), json!({ "query": "phone" }));
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let raw = json!({
            "refinementList": { "brand": ["Apple"] },
            "page": 2,
            "customFacet": { "x": 1 },
        });
        let state: IndexUiState = serde_json::from_value(raw.clone()).expect("deserialize");
        assert_eq!(state.refinement_list["brand"], vec!["Apple".to_string()]);
        assert_eq!(state.page, Some(2));
        assert_eq!(state.custom["customFacet"], json!({ "x": 1 }));
        assert_eq!(serde_json::to_value(&state).expect("serialize"), raw);
    }

    #[test]
    fn overlay_keeps_attributes_missing_from_the_top() {
        let routed: IndexUiState = serde_json::from_value(json!({
            "query": "tv",
            "refinementList": { "brand": ["Apple"], "color": ["red"] },
            "configure": { "hitsPerPage": 4 },
        }))
        .expect("deserialize");
        let live: IndexUiState = serde_json::from_value(json!({
            "refinementList": { "color": ["blue"] },
            "configure": { "analytics": false },
        }))
        .expect("deserialize");

        let merged = routed.overlaid_with(live);
        assert_eq!(
            serde_json::to_value(&merged).expect("serialize"),
            json!({
                "query": "tv",
                "refinementList": { "brand": ["Apple"], "color": ["blue"] },
                "configure": { "hitsPerPage": 4, "analytics": false },
            })
        );
    }

    #[test]
    fn ui_state_keeps_insertion_order() {
        let state = UiState::new()
            .with("b", IndexUiState::default())
            .with("a", IndexUiState::default());
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
