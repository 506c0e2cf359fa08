use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum and maximum observed for a numeric facet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacetStats {
    pub min: f64,
    pub max: f64,
}

/// One page of results returned by the search client for a single index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchResults {
    pub index: String,
    pub query: String,
    pub hits: Vec<Value>,
    pub nb_hits: usize,
    /// Zero-based page.
    pub page: u32,
    pub nb_pages: u32,
    pub hits_per_page: u32,
    /// Value counts per faceted attribute.
    pub facets: IndexMap<String, IndexMap<String, usize>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub facets_stats: IndexMap<String, FacetStats>,
    pub processing_time_ms: u64,
}

impl SearchResults {
    /// Counts for `attribute`, in the order the client returned them.
    pub fn facet_values(&self, attribute: &str) -> impl Iterator<Item = (&str, usize)> {
        self.facets
            .get(attribute)
            .into_iter()
            .flat_map(|values| values.iter().map(|(value, count)| (value.as_str(), *count)))
    }

    #[must_use]
    pub fn first_hit(&self) -> Option<&Value> {
        self.hits.first()
    }
}
