use facetree_core::RenderStateOptions;
use serde_json::{Map, Value, json};

use crate::connector::Connector;

/// Current page of hits, each tagged with its absolute `__position`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hits;

impl Hits {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Connector for Hits {
    fn widget_type(&self) -> &'static str {
        "hits"
    }

    fn widget_params(&self) -> Value {
        json!({})
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let mut data = Map::new();
        let Some(results) = options.results else {
            data.insert("hits".into(), Value::Array(Vec::new()));
            data.insert("results".into(), Value::Null);
            return data;
        };
        let offset = results.page as usize * results.hits_per_page as usize;
        let hits = results
            .hits
            .iter()
            .enumerate()
            .map(|(position, hit)| {
                let mut hit = hit.clone();
                if let Value::Object(fields) = &mut hit {
                    fields.insert("__position".into(), Value::from(offset + position + 1));
                }
                hit
            })
            .collect();
        data.insert("hits".into(), Value::Array(hits));
        data.insert(
            "results".into(),
            json!({
                "index": results.index,
                "query": results.query,
                "nbHits": results.nb_hits,
                "page": results.page,
                "nbPages": results.nb_pages,
            }),
        );
        data
    }
}
