use facetree_core::translate::{FacetTranslator, GeoSearchFacet, PLACES_LABEL_PARAMETER, PlacesFacet};
use facetree_core::{BoundingBox, LatLng, RenderStateOptions, SearchParameters};
use serde_json::{Map, Value, json};

use crate::connector::{Connector, Refinement};

/// Map viewport filtering hits to a bounding box.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoSearch {
    facet: GeoSearchFacet,
}

impl GeoSearch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refine(bounding_box: BoundingBox) -> Refinement {
        Box::new(move |params| {
            params
                .with_inside_bounding_box(Some(bounding_box))
                .with_page(None)
        })
    }

    pub fn clear_map_refinement() -> Refinement {
        Box::new(|params| params.with_inside_bounding_box(None).with_page(None))
    }
}

impl Connector for GeoSearch {
    fn widget_type(&self) -> &'static str {
        "geoSearch"
    }

    fn widget_params(&self) -> Value {
        json!({})
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let items: Vec<Value> = options
            .results
            .into_iter()
            .flat_map(|results| results.hits.iter())
            .filter(|hit| hit.get("_geoloc").is_some())
            .cloned()
            .collect();
        let current = options.parameters.inside_bounding_box();

        let mut data = Map::new();
        data.insert("items".into(), Value::Array(items));
        data.insert(
            "currentRefinement".into(),
            current.map_or(Value::Null, |bounding_box| json!(bounding_box)),
        );
        data.insert(
            "position".into(),
            options
                .parameters
                .around_lat_lng()
                .map_or(Value::Null, |position| json!(position)),
        );
        data.insert("isRefinedWithMap".into(), Value::from(current.is_some()));
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(params.clone().with_inside_bounding_box(None))
    }
}

/// Place picker centering the search around a labelled position.
#[derive(Debug, Clone, Copy, Default)]
pub struct Places {
    facet: PlacesFacet,
}

impl Places {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refine(label: impl Into<String>, position: LatLng) -> Refinement {
        let label = label.into();
        Box::new(move |params| {
            params
                .with_around_lat_lng(Some(position))
                .with_query_parameter(PLACES_LABEL_PARAMETER, Value::from(label))
                .with_page(None)
        })
    }
}

impl Connector for Places {
    fn widget_type(&self) -> &'static str {
        "places"
    }

    fn widget_params(&self) -> Value {
        json!({})
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert(
            "query".into(),
            options
                .parameters
                .query_parameter(PLACES_LABEL_PARAMETER)
                .unwrap_or(Value::Null),
        );
        data.insert(
            "position".into(),
            options
                .parameters
                .around_lat_lng()
                .map_or(Value::Null, |position| Value::from(position.to_string())),
        );
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(
            params
                .clone()
                .with_around_lat_lng(None)
                .with_query_parameter(PLACES_LABEL_PARAMETER, Value::Null),
        )
    }
}
