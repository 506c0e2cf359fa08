use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::FacetTranslator;
use crate::parameters::{
    DEFAULT_HIERARCHICAL_SEPARATOR, HierarchicalFacet, NumericOperator, SearchParameters,
};
use crate::state::grammar::{self, BoundingBox, LatLng, NumericBounds};
use crate::state::{GeoSearchState, IndexUiState, PlacesState};

/// Extra parameter carrying the label of the place selected by [`PlacesFacet`].
pub const PLACES_LABEL_PARAMETER: &str = "aroundLatLngLabel";

/// Free-text query.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryFacet;

impl FacetTranslator for QueryFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        if !params.query().is_empty() {
            state.query = Some(params.query().to_string());
        }
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        params.with_query(state.query.clone().unwrap_or_default())
    }
}

/// How the values of a refinement list combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefinementOperator {
    /// Every selected value must match (conjunctive facet).
    #[default]
    And,
    /// Any selected value may match (disjunctive facet).
    Or,
}

#[derive(Debug, Clone)]
pub struct RefinementListFacet {
    pub attribute: String,
    pub operator: RefinementOperator,
}

impl RefinementListFacet {
    #[must_use]
    pub fn new(attribute: impl Into<String>, operator: RefinementOperator) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
        }
    }

    /// Values currently refined for the attribute.
    #[must_use]
    pub fn refined<'a>(&self, params: &'a SearchParameters) -> &'a [String] {
        match self.operator {
            RefinementOperator::And => params.facet_refinements(&self.attribute),
            RefinementOperator::Or => params.disjunctive_refinements(&self.attribute),
        }
    }

    /// Declare the facet and drop its refinements.
    #[must_use]
    pub fn cleared(&self, params: SearchParameters) -> SearchParameters {
        match self.operator {
            RefinementOperator::And => params
                .add_facet(self.attribute.clone())
                .clear_facet_refinements(&self.attribute),
            RefinementOperator::Or => params
                .add_disjunctive_facet(self.attribute.clone())
                .clear_disjunctive_refinements(&self.attribute),
        }
    }

    #[must_use]
    pub fn with_value(&self, params: SearchParameters, value: &str) -> SearchParameters {
        match self.operator {
            RefinementOperator::And => params.add_facet_refinement(self.attribute.clone(), value),
            RefinementOperator::Or => {
                params.add_disjunctive_refinement(self.attribute.clone(), value)
            }
        }
    }
}

impl FacetTranslator for RefinementListFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        let values = self.refined(params);
        if values.is_empty() {
            state.refinement_list.shift_remove(&self.attribute);
        } else {
            state
                .refinement_list
                .insert(self.attribute.clone(), values.to_vec());
        }
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        let values = state
            .refinement_list
            .get(&self.attribute)
            .map(Vec::as_slice)
            .unwrap_or_default();
        values
            .iter()
            .fold(self.cleared(params), |params, value| {
                self.with_value(params, value)
            })
    }
}

/// Single-level hierarchical facet.
#[derive(Debug, Clone)]
pub struct MenuFacet {
    pub attribute: String,
}

impl MenuFacet {
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }

    #[must_use]
    pub fn declaration(&self) -> HierarchicalFacet {
        HierarchicalFacet::new(vec![self.attribute.clone()], DEFAULT_HIERARCHICAL_SEPARATOR)
    }
}

impl FacetTranslator for MenuFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        match params.hierarchical_refinement(&self.attribute) {
            Some(value) => {
                state
                    .menu
                    .insert(self.attribute.clone(), value.to_string());
            }
            None => {
                state.menu.shift_remove(&self.attribute);
            }
        }
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        let value = state
            .menu
            .get(&self.attribute)
            .filter(|value| !value.is_empty())
            .cloned();
        params
            .add_hierarchical_facet(self.declaration())
            .with_hierarchical_refinement(&self.attribute, value)
    }
}

/// Multi-level facet whose UI state lists the cumulative levels of the selected path.
#[derive(Debug, Clone)]
pub struct HierarchicalMenuFacet {
    pub attributes: Vec<String>,
    pub separator: String,
}

impl HierarchicalMenuFacet {
    #[must_use]
    pub fn new(attributes: Vec<String>) -> Self {
        Self {
            attributes,
            separator: DEFAULT_HIERARCHICAL_SEPARATOR.to_string(),
        }
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Name of the facet, the attribute of its first level.
    #[must_use]
    pub fn name(&self) -> &str {
        self.attributes.first().map(String::as_str).unwrap_or_default()
    }

    #[must_use]
    pub fn declaration(&self) -> HierarchicalFacet {
        HierarchicalFacet::new(self.attributes.clone(), self.separator.clone())
    }
}

impl FacetTranslator for HierarchicalMenuFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        let levels = params
            .hierarchical_refinement(self.name())
            .map(|path| grammar::hierarchical_levels(path, &self.separator))
            .unwrap_or_default();
        if levels.is_empty() {
            state.hierarchical_menu.shift_remove(self.name());
        } else {
            state
                .hierarchical_menu
                .insert(self.name().to_string(), levels);
        }
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        let levels = state
            .hierarchical_menu
            .get(self.name())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let path = match grammar::hierarchical_path(levels, &self.separator) {
            Ok(path) => path,
            Err(error) => {
                tracing::debug!(facet = self.name(), %error, "ignoring malformed hierarchical menu");
                None
            }
        };
        params
            .add_hierarchical_facet(self.declaration())
            .with_hierarchical_refinement(self.name(), path)
    }
}

/// Read a `>=`/`<=` pair registered on `attribute`.
fn numeric_bounds(params: &SearchParameters, attribute: &str) -> NumericBounds {
    NumericBounds::new(
        params.numeric_value(attribute, NumericOperator::Gte),
        params.numeric_value(attribute, NumericOperator::Lte),
    )
}

fn with_bounds(params: SearchParameters, attribute: &str, bounds: NumericBounds) -> SearchParameters {
    let params = match bounds.min {
        Some(min) => params.add_numeric_refinement(attribute, NumericOperator::Gte, min),
        None => params,
    };
    match bounds.max {
        Some(max) => params.add_numeric_refinement(attribute, NumericOperator::Lte, max),
        None => params,
    }
}

/// Predefined numeric options, encoded as `"<min>:<max>"` or a bare number for equality.
#[derive(Debug, Clone)]
pub struct NumericMenuFacet {
    pub attribute: String,
}

impl NumericMenuFacet {
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }

    /// Encode the refinement currently registered for the attribute.
    #[must_use]
    pub fn encoded(&self, params: &SearchParameters) -> Option<String> {
        if let Some(value) = params.numeric_value(&self.attribute, NumericOperator::Eq) {
            return Some(value.to_string());
        }
        let bounds = numeric_bounds(params, &self.attribute);
        (!bounds.is_unbounded()).then(|| bounds.to_string())
    }

    /// Replace the attribute's numeric refinement with the decoded `value`.
    #[must_use]
    pub fn with_encoded(&self, params: SearchParameters, value: Option<&str>) -> SearchParameters {
        let params = params.clear_numeric_refinements(&self.attribute);
        let Some(value) = value.filter(|value| !value.is_empty()) else {
            return params;
        };
        let decoded = if value.contains(':') {
            value.parse::<NumericBounds>().map(NumericOption::Between)
        } else {
            grammar::parse_number(value).map(NumericOption::Exactly)
        };
        match decoded {
            Ok(NumericOption::Between(bounds)) => with_bounds(params, &self.attribute, bounds),
            Ok(NumericOption::Exactly(number)) => {
                params.add_numeric_refinement(self.attribute.clone(), NumericOperator::Eq, number)
            }
            Err(error) => {
                tracing::debug!(attribute = %self.attribute, %error, "ignoring malformed numeric menu");
                params
            }
        }
    }
}

enum NumericOption {
    Between(NumericBounds),
    Exactly(f64),
}

impl FacetTranslator for NumericMenuFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        match self.encoded(params) {
            Some(value) => {
                state.numeric_menu.insert(self.attribute.clone(), value);
            }
            None => {
                state.numeric_menu.shift_remove(&self.attribute);
            }
        }
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        let value = state.numeric_menu.get(&self.attribute).map(String::as_str);
        self.with_encoded(params, value)
    }
}

/// Continuous numeric range, encoded as `"<min>:<max>"`.
#[derive(Debug, Clone)]
pub struct RangeFacet {
    pub attribute: String,
}

impl RangeFacet {
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }

    #[must_use]
    pub fn bounds(&self, params: &SearchParameters) -> NumericBounds {
        numeric_bounds(params, &self.attribute)
    }

    /// Replace the attribute's range with `bounds`.
    #[must_use]
    pub fn with_bounds(&self, params: SearchParameters, bounds: NumericBounds) -> SearchParameters {
        let params = params
            .add_disjunctive_facet(self.attribute.clone())
            .clear_numeric_refinements(&self.attribute);
        with_bounds(params, &self.attribute, bounds)
    }
}

impl FacetTranslator for RangeFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        let bounds = self.bounds(params);
        if bounds.is_unbounded() {
            state.range.shift_remove(&self.attribute);
        } else {
            state
                .range
                .insert(self.attribute.clone(), bounds.to_string());
        }
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        let bounds = match state.range.get(&self.attribute) {
            Some(raw) => raw.parse().unwrap_or_else(|error| {
                tracing::debug!(attribute = %self.attribute, %error, "ignoring malformed range");
                NumericBounds::default()
            }),
            None => NumericBounds::default(),
        };
        self.with_bounds(params, bounds)
    }
}

/// On/off refinement of one attribute value.
#[derive(Debug, Clone)]
pub struct ToggleFacet {
    pub attribute: String,
    pub on: String,
    pub off: Option<String>,
}

impl ToggleFacet {
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            on: "true".to_string(),
            off: None,
        }
    }

    #[must_use]
    pub fn with_values(mut self, on: impl Into<String>, off: Option<String>) -> Self {
        self.on = on.into();
        self.off = off;
        self
    }

    #[must_use]
    pub fn is_on(&self, params: &SearchParameters) -> bool {
        params.is_disjunctive_refined(&self.attribute, &self.on)
    }

    #[must_use]
    pub fn with_state(&self, params: SearchParameters, on: bool) -> SearchParameters {
        let params = params
            .add_disjunctive_facet(self.attribute.clone())
            .clear_disjunctive_refinements(&self.attribute);
        let value = if on { Some(&self.on) } else { self.off.as_ref() };
        match value {
            Some(value) => params.add_disjunctive_refinement(self.attribute.clone(), value),
            None => params,
        }
    }
}

impl FacetTranslator for ToggleFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        if self.is_on(params) {
            state.toggle.insert(self.attribute.clone(), true);
        } else {
            state.toggle.shift_remove(&self.attribute);
        }
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        let on = state.toggle.get(&self.attribute).copied().unwrap_or(false);
        self.with_state(params, on)
    }
}

/// Minimum rating, stored as a `>=` numeric refinement.
#[derive(Debug, Clone)]
pub struct RatingMenuFacet {
    pub attribute: String,
}

impl RatingMenuFacet {
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }

    #[must_use]
    pub fn rating(&self, params: &SearchParameters) -> Option<u32> {
        let value = params.numeric_value(&self.attribute, NumericOperator::Gte)?;
        (value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value))
            .then_some(value as u32)
    }

    #[must_use]
    pub fn with_rating(&self, params: SearchParameters, rating: Option<u32>) -> SearchParameters {
        let params = params
            .add_disjunctive_facet(self.attribute.clone())
            .clear_numeric_refinements(&self.attribute);
        match rating {
            Some(rating) => params.add_numeric_refinement(
                self.attribute.clone(),
                NumericOperator::Gte,
                f64::from(rating),
            ),
            None => params,
        }
    }
}

impl FacetTranslator for RatingMenuFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        match self.rating(params) {
            Some(rating) => {
                state.rating_menu.insert(self.attribute.clone(), rating);
            }
            None => {
                state.rating_menu.shift_remove(&self.attribute);
            }
        }
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        self.with_rating(params, state.rating_menu.get(&self.attribute).copied())
    }
}

/// Map viewport, stored as `insideBoundingBox`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoSearchFacet;

impl FacetTranslator for GeoSearchFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        state.geo_search = params.inside_bounding_box().map(|bounding_box| GeoSearchState {
            bounding_box: bounding_box.to_string(),
        });
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        let bounding_box = state.geo_search.as_ref().and_then(|geo| {
            geo.bounding_box
                .parse::<BoundingBox>()
                .inspect_err(|error| {
                    tracing::debug!(%error, "ignoring malformed geo search bounding box");
                })
                .ok()
        });
        params.with_inside_bounding_box(bounding_box)
    }
}

/// Selected place, stored as `aroundLatLng` plus a label parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacesFacet;

impl FacetTranslator for PlacesFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        state.places = params.around_lat_lng().map(|position| PlacesState {
            query: params
                .query_parameter(PLACES_LABEL_PARAMETER)
                .and_then(|label| label.as_str().map(str::to_string))
                .unwrap_or_default(),
            position: position.to_string(),
        });
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        let place = state.places.as_ref().and_then(|places| {
            let position = places
                .position
                .parse::<LatLng>()
                .inspect_err(|error| tracing::debug!(%error, "ignoring malformed place"))
                .ok()?;
            Some((position, places.query.clone()))
        });
        match place {
            Some((position, label)) => params
                .with_around_lat_lng(Some(position))
                .with_query_parameter(PLACES_LABEL_PARAMETER, Value::from(label)),
            None => params
                .with_around_lat_lng(None)
                .with_query_parameter(PLACES_LABEL_PARAMETER, Value::Null),
        }
    }
}

/// Replica selection; UI state only records a departure from the initial index.
#[derive(Debug, Clone)]
pub struct SortByFacet {
    pub initial_index: String,
}

impl SortByFacet {
    #[must_use]
    pub fn new(initial_index: impl Into<String>) -> Self {
        Self {
            initial_index: initial_index.into(),
        }
    }
}

impl FacetTranslator for SortByFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        state.sort_by =
            (params.index() != self.initial_index).then(|| params.index().to_string());
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        let index = state
            .sort_by
            .clone()
            .unwrap_or_else(|| self.initial_index.clone());
        params.with_index(index)
    }
}

/// Page number; one-based in UI state, zero-based in parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageFacet;

impl FacetTranslator for PageFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        state.page = params
            .page()
            .filter(|page| *page > 0)
            .map(|page| page + 1);
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        let page = state
            .page
            .filter(|page| *page > 1)
            .map(|page| page - 1);
        params.with_page(page)
    }
}

/// Hits per page; the default value is left out of the UI state.
#[derive(Debug, Clone, Copy)]
pub struct HitsPerPageFacet {
    pub default: u32,
}

impl FacetTranslator for HitsPerPageFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        state.hits_per_page = params
            .hits_per_page()
            .filter(|hits_per_page| *hits_per_page != self.default);
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        params.with_hits_per_page(Some(state.hits_per_page.unwrap_or(self.default)))
    }
}

/// Raw parameter block.
///
/// The widget's own values are the defaults; a `configure` entry in the UI
/// state overrides them. The projection reads the live value of every own key,
/// so refinements made after mount survive a round trip.
#[derive(Debug, Clone, Default)]
pub struct ConfigureFacet {
    pub parameters: Map<String, Value>,
}

impl ConfigureFacet {
    #[must_use]
    pub fn new(parameters: Map<String, Value>) -> Self {
        Self { parameters }
    }
}

impl FacetTranslator for ConfigureFacet {
    fn to_ui_state(&self, params: &SearchParameters, mut state: IndexUiState) -> IndexUiState {
        let mut configure = state.configure.take().unwrap_or_default();
        for key in self.parameters.keys() {
            match params.query_parameter(key) {
                Some(value) => {
                    configure.insert(key.clone(), value);
                }
                None => {
                    configure.remove(key);
                }
            }
        }
        state.configure = (!configure.is_empty()).then_some(configure);
        state
    }

    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters {
        let params = params.with_plain_parameters(&self.parameters);
        match &state.configure {
            Some(configure) => params.with_plain_parameters(configure),
            None => params,
        }
    }
}
