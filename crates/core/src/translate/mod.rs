//! Per-facet translation between [`IndexUiState`] and [`SearchParameters`].
//!
//! Every facet has an independent pair of pure rules. The forward rule
//! projects parameters onto the facet's slot of the UI state; the inverse
//! rule replaces whatever the parameters held for that facet with what the UI
//! state says. A facet missing from the UI state therefore clears the
//! corresponding refinement instead of retaining it.

mod facets;

use crate::parameters::SearchParameters;
use crate::state::IndexUiState;

pub use facets::{
    ConfigureFacet, GeoSearchFacet, HierarchicalMenuFacet, HitsPerPageFacet, MenuFacet,
    NumericMenuFacet, PageFacet, PlacesFacet, QueryFacet, RangeFacet, RatingMenuFacet,
    RefinementListFacet, RefinementOperator, SortByFacet, ToggleFacet, PLACES_LABEL_PARAMETER,
};

/// Forward and inverse rule for one facet of the UI state.
pub trait FacetTranslator {
    /// Project `params` onto this facet's slot of `state`.
    fn to_ui_state(&self, params: &SearchParameters, state: IndexUiState) -> IndexUiState;

    /// Replace this facet's refinement in `params` with the one held by `state`.
    fn to_search_parameters(
        &self,
        state: &IndexUiState,
        params: SearchParameters,
    ) -> SearchParameters;
}

/// Fold `params` through every translator's forward rule, in order.
#[must_use]
pub fn project_ui_state(
    translators: &[&dyn FacetTranslator],
    params: &SearchParameters,
    state: IndexUiState,
) -> IndexUiState {
    translators
        .iter()
        .fold(state, |state, translator| translator.to_ui_state(params, state))
}

/// Fold `state` through every translator's inverse rule, in order.
#[must_use]
pub fn apply_ui_state(
    translators: &[&dyn FacetTranslator],
    state: &IndexUiState,
    params: SearchParameters,
) -> SearchParameters {
    translators.iter().fold(params, |params, translator| {
        translator.to_search_parameters(state, params)
    })
}

#[cfg(test)]
mod tests;
