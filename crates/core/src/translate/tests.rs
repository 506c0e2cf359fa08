use indexmap::IndexMap;
use serde_json::{Map, json};

use super::*;
use crate::parameters::NumericOperator;
use crate::state::{GeoSearchState, PlacesState};

fn round_trip(translator: &dyn FacetTranslator, state: &IndexUiState) -> IndexUiState {
    let params = translator.to_search_parameters(state, SearchParameters::new("products"));
    translator.to_ui_state(&params, IndexUiState::default())
}

#[test]
fn refinement_list_brand_maps_to_a_conjunctive_refinement() {
    let facet = RefinementListFacet::new("brand", RefinementOperator::And);
    let state = IndexUiState {
        refinement_list: IndexMap::from([("brand".to_string(), vec!["Apple".to_string()])]),
        ..IndexUiState::default()
    };

    let params = facet.to_search_parameters(&state, SearchParameters::new("indexA"));
    assert!(params.is_facet_refined("brand", "Apple"));
    assert_eq!(params.facets(), ["brand".to_string()]);
    assert!(params.disjunctive_refinements("brand").is_empty());

    assert_eq!(facet.to_ui_state(&params, IndexUiState::default()), state);
}

#[test]
fn disjunctive_refinement_list_round_trips() {
    let facet = RefinementListFacet::new("color", RefinementOperator::Or);
    let state = IndexUiState {
        refinement_list: IndexMap::from([(
            "color".to_string(),
            vec!["red".to_string(), "blue".to_string()],
        )]),
        ..IndexUiState::default()
    };
    assert_eq!(round_trip(&facet, &state), state);
}

#[test]
fn absent_facet_clears_a_previous_refinement() {
    let facet = RefinementListFacet::new("brand", RefinementOperator::And);
    let refined = SearchParameters::new("products").add_facet_refinement("brand", "Apple");

    let params = facet.to_search_parameters(&IndexUiState::default(), refined);
    assert!(params.facet_refinements("brand").is_empty());
}

#[test]
fn empty_query_normalizes_to_absent() {
    let state = IndexUiState {
        query: Some(String::new()),
        ..IndexUiState::default()
    };
    assert_eq!(round_trip(&QueryFacet, &state), IndexUiState::default());

    let state = IndexUiState {
        query: Some("phone".into()),
        ..IndexUiState::default()
    };
    assert_eq!(round_trip(&QueryFacet, &state), state);
}

#[test]
fn hierarchical_menu_keeps_cumulative_levels() {
    let facet = HierarchicalMenuFacet::new(vec!["cat.lvl0".into(), "cat.lvl1".into()]);
    let state = IndexUiState {
        hierarchical_menu: IndexMap::from([(
            "cat.lvl0".to_string(),
            vec!["Audio".to_string(), "Audio > Headphones".to_string()],
        )]),
        ..IndexUiState::default()
    };

    let params = facet.to_search_parameters(&state, SearchParameters::new("products"));
    assert_eq!(
        params.hierarchical_refinement("cat.lvl0"),
        Some("Audio > Headphones")
    );
    assert_eq!(facet.to_ui_state(&params, IndexUiState::default()), state);
}

#[test]
fn malformed_hierarchical_levels_mean_no_refinement() {
    let facet = HierarchicalMenuFacet::new(vec!["cat.lvl0".into(), "cat.lvl1".into()]);
    let state = IndexUiState {
        hierarchical_menu: IndexMap::from([(
            "cat.lvl0".to_string(),
            vec!["Audio".to_string(), "Video > TV".to_string()],
        )]),
        ..IndexUiState::default()
    };
    let params = facet.to_search_parameters(&state, SearchParameters::new("products"));
    assert_eq!(params.hierarchical_refinement("cat.lvl0"), None);
    assert!(params.hierarchical_facet("cat.lvl0").is_some());
}

#[test]
fn menu_round_trips() {
    let facet = MenuFacet::new("category");
    let state = IndexUiState {
        menu: IndexMap::from([("category".to_string(), "Phones".to_string())]),
        ..IndexUiState::default()
    };
    assert_eq!(round_trip(&facet, &state), state);
}

#[test]
fn numeric_menu_accepts_ranges_and_exact_values() {
    let facet = NumericMenuFacet::new("price");
    for encoded in [":5", "5:10", "10:", "42"] {
        let state = IndexUiState {
            numeric_menu: IndexMap::from([("price".to_string(), encoded.to_string())]),
            ..IndexUiState::default()
        };
        assert_eq!(round_trip(&facet, &state), state, "{encoded}");
    }

    let state = IndexUiState {
        numeric_menu: IndexMap::from([("price".to_string(), "42".to_string())]),
        ..IndexUiState::default()
    };
    let params = facet.to_search_parameters(&state, SearchParameters::new("products"));
    assert_eq!(params.numeric_value("price", NumericOperator::Eq), Some(42.0));
}

#[test]
fn malformed_range_is_dropped() {
    let facet = RangeFacet::new("price");
    let state = IndexUiState {
        range: IndexMap::from([("price".to_string(), "cheap".to_string())]),
        ..IndexUiState::default()
    };
    let params = facet.to_search_parameters(
        &state,
        SearchParameters::new("products").add_numeric_refinement("price", NumericOperator::Gte, 3.0),
    );
    assert!(params.numeric_refinements("price").is_none());
    assert_eq!(round_trip(&facet, &state), IndexUiState::default());
}

#[test]
fn range_round_trips_open_bounds() {
    let facet = RangeFacet::new("price");
    let state = IndexUiState {
        range: IndexMap::from([("price".to_string(), "10:".to_string())]),
        ..IndexUiState::default()
    };
    assert_eq!(round_trip(&facet, &state), state);
}

#[test]
fn toggle_and_rating_round_trip() {
    let toggle = ToggleFacet::new("free_shipping");
    let state = IndexUiState {
        toggle: IndexMap::from([("free_shipping".to_string(), true)]),
        ..IndexUiState::default()
    };
    assert_eq!(round_trip(&toggle, &state), state);

    let rating = RatingMenuFacet::new("rating");
    let state = IndexUiState {
        rating_menu: IndexMap::from([("rating".to_string(), 4)]),
        ..IndexUiState::default()
    };
    assert_eq!(round_trip(&rating, &state), state);
}

#[test]
fn toggle_off_value_is_not_part_of_the_ui_state() {
    let toggle = ToggleFacet::new("free_shipping").with_values("true", Some("false".into()));
    let params = toggle.to_search_parameters(&IndexUiState::default(), SearchParameters::new("p"));
    assert!(params.is_disjunctive_refined("free_shipping", "false"));
    assert_eq!(toggle.to_ui_state(&params, IndexUiState::default()), IndexUiState::default());
}

#[test]
fn geo_and_places_round_trip() {
    let state = IndexUiState {
        geo_search: Some(GeoSearchState {
            bounding_box: "47.3165,4.9665,47.3424,5.0201".into(),
        }),
        places: Some(PlacesState {
            query: "Paris".into(),
            position: "48.8546,2.3477".into(),
        }),
        ..IndexUiState::default()
    };
    let translators: [&dyn FacetTranslator; 2] = [&GeoSearchFacet, &PlacesFacet];
    let params = apply_ui_state(&translators, &state, SearchParameters::new("places"));
    assert_eq!(
        project_ui_state(&translators, &params, IndexUiState::default()),
        state
    );
}

#[test]
fn malformed_bounding_box_means_no_refinement() {
    let state = IndexUiState {
        geo_search: Some(GeoSearchState {
            bounding_box: "47.3165,4.9665".into(),
        }),
        ..IndexUiState::default()
    };
    let params = GeoSearchFacet.to_search_parameters(&state, SearchParameters::new("places"));
    assert!(params.inside_bounding_box().is_none());
}

#[test]
fn sort_by_only_records_a_different_index() {
    let facet = SortByFacet::new("products");
    let params = facet.to_search_parameters(&IndexUiState::default(), SearchParameters::new("x"));
    assert_eq!(params.index(), "products");
    assert_eq!(facet.to_ui_state(&params, IndexUiState::default()).sort_by, None);

    let state = IndexUiState {
        sort_by: Some("products_price_asc".into()),
        ..IndexUiState::default()
    };
    assert_eq!(round_trip(&facet, &state), state);
}

#[test]
fn page_is_one_based_in_the_ui_state() {
    let state = IndexUiState {
        page: Some(3),
        ..IndexUiState::default()
    };
    let params = PageFacet.to_search_parameters(&state, SearchParameters::new("products"));
    assert_eq!(params.page(), Some(2));
    assert_eq!(PageFacet.to_ui_state(&params, IndexUiState::default()), state);
}

#[test]
fn default_hits_per_page_is_omitted() {
    let facet = HitsPerPageFacet { default: 20 };
    let params = facet.to_search_parameters(&IndexUiState::default(), SearchParameters::new("p"));
    assert_eq!(params.hits_per_page(), Some(20));
    assert_eq!(facet.to_ui_state(&params, IndexUiState::default()), IndexUiState::default());
}

#[test]
fn configure_state_overrides_the_widget_defaults() {
    let mut own = Map::new();
    own.insert("hitsPerPage".into(), json!(1));
    let facet = ConfigureFacet::new(own);

    let params = facet.to_search_parameters(&IndexUiState::default(), SearchParameters::new("products"));
    assert_eq!(params.hits_per_page(), Some(1));

    let mut routed = Map::new();
    routed.insert("hitsPerPage".into(), json!(5));
    routed.insert("analytics".into(), json!(false));
    let state = IndexUiState {
        configure: Some(routed),
        ..IndexUiState::default()
    };

    let params = facet.to_search_parameters(&state, SearchParameters::new("products"));
    assert_eq!(params.hits_per_page(), Some(5));
    assert_eq!(params.query_parameter("analytics"), Some(json!(false)));

    let projected = facet.to_ui_state(&params, state.clone());
    assert_eq!(projected, state);
}

#[test]
fn configure_projects_the_live_value_of_its_keys() {
    let mut own = Map::new();
    own.insert("hitsPerPage".into(), json!(1));
    let facet = ConfigureFacet::new(own);

    let params = facet
        .to_search_parameters(&IndexUiState::default(), SearchParameters::new("products"))
        .with_hits_per_page(Some(7));
    let projected = facet.to_ui_state(&params, IndexUiState::default());
    assert_eq!(
        projected.configure.as_ref().and_then(|configure| configure.get("hitsPerPage")),
        Some(&json!(7))
    );

    let reapplied = facet.to_search_parameters(&projected, SearchParameters::new("products"));
    assert_eq!(reapplied.hits_per_page(), Some(7));
}

#[test]
fn applying_a_state_twice_is_idempotent() {
    let refinement = RefinementListFacet::new("brand", RefinementOperator::Or);
    let range = RangeFacet::new("price");
    let translators: [&dyn FacetTranslator; 4] = [&QueryFacet, &refinement, &range, &PageFacet];
    let state = IndexUiState {
        query: Some("phone".into()),
        refinement_list: IndexMap::from([("brand".to_string(), vec!["Apple".to_string()])]),
        range: IndexMap::from([("price".to_string(), "5:10".to_string())]),
        page: Some(2),
        ..IndexUiState::default()
    };

    let once = apply_ui_state(&translators, &state, SearchParameters::new("products"));
    let twice = apply_ui_state(&translators, &state, once.clone());
    assert_eq!(once, twice);
}
