use serde_json::json;

use super::*;

#[test]
fn updates_return_new_values_without_touching_the_original() {
    let base = SearchParameters::new("products");
    let refined = base.clone().with_query("phone").add_facet_refinement("brand", "Apple");

    assert_eq!(base.query(), "");
    assert!(base.facet_refinements("brand").is_empty());
    assert_eq!(refined.query(), "phone");
    assert_eq!(refined.facet_refinements("brand"), ["Apple".to_string()]);
}

#[test]
fn refinements_are_deduplicated_and_ordered() {
    let params = SearchParameters::new("products")
        .add_disjunctive_refinement("color", "red")
        .add_disjunctive_refinement("color", "blue")
        .add_disjunctive_refinement("color", "red");

    assert_eq!(
        params.disjunctive_refinements("color"),
        ["red".to_string(), "blue".to_string()]
    );
}

#[test]
fn clear_refinements_drops_every_kind_for_an_attribute() {
    let params = SearchParameters::new("products")
        .add_facet_refinement("price", "10")
        .add_disjunctive_refinement("price", "20")
        .add_numeric_refinement("price", NumericOperator::Gte, 5.0)
        .add_facet_refinement("brand", "Apple")
        .clear_refinements("price");

    assert!(params.facet_refinements("price").is_empty());
    assert!(params.disjunctive_refinements("price").is_empty());
    assert!(params.numeric_refinements("price").is_none());
    assert!(params.is_facet_refined("brand", "Apple"));
}

#[test]
fn hierarchical_facet_declarations_replace_by_name() {
    let params = SearchParameters::new("products")
        .add_hierarchical_facet(HierarchicalFacet::new(vec!["lvl0".into()], " > "))
        .add_hierarchical_facet(HierarchicalFacet::new(
            vec!["lvl0".into(), "lvl1".into()],
            " / ",
        ));

    assert_eq!(params.hierarchical_facets().len(), 1);
    let facet = params.hierarchical_facet("lvl0").expect("facet declared");
    assert_eq!(facet.separator, " / ");
    assert_eq!(facet.attributes.len(), 2);
}

#[test]
fn plain_parameters_map_known_keys_and_keep_unknown_ones() {
    let plain = json!({
        "hitsPerPage": 1,
        "query": "shoes",
        "analytics": false,
    });
    let plain = plain.as_object().expect("object literal");

    let params = SearchParameters::new("products").with_plain_parameters(plain);

    assert_eq!(params.hits_per_page(), Some(1));
    assert_eq!(params.query(), "shoes");
    assert_eq!(params.query_parameter("analytics"), Some(json!(false)));
}

#[test]
fn without_plain_parameters_restores_the_base_values() {
    let plain = json!({ "hitsPerPage": 1, "analytics": false });
    let plain = plain.as_object().expect("object literal");
    let base = SearchParameters::new("products").with_hits_per_page(Some(20));

    let restored = base
        .clone()
        .with_plain_parameters(plain)
        .without_plain_parameters(plain, &base);

    assert_eq!(restored, base);
}

#[test]
fn numeric_refinements_serialize_with_operator_keys() {
    let params = SearchParameters::new("products")
        .add_numeric_refinement("price", NumericOperator::Gte, 10.0)
        .add_numeric_refinement("price", NumericOperator::Lte, 50.0);

    let value = serde_json::to_value(&params).expect("serialize parameters");
    assert_eq!(value["numericRefinements"]["price"][">="], json!([10.0]));
    assert_eq!(value["numericRefinements"]["price"]["<="], json!([50.0]));

    let back: SearchParameters = serde_json::from_value(value).expect("deserialize parameters");
    assert_eq!(back, params);
}
