use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use facetree_core::translate::RefinementOperator;
use facetree_core::{
    IndexUiState, ManualClient, MemoryClient, RenderState, RouteCodec, SearchOptions, SearchTree,
    UiState, WidgetHandle, index,
};
use facetree_widgets::{
    Configure, ConfigureRelatedItems, Connector, HierarchicalMenu, Hits, HitsPerPage,
    HitsPerPageItem, MatchingPattern, Pagination, Range, RefinementList, SearchBox,
    ToggleRefinement,
};
use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(5);

fn catalog() -> HashMap<String, Vec<Value>> {
    let products = vec![
        json!({ "objectID": "1", "name": "iPhone 15", "brand": "Apple", "price": 999, "rating": 5, "free_shipping": true,
                "categories": { "lvl0": "Phones", "lvl1": "Phones > Smartphones" } }),
        json!({ "objectID": "2", "name": "Galaxy S24", "brand": "Samsung", "price": 899, "rating": 4, "free_shipping": false,
                "categories": { "lvl0": "Phones", "lvl1": "Phones > Smartphones" } }),
        json!({ "objectID": "3", "name": "AirPods Pro", "brand": "Apple", "price": 249, "rating": 4, "free_shipping": true,
                "categories": { "lvl0": "Audio", "lvl1": "Audio > Headphones" } }),
        json!({ "objectID": "4", "name": "MacBook Air", "brand": "Apple", "price": 1199, "rating": 5, "free_shipping": false,
                "categories": { "lvl0": "Computers", "lvl1": "Computers > Laptops" } }),
        json!({ "objectID": "5", "name": "Galaxy Buds", "brand": "Samsung", "price": 149, "rating": 3, "free_shipping": true,
                "categories": { "lvl0": "Audio", "lvl1": "Audio > Headphones" } }),
    ];
    HashMap::from([("products".to_string(), products)])
}

fn memory_tree(options: SearchOptions) -> SearchTree {
    SearchTree::new("products", MemoryClient::spawn(catalog()), options)
}

fn field<'a>(
    render_state: &'a RenderState,
    key: &str,
    widget_type: &str,
    attribute: Option<&str>,
    name: &str,
) -> Option<&'a Value> {
    let index_state = render_state.get(key)?;
    let widget = match attribute {
        Some(attribute) => index_state.attribute(widget_type, attribute)?,
        None => index_state.widget(widget_type)?,
    };
    widget.get(name)
}

#[test]
fn search_box_and_nested_configure() {
    let client = ManualClient::new();
    let mut tree = SearchTree::new("products", client.clone(), SearchOptions::default());
    let hits_per_page: Map<String, Value> =
        serde_json::from_value(json!({ "hitsPerPage": 1 })).expect("object");
    tree.add_widgets(
        tree.root(),
        vec![
            SearchBox::new().mount(),
            index("products")
                .with_id("nested")
                .add_widgets(vec![Configure::new(hits_per_page).mount()])
                .into(),
        ],
    )
    .expect("mount");

    let batch = tree.start().expect("first batch");
    client.resolve(batch);
    tree.poll();

    let render_state = tree.render_state();
    assert_eq!(
        field(&render_state, "products", "searchBox", None, "query"),
        Some(&json!(""))
    );
    let configure = render_state
        .get("nested")
        .and_then(|state| state.widget("configure"))
        .expect("configure render state");
    assert_eq!(configure.widget_params["hitsPerPage"], json!(1));

    let nested = tree.node_by_key("nested").expect("nested index");
    assert_eq!(nested.parameters().hits_per_page(), Some(1));
    assert_eq!(
        tree.ui_state()
            .get("nested")
            .and_then(|state| state.configure.as_ref())
            .and_then(|configure| configure.get("hitsPerPage")),
        Some(&json!(1))
    );
    let batch = client.last_batch().expect("batch");
    assert_eq!(batch.queries.len(), 2);
    assert_eq!(batch.queries[1].parameters.hits_per_page(), Some(1));
}

#[test]
fn configure_refinements_survive_reapplying_the_ui_state() {
    let client = ManualClient::new();
    let mut tree = SearchTree::new("products", client.clone(), SearchOptions::default());
    let hits_per_page = |count: u32| -> Map<String, Value> {
        serde_json::from_value(json!({ "hitsPerPage": count })).expect("object")
    };
    tree.add_widgets(tree.root(), vec![Configure::new(hits_per_page(1)).mount()])
        .expect("mount");
    tree.start();

    tree.refine(tree.root(), Configure::refine(hits_per_page(5)))
        .expect("refine");
    let ui_state = tree.ui_state();
    assert_eq!(
        ui_state
            .get("products")
            .and_then(|state| state.configure.as_ref())
            .and_then(|configure| configure.get("hitsPerPage")),
        Some(&json!(5))
    );

    tree.set_ui_state(ui_state.clone());
    let root = tree.node(tree.root()).expect("root");
    assert_eq!(root.parameters().hits_per_page(), Some(5));
    assert_eq!(tree.ui_state(), ui_state);

    tree.flush().expect("batch");
    let batch = client.last_batch().expect("issued batch");
    assert_eq!(batch.queries[0].parameters.hits_per_page(), Some(5));
}

#[test]
fn refinement_list_state_maps_to_a_conjunctive_refinement() {
    let routes = RouteCodec::new().with_base_url(
        Url::parse("https://shop.example/search").expect("valid url"),
    );
    let mut tree = memory_tree(SearchOptions {
        routes,
        ..SearchOptions::default()
    });
    tree.add_widgets(
        tree.root(),
        vec![RefinementList::new("brand").mount(), Hits::new().mount()],
    )
    .expect("mount");
    tree.start();
    tree.settle(TIMEOUT).expect("first search");

    let ui_state = UiState::new().with(
        "products",
        IndexUiState {
            refinement_list: IndexMap::from([("brand".to_string(), vec!["Apple".to_string()])]),
            ..IndexUiState::default()
        },
    );
    tree.set_ui_state(ui_state.clone());
    tree.settle(TIMEOUT).expect("refined search");

    let root = tree.node(tree.root()).expect("root");
    assert_eq!(root.parameters().facet_refinements("brand"), ["Apple".to_string()]);
    assert_eq!(root.results().map(|results| results.nb_hits), Some(3));
    assert_eq!(tree.ui_state(), ui_state);

    let url = tree.url();
    assert!(url.starts_with("https://shop.example/search?"));
    assert_eq!(tree.context().routes.parse_url(&url), ui_state);

    let items = field(&tree.render_state(), "products", "refinementList", Some("brand"), "items")
        .and_then(Value::as_array)
        .cloned()
        .expect("refinement list items");
    assert_eq!(items[0]["value"], json!("Apple"));
    assert_eq!(items[0]["isRefined"], json!(true));
    assert_eq!(items[0]["count"], json!(3));
}

#[test]
fn facet_widgets_expose_counts_from_results() {
    let mut tree = memory_tree(SearchOptions::default());
    tree.add_widgets(
        tree.root(),
        vec![
            RefinementList::new("brand")
                .with_operator(RefinementOperator::Or)
                .mount(),
            HierarchicalMenu::new(vec![
                "categories.lvl0".to_string(),
                "categories.lvl1".to_string(),
            ])
            .mount(),
            ToggleRefinement::new("free_shipping").mount(),
            Range::new("price").mount(),
            Hits::new().mount(),
        ],
    )
    .expect("mount");
    tree.start();

    tree.set_ui_state(UiState::new().with(
        "products",
        IndexUiState {
            refinement_list: IndexMap::from([("brand".to_string(), vec!["Samsung".to_string()])]),
            hierarchical_menu: IndexMap::from([(
                "categories.lvl0".to_string(),
                vec!["Audio".to_string()],
            )]),
            ..IndexUiState::default()
        },
    ));
    tree.settle(TIMEOUT).expect("search settles");
    let render_state = tree.render_state();

    let brands = field(&render_state, "products", "refinementList", Some("brand"), "items")
        .and_then(Value::as_array)
        .cloned()
        .expect("brand items");
    let values: Vec<&Value> = brands.iter().map(|item| &item["value"]).collect();
    assert_eq!(values, vec![&json!("Samsung"), &json!("Apple")]);
    assert_eq!(brands[1]["count"], json!(1));

    let categories = field(
        &render_state,
        "products",
        "hierarchicalMenu",
        Some("categories.lvl0"),
        "items",
    )
    .cloned()
    .expect("category items");
    assert_eq!(categories[0]["value"], json!("Audio"));
    assert_eq!(categories[0]["isRefined"], json!(true));
    assert_eq!(categories[0]["data"][0]["label"], json!("Headphones"));

    let toggle = field(
        &render_state,
        "products",
        "toggleRefinement",
        Some("free_shipping"),
        "value",
    )
    .cloned()
    .expect("toggle value");
    assert_eq!(toggle["isRefined"], json!(false));
    assert_eq!(toggle["count"], json!(1));

    let range = field(&render_state, "products", "range", Some("price"), "range")
        .cloned()
        .expect("price range");
    assert_eq!(range, json!({ "min": 149.0, "max": 149.0 }));

    let hits = field(&render_state, "products", "hits", None, "hits")
        .cloned()
        .expect("hits");
    assert_eq!(hits[0]["objectID"], json!("5"));
    assert_eq!(hits[0]["__position"], json!(1));
}

#[test]
fn pagination_follows_the_page_size() {
    let mut tree = memory_tree(SearchOptions::default());
    tree.add_widgets(
        tree.root(),
        vec![
            HitsPerPage::new(vec![
                HitsPerPageItem {
                    value: 2,
                    label: "2 per page".into(),
                    default: true,
                },
                HitsPerPageItem {
                    value: 10,
                    label: "10 per page".into(),
                    default: false,
                },
            ])
            .mount(),
            Pagination::new().with_padding(1).mount(),
            Hits::new().mount(),
        ],
    )
    .expect("mount");
    tree.start();
    tree.set_index_ui_state(
        tree.root(),
        IndexUiState {
            page: Some(2),
            ..IndexUiState::default()
        },
    )
    .expect("root state");
    tree.settle(TIMEOUT).expect("search settles");

    let render_state = tree.render_state();
    assert_eq!(
        field(&render_state, "products", "pagination", None, "currentRefinement"),
        Some(&json!(1))
    );
    assert_eq!(
        field(&render_state, "products", "pagination", None, "nbPages"),
        Some(&json!(3))
    );
    assert_eq!(
        field(&render_state, "products", "pagination", None, "pages"),
        Some(&json!([0, 1, 2]))
    );
    let hits = field(&render_state, "products", "hits", None, "hits")
        .cloned()
        .expect("hits");
    assert_eq!(hits[0]["__position"], json!(3));
    assert_eq!(hits[1]["__position"], json!(4));

    let state = tree.index_ui_state(tree.root()).expect("root state");
    assert_eq!(state.page, Some(2));
    assert_eq!(state.hits_per_page, None);
}

#[test]
fn related_items_exclude_the_seed_and_rank_by_pattern() {
    let seed = catalog()["products"][0].clone();
    let mut tree = memory_tree(SearchOptions::default());
    let handles = tree
        .add_widgets(
            tree.root(),
            vec![
                Hits::new().mount(),
                index("products")
                    .with_id("relatedItems")
                    .add_widgets(vec![
                        ConfigureRelatedItems::new(
                            seed,
                            IndexMap::from([
                                ("brand".to_string(), MatchingPattern { score: 3 }),
                                ("categories.lvl0".to_string(), MatchingPattern { score: 2 }),
                            ]),
                        )
                        .mount(),
                        Hits::new().mount(),
                    ])
                    .into(),
            ],
        )
        .expect("mount");
    tree.start();
    tree.settle(TIMEOUT).expect("search settles");

    let related = tree.node_by_key("relatedItems").expect("related index");
    let results = related.results().expect("related results");
    assert_eq!(results.nb_hits, 4);
    let ids: Vec<&str> = results
        .hits
        .iter()
        .filter_map(|hit| hit["objectID"].as_str())
        .collect();
    assert_eq!(ids, vec!["3", "4", "2", "5"]);
    assert_eq!(
        tree.node(tree.root())
            .and_then(|root| root.results())
            .map(|results| results.nb_hits),
        Some(5)
    );

    tree.remove_widgets(tree.root(), &handles[1..]).expect("remove related");
    assert!(tree.node_by_key("relatedItems").is_none());
    assert!(tree.render_state().get("relatedItems").is_none());
}

#[test]
fn related_items_keep_filters_set_by_a_sibling_configure() {
    let client = ManualClient::new();
    let mut tree = SearchTree::new("products", client.clone(), SearchOptions::default());
    let free_shipping: Map<String, Value> =
        serde_json::from_value(json!({ "filters": "free_shipping:true" })).expect("object");
    let handles = tree
        .add_widgets(
            tree.root(),
            vec![
                Configure::new(free_shipping).mount(),
                ConfigureRelatedItems::new(
                    json!({ "objectID": "1", "brand": "Apple" }),
                    IndexMap::from([("brand".to_string(), MatchingPattern { score: 3 })]),
                )
                .mount(),
            ],
        )
        .expect("mount");
    tree.start();

    let batch = client.last_batch().expect("first batch");
    assert_eq!(
        batch.queries[0].parameters.filters(),
        Some("free_shipping:true AND NOT objectID:1")
    );

    tree.set_ui_state(tree.ui_state());
    let root = tree.node(tree.root()).expect("root");
    assert_eq!(
        root.parameters().filters(),
        Some("free_shipping:true AND NOT objectID:1")
    );

    tree.remove_widgets(tree.root(), &handles[1..]).expect("remove");
    let root = tree.node(tree.root()).expect("root");
    assert_eq!(root.parameters().filters(), Some("free_shipping:true"));
    assert!(root.parameters().optional_filters().is_empty());
}

#[test]
fn renderers_see_the_first_render_and_can_refine() {
    let client = ManualClient::new();
    let mut tree = SearchTree::new("products", client.clone(), SearchOptions::default());
    let calls: Rc<RefCell<Vec<(bool, Value)>>> = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&calls);
    let handles = tree
        .add_widgets(
            tree.root(),
            vec![
                SearchBox::new()
                    .with_renderer(move |call| {
                        let query = call.state.get("query").cloned().unwrap_or(Value::Null);
                        log.borrow_mut().push((call.is_first_render, query));
                        if call.is_first_render {
                            call.mutations.refine(call.node, SearchBox::refine("auto"));
                        }
                        Ok(())
                    })
                    .into(),
            ],
        )
        .expect("mount");

    let batch = tree.start().expect("first batch");
    assert_eq!(client.issued().len(), 1);
    assert_eq!(
        client.last_batch().map(|batch| batch.queries[0].parameters.query().to_string()),
        Some("auto".to_string())
    );
    client.resolve(batch);
    tree.poll();

    assert_eq!(
        *calls.borrow(),
        vec![(true, json!("")), (false, json!("auto"))]
    );

    let WidgetHandle::Widget(search_box) = handles[0] else {
        panic!("expected a widget handle");
    };
    tree.remove_widgets(tree.root(), &handles).expect("remove");
    assert!(!tree.is_widget_mounted(search_box));
    let root = tree.node(tree.root()).expect("root");
    assert_eq!(root.parameters().query(), "");
    assert_eq!(calls.borrow().len(), 2);
}

#[test]
fn declarative_layouts_drive_a_full_search() {
    let layout: Vec<facetree_widgets::WidgetSpec> = serde_json::from_value(json!([
        { "type": "searchBox" },
        { "type": "refinementList", "attribute": "brand" },
        { "type": "hits" },
        {
            "type": "index",
            "indexName": "products",
            "indexId": "cheap",
            "widgets": [
                { "type": "configure", "parameters": { "hitsPerPage": 1 } },
                { "type": "numericMenu", "attribute": "price", "items": [
                    { "label": "All" },
                    { "label": "Under 500", "end": 500.0 }
                ] },
                { "type": "hits" }
            ]
        }
    ]))
    .expect("valid layout");

    let initial_ui_state = RouteCodec::new().decode("cheap%5BnumericMenu%5D%5Bprice%5D=%3A500");
    let mut tree = memory_tree(SearchOptions {
        initial_ui_state,
        ..SearchOptions::default()
    });
    tree.add_widgets(tree.root(), facetree_widgets::build_all(layout))
        .expect("mount");
    tree.start();
    tree.settle(TIMEOUT).expect("search settles");

    let cheap = tree.node_by_key("cheap").expect("nested index");
    let results = cheap.results().expect("results");
    assert_eq!(results.nb_hits, 2);
    assert_eq!(results.hits.len(), 1);

    let items = field(
        &tree.render_state(),
        "cheap",
        "numericMenu",
        Some("price"),
        "items",
    )
    .cloned()
    .expect("numeric menu items");
    assert_eq!(items[1]["value"], json!(":500"));
    assert_eq!(items[1]["isRefined"], json!(true));
}
