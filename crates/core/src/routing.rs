//! Query-string encoding of [`UiState`].
//!
//! The state is written as nested bracketed keys, e.g.
//! `products[refinementList][brand][0]=Apple`. Decoding restores the nesting
//! and coerces the facets whose UI state is not a string (page numbers,
//! ratings, toggles) back to their types, so `URL -> state -> URL` is stable.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use url::Url;
use url::form_urlencoded;

use crate::state::{IndexUiState, UiState};

const INTEGER_FACETS: [&str; 2] = ["page", "hitsPerPage"];
/// Facets mapping an attribute to a list of values.
const LIST_FACETS: [&str; 2] = ["refinementList", "hierarchicalMenu"];
/// Facets mapping an attribute to a single value.
const ATTRIBUTE_FACETS: [&str; 5] = ["menu", "numericMenu", "ratingMenu", "range", "toggle"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteCodec {
    base_url: Option<Url>,
}

impl RouteCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every created URL with `base_url`, replacing its query string.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Full URL for `state`, or `?<query>` when no base URL is configured.
    #[must_use]
    pub fn create_url(&self, state: &UiState) -> String {
        let query = self.encode(state);
        match &self.base_url {
            Some(base) => {
                let mut url = base.clone();
                url.set_query((!query.is_empty()).then_some(query.as_str()));
                url.to_string()
            }
            None if query.is_empty() => String::new(),
            None => format!("?{query}"),
        }
    }

    /// Encode `state` as a query string without the leading `?`.
    #[must_use]
    pub fn encode(&self, state: &UiState) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, index_state) in state.iter() {
            match serde_json::to_value(index_state) {
                Ok(value) => append_pairs(&mut serializer, key.to_string(), &value),
                Err(error) => tracing::debug!(key, %error, "skipping unserializable index state"),
            }
        }
        serializer.finish()
    }

    /// Decode a query string, with or without its leading `?`.
    #[must_use]
    pub fn decode(&self, query: &str) -> UiState {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut root = Tree::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let path = split_key(&key);
            if path.is_empty() {
                continue;
            }
            root.insert(&path, value.into_owned());
        }

        root.children
            .into_iter()
            .filter_map(|(key, tree)| {
                let mut value = tree.into_index_state();
                coerce_index_state(&mut value);
                match serde_json::from_value::<IndexUiState>(value) {
                    Ok(state) => Some((key, state)),
                    Err(error) => {
                        tracing::debug!(key = %key, %error, "ignoring malformed routed index state");
                        None
                    }
                }
            })
            .collect()
    }

    /// Decode the query string of `url`. Accepts absolute URLs and bare query strings.
    #[must_use]
    pub fn parse_url(&self, url: &str) -> UiState {
        match Url::parse(url) {
            Ok(parsed) => self.decode(parsed.query().unwrap_or_default()),
            Err(_) => {
                let query = url.split_once('?').map_or(url, |(_, query)| query);
                self.decode(query)
            }
        }
    }
}

fn append_pairs(
    serializer: &mut form_urlencoded::Serializer<'_, String>,
    prefix: String,
    value: &Value,
) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => {
            serializer.append_pair(&prefix, if *flag { "true" } else { "false" });
        }
        Value::Number(number) => {
            serializer.append_pair(&prefix, &number.to_string());
        }
        Value::String(text) => {
            serializer.append_pair(&prefix, text);
        }
        Value::Array(items) => {
            for (position, item) in items.iter().enumerate() {
                append_pairs(serializer, format!("{prefix}[{position}]"), item);
            }
        }
        Value::Object(fields) => {
            for (key, field) in fields {
                append_pairs(serializer, format!("{prefix}[{key}]"), field);
            }
        }
    }
}

/// `a[b][0]` becomes `["a", "b", "0"]`.
fn split_key(key: &str) -> Vec<String> {
    let (head, mut rest) = match key.find('[') {
        Some(position) => key.split_at(position),
        None => (key, ""),
    };
    let mut path = vec![head.to_string()];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some((segment, tail)) = inner.split_once(']') else {
            break;
        };
        path.push(segment.to_string());
        rest = tail;
    }
    path
}

#[derive(Default)]
struct Tree {
    leaf: Option<String>,
    children: IndexMap<String, Tree>,
}

impl Tree {
    fn insert(&mut self, path: &[String], value: String) {
        match path.split_first() {
            None => self.leaf = Some(value),
            Some((head, rest)) => self
                .children
                .entry(head.clone())
                .or_default()
                .insert(rest, value),
        }
    }

    /// Shape the facets of one index by what each facet holds, so attribute
    /// names that look like numbers stay map keys.
    fn into_index_state(self) -> Value {
        if self.children.is_empty() {
            return self.into_value();
        }
        Value::Object(
            self.children
                .into_iter()
                .map(|(facet, tree)| {
                    let value = if LIST_FACETS.contains(&facet.as_str()) {
                        tree.into_map(Tree::into_list)
                    } else if ATTRIBUTE_FACETS.contains(&facet.as_str()) {
                        tree.into_map(Tree::into_value)
                    } else {
                        tree.into_value()
                    };
                    (facet, value)
                })
                .collect(),
        )
    }

    fn into_map(self, shape: fn(Tree) -> Value) -> Value {
        if self.children.is_empty() {
            return self.into_value();
        }
        Value::Object(
            self.children
                .into_iter()
                .map(|(key, tree)| (key, shape(tree)))
                .collect(),
        )
    }

    /// Items ordered by position; a bare value is a one-item list.
    fn into_list(self) -> Value {
        if self.children.is_empty() {
            return Value::Array(self.leaf.map(Value::String).into_iter().collect());
        }
        let mut items: Vec<(usize, Tree)> = self
            .children
            .into_iter()
            .filter_map(|(key, tree)| Some((key.parse().ok()?, tree)))
            .collect();
        items.sort_by_key(|(position, _)| *position);
        Value::Array(items.into_iter().map(|(_, tree)| tree.into_value()).collect())
    }

    /// Free-form value: children keyed exactly `0..n` form a list.
    fn into_value(self) -> Value {
        if self.children.is_empty() {
            return self.leaf.map_or(Value::Null, Value::String);
        }
        if self.is_dense_list() {
            return self.into_list();
        }
        Value::Object(
            self.children
                .into_iter()
                .map(|(key, tree)| (key, tree.into_value()))
                .collect(),
        )
    }

    fn is_dense_list(&self) -> bool {
        let mut positions: Vec<usize> = self
            .children
            .keys()
            .filter_map(|key| key.parse::<usize>().ok().filter(|position| position.to_string() == *key))
            .collect();
        if positions.len() != self.children.len() {
            return false;
        }
        positions.sort_unstable();
        positions.iter().enumerate().all(|(expected, position)| expected == *position)
    }
}

fn coerce_index_state(value: &mut Value) {
    let Some(fields) = value.as_object_mut() else {
        return;
    };
    for key in INTEGER_FACETS {
        if let Some(field) = fields.get_mut(key) {
            match field.as_str().and_then(|raw| raw.parse::<u32>().ok()) {
                Some(number) => *field = Value::from(number),
                None => {
                    fields.remove(key);
                }
            }
        }
    }
    if let Some(Value::Object(ratings)) = fields.get_mut("ratingMenu") {
        ratings.retain(|_, rating| match rating.as_str().and_then(|raw| raw.parse::<u32>().ok()) {
            Some(number) => {
                *rating = Value::from(number);
                true
            }
            None => false,
        });
    }
    if let Some(Value::Object(toggles)) = fields.get_mut("toggle") {
        toggles.retain(|_, toggle| match toggle.as_str() {
            Some("true") => {
                *toggle = Value::Bool(true);
                true
            }
            Some("false") => {
                *toggle = Value::Bool(false);
                true
            }
            _ => false,
        });
    }
    if let Some(Value::Object(configure)) = fields.get_mut("configure") {
        coerce_scalars(configure);
    }
}

/// Restore numbers and booleans inside a free-form block.
fn coerce_scalars(fields: &mut Map<String, Value>) {
    for value in fields.values_mut() {
        coerce_scalar(value);
    }
}

fn coerce_scalar(value: &mut Value) {
    match value {
        Value::String(raw) => {
            if let Some(coerced) = scalar_from_str(raw) {
                *value = coerced;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(coerce_scalar),
        Value::Object(fields) => coerce_scalars(fields),
        _ => {}
    }
}

fn scalar_from_str(raw: &str) -> Option<Value> {
    match raw {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }
    if let Ok(integer) = raw.parse::<i64>() {
        return Some(Value::from(integer));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|number| number.is_finite() && number.to_string() == raw)
        .and_then(Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn state(raw: Value) -> UiState {
        serde_json::from_value(raw).expect("valid ui state")
    }

    #[test]
    fn encodes_nested_brackets() {
        let codec = RouteCodec::new();
        let encoded = codec.encode(&state(json!({
            "products": { "refinementList": { "brand": ["Apple"] } }
        })));
        assert_eq!(encoded, "products%5BrefinementList%5D%5Bbrand%5D%5B0%5D=Apple");
    }

    #[test]
    fn decodes_typed_facets() {
        let codec = RouteCodec::new();
        let decoded = codec.decode(
            "?products[page]=3&products[toggle][free_shipping]=true&products[ratingMenu][rating]=4\
             &products[configure][hitsPerPage]=8&products[configure][analytics]=false",
        );
        assert_eq!(
            decoded,
            state(json!({
                "products": {
                    "page": 3,
                    "toggle": { "free_shipping": true },
                    "ratingMenu": { "rating": 4 },
                    "configure": { "hitsPerPage": 8, "analytics": false }
                }
            }))
        );
    }

    #[test]
    fn url_to_state_to_url_is_stable() {
        let codec = RouteCodec::new().with_base_url(
            Url::parse("https://shop.example/search").expect("valid base url"),
        );
        let original = state(json!({
            "products": {
                "query": "phone case",
                "hierarchicalMenu": { "cat.lvl0": ["Audio", "Audio > Headphones"] },
                "range": { "price": "10:" }
            },
            "related": { "page": 2 }
        }));

        let url = codec.create_url(&original);
        assert!(url.starts_with("https://shop.example/search?"));
        let decoded = codec.parse_url(&url);
        assert_eq!(decoded, original);
        assert_eq!(codec.create_url(&decoded), url);
    }

    #[test]
    fn numeric_attribute_names_stay_map_keys() {
        let codec = RouteCodec::new();
        let original = state(json!({
            "products": {
                "query": "tv",
                "refinementList": { "2024": ["yes"], "brand": ["Apple", "Sony"] },
                "range": { "0": "10:20" },
                "toggle": { "1": true }
            }
        }));

        let query = codec.encode(&original);
        let decoded = codec.decode(&query);
        assert_eq!(decoded, original);
        assert_eq!(codec.encode(&decoded), query);
    }

    #[test]
    fn sparse_numeric_keys_in_free_form_blocks_stay_objects() {
        let decoded = RouteCodec::new().decode(
            "products[configure][facetFilters][0]=brand:Apple&products[configure][facetFilters][1]=color:red\
             &products[customFacet][7]=seven",
        );
        assert_eq!(
            decoded,
            state(json!({
                "products": {
                    "configure": { "facetFilters": ["brand:Apple", "color:red"] },
                    "customFacet": { "7": "seven" }
                }
            }))
        );
    }

    #[test]
    fn malformed_numbers_are_dropped() {
        let decoded = RouteCodec::new().decode("products[page]=abc&products[query]=tv");
        assert_eq!(decoded, state(json!({ "products": { "query": "tv" } })));
    }

    #[test]
    fn empty_state_creates_an_empty_url() {
        assert_eq!(RouteCodec::new().create_url(&UiState::new()), "");
        assert!(RouteCodec::new().decode("").is_empty());
    }
}
