use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Data one widget exposes for rendering, plus the params it was built with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetRenderState {
    #[serde(flatten)]
    pub data: Map<String, Value>,
    pub widget_params: Value,
}

impl WidgetRenderState {
    #[must_use]
    pub fn new(data: Map<String, Value>, widget_params: Value) -> Self {
        Self {
            data,
            widget_params,
        }
    }

    /// Look up one field of the payload.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Entry for one widget type within an index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RenderEntry {
    Widget(WidgetRenderState),
    /// Widget types that can be mounted once per attribute.
    ByAttribute(IndexMap<String, WidgetRenderState>),
}

/// One widget's contribution to the render state of its index.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContribution {
    pub widget_type: String,
    pub attribute: Option<String>,
    pub state: WidgetRenderState,
}

impl RenderContribution {
    #[must_use]
    pub fn new(widget_type: impl Into<String>, state: WidgetRenderState) -> Self {
        Self {
            widget_type: widget_type.into(),
            attribute: None,
            state,
        }
    }

    #[must_use]
    pub fn for_attribute(
        widget_type: impl Into<String>,
        attribute: impl Into<String>,
        state: WidgetRenderState,
    ) -> Self {
        Self {
            widget_type: widget_type.into(),
            attribute: Some(attribute.into()),
            state,
        }
    }
}

/// Render data of one index, keyed by widget type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IndexRenderState(IndexMap<String, RenderEntry>);

impl IndexRenderState {
    /// Merge a contribution; a later contribution for the same key replaces the earlier one.
    pub fn merge(&mut self, contribution: RenderContribution) {
        let RenderContribution {
            widget_type,
            attribute,
            state,
        } = contribution;
        match attribute {
            None => {
                self.0.insert(widget_type, RenderEntry::Widget(state));
            }
            Some(attribute) => match self.0.get_mut(&widget_type) {
                Some(RenderEntry::ByAttribute(entries)) => {
                    entries.insert(attribute, state);
                }
                _ => {
                    let entries = IndexMap::from([(attribute, state)]);
                    self.0.insert(widget_type, RenderEntry::ByAttribute(entries));
                }
            },
        }
    }

    #[must_use]
    pub fn get(&self, widget_type: &str) -> Option<&RenderEntry> {
        self.0.get(widget_type)
    }

    /// Render state of a widget type mounted without an attribute.
    #[must_use]
    pub fn widget(&self, widget_type: &str) -> Option<&WidgetRenderState> {
        match self.0.get(widget_type)? {
            RenderEntry::Widget(state) => Some(state),
            RenderEntry::ByAttribute(_) => None,
        }
    }

    /// Render state of a widget type mounted for `attribute`.
    #[must_use]
    pub fn attribute(&self, widget_type: &str, attribute: &str) -> Option<&WidgetRenderState> {
        match self.0.get(widget_type)? {
            RenderEntry::ByAttribute(entries) => entries.get(attribute),
            RenderEntry::Widget(_) => None,
        }
    }

    pub fn widget_types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Render data of a whole tree, keyed by index state key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderState(IndexMap<String, IndexRenderState>);

impl RenderState {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&IndexRenderState> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, state: IndexRenderState) {
        self.0.insert(key.into(), state);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexRenderState)> {
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

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> WidgetRenderState {
        let data = value.as_object().cloned().unwrap_or_default();
        WidgetRenderState::new(data, json!({}))
    }

    #[test]
    fn attribute_contributions_are_grouped_per_widget_type() {
        let mut state = IndexRenderState::default();
        state.merge(RenderContribution::for_attribute(
            "refinementList",
            "brand",
            payload(json!({ "items": [] })),
        ));
        state.merge(RenderContribution::for_attribute(
            "refinementList",
            "color",
            payload(json!({ "items": ["red"] })),
        ));

        assert!(state.attribute("refinementList", "brand").is_some());
        assert_eq!(
            state
                .attribute("refinementList", "color")
                .and_then(|entry| entry.get("items")),
            Some(&json!(["red"]))
        );
        assert!(state.widget("refinementList").is_none());
    }

    #[test]
    fn later_contributions_replace_earlier_ones() {
        let mut state = IndexRenderState::default();
        state.merge(RenderContribution::new("searchBox", payload(json!({ "query": "a" }))));
        state.merge(RenderContribution::new("searchBox", payload(json!({ "query": "b" }))));

        assert_eq!(
            state.widget("searchBox").and_then(|entry| entry.get("query")),
            Some(&json!("b"))
        );
    }

    #[test]
    fn serializes_payload_next_to_widget_params() {
        let mut state = IndexRenderState::default();
        state.merge(RenderContribution::new(
            "configure",
            WidgetRenderState::new(Map::new(), json!({ "hitsPerPage": 1 })),
        ));
        assert_eq!(
            serde_json::to_value(&state).expect("serialize"),
            json!({ "configure": { "widgetParams": { "hitsPerPage": 1 } } })
        );
    }
}
