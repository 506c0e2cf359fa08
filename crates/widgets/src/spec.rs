//! Declarative widget layouts.
//!
//! A layout is a list of [`WidgetSpec`]s, tagged by `type`, that can be read
//! from configuration and turned into mountable widgets. Nested indices are
//! described by [`IndexSpec`] and may hold layouts of their own.

use facetree_core::translate::RefinementOperator;
use facetree_core::{IndexWidget, Mountable, index};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::connector::Connector;
use crate::{
    Configure, ConfigureRelatedItems, GeoSearch, HierarchicalMenu, Hits, HitsPerPage,
    HitsPerPageItem, MatchingPattern, Menu, NumericMenu, NumericMenuItem, Pagination, Places,
    Range, RatingMenu, RefinementList, SearchBox, SortBy, SortByItem, ToggleRefinement,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WidgetSpec {
    SearchBox,
    Configure {
        #[serde(default)]
        parameters: Map<String, Value>,
    },
    Hits,
    RefinementList {
        attribute: String,
        #[serde(default)]
        operator: RefinementOperator,
        #[serde(default)]
        limit: Option<usize>,
    },
    Menu {
        attribute: String,
        #[serde(default)]
        limit: Option<usize>,
    },
    HierarchicalMenu {
        attributes: Vec<String>,
        #[serde(default)]
        separator: Option<String>,
        #[serde(default)]
        limit: Option<usize>,
    },
    NumericMenu {
        attribute: String,
        items: Vec<NumericMenuItem>,
    },
    RatingMenu {
        attribute: String,
        #[serde(default)]
        max: Option<u32>,
    },
    Range {
        attribute: String,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    ToggleRefinement {
        attribute: String,
        #[serde(default)]
        on: Option<String>,
        #[serde(default)]
        off: Option<String>,
    },
    SortBy {
        items: Vec<SortByItem>,
    },
    Pagination {
        #[serde(default)]
        padding: Option<u32>,
        #[serde(default, rename = "totalPages")]
        total_pages: Option<u32>,
    },
    HitsPerPage {
        items: Vec<HitsPerPageItem>,
    },
    GeoSearch,
    Places,
    ConfigureRelatedItems {
        hit: Value,
        #[serde(rename = "matchingPatterns")]
        matching_patterns: IndexMap<String, MatchingPattern>,
    },
    Index(IndexSpec),
}

/// A nested index and its layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSpec {
    pub index_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_id: Option<String>,
    #[serde(default)]
    pub widgets: Vec<WidgetSpec>,
}

impl IndexSpec {
    #[must_use]
    pub fn build(self) -> IndexWidget {
        let widget = index(self.index_name);
        let widget = match self.index_id {
            Some(index_id) => widget.with_id(index_id),
            None => widget,
        };
        widget.add_widgets(build_all(self.widgets))
    }
}

/// Build every spec of a layout, in order.
#[must_use]
pub fn build_all(specs: Vec<WidgetSpec>) -> Vec<Mountable> {
    specs.into_iter().map(WidgetSpec::build).collect()
}

impl WidgetSpec {
    /// Tag of the widget this spec builds, `"index"` for nested indices.
    #[must_use]
    pub fn widget_type(&self) -> &'static str {
        match self {
            Self::SearchBox => "searchBox",
            Self::Configure { .. } => "configure",
            Self::Hits => "hits",
            Self::RefinementList { .. } => "refinementList",
            Self::Menu { .. } => "menu",
            Self::HierarchicalMenu { .. } => "hierarchicalMenu",
            Self::NumericMenu { .. } => "numericMenu",
            Self::RatingMenu { .. } => "ratingMenu",
            Self::Range { .. } => "range",
            Self::ToggleRefinement { .. } => "toggleRefinement",
            Self::SortBy { .. } => "sortBy",
            Self::Pagination { .. } => "pagination",
            Self::HitsPerPage { .. } => "hitsPerPage",
            Self::GeoSearch => "geoSearch",
            Self::Places => "places",
            Self::ConfigureRelatedItems { .. } => "configureRelatedItems",
            Self::Index(_) => "index",
        }
    }

    #[must_use]
    pub fn build(self) -> Mountable {
        match self {
            Self::SearchBox => SearchBox::new().mount(),
            Self::Configure { parameters } => Configure::new(parameters).mount(),
            Self::Hits => Hits::new().mount(),
            Self::RefinementList {
                attribute,
                operator,
                limit,
            } => {
                let widget = RefinementList::new(attribute).with_operator(operator);
                let widget = match limit {
                    Some(limit) => widget.with_limit(limit),
                    None => widget,
                };
                widget.mount()
            }
            Self::Menu { attribute, limit } => {
                let widget = Menu::new(attribute);
                let widget = match limit {
                    Some(limit) => widget.with_limit(limit),
                    None => widget,
                };
                widget.mount()
            }
            Self::HierarchicalMenu {
                attributes,
                separator,
                limit,
            } => {
                let mut widget = HierarchicalMenu::new(attributes);
                if let Some(separator) = separator {
                    widget = widget.with_separator(separator);
                }
                if let Some(limit) = limit {
                    widget = widget.with_limit(limit);
                }
                widget.mount()
            }
            Self::NumericMenu { attribute, items } => NumericMenu::new(attribute, items).mount(),
            Self::RatingMenu { attribute, max } => {
                let widget = RatingMenu::new(attribute);
                let widget = match max {
                    Some(max) => widget.with_max(max),
                    None => widget,
                };
                widget.mount()
            }
            Self::Range {
                attribute,
                min,
                max,
            } => Range::new(attribute).with_bounds(min, max).mount(),
            Self::ToggleRefinement { attribute, on, off } => {
                let widget = ToggleRefinement::new(attribute);
                let widget = match on {
                    Some(on) => widget.with_values(on, off),
                    None if off.is_some() => widget.with_values("true", off),
                    None => widget,
                };
                widget.mount()
            }
            Self::SortBy { items } => SortBy::new(items).mount(),
            Self::Pagination {
                padding,
                total_pages,
            } => {
                let widget = Pagination::new().with_total_pages(total_pages);
                let widget = match padding {
                    Some(padding) => widget.with_padding(padding),
                    None => widget,
                };
                widget.mount()
            }
            Self::HitsPerPage { items } => HitsPerPage::new(items).mount(),
            Self::GeoSearch => GeoSearch::new().mount(),
            Self::Places => Places::new().mount(),
            Self::ConfigureRelatedItems {
                hit,
                matching_patterns,
            } => ConfigureRelatedItems::new(hit, matching_patterns).mount(),
            Self::Index(spec) => spec.build().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn layouts_deserialize_from_tagged_objects() {
        let layout: Vec<WidgetSpec> = serde_json::from_value(json!([
            { "type": "searchBox" },
            { "type": "refinementList", "attribute": "brand", "operator": "or" },
            {
                "type": "index",
                "indexName": "products",
                "indexId": "related",
                "widgets": [{ "type": "configure", "parameters": { "hitsPerPage": 1 } }]
            }
        ]))
        .expect("valid layout");

        assert_eq!(layout[0], WidgetSpec::SearchBox);
        assert_eq!(
            layout[1],
            WidgetSpec::RefinementList {
                attribute: "brand".into(),
                operator: RefinementOperator::Or,
                limit: None,
            }
        );
        let WidgetSpec::Index(nested) = &layout[2] else {
            panic!("expected a nested index, got {:?}", layout[2]);
        };
        assert_eq!(nested.index_id.as_deref(), Some("related"));
        assert_eq!(nested.widgets[0].widget_type(), "configure");
    }

    #[test]
    fn unknown_widget_types_are_rejected() {
        let error = serde_json::from_value::<WidgetSpec>(json!({ "type": "carousel" }))
            .expect_err("unknown type");
        assert!(error.to_string().contains("carousel"));
    }

    #[test]
    fn built_indices_keep_their_layout() {
        let spec = IndexSpec {
            index_name: "products".into(),
            index_id: None,
            widgets: vec![
                WidgetSpec::Hits,
                WidgetSpec::Pagination {
                    padding: Some(2),
                    total_pages: None,
                },
            ],
        };
        let built = spec.build();
        assert_eq!(built.index_id(), "products");
        let rendered = format!("{built:?}");
        assert!(rendered.contains("hits"));
        assert!(rendered.contains("pagination"));
    }
}
