use facetree_core::state::grammar;
use facetree_core::translate::{FacetTranslator, HierarchicalMenuFacet, MenuFacet};
use facetree_core::{RenderStateOptions, SearchParameters, SearchResults};
use serde_json::{Map, Value, json};

use crate::connector::{Connector, Refinement};
use crate::refinement_list::DEFAULT_LIMIT;

/// Single-choice list over the values of one attribute.
#[derive(Debug, Clone)]
pub struct Menu {
    facet: MenuFacet,
    limit: usize,
}

impl Menu {
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            facet: MenuFacet::new(attribute),
            limit: DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Select `value`, or clear the menu if it is already selected.
    pub fn refine(&self, value: impl Into<String>) -> Refinement {
        let facet = self.facet.clone();
        let value = value.into();
        Box::new(move |params| menu_toggled(&facet, params, value))
    }
}

fn menu_toggled(facet: &MenuFacet, params: SearchParameters, value: String) -> SearchParameters {
    let next = (params.hierarchical_refinement(&facet.attribute) != Some(value.as_str()))
        .then_some(value);
    params
        .add_hierarchical_facet(facet.declaration())
        .with_hierarchical_refinement(&facet.attribute, next)
        .with_page(None)
}

impl Connector for Menu {
    fn widget_type(&self) -> &'static str {
        "menu"
    }

    fn attribute(&self) -> Option<&str> {
        Some(&self.facet.attribute)
    }

    fn widget_params(&self) -> Value {
        json!({ "attribute": self.facet.attribute, "limit": self.limit })
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let selected = options
            .parameters
            .hierarchical_refinement(&self.facet.attribute);
        let items: Vec<Value> = options
            .results
            .into_iter()
            .flat_map(|results| results.facet_values(&self.facet.attribute))
            .take(self.limit)
            .map(|(value, count)| {
                let url = options.create_url_for(
                    |params| menu_toggled(&self.facet, params, value.to_string()),
                    |params, state| self.facet.to_ui_state(params, state),
                );
                json!({
                    "value": value,
                    "label": value,
                    "count": count,
                    "isRefined": selected == Some(value),
                    "url": url,
                })
            })
            .collect();

        let mut data = Map::new();
        data.insert("canRefine".into(), Value::from(!items.is_empty()));
        data.insert("items".into(), Value::Array(items));
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(
            params
                .clone()
                .with_hierarchical_refinement(&self.facet.attribute, None),
        )
    }
}

/// Tree of categories spread over one attribute per level.
#[derive(Debug, Clone)]
pub struct HierarchicalMenu {
    facet: HierarchicalMenuFacet,
    limit: usize,
}

impl HierarchicalMenu {
    #[must_use]
    pub fn new(attributes: Vec<String>) -> Self {
        Self {
            facet: HierarchicalMenuFacet::new(attributes),
            limit: DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.facet = self.facet.with_separator(separator);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Select the category `path`; selecting the current one moves up to its parent.
    pub fn refine(&self, path: impl Into<String>) -> Refinement {
        let facet = self.facet.clone();
        let path = path.into();
        Box::new(move |params| hierarchy_toggled(&facet, params, path))
    }

    fn level_items(
        &self,
        options: &RenderStateOptions<'_>,
        results: &SearchResults,
        level: usize,
        parent: Option<&str>,
        selected: &[String],
    ) -> Vec<Value> {
        let Some(attribute) = self.facet.attributes.get(level) else {
            return Vec::new();
        };
        let separator = self.facet.separator.as_str();
        results
            .facet_values(attribute)
            .filter(|(value, _)| {
                parent.is_none_or(|parent| {
                    value
                        .strip_prefix(parent)
                        .is_some_and(|rest| rest.starts_with(separator))
                })
            })
            .take(self.limit)
            .map(|(value, count)| {
                let is_refined = selected.get(level).is_some_and(|current| current == value);
                let children = if is_refined {
                    Value::Array(self.level_items(options, results, level + 1, Some(value), selected))
                } else {
                    Value::Null
                };
                let url = options.create_url_for(
                    |params| hierarchy_toggled(&self.facet, params, value.to_string()),
                    |params, state| self.facet.to_ui_state(params, state),
                );
                json!({
                    "value": value,
                    "label": value.rsplit(separator).next().unwrap_or(value),
                    "count": count,
                    "isRefined": is_refined,
                    "url": url,
                    "data": children,
                })
            })
            .collect()
    }
}

fn hierarchy_toggled(
    facet: &HierarchicalMenuFacet,
    params: SearchParameters,
    path: String,
) -> SearchParameters {
    let next = if params.hierarchical_refinement(facet.name()) == Some(path.as_str()) {
        path.rsplit_once(facet.separator.as_str())
            .map(|(parent, _)| parent.to_string())
    } else {
        Some(path)
    };
    params
        .add_hierarchical_facet(facet.declaration())
        .with_hierarchical_refinement(facet.name(), next)
        .with_page(None)
}

impl Connector for HierarchicalMenu {
    fn widget_type(&self) -> &'static str {
        "hierarchicalMenu"
    }

    fn attribute(&self) -> Option<&str> {
        Some(self.facet.name())
    }

    fn widget_params(&self) -> Value {
        json!({
            "attributes": self.facet.attributes,
            "separator": self.facet.separator,
            "limit": self.limit,
        })
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let selected = options
            .parameters
            .hierarchical_refinement(self.facet.name())
            .map(|path| grammar::hierarchical_levels(path, &self.facet.separator))
            .unwrap_or_default();
        let items = options
            .results
            .map(|results| self.level_items(options, results, 0, None, &selected))
            .unwrap_or_default();

        let mut data = Map::new();
        data.insert("canRefine".into(), Value::from(!items.is_empty()));
        data.insert("items".into(), Value::Array(items));
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(
            params
                .clone()
                .with_hierarchical_refinement(self.facet.name(), None),
        )
    }
}
