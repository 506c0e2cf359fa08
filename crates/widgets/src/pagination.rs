use facetree_core::translate::{FacetTranslator, HitsPerPageFacet, PageFacet};
use facetree_core::{RenderStateOptions, SearchParameters};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::connector::{Connector, Refinement};

pub const DEFAULT_PADDING: u32 = 3;

/// Page selector.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    facet: PageFacet,
    padding: u32,
    total_pages: Option<u32>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            facet: PageFacet,
            padding: DEFAULT_PADDING,
            total_pages: None,
        }
    }
}

impl Pagination {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages listed on each side of the current one.
    #[must_use]
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    #[must_use]
    pub fn with_total_pages(mut self, total_pages: Option<u32>) -> Self {
        self.total_pages = total_pages;
        self
    }

    /// Go to the zero-based `page`.
    pub fn refine(page: u32) -> Refinement {
        Box::new(move |params| params.with_page((page > 0).then_some(page)))
    }

    /// Zero-based pages shown around `current`, never more than `2 * padding + 1`.
    fn pages(&self, current: u32, nb_pages: u32) -> Vec<u32> {
        if nb_pages == 0 {
            return Vec::new();
        }
        let width = self
            .padding
            .saturating_mul(2)
            .saturating_add(1)
            .min(nb_pages);
        let first = current
            .saturating_sub(self.padding)
            .min(nb_pages - width);
        (first..first + width).collect()
    }
}

impl Connector for Pagination {
    fn widget_type(&self) -> &'static str {
        "pagination"
    }

    fn widget_params(&self) -> Value {
        json!({ "padding": self.padding, "totalPages": self.total_pages })
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let current = options.parameters.page().unwrap_or(0);
        let nb_hits = options.results.map_or(0, |results| results.nb_hits);
        let nb_pages = options.results.map_or(0, |results| results.nb_pages);
        let nb_pages = self.total_pages.map_or(nb_pages, |total| nb_pages.min(total));

        let mut data = Map::new();
        data.insert("currentRefinement".into(), Value::from(current));
        data.insert("nbHits".into(), Value::from(nb_hits));
        data.insert("nbPages".into(), Value::from(nb_pages));
        data.insert("pages".into(), json!(self.pages(current, nb_pages)));
        data.insert("isFirstPage".into(), Value::from(current == 0));
        data.insert(
            "isLastPage".into(),
            Value::from(current + 1 >= nb_pages),
        );
        data.insert("canRefine".into(), Value::from(nb_pages > 1));
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(params.clone().with_page(None))
    }
}

/// One option of a [`HitsPerPage`] selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitsPerPageItem {
    pub value: u32,
    pub label: String,
    #[serde(default)]
    pub default: bool,
}

/// Selector for the page size.
///
/// The item flagged `default` (or the first one) is what an index without a
/// `hitsPerPage` entry in its UI state uses.
#[derive(Debug, Clone)]
pub struct HitsPerPage {
    facet: HitsPerPageFacet,
    items: Vec<HitsPerPageItem>,
}

impl HitsPerPage {
    #[must_use]
    pub fn new(items: Vec<HitsPerPageItem>) -> Self {
        let default = items
            .iter()
            .find(|item| item.default)
            .or(items.first())
            .map_or(crate::DEFAULT_HITS_PER_PAGE, |item| item.value);
        Self {
            facet: HitsPerPageFacet { default },
            items,
        }
    }

    pub fn refine(hits_per_page: u32) -> Refinement {
        Box::new(move |params| {
            params
                .with_hits_per_page(Some(hits_per_page))
                .with_page(None)
        })
    }
}

impl Connector for HitsPerPage {
    fn widget_type(&self) -> &'static str {
        "hitsPerPage"
    }

    fn widget_params(&self) -> Value {
        json!({ "items": self.items })
    }

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        Some(&self.facet)
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value> {
        let current = options
            .parameters
            .hits_per_page()
            .unwrap_or(self.facet.default);
        let items: Vec<Value> = self
            .items
            .iter()
            .map(|item| {
                json!({
                    "value": item.value,
                    "label": item.label,
                    "isRefined": item.value == current,
                })
            })
            .collect();

        let mut data = Map::new();
        data.insert("items".into(), Value::Array(items));
        data.insert(
            "hasNoResults".into(),
            Value::from(options.results.is_none_or(|results| results.nb_hits == 0)),
        );
        data
    }

    fn cleanup(&self, params: &SearchParameters) -> Option<SearchParameters> {
        Some(params.clone().with_hits_per_page(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_stays_within_bounds() {
        let pagination = Pagination::new().with_padding(1);
        assert_eq!(pagination.pages(0, 10), vec![0, 1, 2]);
        assert_eq!(pagination.pages(5, 10), vec![4, 5, 6]);
        assert_eq!(pagination.pages(9, 10), vec![7, 8, 9]);
        assert_eq!(pagination.pages(0, 2), vec![0, 1]);
        assert!(pagination.pages(0, 0).is_empty());
    }

    #[test]
    fn huge_padding_shows_every_page() {
        let pagination = Pagination::new().with_padding(u32::MAX);
        assert_eq!(pagination.pages(3, 5), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn default_hits_per_page_prefers_the_flagged_item() {
        let items = vec![
            HitsPerPageItem { value: 8, label: "8".into(), default: false },
            HitsPerPageItem { value: 16, label: "16".into(), default: true },
        ];
        assert_eq!(HitsPerPage::new(items).facet.default, 16);
        assert_eq!(HitsPerPage::new(Vec::new()).facet.default, crate::DEFAULT_HITS_PER_PAGE);
    }
}
