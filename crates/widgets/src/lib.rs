//! Built-in widgets for facetree.
//!
//! Each widget is a [`Connector`]: it names the facet it translates, the data
//! it exposes for rendering and how it cleans up after itself. Wrapping one
//! in [`Connected`] (or calling [`Connector::mount`]) produces something
//! [`SearchTree::add_widgets`](facetree_core::SearchTree::add_widgets)
//! accepts. Layouts can also be described declaratively with [`WidgetSpec`].

mod configure;
mod connector;
mod geo;
mod hits;
mod menu;
mod numeric;
mod pagination;
mod refinement_list;
mod related;
mod search_box;
mod sort_by;
pub mod spec;
mod toggle;

pub use configure::Configure;
pub use connector::{Connected, Connector, Refinement, RenderCall, Renderer};
pub use geo::{GeoSearch, Places};
pub use hits::Hits;
pub use menu::{HierarchicalMenu, Menu};
pub use numeric::{DEFAULT_MAX_RATING, NumericMenu, NumericMenuItem, Range, RatingMenu};
pub use pagination::{DEFAULT_PADDING, HitsPerPage, HitsPerPageItem, Pagination};
pub use refinement_list::{DEFAULT_LIMIT, RefinementList};
pub use related::{ConfigureRelatedItems, MatchingPattern, ParameterTransform};
pub use search_box::SearchBox;
pub use sort_by::{SortBy, SortByItem};
pub use spec::{IndexSpec, WidgetSpec, build_all};
pub use toggle::ToggleRefinement;

/// Page size used when no hits-per-page option says otherwise.
pub const DEFAULT_HITS_PER_PAGE: u32 = 20;
