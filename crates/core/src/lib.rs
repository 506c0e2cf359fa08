//! Synchronization engine for a tree of search indices and the widgets mounted
//! on them.
//!
//! A [`SearchTree`] owns an arena of index nodes. Each node holds its own
//! [`SearchParameters`], the latest [`SearchResults`] for those parameters and
//! an ordered list of children: plain [`Widget`]s and nested index nodes. The
//! tree drives widget lifecycles (init, render, dispose), folds widget
//! contributions into a serializable [`UiState`] and back into parameters, and
//! aggregates a fresh [`RenderState`] every time results arrive.
//!
//! Query execution is delegated to a [`SearchClient`]. The tree never blocks
//! on it: batches are handed over with a [`Responder`] and answers are drained
//! later through [`SearchTree::poll`].

pub mod client;
pub mod error;
pub mod events;
pub mod parameters;
pub mod results;
pub mod routing;
pub mod state;
pub mod translate;
pub mod tree;
pub mod widget;

pub use client::{
    BatchResponse, ManualClient, MemoryClient, NodeQuery, NodeResults, QueryBatch, Responder,
    SearchClient,
};
pub use error::{EngineError, FacetParseError, QueryError, WidgetError};
pub use events::{EngineEvent, Hook};
pub use parameters::{HierarchicalFacet, NumericOperator, SearchParameters};
pub use results::{FacetStats, SearchResults};
pub use routing::RouteCodec;
pub use state::{
    BoundingBox, GeoSearchState, IndexRenderState, IndexUiState, LatLng, NumericBounds,
    PlacesState, RenderEntry, RenderState, UiState, WidgetRenderState,
};
pub use translate::FacetTranslator;
pub use tree::{IndexNode, NodeId, ScopedResult, SearchOptions, SearchTree};
pub use widget::{
    Capabilities, DeferredMutations, DisposeOptions, IndexWidget, InitOptions, Mountable,
    RenderContribution, RenderOptions, RenderStateOptions, SearchContext, SearchMetadata,
    SearchParametersOptions, UiStateOptions, Widget, WidgetHandle, WidgetId, index,
};
