//! Contract between the tree and the widgets mounted on it.
//!
//! Every hook is optional. A widget advertises the hooks it implements through
//! [`Capabilities`] and the tree only dispatches those, so a widget that does
//! not declare [`Capabilities::UI_STATE`] never contributes to the UI state
//! even if it overrides the method.

mod index;
mod mutations;

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use serde_json::{Map, Value};

use crate::error::{QueryError, WidgetError};
use crate::parameters::SearchParameters;
use crate::results::SearchResults;
use crate::routing::RouteCodec;
use crate::state::{IndexUiState, RenderState, UiState};
use crate::tree::{NodeId, ScopedResult};

pub use crate::state::RenderContribution;
pub use index::{IndexWidget, index};
pub use mutations::DeferredMutations;
pub(crate) use mutations::Mutation;

bitflags! {
    /// Lifecycle hooks a widget implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        const INIT = 1 << 0;
        const RENDER = 1 << 1;
        const DISPOSE = 1 << 2;
        const UI_STATE = 1 << 3;
        const SEARCH_PARAMETERS = 1 << 4;
        const RENDER_STATE = 1 << 5;
    }
}

/// Handle of a plain widget mounted in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub(crate) u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

/// Anything `add_widgets` mounted, as returned to the caller for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetHandle {
    Widget(WidgetId),
    Index(NodeId),
}

/// Shared, read-only configuration handed to every hook.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    pub routes: RouteCodec,
    /// Free-form template configuration forwarded to renderers.
    pub templates: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchMetadata {
    pub is_search_stalled: bool,
}

/// Everything a widget may read about its node during a traversal.
#[derive(Clone, Copy)]
pub struct RenderStateOptions<'a> {
    pub context: &'a SearchContext,
    pub widget: WidgetId,
    pub node: NodeId,
    pub index_id: &'a str,
    /// Key of the node in [`UiState`] and [`RenderState`].
    pub state_key: &'a str,
    pub parameters: &'a SearchParameters,
    pub results: Option<&'a Arc<SearchResults>>,
    /// Results of every index from the root down to this node, root first.
    pub scoped_results: &'a [ScopedResult],
    pub ui_state: &'a UiState,
    pub metadata: SearchMetadata,
}

impl RenderStateOptions<'_> {
    /// URL of the tree once this node's UI state is replaced by `state`.
    #[must_use]
    pub fn create_url(&self, state: IndexUiState) -> String {
        let mut ui_state = self.ui_state.clone();
        ui_state.insert(self.state_key, state);
        self.context.routes.create_url(&ui_state)
    }

    /// URL of the tree after applying `update` to this node's parameters.
    #[must_use]
    pub fn create_url_for(
        &self,
        update: impl FnOnce(SearchParameters) -> SearchParameters,
        project: impl FnOnce(&SearchParameters, IndexUiState) -> IndexUiState,
    ) -> String {
        let parameters = update(self.parameters.clone());
        let current = self.ui_state.get(self.state_key).cloned().unwrap_or_default();
        self.create_url(project(&parameters, current))
    }
}

pub struct InitOptions<'a> {
    pub scope: RenderStateOptions<'a>,
    pub mutations: &'a mut DeferredMutations,
}

pub struct RenderOptions<'a> {
    pub scope: RenderStateOptions<'a>,
    /// Aggregated render state of the whole tree for this pass.
    pub render_state: &'a Arc<RenderState>,
    /// Failure of the latest batch for this node, if it failed.
    pub error: Option<&'a QueryError>,
    pub mutations: &'a mut DeferredMutations,
}

impl RenderOptions<'_> {
    #[must_use]
    pub fn results(&self) -> Option<&Arc<SearchResults>> {
        self.scope.results
    }
}

pub struct DisposeOptions<'a> {
    pub context: &'a SearchContext,
    pub node: NodeId,
    pub index_id: &'a str,
    /// Parameters of the node, including replacements returned by widgets disposed earlier.
    pub parameters: &'a SearchParameters,
}

pub struct UiStateOptions<'a> {
    pub node: NodeId,
    pub index_id: &'a str,
    pub parameters: &'a SearchParameters,
}

pub struct SearchParametersOptions<'a> {
    pub node: NodeId,
    pub index_id: &'a str,
    pub ui_state: &'a IndexUiState,
}

/// Optional-hook contract implemented by every widget.
pub trait Widget {
    /// Tag under which the widget's render state is stored, e.g. `"searchBox"`.
    fn widget_type(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    fn init(&mut self, _options: &mut InitOptions<'_>) -> Result<(), WidgetError> {
        Ok(())
    }

    fn render(&mut self, _options: &mut RenderOptions<'_>) -> Result<(), WidgetError> {
        Ok(())
    }

    /// Tear down. Returned parameters replace the node's parameters.
    fn dispose(
        &mut self,
        _options: &DisposeOptions<'_>,
    ) -> Result<Option<SearchParameters>, WidgetError> {
        Ok(None)
    }

    fn widget_ui_state(&self, state: IndexUiState, _options: &UiStateOptions<'_>) -> IndexUiState {
        state
    }

    fn widget_search_parameters(
        &self,
        params: SearchParameters,
        _options: &SearchParametersOptions<'_>,
    ) -> SearchParameters {
        params
    }

    fn widget_render_state(&self, _options: &RenderStateOptions<'_>) -> Option<RenderContribution> {
        None
    }
}

/// Item accepted by `add_widgets`.
pub enum Mountable {
    Widget(Box<dyn Widget>),
    Index(IndexWidget),
}

impl Mountable {
    pub fn widget(widget: impl Widget + 'static) -> Self {
        Self::Widget(Box::new(widget))
    }
}

impl From<IndexWidget> for Mountable {
    fn from(index: IndexWidget) -> Self {
        Self::Index(index)
    }
}

impl From<Box<dyn Widget>> for Mountable {
    fn from(widget: Box<dyn Widget>) -> Self {
        Self::Widget(widget)
    }
}

impl fmt::Debug for Mountable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Widget(widget) => f.debug_tuple("Widget").field(&widget.widget_type()).finish(),
            Self::Index(index) => f.debug_tuple("Index").field(index).finish(),
        }
    }
}
