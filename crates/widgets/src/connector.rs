//! Glue turning a [`Connector`] into a mountable widget.
//!
//! A connector only describes its domain: which facet it translates, what it
//! exposes for rendering and how it cleans up. [`Connected`] implements the
//! lifecycle hooks around it and forwards every init and render to an
//! optional [`Renderer`].

use facetree_core::translate::FacetTranslator;
use facetree_core::{
    Capabilities, DeferredMutations, DisposeOptions, IndexUiState, InitOptions, Mountable, NodeId,
    QueryError, RenderContribution, RenderOptions, RenderStateOptions, SearchParameters,
    SearchParametersOptions, UiStateOptions, Widget, WidgetError, WidgetRenderState,
};
use serde_json::{Map, Value};

/// Arguments handed to a [`Renderer`].
pub struct RenderCall<'a> {
    pub state: &'a WidgetRenderState,
    /// Index node the widget is mounted on, for queuing refinements.
    pub node: NodeId,
    /// `true` for the call made from `init`, before any results exist.
    pub is_first_render: bool,
    pub is_search_stalled: bool,
    pub error: Option<&'a QueryError>,
    pub mutations: &'a mut DeferredMutations,
}

/// Callback invoked on init and on every render of a connected widget.
pub type Renderer = Box<dyn FnMut(RenderCall<'_>) -> Result<(), WidgetError>>;

/// Parameter update produced by a widget action, for `refine` or
/// [`DeferredMutations::refine`].
pub type Refinement = Box<dyn FnOnce(SearchParameters) -> SearchParameters>;

/// Domain half of a widget.
pub trait Connector {
    fn widget_type(&self) -> &'static str;

    /// Attribute keying the render state when one index mounts several
    /// widgets of this type.
    fn attribute(&self) -> Option<&str> {
        None
    }

    fn widget_params(&self) -> Value;

    fn translator(&self) -> Option<&dyn FacetTranslator> {
        None
    }

    fn capabilities(&self) -> Capabilities {
        let base = Capabilities::INIT
            | Capabilities::RENDER
            | Capabilities::DISPOSE
            | Capabilities::RENDER_STATE;
        if self.translator().is_some() {
            base | Capabilities::UI_STATE | Capabilities::SEARCH_PARAMETERS
        } else {
            base
        }
    }

    fn search_parameters(
        &self,
        params: SearchParameters,
        options: &SearchParametersOptions<'_>,
    ) -> SearchParameters {
        match self.translator() {
            Some(translator) => translator.to_search_parameters(options.ui_state, params),
            None => params,
        }
    }

    fn render_data(&self, options: &RenderStateOptions<'_>) -> Map<String, Value>;

    /// Parameters of the node once the widget is gone; `None` leaves them as they are.
    fn cleanup(&self, _params: &SearchParameters) -> Option<SearchParameters> {
        None
    }

    /// Attach a renderer.
    fn with_renderer(
        self,
        renderer: impl FnMut(RenderCall<'_>) -> Result<(), WidgetError> + 'static,
    ) -> Connected<Self>
    where
        Self: Sized,
    {
        Connected::new(self).with_renderer(renderer)
    }

    /// Wrap the connector, without a renderer, ready for `add_widgets`.
    fn mount(self) -> Mountable
    where
        Self: Sized + 'static,
    {
        Connected::new(self).into()
    }
}

/// A [`Connector`] plus its renderer.
pub struct Connected<C> {
    connector: C,
    renderer: Option<Renderer>,
}

impl<C: Connector> Connected<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            renderer: None,
        }
    }

    #[must_use]
    pub fn with_renderer(
        mut self,
        renderer: impl FnMut(RenderCall<'_>) -> Result<(), WidgetError> + 'static,
    ) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn render_state(&self, options: &RenderStateOptions<'_>) -> WidgetRenderState {
        WidgetRenderState::new(
            self.connector.render_data(options),
            self.connector.widget_params(),
        )
    }

    fn call_renderer(
        &mut self,
        scope: &RenderStateOptions<'_>,
        is_first_render: bool,
        error: Option<&QueryError>,
        mutations: &mut DeferredMutations,
    ) -> Result<(), WidgetError> {
        if self.renderer.is_none() {
            return Ok(());
        }
        let state = self.render_state(scope);
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        renderer(RenderCall {
            state: &state,
            node: scope.node,
            is_first_render,
            is_search_stalled: scope.metadata.is_search_stalled,
            error,
            mutations,
        })
    }
}

impl<C: Connector + 'static> From<Connected<C>> for Mountable {
    fn from(widget: Connected<C>) -> Self {
        Mountable::widget(widget)
    }
}

impl<C: Connector> Widget for Connected<C> {
    fn widget_type(&self) -> &'static str {
        self.connector.widget_type()
    }

    fn capabilities(&self) -> Capabilities {
        self.connector.capabilities()
    }

    fn init(&mut self, options: &mut InitOptions<'_>) -> Result<(), WidgetError> {
        let scope = options.scope;
        self.call_renderer(&scope, true, None, options.mutations)
    }

    fn render(&mut self, options: &mut RenderOptions<'_>) -> Result<(), WidgetError> {
        let scope = options.scope;
        self.call_renderer(&scope, false, options.error, options.mutations)
    }

    fn dispose(
        &mut self,
        options: &DisposeOptions<'_>,
    ) -> Result<Option<SearchParameters>, WidgetError> {
        Ok(self.connector.cleanup(options.parameters))
    }

    fn widget_ui_state(&self, state: IndexUiState, options: &UiStateOptions<'_>) -> IndexUiState {
        match self.connector.translator() {
            Some(translator) => translator.to_ui_state(options.parameters, state),
            None => state,
        }
    }

    fn widget_search_parameters(
        &self,
        params: SearchParameters,
        options: &SearchParametersOptions<'_>,
    ) -> SearchParameters {
        self.connector.search_parameters(params, options)
    }

    fn widget_render_state(&self, options: &RenderStateOptions<'_>) -> Option<RenderContribution> {
        let state = self.render_state(options);
        let widget_type = self.connector.widget_type();
        Some(match self.connector.attribute() {
            Some(attribute) => RenderContribution::for_attribute(widget_type, attribute, state),
            None => RenderContribution::new(widget_type, state),
        })
    }
}
