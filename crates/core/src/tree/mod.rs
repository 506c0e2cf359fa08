//! The index tree and its synchronization engine.
//!
//! Nodes live in an arena keyed by [`NodeId`]; a node links to its parent by
//! id only, so ownership flows strictly from [`SearchTree`] to nodes and from
//! nodes to their children. All traversals use pre-order: a node, then its
//! nested indices in mount order.

mod lifecycle;
mod node;
mod scheduler;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use serde_json::{Map, Value};

use crate::client::{BatchResponse, NodeQuery, QueryBatch, Responder, SearchClient};
use crate::error::EngineError;
use crate::events::{EngineEvent, EventBus};
use crate::parameters::SearchParameters;
use crate::routing::RouteCodec;
use crate::state::{IndexUiState, RenderState, UiState};
use crate::widget::{
    Capabilities, DeferredMutations, Mountable, Mutation, SearchContext, SearchParametersOptions,
    UiStateOptions, WidgetHandle, WidgetId,
};

use node::{Child, WidgetSlot};
use scheduler::QueryScheduler;

pub use node::{IndexNode, NodeId, ScopedResult};

/// Delay after which an unanswered batch flags every index as stalled.
pub const DEFAULT_STALLED_DELAY: Duration = Duration::from_millis(200);

pub struct SearchOptions {
    /// State applied to every index when the search starts.
    pub initial_ui_state: UiState,
    pub stalled_delay: Duration,
    pub routes: RouteCodec,
    pub templates: Map<String, Value>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            initial_ui_state: UiState::default(),
            stalled_delay: DEFAULT_STALLED_DELAY,
            routes: RouteCodec::default(),
            templates: Map::new(),
        }
    }
}

/// Root of a search experience: the index tree, its widgets and the query loop.
pub struct SearchTree {
    context: SearchContext,
    client: Box<dyn SearchClient>,
    root: NodeId,
    nodes: HashMap<NodeId, IndexNode>,
    widgets: HashMap<WidgetId, WidgetSlot>,
    next_node: u64,
    next_widget: u64,
    scheduler: QueryScheduler,
    responses_tx: Sender<BatchResponse>,
    responses_rx: Receiver<BatchResponse>,
    render_state: Arc<RenderState>,
    /// Latest state applied from outside; seeds indices mounted later on.
    routed_state: UiState,
    stalled_delay: Duration,
    deferred: DeferredMutations,
    events: EventBus,
    started: bool,
}

impl SearchTree {
    pub fn new(
        root_index: impl Into<String>,
        client: impl SearchClient + 'static,
        options: SearchOptions,
    ) -> Self {
        let index_name = root_index.into();
        let root = NodeId(0);
        let node = IndexNode::new(
            root,
            index_name.clone(),
            index_name.clone(),
            index_name,
            None,
        );
        let (responses_tx, responses_rx) = mpsc::channel();
        Self {
            context: SearchContext {
                routes: options.routes,
                templates: options.templates,
            },
            client: Box::new(client),
            root,
            nodes: HashMap::from([(root, node)]),
            widgets: HashMap::new(),
            next_node: 1,
            next_widget: 0,
            scheduler: QueryScheduler::default(),
            responses_tx,
            responses_rx,
            render_state: Arc::new(RenderState::default()),
            routed_state: options.initial_ui_state,
            stalled_delay: options.stalled_delay,
            deferred: DeferredMutations::default(),
            events: EventBus::default(),
            started: false,
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&IndexNode> {
        self.nodes.get(&id)
    }

    /// First mounted node whose state key is `key`.
    #[must_use]
    pub fn node_by_key(&self, key: &str) -> Option<&IndexNode> {
        self.nodes.values().find(|node| node.state_key == key)
    }

    #[must_use]
    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn is_widget_mounted(&self, widget: WidgetId) -> bool {
        self.widgets.contains_key(&widget)
    }

    /// Receive every [`EngineEvent`] published from now on.
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Render state computed by the latest pass.
    #[must_use]
    pub fn render_state(&self) -> Arc<RenderState> {
        Arc::clone(&self.render_state)
    }

    /// Mount `widgets` on `node`, in order.
    ///
    /// Nested indices mount their own widgets recursively. Once the search has
    /// started, the node's parameters are recomputed and every new widget is
    /// initialized right away; the next [`flush`](Self::flush) queries with
    /// their contributions.
    pub fn add_widgets(
        &mut self,
        node: NodeId,
        widgets: Vec<Mountable>,
    ) -> Result<Vec<WidgetHandle>, EngineError> {
        if !self.nodes.contains_key(&node) {
            return Err(EngineError::UnknownNode { node });
        }
        let mut taken: HashSet<String> = self
            .nodes
            .values()
            .map(|existing| existing.state_key.clone())
            .collect();
        let scope = self.key_scope(node);
        reserve_keys(scope.as_ref(), &widgets, &mut taken)?;

        let mut new_nodes = Vec::new();
        let handles: Vec<WidgetHandle> = widgets
            .into_iter()
            .map(|item| self.mount(node, item, &mut new_nodes))
            .collect();

        if self.started {
            for id in new_nodes {
                let state = self.routed_index_state(id);
                self.apply_index_ui_state(id, &state);
            }
            let fresh: Vec<WidgetId> = handles
                .iter()
                .filter_map(|handle| match handle {
                    WidgetHandle::Widget(widget) => Some(*widget),
                    WidgetHandle::Index(_) => None,
                })
                .collect();
            self.seed_widgets(node, &fresh);
            self.recompute_parameters(node);
            self.init_pending(node);
            self.refresh_render_state();
            self.scheduler.mark_dirty();
            self.apply_deferred();
        }
        Ok(handles)
    }

    /// Dispose and unmount `handles`, all children of `node`.
    ///
    /// Parameters returned by `dispose` replace the node's parameters in
    /// order. Removing an index disposes its whole subtree, deepest nodes
    /// first, and late responses for it are dropped.
    pub fn remove_widgets(
        &mut self,
        node: NodeId,
        handles: &[WidgetHandle],
    ) -> Result<(), EngineError> {
        if !self.nodes.contains_key(&node) {
            return Err(EngineError::UnknownNode { node });
        }
        for handle in handles {
            let is_child = match handle {
                WidgetHandle::Widget(widget) => self
                    .widgets
                    .get(widget)
                    .is_some_and(|slot| slot.node == node),
                WidgetHandle::Index(index) if *index == self.root => {
                    return Err(EngineError::RootRemoval);
                }
                WidgetHandle::Index(index) => self
                    .nodes
                    .get(index)
                    .is_some_and(|child| child.parent == Some(node)),
            };
            if !is_child {
                return Err(EngineError::NotAChild {
                    node,
                    handle: *handle,
                });
            }
        }

        for handle in handles {
            match handle {
                WidgetHandle::Widget(widget) => self.dispose_widget(*widget),
                WidgetHandle::Index(index) => self.dispose_index(*index),
            }
        }

        if self.started {
            self.scheduler.mark_dirty();
            self.refresh_render_state();
        }
        Ok(())
    }

    /// Apply the initial UI state, initialize every widget and issue the first batch.
    pub fn start(&mut self) -> Option<u64> {
        if self.started {
            return None;
        }
        self.started = true;
        for id in self.walk(self.root) {
            let state = self.routed_index_state(id);
            self.apply_index_ui_state(id, &state);
        }
        self.init_pending(self.root);
        self.refresh_render_state();
        self.scheduler.mark_dirty();
        self.apply_deferred();
        tracing::debug!(indices = self.nodes.len(), widgets = self.widgets.len(), "search started");
        self.flush()
    }

    /// Dispose every widget and index; the root stays mounted but empty.
    pub fn dispose(&mut self) {
        let Some(root) = self.nodes.get(&self.root) else {
            return;
        };
        let children = root.children.clone();
        for child in &children {
            if let Child::Index(index) = child {
                self.dispose_index(*index);
            }
        }
        for child in children {
            if let Child::Widget(widget) = child {
                self.dispose_widget(widget);
            }
        }
        self.started = false;
        self.render_state = Arc::new(RenderState::default());
        tracing::debug!("search disposed");
    }

    /// Project every node's parameters through its widgets.
    ///
    /// Keys follow pre-order; within a node, widgets contribute in mount order
    /// and the later widget wins on a shared facet.
    #[must_use]
    pub fn ui_state(&self) -> UiState {
        self.walk(self.root)
            .into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .map(|node| (node.state_key.clone(), self.project(node)))
            .collect()
    }

    pub fn index_ui_state(&self, node: NodeId) -> Result<IndexUiState, EngineError> {
        self.nodes
            .get(&node)
            .map(|node| self.project(node))
            .ok_or(EngineError::UnknownNode { node })
    }

    /// Replace the state of every index with `ui_state`.
    ///
    /// Indices missing from `ui_state` are reset. The change is batched into
    /// the next [`flush`](Self::flush).
    pub fn set_ui_state(&mut self, ui_state: UiState) {
        self.routed_state = ui_state;
        if !self.started {
            return;
        }
        for id in self.walk(self.root) {
            let state = self.routed_index_state(id);
            self.apply_index_ui_state(id, &state);
        }
        self.scheduler.mark_dirty();
    }

    pub fn set_index_ui_state(
        &mut self,
        node: NodeId,
        state: IndexUiState,
    ) -> Result<(), EngineError> {
        let key = self
            .nodes
            .get(&node)
            .map(|node| node.state_key.clone())
            .ok_or(EngineError::UnknownNode { node })?;
        self.routed_state.insert(key, state.clone());
        if self.started {
            self.apply_index_ui_state(node, &state);
            self.scheduler.mark_dirty();
        }
        Ok(())
    }

    /// Replace the parameters of `node` with `update` applied to them.
    pub fn refine(
        &mut self,
        node: NodeId,
        update: impl FnOnce(SearchParameters) -> SearchParameters,
    ) -> Result<(), EngineError> {
        let target = self
            .nodes
            .get_mut(&node)
            .ok_or(EngineError::UnknownNode { node })?;
        let parameters = std::mem::take(&mut target.parameters);
        target.parameters = update(parameters);
        self.scheduler.mark_dirty();
        Ok(())
    }

    /// `(index_id, results, parameters)` of every index from the root down to `node`.
    pub fn scoped_results(&self, node: NodeId) -> Result<Vec<ScopedResult>, EngineError> {
        if !self.nodes.contains_key(&node) {
            return Err(EngineError::UnknownNode { node });
        }
        Ok(self.scoped_results_of(node))
    }

    #[must_use]
    pub fn create_url(&self, ui_state: &UiState) -> String {
        self.context.routes.create_url(ui_state)
    }

    /// URL of the current UI state.
    #[must_use]
    pub fn url(&self) -> String {
        self.create_url(&self.ui_state())
    }

    /// Issue one batch with one query per mounted index, if anything changed.
    pub fn flush(&mut self) -> Option<u64> {
        if !self.started || !self.scheduler.is_dirty() {
            return None;
        }
        let order = self.walk(self.root);
        let queries: Vec<NodeQuery> = order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|node| NodeQuery {
                node: node.id,
                index_id: node.index_id.clone(),
                parameters: node.parameters.clone(),
            })
            .collect();
        let id = self.scheduler.issue(order);
        tracing::debug!(batch = id, queries = queries.len(), "issuing search batch");
        let responder = Responder::new(id, self.responses_tx.clone());
        self.client.search(QueryBatch { id, queries }, responder);
        Some(id)
    }

    /// Apply every response that already arrived and render. Never blocks.
    ///
    /// Returns the number of responses handled, stale ones included.
    pub fn poll(&mut self) -> usize {
        let responses: Vec<BatchResponse> = self.responses_rx.try_iter().collect();
        self.process(responses)
    }

    /// Block until at least one response arrives, then behave like [`poll`](Self::poll).
    ///
    /// Returns immediately with `0` when no batch is in flight.
    pub fn wait(&mut self, timeout: Duration) -> Result<usize, EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            let handled = self.poll();
            if handled > 0 || !self.scheduler.is_in_flight() {
                return Ok(handled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(EngineError::Timeout {
                    millis: timeout.as_millis(),
                });
            }
            let mut slice = deadline - now;
            if let Some(until_stalled) = self.scheduler.until_stalled(now, self.stalled_delay) {
                slice = slice.min(until_stalled.max(Duration::from_millis(1)));
            }
            match self.responses_rx.recv_timeout(slice) {
                Ok(response) => {
                    let mut responses = vec![response];
                    responses.extend(self.responses_rx.try_iter());
                    return Ok(self.process(responses));
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(EngineError::Disconnected),
            }
        }
    }

    /// Flush and wait until nothing is left in flight.
    pub fn settle(&mut self, timeout: Duration) -> Result<(), EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.flush();
            if !self.scheduler.is_in_flight() {
                return Ok(());
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            self.wait(remaining)?;
        }
    }

    fn process(&mut self, responses: Vec<BatchResponse>) -> usize {
        let handled = responses.len();
        let mut latest = None;
        for response in responses {
            let batch_id = response.batch_id;
            self.apply_response(response);
            latest = latest.max(Some(batch_id));
        }
        if let Some(stalled) = self.check_stalled() {
            latest = latest.max(Some(stalled));
        }
        if !self.scheduler.is_in_flight() {
            for node in self.nodes.values_mut() {
                node.is_search_stalled = false;
            }
        }
        if self.started && self.nodes.values().any(|node| node.needs_render) {
            self.render_pass(latest.or(self.scheduler.latest_issued()).unwrap_or_default());
        }
        handled
    }

    fn apply_response(&mut self, response: BatchResponse) {
        let BatchResponse { batch_id, outcome } = response;
        let queried = self.scheduler.settle(batch_id);
        let Self { nodes, events, .. } = self;
        match outcome {
            Ok(results) => {
                for entry in results {
                    let Some(node) = nodes.get_mut(&entry.node) else {
                        tracing::trace!(batch = batch_id, node = %entry.node, "dropping results of an unmounted index");
                        continue;
                    };
                    if node.last_received.is_some_and(|last| last >= batch_id) {
                        discard_stale(events, node, batch_id);
                        continue;
                    }
                    node.results = Some(Arc::new(entry.results));
                    node.error = None;
                    node.last_received = Some(batch_id);
                    node.needs_render = true;
                }
            }
            Err(error) => {
                tracing::warn!(batch = batch_id, %error, "search batch failed");
                events.emit(EngineEvent::QueryFailed {
                    batch_id,
                    error: error.clone(),
                });
                for id in queried {
                    let Some(node) = nodes.get_mut(&id) else {
                        continue;
                    };
                    if node.last_received.is_some_and(|last| last >= batch_id) {
                        discard_stale(events, node, batch_id);
                        continue;
                    }
                    node.error = Some(error.clone());
                    node.last_received = Some(batch_id);
                    node.needs_render = true;
                }
            }
        }
    }

    fn check_stalled(&mut self) -> Option<u64> {
        let batch_id = self
            .scheduler
            .take_stalled(Instant::now(), self.stalled_delay)?;
        tracing::debug!(batch = batch_id, "search stalled");
        for node in self.nodes.values_mut() {
            node.is_search_stalled = true;
            if node.results.is_some() || node.error.is_some() {
                node.needs_render = true;
            }
        }
        self.events.emit(EngineEvent::SearchStalled { batch_id });
        Some(batch_id)
    }

    /// Apply queued mutations until hooks stop queuing new ones.
    fn apply_deferred(&mut self) {
        loop {
            let mutations = self.deferred.take();
            if mutations.is_empty() {
                return;
            }
            for mutation in mutations {
                let outcome = match mutation {
                    Mutation::AddWidgets { node, widgets } => {
                        self.add_widgets(node, widgets).map(drop)
                    }
                    Mutation::RemoveWidgets { node, handles } => {
                        self.remove_widgets(node, &handles)
                    }
                    Mutation::Refine { node, update } => self.refine(node, update),
                    Mutation::SetIndexUiState { node, state } => {
                        self.set_index_ui_state(node, state)
                    }
                };
                if let Err(error) = outcome {
                    tracing::warn!(%error, "deferred mutation failed");
                }
            }
        }
    }

    fn mount(&mut self, parent: NodeId, item: Mountable, new_nodes: &mut Vec<NodeId>) -> WidgetHandle {
        match item {
            Mountable::Widget(widget) => {
                let id = WidgetId(self.next_widget);
                self.next_widget += 1;
                tracing::debug!(widget = widget.widget_type(), %id, index = %parent, "mounting widget");
                self.widgets.insert(
                    id,
                    WidgetSlot {
                        widget,
                        node: parent,
                        initialized: false,
                    },
                );
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.children.push(Child::Widget(id));
                }
                WidgetHandle::Widget(id)
            }
            Mountable::Index(index) => {
                let (index_name, index_id, widgets) = index.into_parts();
                let state_key = self
                    .key_scope(parent)
                    .map_or_else(|| index_id.clone(), |scope| scope.child_key(&index_id));
                let id = NodeId(self.next_node);
                self.next_node += 1;
                tracing::debug!(%id, index_id = %index_id, state_key = %state_key, "mounting index");
                self.nodes.insert(
                    id,
                    IndexNode::new(id, index_name, index_id, state_key, Some(parent)),
                );
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.children.push(Child::Index(id));
                }
                new_nodes.push(id);
                for widget in widgets {
                    self.mount(id, widget, new_nodes);
                }
                WidgetHandle::Index(id)
            }
        }
    }

    fn key_scope(&self, node: NodeId) -> Option<KeyScope> {
        self.nodes.get(&node).map(|target| KeyScope {
            key: target.state_key.clone(),
            is_root: node == self.root,
        })
    }

    fn routed_index_state(&self, node: NodeId) -> IndexUiState {
        self.nodes
            .get(&node)
            .and_then(|node| self.routed_state.get(&node.state_key))
            .cloned()
            .unwrap_or_default()
    }

    /// Pre-order list of `from` and every index below it.
    fn walk(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            order.push(id);
            let children: Vec<NodeId> = node.indices().collect();
            stack.extend(children.into_iter().rev());
        }
        order
    }

    fn scoped_results_of(&self, node: NodeId) -> Vec<ScopedResult> {
        let mut scoped = Vec::new();
        let mut current = self.nodes.get(&node);
        while let Some(node) = current {
            scoped.push(node.scoped());
            current = node.parent.and_then(|parent| self.nodes.get(&parent));
        }
        scoped.reverse();
        scoped
    }

    fn project(&self, node: &IndexNode) -> IndexUiState {
        let options = UiStateOptions {
            node: node.id,
            index_id: &node.index_id,
            parameters: &node.parameters,
        };
        self.widgets_of(node, Capabilities::UI_STATE)
            .fold(IndexUiState::default(), |state, slot| {
                slot.widget.widget_ui_state(state, &options)
            })
    }

    /// Fold `state` through the widgets of `node`, starting from `base`.
    fn parameters_for(&self, node: &IndexNode, state: &IndexUiState, base: SearchParameters) -> SearchParameters {
        let options = SearchParametersOptions {
            node: node.id,
            index_id: &node.index_id,
            ui_state: state,
        };
        self.widgets_of(node, Capabilities::SEARCH_PARAMETERS)
            .fold(base, |params, slot| {
                slot.widget.widget_search_parameters(params, &options)
            })
    }

    /// Replace the parameters of `node` with what its widgets derive from `state`.
    fn apply_index_ui_state(&mut self, node: NodeId, state: &IndexUiState) {
        let Some(target) = self.nodes.get(&node) else {
            return;
        };
        let base = SearchParameters::new(target.index_name.clone());
        let parameters = self.parameters_for(target, state, base);
        if let Some(target) = self.nodes.get_mut(&node) {
            target.parameters = parameters;
        }
    }

    /// Let widgets mounted late on `node` pick up the routed state.
    ///
    /// Facets the node already projects win over the routed ones, so live
    /// refinements survive.
    fn seed_widgets(&mut self, node: NodeId, fresh: &[WidgetId]) {
        let Some(target) = self.nodes.get(&node) else {
            return;
        };
        if fresh.is_empty() {
            return;
        }
        let seed = self.routed_index_state(node).overlaid_with(self.project(target));
        let options = SearchParametersOptions {
            node,
            index_id: &target.index_id,
            ui_state: &seed,
        };
        let parameters = fresh
            .iter()
            .filter_map(|id| self.widgets.get(id))
            .filter(|slot| {
                slot.widget
                    .capabilities()
                    .contains(Capabilities::SEARCH_PARAMETERS)
            })
            .fold(target.parameters.clone(), |params, slot| {
                slot.widget.widget_search_parameters(params, &options)
            });
        if let Some(target) = self.nodes.get_mut(&node) {
            target.parameters = parameters;
        }
    }

    /// Re-derive the parameters of `node` from its own projection.
    fn recompute_parameters(&mut self, node: NodeId) {
        let Some(target) = self.nodes.get(&node) else {
            return;
        };
        let state = self.project(target);
        let parameters = self.parameters_for(target, &state, target.parameters.clone());
        if let Some(target) = self.nodes.get_mut(&node) {
            target.parameters = parameters;
        }
    }

    fn widgets_of<'a>(
        &'a self,
        node: &'a IndexNode,
        capability: Capabilities,
    ) -> impl Iterator<Item = &'a WidgetSlot> + 'a {
        node.widgets()
            .filter_map(|id| self.widgets.get(&id))
            .filter(move |slot| slot.widget.capabilities().contains(capability))
    }
}

fn discard_stale(events: &mut EventBus, node: &IndexNode, batch_id: u64) {
    tracing::trace!(batch = batch_id, index = %node.index_id, "discarding stale response");
    events.emit(EngineEvent::StaleResultDiscarded {
        batch_id,
        index_id: node.index_id.clone(),
    });
}

/// State key of a node, seen from the children mounted under it.
struct KeyScope {
    key: String,
    is_root: bool,
}

impl KeyScope {
    /// Children of the root use their bare id unless it is the root's own
    /// key; every other child is keyed by its `/`-joined path.
    fn child_key(&self, index_id: &str) -> String {
        if self.is_root && index_id != self.key {
            index_id.to_string()
        } else {
            format!("{}/{index_id}", self.key)
        }
    }
}

/// Reserve the state key of every index in `items`, recursively.
fn reserve_keys(
    scope: Option<&KeyScope>,
    items: &[Mountable],
    taken: &mut HashSet<String>,
) -> Result<(), EngineError> {
    for item in items {
        let Mountable::Index(index) = item else {
            continue;
        };
        let key = scope.map_or_else(
            || index.index_id().to_string(),
            |scope| scope.child_key(index.index_id()),
        );
        if !taken.insert(key.clone()) {
            return Err(EngineError::DuplicateIndexId {
                index_id: index.index_id().to_string(),
                key,
            });
        }
        let nested = KeyScope {
            key,
            is_root: false,
        };
        reserve_keys(Some(&nested), index.widgets(), taken)?;
    }
    Ok(())
}
