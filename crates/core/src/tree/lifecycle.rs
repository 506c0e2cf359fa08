//! Hook dispatch: init, render, dispose and render-state aggregation.
//!
//! A failing hook is reported on the event bus and traversal moves on to the
//! next widget. Hooks queue structural changes in the tree's
//! [`DeferredMutations`](crate::DeferredMutations); callers apply them once
//! the traversal is over.

use std::sync::Arc;

use super::node::Child;
use super::{NodeId, ScopedResult, SearchTree};
use crate::error::WidgetError;
use crate::events::{EngineEvent, EventBus, Hook};
use crate::state::{IndexRenderState, RenderState, UiState};
use crate::widget::{
    Capabilities, DisposeOptions, InitOptions, RenderOptions, RenderStateOptions, SearchMetadata,
    WidgetId,
};

impl SearchTree {
    /// Initialize every widget below `node` that has not been initialized, in mount order.
    pub(super) fn init_pending(&mut self, node: NodeId) {
        let ui_state = self.ui_state();
        self.init_children(node, &ui_state);
    }

    fn init_children(&mut self, node: NodeId, ui_state: &UiState) {
        let Some(target) = self.nodes.get(&node) else {
            return;
        };
        let children = target.children.clone();
        let scoped = self.scoped_results_of(node);
        for child in children {
            match child {
                Child::Index(index) => self.init_children(index, ui_state),
                Child::Widget(widget) => self.init_widget(node, widget, &scoped, ui_state),
            }
        }
    }

    fn init_widget(
        &mut self,
        node: NodeId,
        widget: WidgetId,
        scoped: &[ScopedResult],
        ui_state: &UiState,
    ) {
        let Self {
            nodes,
            widgets,
            context,
            deferred,
            events,
            ..
        } = self;
        let (Some(target), Some(slot)) = (nodes.get(&node), widgets.get_mut(&widget)) else {
            return;
        };
        if slot.initialized {
            return;
        }
        slot.initialized = true;
        if !slot.widget.capabilities().contains(Capabilities::INIT) {
            return;
        }
        let mut options = InitOptions {
            scope: RenderStateOptions {
                context: &*context,
                widget,
                node,
                index_id: &target.index_id,
                state_key: &target.state_key,
                parameters: &target.parameters,
                results: target.results.as_ref(),
                scoped_results: scoped,
                ui_state,
                metadata: SearchMetadata {
                    is_search_stalled: target.is_search_stalled,
                },
            },
            mutations: &mut *deferred,
        };
        if let Err(error) = slot.widget.init(&mut options) {
            report(events, Hook::Init, &target.index_id, error);
        }
    }

    /// Rebuild the render state from scratch and render every node with new data.
    ///
    /// Nodes render in pre-order; within a node, widgets render in mount order.
    pub(super) fn render_pass(&mut self, batch_id: u64) {
        self.refresh_render_state();
        let render_state = Arc::clone(&self.render_state);
        let ui_state = self.ui_state();

        for node in self.walk(self.root) {
            let scoped = self.scoped_results_of(node);
            let Self {
                nodes,
                widgets,
                context,
                deferred,
                events,
                ..
            } = self;
            let Some(target) = nodes.get_mut(&node) else {
                continue;
            };
            if !std::mem::take(&mut target.needs_render) {
                continue;
            }
            let target = &*target;
            for widget in target.widgets() {
                let Some(slot) = widgets.get_mut(&widget) else {
                    continue;
                };
                if !slot.initialized || !slot.widget.capabilities().contains(Capabilities::RENDER) {
                    continue;
                }
                let mut options = RenderOptions {
                    scope: RenderStateOptions {
                        context: &*context,
                        widget,
                        node,
                        index_id: &target.index_id,
                        state_key: &target.state_key,
                        parameters: &target.parameters,
                        results: target.results.as_ref(),
                        scoped_results: &scoped,
                        ui_state: &ui_state,
                        metadata: SearchMetadata {
                            is_search_stalled: target.is_search_stalled,
                        },
                    },
                    render_state: &render_state,
                    error: target.error.as_ref(),
                    mutations: &mut *deferred,
                };
                if let Err(error) = slot.widget.render(&mut options) {
                    report(events, Hook::Render, &target.index_id, error);
                }
            }
        }

        self.events.emit(EngineEvent::Rendered { batch_id });
        self.apply_deferred();
    }

    /// Replace the render state with a fresh aggregation of every mounted widget.
    pub(super) fn refresh_render_state(&mut self) {
        let ui_state = self.ui_state();
        let mut render_state = RenderState::default();
        for node in self.walk(self.root) {
            let Some(target) = self.nodes.get(&node) else {
                continue;
            };
            let scoped = self.scoped_results_of(node);
            let mut index_state = IndexRenderState::default();
            for widget in target.widgets() {
                let Some(slot) = self.widgets.get(&widget) else {
                    continue;
                };
                if !slot.widget.capabilities().contains(Capabilities::RENDER_STATE) {
                    continue;
                }
                let options = RenderStateOptions {
                    context: &self.context,
                    widget,
                    node,
                    index_id: &target.index_id,
                    state_key: &target.state_key,
                    parameters: &target.parameters,
                    results: target.results.as_ref(),
                    scoped_results: &scoped,
                    ui_state: &ui_state,
                    metadata: SearchMetadata {
                        is_search_stalled: target.is_search_stalled,
                    },
                };
                if let Some(contribution) = slot.widget.widget_render_state(&options) {
                    index_state.merge(contribution);
                }
            }
            render_state.insert(target.state_key.clone(), index_state);
        }
        self.render_state = Arc::new(render_state);
    }

    /// Dispose one widget and detach it from its node.
    pub(super) fn dispose_widget(&mut self, widget: WidgetId) {
        let Some(mut slot) = self.widgets.remove(&widget) else {
            return;
        };
        let Self {
            nodes,
            context,
            events,
            ..
        } = self;
        let Some(target) = nodes.get_mut(&slot.node) else {
            return;
        };
        if slot.widget.capabilities().contains(Capabilities::DISPOSE) {
            let options = DisposeOptions {
                context: &*context,
                node: target.id,
                index_id: &target.index_id,
                parameters: &target.parameters,
            };
            match slot.widget.dispose(&options) {
                Ok(Some(parameters)) => target.parameters = parameters,
                Ok(None) => {}
                Err(error) => report(events, Hook::Dispose, &target.index_id, error),
            }
        }
        target.children.retain(|child| *child != Child::Widget(widget));
        tracing::debug!(widget = slot.widget.widget_type(), %widget, index = %target.id, "disposed widget");
    }

    /// Dispose the subtree of `node`: nested indices first, then its own widgets.
    pub(super) fn dispose_index(&mut self, node: NodeId) {
        let Some(target) = self.nodes.get(&node) else {
            return;
        };
        let children = target.children.clone();
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
        let Some(removed) = self.nodes.remove(&node) else {
            return;
        };
        if let Some(parent) = removed.parent.and_then(|parent| self.nodes.get_mut(&parent)) {
            parent.children.retain(|child| *child != Child::Index(node));
        }
        tracing::debug!(index = %node, index_id = %removed.index_id, "disposed index");
    }
}

fn report(events: &mut EventBus, hook: Hook, index_id: &str, error: WidgetError) {
    tracing::warn!(%hook, index_id, %error, "widget hook failed");
    events.emit(EngineEvent::WidgetHookFailed {
        hook,
        index_id: index_id.to_string(),
        error,
    });
}
