use std::fmt;

use super::{Mountable, WidgetHandle};
use crate::parameters::SearchParameters;
use crate::state::IndexUiState;
use crate::tree::NodeId;

type ParameterUpdate = Box<dyn FnOnce(SearchParameters) -> SearchParameters>;

pub(crate) enum Mutation {
    AddWidgets {
        node: NodeId,
        widgets: Vec<Mountable>,
    },
    RemoveWidgets {
        node: NodeId,
        handles: Vec<WidgetHandle>,
    },
    Refine {
        node: NodeId,
        update: ParameterUpdate,
    },
    SetIndexUiState {
        node: NodeId,
        state: IndexUiState,
    },
}

/// Structural changes and refinements requested from inside a hook.
///
/// Hooks run while the tree walks its nodes, so nothing they ask for can be
/// applied on the spot. Requests are queued here and applied in order once
/// the current pass is over.
#[derive(Default)]
pub struct DeferredMutations {
    queue: Vec<Mutation>,
}

impl DeferredMutations {
    pub fn add_widgets(&mut self, node: NodeId, widgets: Vec<Mountable>) {
        self.queue.push(Mutation::AddWidgets { node, widgets });
    }

    pub fn remove_widgets(&mut self, node: NodeId, handles: Vec<WidgetHandle>) {
        self.queue.push(Mutation::RemoveWidgets { node, handles });
    }

    /// Replace the parameters of `node` with `update` applied to them.
    pub fn refine(
        &mut self,
        node: NodeId,
        update: impl FnOnce(SearchParameters) -> SearchParameters + 'static,
    ) {
        self.queue.push(Mutation::Refine {
            node,
            update: Box::new(update),
        });
    }

    pub fn set_index_ui_state(&mut self, node: NodeId, state: IndexUiState) {
        self.queue.push(Mutation::SetIndexUiState { node, state });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.queue)
    }
}

impl fmt::Debug for DeferredMutations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredMutations")
            .field("queued", &self.queue.len())
            .finish()
    }
}
