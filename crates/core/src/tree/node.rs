use std::fmt;
use std::sync::Arc;

use crate::error::QueryError;
use crate::parameters::SearchParameters;
use crate::results::SearchResults;
use crate::widget::{Widget, WidgetId};

/// Arena key of an index node. Never reused within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Child {
    Widget(WidgetId),
    Index(NodeId),
}

/// Results of one index as seen from a node below (or at) it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedResult {
    pub index_id: String,
    /// `None` until the index received its first response.
    pub results: Option<Arc<SearchResults>>,
    pub parameters: SearchParameters,
}

/// One index of the tree: its parameters, latest results and children.
#[derive(Debug)]
pub struct IndexNode {
    pub(crate) id: NodeId,
    pub(crate) index_name: String,
    pub(crate) index_id: String,
    pub(crate) state_key: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<Child>,
    pub(crate) parameters: SearchParameters,
    pub(crate) results: Option<Arc<SearchResults>>,
    pub(crate) error: Option<QueryError>,
    /// Newest batch whose answer was applied to this node.
    pub(crate) last_received: Option<u64>,
    pub(crate) needs_render: bool,
    pub(crate) is_search_stalled: bool,
}

impl IndexNode {
    pub(crate) fn new(
        id: NodeId,
        index_name: String,
        index_id: String,
        state_key: String,
        parent: Option<NodeId>,
    ) -> Self {
        let parameters = SearchParameters::new(index_name.clone());
        Self {
            id,
            index_name,
            index_id,
            state_key,
            parent,
            children: Vec::new(),
            parameters,
            results: None,
            error: None,
            last_received: None,
            needs_render: false,
            is_search_stalled: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    #[must_use]
    pub fn index_id(&self) -> &str {
        &self.index_id
    }

    /// Key of this node in the tree's UI state and render state.
    #[must_use]
    pub fn state_key(&self) -> &str {
        &self.state_key
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn parameters(&self) -> &SearchParameters {
        &self.parameters
    }

    #[must_use]
    pub fn results(&self) -> Option<&Arc<SearchResults>> {
        self.results.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn is_search_stalled(&self) -> bool {
        self.is_search_stalled
    }

    /// Plain widgets in mount order.
    pub fn widgets(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.children.iter().filter_map(|child| match child {
            Child::Widget(widget) => Some(*widget),
            Child::Index(_) => None,
        })
    }

    /// Nested indices in mount order.
    pub fn indices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().filter_map(|child| match child {
            Child::Index(node) => Some(*node),
            Child::Widget(_) => None,
        })
    }

    pub(crate) fn scoped(&self) -> ScopedResult {
        ScopedResult {
            index_id: self.index_id.clone(),
            results: self.results.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

pub(crate) struct WidgetSlot {
    pub(crate) widget: Box<dyn Widget>,
    pub(crate) node: NodeId,
    pub(crate) initialized: bool,
}
