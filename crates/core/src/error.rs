use thiserror::Error;

use crate::tree::NodeId;
use crate::widget::WidgetHandle;

/// Errors returned when the tree is driven with invalid arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The node is not (or no longer) mounted in the tree.
    #[error("index node {node} is not mounted")]
    UnknownNode { node: NodeId },

    /// The handle does not refer to a child of the node it was removed from.
    #[error("{handle:?} is not a child of index node {node}")]
    NotAChild { node: NodeId, handle: WidgetHandle },

    /// Mounting the index would reuse a state key already owned by another node.
    #[error("index id '{index_id}' resolves to state key '{key}' which is already in use")]
    DuplicateIndexId { index_id: String, key: String },

    /// The root index cannot be removed from its own tree.
    #[error("the root index cannot be removed")]
    RootRemoval,

    /// Waiting for a response timed out.
    #[error("no search response arrived within {millis}ms")]
    Timeout { millis: u128 },

    /// The response channel was closed while responses were still expected.
    #[error("search response channel disconnected")]
    Disconnected,
}

/// Failure raised from inside a widget lifecycle hook.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{widget_type}: {message}")]
pub struct WidgetError {
    pub widget_type: &'static str,
    pub message: String,
}

impl WidgetError {
    pub fn new(widget_type: &'static str, message: impl Into<String>) -> Self {
        Self {
            widget_type,
            message: message.into(),
        }
    }
}

/// A serialized facet value did not match its grammar.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FacetParseError {
    #[error("range '{0}' is not of the form <min>:<max>")]
    Range(String),

    #[error("'{0}' is not a number")]
    Number(String),

    #[error("bounding box '{0}' must contain four comma separated coordinates")]
    BoundingBox(String),

    #[error("position '{0}' must be of the form <lat>,<lng>")]
    Position(String),

    #[error("hierarchical level '{level}' does not extend '{parent}'")]
    Hierarchy { parent: String, level: String },
}

/// Failure reported by the external search client for a whole batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("search client failed: {0}")]
    Client(String),

    #[error("search client dropped the request without answering")]
    Dropped,
}
