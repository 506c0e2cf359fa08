//! Contract with the external search client.
//!
//! The tree hands every batch to a [`SearchClient`] together with a
//! [`Responder`]. The client answers whenever it is ready, from any thread;
//! answers are queued on a channel that the tree drains on its own schedule.

mod manual;
mod memory;

use std::sync::mpsc::Sender;

use crate::error::QueryError;
use crate::parameters::SearchParameters;
use crate::results::SearchResults;
use crate::tree::NodeId;

pub use manual::ManualClient;
pub use memory::{MemoryClient, execute};

/// Parameters of one index within a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeQuery {
    pub node: NodeId,
    pub index_id: String,
    pub parameters: SearchParameters,
}

/// All queries issued during one search tick.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBatch {
    pub id: u64,
    pub queries: Vec<NodeQuery>,
}

/// Results for one node of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeResults {
    pub node: NodeId,
    pub results: SearchResults,
}

/// Answer to a [`QueryBatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse {
    pub batch_id: u64,
    pub outcome: Result<Vec<NodeResults>, QueryError>,
}

/// One-shot handle for answering a batch.
///
/// Dropping a responder without answering reports [`QueryError::Dropped`].
#[derive(Debug)]
pub struct Responder {
    batch_id: u64,
    tx: Option<Sender<BatchResponse>>,
}

impl Responder {
    pub(crate) fn new(batch_id: u64, tx: Sender<BatchResponse>) -> Self {
        Self {
            batch_id,
            tx: Some(tx),
        }
    }

    #[must_use]
    pub fn batch_id(&self) -> u64 {
        self.batch_id
    }

    /// Deliver results. Returns `false` when the tree is gone.
    pub fn resolve(mut self, results: Vec<NodeResults>) -> bool {
        self.send(Ok(results))
    }

    /// Report a failure for the whole batch. Returns `false` when the tree is gone.
    pub fn reject(mut self, error: QueryError) -> bool {
        self.send(Err(error))
    }

    fn send(&mut self, outcome: Result<Vec<NodeResults>, QueryError>) -> bool {
        let Some(tx) = self.tx.take() else {
            return false;
        };
        tx.send(BatchResponse {
            batch_id: self.batch_id,
            outcome,
        })
        .is_ok()
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if self.tx.is_some() {
            self.send(Err(QueryError::Dropped));
        }
    }
}

/// Executes query batches on behalf of a [`SearchTree`](crate::SearchTree).
///
/// Implementations must not block: they should queue the work and answer
/// through the responder later.
pub trait SearchClient {
    fn search(&mut self, batch: QueryBatch, responder: Responder);
}

impl<C: SearchClient + ?Sized> SearchClient for Box<C> {
    fn search(&mut self, batch: QueryBatch, responder: Responder) {
        (**self).search(batch, responder);
    }
}
