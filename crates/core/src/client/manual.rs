use std::cell::RefCell;
use std::rc::Rc;

use super::{NodeQuery, NodeResults, QueryBatch, Responder, SearchClient};
use crate::error::QueryError;
use crate::results::SearchResults;

#[derive(Default)]
struct ManualQueue {
    issued: Vec<QueryBatch>,
    pending: Vec<(QueryBatch, Responder)>,
}

/// Client that parks every batch until the caller answers it explicitly.
///
/// Clones share the same queue, so a host can hand one clone to the tree and
/// keep another to resolve batches in any order.
#[derive(Clone, Default)]
pub struct ManualClient {
    queue: Rc<RefCell<ManualQueue>>,
}

impl ManualClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every batch ever received, in issue order.
    #[must_use]
    pub fn issued(&self) -> Vec<QueryBatch> {
        self.queue.borrow().issued.clone()
    }

    /// Identifiers of batches still waiting for an answer.
    #[must_use]
    pub fn pending(&self) -> Vec<u64> {
        self.queue
            .borrow()
            .pending
            .iter()
            .map(|(batch, _)| batch.id)
            .collect()
    }

    #[must_use]
    pub fn last_batch(&self) -> Option<QueryBatch> {
        self.queue.borrow().issued.last().cloned()
    }

    fn take(&self, batch_id: u64) -> Option<(QueryBatch, Responder)> {
        let mut queue = self.queue.borrow_mut();
        let position = queue
            .pending
            .iter()
            .position(|(batch, _)| batch.id == batch_id)?;
        Some(queue.pending.remove(position))
    }

    /// Answer `batch_id`, building each node's results with `respond`.
    pub fn resolve_with(
        &self,
        batch_id: u64,
        mut respond: impl FnMut(&NodeQuery) -> SearchResults,
    ) -> bool {
        let Some((batch, responder)) = self.take(batch_id) else {
            return false;
        };
        let results = batch
            .queries
            .iter()
            .map(|query| NodeResults {
                node: query.node,
                results: respond(query),
            })
            .collect();
        responder.resolve(results)
    }

    /// Answer `batch_id` with empty results echoing each node's query.
    pub fn resolve(&self, batch_id: u64) -> bool {
        self.resolve_with(batch_id, |query| SearchResults {
            index: query.parameters.index().to_string(),
            query: query.parameters.query().to_string(),
            hits_per_page: query.parameters.hits_per_page().unwrap_or(20),
            page: query.parameters.page().unwrap_or(0),
            ..SearchResults::default()
        })
    }

    pub fn reject(&self, batch_id: u64, error: QueryError) -> bool {
        match self.take(batch_id) {
            Some((_, responder)) => responder.reject(error),
            None => false,
        }
    }
}

impl SearchClient for ManualClient {
    fn search(&mut self, batch: QueryBatch, responder: Responder) {
        let mut queue = self.queue.borrow_mut();
        queue.issued.push(batch.clone());
        queue.pending.push((batch, responder));
    }
}
