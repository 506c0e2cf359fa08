use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::NodeId;

struct InFlight {
    issued_at: Instant,
    nodes: Vec<NodeId>,
    stall_reported: bool,
}

/// Revision counters deciding when a new batch is due.
#[derive(Default)]
struct RevisionState {
    input: u64,
    issued: u64,
}

/// Batch ids, the debounce flag and in-flight bookkeeping of one tree.
#[derive(Default)]
pub(crate) struct QueryScheduler {
    next_batch_id: u64,
    in_flight: BTreeMap<u64, InFlight>,
    revisions: RevisionState,
}

impl QueryScheduler {
    pub(crate) fn mark_dirty(&mut self) {
        self.revisions.input = self.revisions.input.wrapping_add(1);
    }

    /// Whether a mutation happened since the last issued batch.
    pub(crate) fn is_dirty(&self) -> bool {
        self.revisions.input != self.revisions.issued
    }

    pub(crate) fn issue(&mut self, nodes: Vec<NodeId>) -> u64 {
        self.next_batch_id = self.next_batch_id.saturating_add(1);
        let id = self.next_batch_id;
        self.revisions.issued = self.revisions.input;
        self.in_flight.insert(
            id,
            InFlight {
                issued_at: Instant::now(),
                nodes,
                stall_reported: false,
            },
        );
        id
    }

    /// Forget `batch_id`, returning the nodes it queried.
    pub(crate) fn settle(&mut self, batch_id: u64) -> Vec<NodeId> {
        self.in_flight
            .remove(&batch_id)
            .map(|batch| batch.nodes)
            .unwrap_or_default()
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub(crate) fn latest_issued(&self) -> Option<u64> {
        (self.next_batch_id > 0).then_some(self.next_batch_id)
    }

    /// Oldest batch that has now been in flight for `delay`, reported once.
    pub(crate) fn take_stalled(&mut self, now: Instant, delay: Duration) -> Option<u64> {
        let (id, batch) = self
            .in_flight
            .iter_mut()
            .find(|(_, batch)| !batch.stall_reported)?;
        if now.duration_since(batch.issued_at) < delay {
            return None;
        }
        batch.stall_reported = true;
        Some(*id)
    }

    /// Time left until the oldest unreported batch stalls.
    pub(crate) fn until_stalled(&self, now: Instant, delay: Duration) -> Option<Duration> {
        self.in_flight
            .values()
            .find(|batch| !batch.stall_reported)
            .map(|batch| delay.saturating_sub(now.duration_since(batch.issued_at)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuing_clears_the_dirty_flag() {
        let mut scheduler = QueryScheduler::default();
        assert!(!scheduler.is_dirty());

        scheduler.mark_dirty();
        scheduler.mark_dirty();
        assert!(scheduler.is_dirty());

        let first = scheduler.issue(vec![NodeId(0)]);
        assert!(!scheduler.is_dirty());
        assert_eq!(scheduler.latest_issued(), Some(first));

        scheduler.mark_dirty();
        assert_eq!(scheduler.issue(Vec::new()), first + 1);
    }

    #[test]
    fn stalled_batches_are_reported_once() {
        let mut scheduler = QueryScheduler::default();
        let id = scheduler.issue(vec![NodeId(0)]);
        let later = Instant::now() + Duration::from_millis(50);

        assert_eq!(scheduler.take_stalled(Instant::now(), Duration::from_secs(60)), None);
        assert_eq!(scheduler.take_stalled(later, Duration::from_millis(10)), Some(id));
        assert_eq!(scheduler.take_stalled(later, Duration::from_millis(10)), None);
        assert_eq!(scheduler.until_stalled(later, Duration::from_millis(10)), None);

        assert_eq!(scheduler.settle(id), vec![NodeId(0)]);
        assert!(!scheduler.is_in_flight());
    }
}
