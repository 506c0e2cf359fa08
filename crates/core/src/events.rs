//! Engine-wide event channel.
//!
//! Hook failures, query failures and other engine notices are published to
//! every subscriber so a host can log or surface them without the tree
//! aborting its traversal.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::error::{QueryError, WidgetError};

/// Lifecycle hook a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Init,
    Render,
    Dispose,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::Render => "render",
            Self::Dispose => "dispose",
        })
    }
}

/// Notifications emitted by a [`SearchTree`](crate::SearchTree).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A widget hook failed; its siblings were still processed.
    WidgetHookFailed {
        hook: Hook,
        index_id: String,
        error: WidgetError,
    },
    /// The search client rejected a batch.
    QueryFailed { batch_id: u64, error: QueryError },
    /// A response arrived for a node that already applied a newer one.
    StaleResultDiscarded { batch_id: u64, index_id: String },
    /// A batch has been in flight for longer than the stalled-search delay.
    SearchStalled { batch_id: u64 },
    /// A render pass finished.
    Rendered { batch_id: u64 },
}

/// Fan-out of [`EngineEvent`]s to any number of subscribers.
#[derive(Default)]
pub(crate) struct EventBus {
    subscribers: Vec<Sender<EngineEvent>>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, dropping disconnected ones.
    pub(crate) fn emit(&mut self, event: EngineEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_subscribers_are_pruned() {
        let mut bus = EventBus::default();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.emit(EngineEvent::Rendered { batch_id: 1 });

        assert_eq!(bus.subscribers.len(), 1);
        assert_eq!(kept.try_recv(), Ok(EngineEvent::Rendered { batch_id: 1 }));
    }
}
