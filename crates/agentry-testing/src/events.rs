//! Event capture for assertions on emitted lifecycle events.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentry_core::{EventMeta, ExecutionEvent};

/// Collects every event delivered to its handler, in delivery order.
///
/// Attach via a workflow's `observe` or an emitter subscription:
///
/// ```rust,ignore
/// let collector = EventCollector::new();
/// let result = workflow.run(messages).observe(collector.handler()).await;
/// collector.wait_for(3).await;
/// assert_eq!(collector.names_of("retry").len(), 3);
/// ```
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<(EventMeta, ExecutionEvent)>>>,
}

impl EventCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// An async handler that records every event it receives.
    pub fn handler(
        &self,
    ) -> impl Fn(ExecutionEvent, EventMeta) -> futures::future::Ready<()>
    + Send
    + Sync
    + Clone
    + 'static {
        let sink = Arc::clone(&self.events);
        move |event, meta| {
            sink.lock().unwrap().push((meta, event));
            futures::future::ready(())
        }
    }

    /// Snapshot of all collected events.
    pub fn events(&self) -> Vec<(EventMeta, ExecutionEvent)> {
        self.events.lock().unwrap().clone()
    }

    /// Wire names of all collected events, in order.
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(meta, _)| meta.name.clone())
            .collect()
    }

    /// How many collected events carry the given wire name.
    pub fn count_of(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(meta, _)| meta.name == name)
            .count()
    }

    /// `NewToken` fragments in delivery order.
    pub fn tokens(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, event)| event.token_text().map(str::to_string))
            .collect()
    }

    /// Total number of collected events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Whether no events were collected.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    /// Wait until at least `expected` events arrived, panicking after a
    /// short deadline. Delivery is asynchronous, so tests must not assert
    /// on counts without settling first.
    pub async fn wait_for(&self, expected: usize) {
        for _ in 0..200 {
            if self.len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "timed out waiting for {} events, collected {:?}",
            expected,
            self.names()
        );
    }

    /// Let in-flight deliveries settle without requiring a count.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(30)).await;
    }
}
