//! In-process publish/subscribe hub for lifecycle events.
//!
//! An [`Emitter`] is created per workflow run. Subscribers register a
//! two-segment wildcard pattern (`scope.name`, `*` matches any segment)
//! and an async handler. Emission is fire-and-forget: every subscription
//! owns an unbounded channel drained by a dedicated task, so the emitting
//! code never waits on a handler and each subscriber observes one run's
//! events in emission order.
//!
//! Nested work (a tool call inside an agent step) runs on a child emitter
//! created with [`Emitter::child`]. Subscriptions that set
//! [`EmitterOptions::match_nested`] also receive events emitted by
//! descendants of the emitter they subscribed on.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::PatternError;
use crate::event::{EventMeta, ExecutionEvent};

/// Subscription options.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitterOptions {
    /// Also match events emitted by child emitters created for nested work.
    pub match_nested: bool,
}

impl EmitterOptions {
    /// Options with nested matching enabled.
    pub fn nested() -> Self {
        Self { match_nested: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Any,
    Exact(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == "*" {
            Segment::Any
        } else {
            Segment::Exact(raw.to_string())
        }
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            Segment::Any => true,
            Segment::Exact(expected) => expected == value,
        }
    }
}

/// A two-segment `scope.name` event matcher where either segment may be `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPattern {
    scope: Segment,
    name: Segment,
}

impl EventPattern {
    /// Parse a pattern string like `"EmployeeChurn.retry"` or `"*.*"`.
    pub fn parse(input: &str) -> Result<Self, PatternError> {
        let mut segments = input.split('.');
        let (Some(scope), Some(name), None) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(PatternError::SegmentCount {
                input: input.to_string(),
            });
        };
        if scope.is_empty() || name.is_empty() {
            return Err(PatternError::EmptySegment {
                input: input.to_string(),
            });
        }
        Ok(Self {
            scope: Segment::parse(scope),
            name: Segment::parse(name),
        })
    }

    /// The match-everything pattern `*.*`.
    pub fn any() -> Self {
        Self {
            scope: Segment::Any,
            name: Segment::Any,
        }
    }

    /// Whether this pattern matches an emitted `(scope, name)` pair.
    pub fn matches(&self, scope: &str, name: &str) -> bool {
        self.scope.matches(scope) && self.name.matches(name)
    }
}

struct SubscriptionEntry {
    id: u64,
    pattern: EventPattern,
    options: EmitterOptions,
    tx: mpsc::UnboundedSender<(ExecutionEvent, EventMeta)>,
}

struct Node {
    scope: String,
    parent: Option<Arc<Node>>,
    subscriptions: Mutex<Vec<SubscriptionEntry>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

/// Handle to an active subscription; dropping it does not unsubscribe.
pub struct Subscription {
    id: u64,
    node: Weak<Node>,
}

impl Subscription {
    /// Detach the subscription. Events already queued still drain.
    pub fn unsubscribe(self) {
        if let Some(node) = self.node.upgrade() {
            let mut subs = node.subscriptions.lock().expect("emitter lock poisoned");
            subs.retain(|entry| entry.id != self.id);
        }
    }
}

/// Publish/subscribe hub scoped to one workflow run.
///
/// Cloning is cheap and clones share the same subscription registry.
#[derive(Clone)]
pub struct Emitter {
    node: Arc<Node>,
}

impl Emitter {
    /// Create a root emitter with the given scope.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            node: Arc::new(Node {
                scope: scope.into(),
                parent: None,
                subscriptions: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Create a child emitter for nested work.
    ///
    /// Its events reach subscriptions on this emitter (and its ancestors)
    /// only when they opted into nested matching.
    pub fn child(&self, scope: impl Into<String>) -> Emitter {
        Emitter {
            node: Arc::new(Node {
                scope: scope.into(),
                parent: Some(Arc::clone(&self.node)),
                subscriptions: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Scope of this emitter.
    pub fn scope(&self) -> &str {
        &self.node.scope
    }

    /// Register an async handler for events matching `pattern`.
    ///
    /// The handler runs on its own task; a panic inside it is caught and
    /// logged without disturbing other subscribers or the emitting code.
    pub fn subscribe<F, Fut>(
        &self,
        pattern: EventPattern,
        handler: F,
        options: EmitterOptions,
    ) -> Subscription
    where
        F: Fn(ExecutionEvent, EventMeta) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<(ExecutionEvent, EventMeta)>();
        let id = self.node.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut subs = self
                .node
                .subscriptions
                .lock()
                .expect("emitter lock poisoned");
            subs.push(SubscriptionEntry {
                id,
                pattern,
                options,
                tx,
            });
        }

        // One drain task per subscription keeps delivery FIFO per handler.
        tokio::spawn(async move {
            while let Some((event, meta)) = rx.recv().await {
                let scope = meta.scope.clone();
                let name = meta.name.clone();
                let outcome = AssertUnwindSafe(handler(event, meta)).catch_unwind().await;
                if outcome.is_err() {
                    warn!(scope = %scope, event = %name, "Event handler panicked");
                }
            }
        });

        Subscription {
            id,
            node: Arc::downgrade(&self.node),
        }
    }

    /// Deliver an event to every matching subscription without blocking.
    ///
    /// Subscriptions on this emitter match directly; subscriptions on
    /// ancestors match only when they enabled nested matching.
    pub fn emit(&self, event: ExecutionEvent) {
        let meta = EventMeta {
            scope: self.node.scope.clone(),
            name: event.name().to_string(),
            created_at: chrono::Utc::now(),
        };

        let mut nested = false;
        let mut current = Some(&self.node);
        while let Some(node) = current {
            if !node.closed.load(Ordering::Acquire) {
                let subs = node.subscriptions.lock().expect("emitter lock poisoned");
                for entry in subs.iter() {
                    if nested && !entry.options.match_nested {
                        continue;
                    }
                    if entry.pattern.matches(&meta.scope, &meta.name) {
                        // Send failure means the drain task is gone; nothing to do.
                        let _ = entry.tx.send((event.clone(), meta.clone()));
                    }
                }
            }
            nested = true;
            current = node.parent.as_ref();
        }
    }

    /// Number of active subscriptions on this emitter.
    pub fn subscription_count(&self) -> usize {
        self.node
            .subscriptions
            .lock()
            .expect("emitter lock poisoned")
            .len()
    }

    /// Invalidate every subscription on this emitter.
    ///
    /// Queued events still drain, but nothing emitted afterwards is
    /// delivered and `subscription_count` drops to zero.
    pub fn close(&self) {
        self.node.closed.store(true, Ordering::Release);
        let mut subs = self
            .node
            .subscriptions
            .lock()
            .expect("emitter lock poisoned");
        subs.clear();
    }
}
