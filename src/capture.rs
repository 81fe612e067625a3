// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory capture of the crate's diagnostics, for tests.
//!
//! The context and decorator modules report misuse (overwrites, failed
//! updates, propagation conflicts) through the [`tracing`] facade rather than
//! returning errors. Verifying that behavior requires capturing those events,
//! which is what [`InMemorySubscriber`] does: it records every event's level
//! and message into a buffer that a test can drain and assert on.
//!
//! Scope it to a closure with [`tracing::subscriber::with_default`], which
//! confines the capture to the current thread - tests in other threads keep
//! their own subscribers and there is no global state to fight over:
//!
//! ```rust
//! use scoped_mdc::InMemorySubscriber;
//! use std::sync::Arc;
//! use tracing::Level;
//!
//! let subscriber = Arc::new(InMemorySubscriber::new());
//! tracing::subscriber::with_default(subscriber.clone(), || {
//!     tracing::warn!("something suspicious");
//! });
//!
//! let events = subscriber.drain();
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].level, Level::WARN);
//! assert!(events[0].message.contains("suspicious"));
//! ```

use parking_lot::Mutex;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::span;
use tracing::{Event, Level, Metadata, Subscriber};

/// One captured diagnostic event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    /// The event's level.
    pub level: Level,
    /// The event's target (module path by default).
    pub target: String,
    /// The formatted message.
    pub message: String,
}

/// A [`tracing::Subscriber`] that stores events in memory.
///
/// Captures every event regardless of level; spans are accepted but ignored,
/// since this crate only emits events. Thread-safe: wrap in an `Arc`, hand one
/// clone to `with_default` and keep the other to [`drain`](Self::drain).
#[derive(Debug, Default)]
pub struct InMemorySubscriber {
    events: Mutex<Vec<CapturedEvent>>,
}

impl InMemorySubscriber {
    /// Creates a subscriber with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all captured events, oldest first.
    pub fn drain(&self) -> Vec<CapturedEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Returns how many captured events at `level` contain `needle`.
    ///
    /// Does not drain; useful for "exactly one WARN" style assertions.
    pub fn count_matching(&self, level: Level, needle: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.level == level && event.message.contains(needle))
            .count()
    }
}

impl Subscriber for InMemorySubscriber {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _span: &span::Attributes<'_>) -> span::Id {
        span::Id::from_u64(1)
    }

    fn record(&self, _span: &span::Id, _values: &span::Record<'_>) {}

    fn record_follows_from(&self, _span: &span::Id, _follows: &span::Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
        });
    }

    fn enter(&self, _span: &span::Id) {}

    fn exit(&self, _span: &span::Id) {}
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn captures_level_and_message() {
        let subscriber = Arc::new(InMemorySubscriber::new());
        tracing::subscriber::with_default(subscriber.clone(), || {
            tracing::debug!("fine detail");
            tracing::warn!("watch out: {code}", code = 7);
            tracing::error!("broken");
        });
        let events = subscriber.drain();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].level, Level::DEBUG);
        assert_eq!(events[1].level, Level::WARN);
        assert_eq!(events[1].message, "watch out: 7");
        assert_eq!(events[2].level, Level::ERROR);
    }

    #[test]
    fn drain_empties_the_buffer() {
        let subscriber = Arc::new(InMemorySubscriber::new());
        tracing::subscriber::with_default(subscriber.clone(), || {
            tracing::warn!("once");
        });
        assert_eq!(subscriber.drain().len(), 1);
        assert!(subscriber.drain().is_empty());
    }

    #[test]
    fn capture_is_scoped_to_the_closure() {
        let subscriber = Arc::new(InMemorySubscriber::new());
        tracing::subscriber::with_default(subscriber.clone(), || {});
        tracing::warn!("outside the scope");
        assert!(subscriber.drain().is_empty());
    }
}
