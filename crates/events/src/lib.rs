#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication across the ratchet pipeline
//!
//! All progress/status reporting goes through events — components never log
//! user-facing output directly. Downstream consumers (the excluded CLI/HTTP
//! layers) subscribe to an `EventReceiver` instead of polling component state.

pub mod duration;
pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::*;

use tokio::sync::mpsc::UnboundedSender;

/// Type alias for the event sender.
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for the event receiver.
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel.
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Unified trait for emitting events throughout the system.
pub trait EventEmitter {
    /// Get the event sender for this emitter, if any.
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter. Send errors are ignored — if the
    /// receiver was dropped, the operation still proceeds.
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::{GeneralEvent, ScanEvent};

    struct TestEmitter(EventSender);

    impl EventEmitter for TestEmitter {
        fn event_sender(&self) -> Option<&EventSender> {
            Some(&self.0)
        }
    }

    #[tokio::test]
    async fn emit_delivers_through_channel() {
        let (tx, mut rx) = channel();
        let emitter = TestEmitter(tx);
        emitter.emit(AppEvent::General(GeneralEvent::Warning {
            message: "test".into(),
        }));
        let received = rx.recv().await.unwrap();
        assert!(matches!(
            received,
            AppEvent::General(GeneralEvent::Warning { .. })
        ));
    }

    #[tokio::test]
    async fn emit_on_dropped_receiver_does_not_panic() {
        let (tx, rx) = channel();
        drop(rx);
        let emitter = TestEmitter(tx);
        emitter.emit(AppEvent::Scan(ScanEvent::Started {
            project_id: 1,
            ecosystem: ratchet_types::EcosystemKind::Npm,
            dependency_count: 0,
        }));
    }
}
