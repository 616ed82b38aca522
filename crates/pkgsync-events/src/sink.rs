use std::sync::{
    mpsc::{self, Receiver, Sender},
    Mutex,
};

use crate::SyncEvent;

/// Consumer of sync events. Each frontend provides its own.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SyncEvent);

    fn report(&self, message: &str, level: usize) {
        self.emit(SyncEvent::report(message, level));
    }

    fn inline(&self, message: &str) {
        self.emit(SyncEvent::inline(message));
    }

    fn error(&self, message: &str) {
        self.emit(SyncEvent::error(message));
    }
}

/// Forwards events through an mpsc channel.
pub struct ChannelSink {
    sender: Sender<SyncEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<SyncEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: SyncEvent) {
        let _ = self.sender.send(event);
    }
}

/// Drops everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: SyncEvent) {}
}

/// Stores every event for later inspection.
#[derive(Default)]
pub struct CollectorSink {
    events: Mutex<Vec<SyncEvent>>,
}

impl CollectorSink {
    pub fn events(&self) -> Vec<SyncEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Messages of all `Report` and `Inline` events, in order.
    pub fn messages(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| {
                match event {
                    SyncEvent::Report { message, .. } | SyncEvent::Inline { message } => {
                        Some(message.clone())
                    }
                    _ => None,
                }
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| {
                match event {
                    SyncEvent::Error { message } => Some(message.clone()),
                    _ => None,
                }
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SyncEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for CollectorSink {
    fn emit(&self, event: SyncEvent) {
        self.lock().push(event);
    }
}
