//! Caller-owned delivery endpoints
//!
//! A sink is a bounded `mpsc::Sender` handed in by the caller. Delivery uses
//! `try_send` so the receive loop never waits on a consumer: a full sink
//! loses the frame, a closed sink is unregistered.

use okws_core::{ErrorEvent, LoginEvent, SubscribeEvent, SuccessEvent, UnsubscribeEvent};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Result of offering one item to a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// No sink registered; silently ignored
    NoSink,
    /// Sink at capacity; the item was dropped
    Full,
    /// Consumer went away; the slot was cleared
    Closed,
    /// Payload did not match the topic's record shape
    Undecodable(String),
}

/// At most one registered sink for one topic type
#[derive(Debug)]
pub struct SinkSlot<T> {
    slot: RwLock<Option<mpsc::Sender<T>>>,
}

impl<T> Default for SinkSlot<T> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<T> SinkSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink, replacing any previous one
    pub fn set(&self, sink: mpsc::Sender<T>) {
        *self.slot.write() = Some(sink);
    }

    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }

    pub fn deliver(&self, item: T) -> Delivery {
        let result = {
            let guard = self.slot.read();
            let Some(sink) = guard.as_ref() else {
                return Delivery::NoSink;
            };
            sink.try_send(item)
        };
        match result {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => {
                let mut guard = self.slot.write();
                // a fresh sink may have been registered in between
                if guard.as_ref().is_some_and(|s| s.is_closed()) {
                    *guard = None;
                }
                Delivery::Closed
            }
        }
    }
}

/// Lifecycle and control event sinks
#[derive(Debug, Default)]
pub struct ControlSinks {
    pub error: SinkSlot<ErrorEvent>,
    pub subscribe: SinkSlot<SubscribeEvent>,
    pub unsubscribe: SinkSlot<UnsubscribeEvent>,
    pub login: SinkSlot<LoginEvent>,
    /// Correlated command acknowledgements
    pub success: SinkSlot<SuccessEvent>,
}

/// Delivery counters shared by every sink of one client
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
    undecodable: AtomicU64,
}

impl DeliveryStats {
    pub fn record(&self, delivery: &Delivery) {
        let counter = match delivery {
            Delivery::Delivered => &self.delivered,
            Delivery::Full => &self.dropped,
            Delivery::Undecodable(_) => &self.undecodable,
            Delivery::NoSink | Delivery::Closed => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Frames lost to full sinks
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn undecodable(&self) -> u64 {
        self.undecodable.load(Ordering::Relaxed)
    }
}
