//! # Correlation Broker
//!
//! Maps a [`CorrelationId`] to the caller waiting for its result. The worker's
//! result is produced on a different path than the caller's submission, so the
//! broker is the only place the two meet.
//!
//! - [`register`](CorrelationBroker::register) parks a oneshot sender.
//! - [`deliver`](CorrelationBroker::deliver) removes it and completes the caller.
//! - [`abandon`](CorrelationBroker::abandon) removes it without completing (caller gave up).
//!
//! A result for an unknown id is logged and discarded. The broker itself never
//! times out.

use crate::error::FrameworkError;
use crate::message::CorrelationId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Routing table from correlation ids to pending callers.
pub struct CorrelationBroker<T> {
    pending: DashMap<CorrelationId, oneshot::Sender<T>>,
}

impl<T> Default for CorrelationBroker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CorrelationBroker<T> {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Mints a fresh id and parks a pending reply for it.
    pub fn register(&self) -> (CorrelationId, oneshot::Receiver<T>) {
        loop {
            let id = CorrelationId::new();
            if let Ok(receiver) = self.register_with(id) {
                return (id, receiver);
            }
        }
    }

    /// Parks a pending reply under a caller-supplied id.
    pub fn register_with(&self, id: CorrelationId) -> Result<oneshot::Receiver<T>, FrameworkError> {
        match self.pending.entry(id) {
            Entry::Occupied(_) => Err(FrameworkError::DuplicateCorrelation(id)),
            Entry::Vacant(slot) => {
                let (sender, receiver) = oneshot::channel();
                slot.insert(sender);
                Ok(receiver)
            }
        }
    }

    /// Delivers `value` to the caller registered under `id`.
    ///
    /// Returns `false` when nobody is waiting any more; the value is dropped.
    pub fn deliver(&self, id: CorrelationId, value: T) -> bool {
        let Some((_, sender)) = self.pending.remove(&id) else {
            warn!(correlation_id = %id, "Result for unknown correlation id discarded");
            return false;
        };
        if sender.send(value).is_err() {
            debug!(correlation_id = %id, "Caller went away before result arrived");
            return false;
        }
        true
    }

    /// Forgets `id`. A late result for it will be discarded by `deliver`.
    pub fn abandon(&self, id: CorrelationId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Number of callers currently waiting.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: &CorrelationId) -> bool {
        self.pending.contains_key(id)
    }
}
