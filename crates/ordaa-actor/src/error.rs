//! # Framework Errors
//!
//! Errors raised by the coordinator plumbing itself, as opposed to the
//! business errors produced by an [`ActionHandler`](crate::ActionHandler).
//! Handler error types absorb these through `From<FrameworkError>`, so a caller
//! only ever matches on one error enum.

use crate::message::CorrelationId;
use std::time::Duration;

/// Errors that can occur within the coordinator framework itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameworkError {
    /// The worker is gone and no longer accepts actions.
    #[error("Coordinator closed")]
    ActorClosed,
    /// The pending reply was dropped before a result arrived.
    #[error("Coordinator dropped response channel")]
    ActorDropped,
    /// The caller's own deadline expired; the correlation id was abandoned.
    #[error("No result within {0:?}")]
    Timeout(Duration),
    /// A producer supplied a correlation id that is still pending.
    #[error("Correlation id already pending: {0}")]
    DuplicateCorrelation(CorrelationId),
}
