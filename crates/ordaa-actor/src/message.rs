//! # Envelopes & Correlation Ids
//!
//! This module defines what travels over the coordinator queue. A producer never
//! sends a reply channel along with its action; instead it mints a
//! [`CorrelationId`], parks a pending reply in the
//! [`CorrelationBroker`](crate::CorrelationBroker) under that id, and sends an
//! [`Envelope`] carrying only the id and the action. The worker hands the result
//! back to the broker, which routes it to whoever is waiting on the id.

use crate::handler::ActionHandler;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};
use std::str::FromStr;
use uuid::Uuid;

/// A message the coordinator knows how to label in logs.
///
/// `kind` is a short static tag such as `"create_order"`; it shows up as the
/// `kind` field on every span the worker opens for the action.
pub trait Action: Send + Debug + 'static {
    fn kind(&self) -> &'static str;
}

/// Token minted per submitted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    /// Generates a random (v4) id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for CorrelationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for CorrelationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One queued unit of work: the action plus the id its result is routed by.
#[derive(Debug)]
pub struct Envelope<A> {
    pub correlation_id: CorrelationId,
    pub action: A,
}

impl<A> Envelope<A> {
    pub fn new(correlation_id: CorrelationId, action: A) -> Self {
        Self {
            correlation_id,
            action,
        }
    }
}

/// The terminal outcome of one action, as delivered through the broker.
pub type Reply<H> = Result<<H as ActionHandler>::Output, <H as ActionHandler>::Error>;
