//! Message queue adapter.
//!
//! Inbound messages are JSON [`ActionMessage`]s: an [`OrderAction`] tagged by
//! `action`, plus an optional producer-chosen `correlation_id`. Each one is
//! answered with an [`ActionReply`] carrying the same id, so a producer can
//! match replies to requests on a shared reply queue.
//!
//! [`ChannelPublisher`] is the outbound half: it pushes an order snapshot onto
//! a channel whenever an order is placed.

use crate::clients::OrderClient;
use crate::error::OrderError;
use crate::model::OrderSnapshot;
use crate::registry::{OrderAction, OrderActionResult, PublishError, SnapshotPublisher};
use async_trait::async_trait;
use ordaa_actor::CorrelationId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    #[serde(flatten)]
    pub action: OrderAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyError {
    pub kind: String,
    pub message: String,
}

impl From<&OrderError> for ReplyError {
    fn from(e: &OrderError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReply {
    /// Echo of the request id, or the id minted for it. `None` only when the
    /// request could not be read at all.
    pub correlation_id: Option<CorrelationId>,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<OrderActionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ReplyError>,
}

impl ActionReply {
    fn from_outcome(
        correlation_id: CorrelationId,
        outcome: Result<OrderActionResult, OrderError>,
    ) -> Self {
        match outcome {
            Ok(result) => Self {
                correlation_id: Some(correlation_id),
                ok: true,
                result: Some(result),
                error: None,
            },
            Err(e) => Self {
                correlation_id: Some(correlation_id),
                ok: false,
                result: None,
                error: Some(ReplyError::from(&e)),
            },
        }
    }

    fn malformed(correlation_id: Option<CorrelationId>, reason: String) -> Self {
        Self {
            correlation_id,
            ok: false,
            result: None,
            error: Some(ReplyError {
                kind: "malformed_message".to_string(),
                message: reason,
            }),
        }
    }
}

/// Turns inbound payloads into submitted actions.
#[derive(Clone)]
pub struct QueueConsumer {
    client: OrderClient,
}

impl QueueConsumer {
    pub fn new(client: OrderClient) -> Self {
        Self { client }
    }

    /// Handles one payload. Never fails: every problem becomes an error reply.
    pub async fn process(&self, payload: &str) -> ActionReply {
        let value: serde_json::Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Unreadable queue message");
                return ActionReply::malformed(None, e.to_string());
            }
        };
        // Salvage the id first so even a bad action can be answered in place.
        let salvaged = value
            .get("correlation_id")
            .and_then(|id| serde_json::from_value::<CorrelationId>(id.clone()).ok());

        let message: ActionMessage = match serde_json::from_value(value) {
            Ok(message) => message,
            Err(e) => {
                warn!(correlation_id = ?salvaged, error = %e, "Invalid queue message");
                return ActionReply::malformed(salvaged, e.to_string());
            }
        };

        let correlation_id = message.correlation_id.unwrap_or_default();
        debug!(%correlation_id, action = ?message.action, "Queue message");
        let outcome = self.client.submit_as(correlation_id, message.action).await;
        ActionReply::from_outcome(correlation_id, outcome)
    }

    /// Consumes `inbound` until it closes or `shutdown` fires, writing one
    /// serialized reply per message to `outbound`.
    ///
    /// Messages are processed concurrently; their replies may leave in a
    /// different order than the requests arrived.
    pub async fn run(
        self,
        mut inbound: mpsc::Receiver<String>,
        outbound: mpsc::Sender<String>,
        shutdown: CancellationToken,
    ) {
        info!("Queue consumer started");
        let mut tasks = tokio::task::JoinSet::new();
        loop {
            let payload = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = inbound.recv() => match next {
                    Some(payload) => payload,
                    None => break,
                },
            };

            let consumer = self.clone();
            let outbound = outbound.clone();
            tasks.spawn(async move {
                let reply = consumer.process(&payload).await;
                match serde_json::to_string(&reply) {
                    Ok(json) => {
                        if outbound.send(json).await.is_err() {
                            warn!(correlation_id = ?reply.correlation_id, "Reply queue closed");
                        }
                    }
                    Err(e) => warn!(error = %e, "Could not encode reply"),
                }
            });
            // Reap finished tasks so the set does not grow without bound.
            while tasks.try_join_next().is_some() {}
        }

        while tasks.join_next().await.is_some() {}
        info!("Queue consumer stopped");
    }
}

/// Event pushed when an order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    OrderPlaced { snapshot: OrderSnapshot },
}

/// [`SnapshotPublisher`] writing JSON [`OrderEvent`]s to a channel.
///
/// Publishing never waits: the call runs on the coordinator worker, so an
/// event that finds the channel full is dropped and reported as an error.
pub struct ChannelPublisher {
    sender: mpsc::Sender<String>,
}

impl ChannelPublisher {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl SnapshotPublisher for ChannelPublisher {
    async fn publish(&self, snapshot: &OrderSnapshot) -> Result<(), PublishError> {
        let event = OrderEvent::OrderPlaced {
            snapshot: snapshot.clone(),
        };
        let json = serde_json::to_string(&event).map_err(|e| PublishError(e.to_string()))?;
        self.sender.try_send(json).map_err(|e| match e {
            TrySendError::Full(_) => PublishError("event channel full; event dropped".to_string()),
            TrySendError::Closed(_) => PublishError("event channel closed".to_string()),
        })
    }
}
