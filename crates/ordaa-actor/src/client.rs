//! # Generic Client
//!
//! This module defines the producer side of a [`Coordinator`](crate::Coordinator).

use crate::broker::CorrelationBroker;
use crate::error::FrameworkError;
use crate::handler::ActionHandler;
use crate::message::{CorrelationId, Envelope, Reply};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// ## CoordinatorClient
///
/// The `CoordinatorClient<H>` submits actions to the coordinator owning `H` and
/// awaits their correlated result. It holds the queue sender plus a handle to
/// the shared broker, so cloning it is cheap and clones can be handed to as
/// many producer tasks as needed.
///
/// * **`submit`** – waits as long as it takes.
/// * **`submit_within`** – gives up after a deadline and abandons its id.
/// * **`submit_as`** – uses a correlation id chosen by the producer.
pub struct CoordinatorClient<H: ActionHandler> {
    sender: mpsc::Sender<Envelope<H::Action>>,
    broker: Arc<CorrelationBroker<Reply<H>>>,
}

impl<H: ActionHandler> Clone for CoordinatorClient<H> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            broker: self.broker.clone(),
        }
    }
}

impl<H: ActionHandler> CoordinatorClient<H> {
    pub fn new(
        sender: mpsc::Sender<Envelope<H::Action>>,
        broker: Arc<CorrelationBroker<Reply<H>>>,
    ) -> Self {
        Self { sender, broker }
    }

    pub async fn submit(&self, action: H::Action) -> Reply<H> {
        let (id, reply) = self.broker.register();
        self.dispatch(id, action, reply).await
    }

    pub async fn submit_as(&self, id: CorrelationId, action: H::Action) -> Reply<H> {
        let reply = self.broker.register_with(id)?;
        self.dispatch(id, action, reply).await
    }

    pub async fn submit_within(&self, action: H::Action, deadline: Duration) -> Reply<H> {
        let (id, reply) = self.broker.register();
        match tokio::time::timeout(deadline, self.dispatch(id, action, reply)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(correlation_id = %id, ?deadline, "Gave up waiting for result");
                Err(FrameworkError::Timeout(deadline).into())
            }
        }
    }

    /// The broker shared with the coordinator.
    pub fn broker(&self) -> &CorrelationBroker<Reply<H>> {
        &self.broker
    }

    /// `true` once the coordinator has stopped accepting actions.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn dispatch(
        &self,
        id: CorrelationId,
        action: H::Action,
        reply: oneshot::Receiver<Reply<H>>,
    ) -> Reply<H> {
        // If this future is dropped (deadline, caller cancelled) the id is pruned.
        let mut guard = PendingGuard {
            broker: &self.broker,
            id,
            armed: true,
        };
        if self.sender.send(Envelope::new(id, action)).await.is_err() {
            return Err(FrameworkError::ActorClosed.into());
        }
        let result = reply.await.map_err(|_| FrameworkError::ActorDropped);
        guard.armed = false;
        result?
    }
}

struct PendingGuard<'a, T> {
    broker: &'a CorrelationBroker<T>,
    id: CorrelationId,
    armed: bool,
}

impl<T> Drop for PendingGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.broker.abandon(self.id);
        }
    }
}
