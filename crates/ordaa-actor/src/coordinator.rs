//! # Serialized Coordinator
//!
//! This module defines the `Coordinator`, the single worker that owns an
//! [`ActionHandler`] and applies actions to it one at a time. It is the "server"
//! half of the actor; [`CoordinatorClient`] is the other half.

use crate::broker::CorrelationBroker;
use crate::client::CoordinatorClient;
use crate::handler::ActionHandler;
use crate::message::{Action, Envelope, Reply};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// The worker that serializes every mutation of a handler's state.
///
/// **Concurrency Model**:
/// Any number of cloned clients push [`Envelope`]s into one bounded mpsc queue.
/// The coordinator pops them in order and awaits `handle` for each before
/// looking at the next, so two actions are never interleaved and the handler
/// needs no `Mutex` for its writes. The queue is bounded; a producer that finds
/// it full waits for space instead of having its action dropped.
///
/// # Results
///
/// The worker does not hold reply channels. After `handle` returns it passes the
/// result and the envelope's correlation id to the shared [`CorrelationBroker`],
/// which completes whichever caller registered that id.
///
/// # Shutdown
///
/// The loop ends when the [`CancellationToken`] is cancelled or when every
/// client has been dropped. Cancellation is checked before each dequeue, so
/// envelopes still sitting in the queue at that point are abandoned without
/// being applied and their callers get no reply from the worker.
///
/// ```rust
/// use ordaa_actor::{Action, ActionHandler, Coordinator, FrameworkError};
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
///
/// #[derive(Debug)] struct Add(u64);
/// impl Action for Add { fn kind(&self) -> &'static str { "add" } }
///
/// #[derive(Debug, thiserror::Error)]
/// #[error(transparent)]
/// struct CounterError(#[from] FrameworkError);
///
/// struct Counter(u64);
///
/// #[async_trait]
/// impl ActionHandler for Counter {
///     type Action = Add;
///     type Output = u64;
///     type Context = ();
///     type Error = CounterError;
///
///     async fn handle(&mut self, action: Add, _: &()) -> Result<u64, CounterError> {
///         self.0 += action.0;
///         Ok(self.0)
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let shutdown = CancellationToken::new();
///     let (coordinator, client) = Coordinator::new(Counter(0), 16, shutdown.clone());
///     let worker = tokio::spawn(coordinator.run(()));
///
///     assert_eq!(client.submit(Add(2)).await.unwrap(), 2);
///     assert_eq!(client.submit(Add(3)).await.unwrap(), 5);
///
///     shutdown.cancel();
///     worker.await.unwrap();
/// }
/// ```
pub struct Coordinator<H: ActionHandler> {
    receiver: mpsc::Receiver<Envelope<H::Action>>,
    broker: Arc<CorrelationBroker<Reply<H>>>,
    handler: H,
    shutdown: CancellationToken,
}

impl<H: ActionHandler> Coordinator<H> {
    /// Creates a coordinator around `handler` and the first client for it.
    ///
    /// `buffer_size` is the queue capacity; once it is reached, `submit` waits.
    pub fn new(
        handler: H,
        buffer_size: usize,
        shutdown: CancellationToken,
    ) -> (Self, CoordinatorClient<H>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let broker = Arc::new(CorrelationBroker::new());
        let coordinator = Self {
            receiver,
            broker: broker.clone(),
            handler,
            shutdown,
        };
        (coordinator, CoordinatorClient::new(sender, broker))
    }

    /// Runs the worker loop until cancellation or until all clients are gone.
    ///
    /// # Context Injection
    /// `context` is passed to every `handle` call. Collaborators created after
    /// the coordinator (publishers, other clients) are wired in here.
    pub async fn run(mut self, context: H::Context) {
        let handler_type = std::any::type_name::<H>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(handler_type, "Coordinator started");
        self.handler.on_start(&context).await;

        let mut processed: u64 = 0;
        loop {
            let envelope = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!(handler_type, "Cancellation requested");
                    break;
                }
                next = self.receiver.recv() => match next {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            let Envelope {
                correlation_id,
                action,
            } = envelope;
            let span = info_span!("action", %correlation_id, kind = action.kind());
            debug!(parent: &span, ?action, "Dequeued");

            let result = self
                .handler
                .handle(action, &context)
                .instrument(span.clone())
                .await;
            match &result {
                Ok(_) => info!(parent: &span, "Action ok"),
                Err(e) => warn!(parent: &span, error = %e, "Action failed"),
            }
            self.broker.deliver(correlation_id, result);
            processed += 1;
        }

        self.receiver.close();
        let mut abandoned: usize = 0;
        while let Ok(envelope) = self.receiver.try_recv() {
            debug!(correlation_id = %envelope.correlation_id, kind = envelope.action.kind(), "Abandoned");
            abandoned += 1;
        }

        self.handler.on_stop(&context).await;
        info!(handler_type, processed, abandoned, "Shutdown");
    }
}
