//! # Mock Coordinator & Testing Guide
//!
//! [`MockCoordinator<H>`] hands out a real [`CoordinatorClient<H>`] whose queue is
//! drained by a scripted task instead of a real handler. Each expectation names
//! the action kind it expects and the reply to hand back through the broker.
//! This lets domain client wrappers be tested without their handler or store.
//!
//! ## When to use Mocks vs a Real Coordinator
//!
//! | Feature | MockCoordinator | Real Coordinator |
//! |---------|-----------------|------------------|
//! | **State** | None (scripted replies) | Real handler state |
//! | **Determinism** | Fully scripted | Subject to scheduler |
//! | **Use Case** | Logic *around* the client | The handler itself or the full system |
//! | **Error Injection** | Easy (`return_err`) | Requires reaching the state |
//!
//! ## Testing Strategies
//!
//! <details>
//! <summary><b>Pattern 0: Client Logic Test (Scripted Mock)</b></summary>
//!
//! ```rust
//! use ordaa_actor::mock::MockCoordinator;
//! use ordaa_actor::{Action, ActionHandler, FrameworkError};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)] enum CounterAction { Add(u64) }
//! impl Action for CounterAction { fn kind(&self) -> &'static str { "add" } }
//! #[derive(Debug, thiserror::Error)] #[error(transparent)] struct CounterError(#[from] FrameworkError);
//! struct Counter;
//!
//! #[async_trait]
//! impl ActionHandler for Counter {
//!     type Action = CounterAction; type Output = u64; type Context = (); type Error = CounterError;
//!     async fn handle(&mut self, _: CounterAction, _: &()) -> Result<u64, CounterError> { unreachable!() }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockCoordinator::<Counter>::new();
//!     mock.expect("add").return_ok(42);
//!
//!     let client = mock.client();
//!     assert_eq!(client.submit(CounterAction::Add(1)).await.unwrap(), 42);
//!     mock.verify();
//! }
//! ```
//! </details>
//!
//! <details>
//! <summary><b>Pattern 1: Manual Responder</b></summary>
//!
//! Use [`create_mock_client`] + [`expect_action`] when a test must inspect the
//! action payload before deciding the reply, or must hold the reply back to
//! simulate a slow worker.
//! </details>
//!
//! <details>
//! <summary><b>Pattern 2: Full System</b></summary>
//!
//! Spawn the real coordinator around the real handler; see the `ordaa` crate's
//! `tests/integration_test.rs`.
//! </details>

use crate::broker::CorrelationBroker;
use crate::client::CoordinatorClient;
use crate::error::FrameworkError;
use crate::handler::ActionHandler;
use crate::message::{Action, CorrelationId, Envelope, Reply};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

struct Expectation<H: ActionHandler> {
    kind: &'static str,
    response: Reply<H>,
}

/// A scripted coordinator for fluent client tests.
///
/// Replies are handed out in the order expectations were added. A request whose
/// kind does not match the next expectation, or that arrives after the script
/// ran out, is answered with [`FrameworkError::ActorDropped`] and recorded;
/// [`verify`](Self::verify) then fails.
pub struct MockCoordinator<H: ActionHandler> {
    client: CoordinatorClient<H>,
    expectations: Arc<Mutex<VecDeque<Expectation<H>>>>,
    received: Arc<Mutex<Vec<&'static str>>>,
    mismatches: Arc<Mutex<Vec<String>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<H: ActionHandler> Default for MockCoordinator<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ActionHandler> MockCoordinator<H> {
    /// Creates a mock with no expectations. Must be called inside a runtime.
    pub fn new() -> Self {
        let (client, mut receiver) = create_mock_client::<H>(100);
        let expectations: Arc<Mutex<VecDeque<Expectation<H>>>> = Arc::default();
        let received: Arc<Mutex<Vec<&'static str>>> = Arc::default();
        let mismatches: Arc<Mutex<Vec<String>>> = Arc::default();

        let script = expectations.clone();
        let log = received.clone();
        let failures = mismatches.clone();
        let handle = tokio::spawn(async move {
            while let Some((action, responder)) = expect_action(&mut receiver).await {
                let kind = action.kind();
                log.lock().unwrap().push(kind);
                let next = script.lock().unwrap().pop_front();
                match next {
                    Some(expectation) if expectation.kind == kind => {
                        responder.send(expectation.response);
                    }
                    Some(expectation) => {
                        failures.lock().unwrap().push(format!(
                            "expected `{}`, received `{}`",
                            expectation.kind, kind
                        ));
                        responder.send(Err(FrameworkError::ActorDropped.into()));
                    }
                    None => {
                        failures
                            .lock()
                            .unwrap()
                            .push(format!("unexpected `{}`", kind));
                        responder.send(Err(FrameworkError::ActorDropped.into()));
                    }
                }
            }
        });

        Self {
            client,
            expectations,
            received,
            mismatches,
            _handle: handle,
        }
    }

    /// Returns a client wired to this mock.
    pub fn client(&self) -> CoordinatorClient<H> {
        self.client.clone()
    }

    /// Expects the next action to have the given kind.
    pub fn expect(&self, kind: &'static str) -> ExpectationBuilder<H> {
        ExpectationBuilder {
            kind,
            expectations: self.expectations.clone(),
        }
    }

    /// Kinds of every action received so far, in order.
    pub fn received(&self) -> Vec<&'static str> {
        self.received.lock().unwrap().clone()
    }

    /// Panics if any expectation is left over or any request did not match.
    pub fn verify(&self) {
        let mismatches = self.mismatches.lock().unwrap();
        if !mismatches.is_empty() {
            panic!("Unexpected requests: {}", mismatches.join("; "));
        }
        let remaining = self.expectations.lock().unwrap().len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

/// Builder returned by [`MockCoordinator::expect`].
pub struct ExpectationBuilder<H: ActionHandler> {
    kind: &'static str,
    expectations: Arc<Mutex<VecDeque<Expectation<H>>>>,
}

impl<H: ActionHandler> ExpectationBuilder<H> {
    /// Answer with a successful result.
    pub fn return_ok(self, output: H::Output) {
        self.push(Ok(output));
    }

    /// Answer with an error.
    pub fn return_err(self, error: H::Error) {
        self.push(Err(error));
    }

    fn push(self, response: Reply<H>) {
        self.expectations.lock().unwrap().push_back(Expectation {
            kind: self.kind,
            response,
        });
    }
}

// =============================================================================
// MANUAL HELPERS
// =============================================================================

/// The receiving half of a mock client: the raw queue plus the broker that
/// replies must be delivered through.
pub struct MockReceiver<H: ActionHandler> {
    receiver: mpsc::Receiver<Envelope<H::Action>>,
    broker: Arc<CorrelationBroker<Reply<H>>>,
}

/// Completes one received action.
pub struct Responder<H: ActionHandler> {
    correlation_id: CorrelationId,
    broker: Arc<CorrelationBroker<Reply<H>>>,
}

impl<H: ActionHandler> Responder<H> {
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Delivers `reply`; `false` if the caller already gave up.
    pub fn send(self, reply: Reply<H>) -> bool {
        self.broker.deliver(self.correlation_id, reply)
    }
}

/// Creates a client whose queue is read by the test itself.
///
/// # Testing Strategy
/// The test owns the [`MockReceiver`] and plays the worker: it pulls envelopes
/// with [`expect_action`], asserts on the payload, and answers through the
/// returned [`Responder`].
pub fn create_mock_client<H: ActionHandler>(
    buffer_size: usize,
) -> (CoordinatorClient<H>, MockReceiver<H>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let broker = Arc::new(CorrelationBroker::new());
    (
        CoordinatorClient::new(sender, broker.clone()),
        MockReceiver { receiver, broker },
    )
}

/// Waits for the next submitted action.
pub async fn expect_action<H: ActionHandler>(
    receiver: &mut MockReceiver<H>,
) -> Option<(H::Action, Responder<H>)> {
    let envelope = receiver.receiver.recv().await?;
    Some((
        envelope.action,
        Responder {
            correlation_id: envelope.correlation_id,
            broker: receiver.broker.clone(),
        },
    ))
}
