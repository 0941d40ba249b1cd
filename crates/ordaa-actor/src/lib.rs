//! # Coordinator Framework
//!
//! Building blocks for funnelling every mutation of some shared state through a
//! single worker, while any number of producers submit work concurrently and
//! each gets back exactly the result of its own request.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into three layers:
//!
//! 1. **Handler Layer** ([`ActionHandler`]) - your business logic, owned by one task
//! 2. **Runtime Layer** ([`Coordinator`]) - the bounded queue and the sequential worker loop
//! 3. **Interface Layer** ([`CoordinatorClient`], [`ActorClient`]) - typed submission
//!
//! Replies do not ride along with the request. Each submission mints a
//! [`CorrelationId`] and parks a pending reply in the [`CorrelationBroker`];
//! the worker hands its result to the broker, which routes it back by id. A
//! caller that stops waiting abandons its id, and a late result is discarded.
//!
//! ```text
//!  producer ─┐                          ┌─> broker.deliver(id, result) ─> producer
//!  producer ─┼─> [ bounded mpsc queue ] ─> coordinator.handle(action)
//!  producer ─┘        Envelope{id, action}
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ordaa_actor::{Action, ActionHandler, Coordinator, FrameworkError};
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug)]
//! enum TallyAction { Bump, Read }
//!
//! impl Action for TallyAction {
//!     fn kind(&self) -> &'static str {
//!         match self { TallyAction::Bump => "bump", TallyAction::Read => "read" }
//!     }
//! }
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error(transparent)]
//! struct TallyError(#[from] FrameworkError);
//!
//! struct Tally(u32);
//!
//! #[async_trait]
//! impl ActionHandler for Tally {
//!     type Action = TallyAction;
//!     type Output = u32;
//!     type Context = ();
//!     type Error = TallyError;
//!
//!     async fn handle(&mut self, action: TallyAction, _: &()) -> Result<u32, TallyError> {
//!         if let TallyAction::Bump = action { self.0 += 1; }
//!         Ok(self.0)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let shutdown = CancellationToken::new();
//!     let (coordinator, client) = Coordinator::new(Tally(0), 8, shutdown.clone());
//!     tokio::spawn(coordinator.run(()));
//!
//!     let producers: Vec<_> = (0..10)
//!         .map(|_| {
//!             let client = client.clone();
//!             tokio::spawn(async move { client.submit(TallyAction::Bump).await })
//!         })
//!         .collect();
//!     for p in producers {
//!         p.await.unwrap().unwrap();
//!     }
//!     assert_eq!(client.submit(TallyAction::Read).await.unwrap(), 10);
//!     shutdown.cancel();
//! }
//! ```
//!
//! ## Context Injection Pattern
//!
//! Collaborators are injected when the worker starts (`run(context)`), not at
//! construction time, so a handler can be wired to things created after it.
//!
//! ## Concurrency Model
//!
//! - One worker task per coordinator; actions are applied strictly one at a time
//! - The queue is bounded; a full queue makes producers wait, never drops work
//! - No caller ever observes another caller's result
//! - Cancellation stops the loop before the next dequeue; queued work is abandoned
//!
//! ## Testing
//!
//! The [`mock`] module scripts a coordinator's replies so that domain client
//! wrappers can be tested without their handler.

pub mod broker;
pub mod client;
pub mod client_trait;
pub mod coordinator;
pub mod error;
pub mod handler;
pub mod message;
pub mod mock;
pub mod tracing;

// Re-export core types for convenience
pub use broker::CorrelationBroker;
pub use client::CoordinatorClient;
pub use client_trait::ActorClient;
pub use coordinator::Coordinator;
pub use error::FrameworkError;
pub use handler::ActionHandler;
pub use message::{Action, CorrelationId, Envelope, Reply};
