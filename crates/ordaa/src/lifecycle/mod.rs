//! # System Lifecycle & Orchestration
//!
//! Wiring the registry, its coordinator and the client together, and tearing
//! them down again.
//!
//! ## The OrderSystem Pattern
//!
//! ```rust,ignore
//! impl OrderSystem {
//!     pub fn new(config, store, context) -> Result<Self, ConfigError> {
//!         // 0. Reject a zero capacity or timeout
//!         config.validate()?;
//!
//!         // 1. Create the coordinator (no collaborators yet)
//!         let (coordinator, client, reader) = registry::new(store, capacity, shutdown.clone());
//!
//!         // 2. Start it with its context injected
//!         let handle = tokio::spawn(coordinator.run(context));
//!
//!         Ok(Self { order_client: OrderClient::new(client, reader, deadline), shutdown, handle })
//!     }
//! }
//! ```
//!
//! ## Dependency Injection via Context
//!
//! The registry's [`OrderContext`](crate::registry::OrderContext) is passed to
//! `run()`, not to the constructor, so a snapshot publisher created after the
//! registry (for example one feeding the queue transport) can still be wired in.
//!
//! ## Graceful Shutdown
//!
//! 1. **Cancel the token** - the worker stops before its next dequeue
//! 2. **Abandon the rest** - queued actions are dropped and counted in the log
//! 3. **Await completion** - [`OrderSystem::shutdown`] joins the worker task
//!
//! Callers with actions still queued at that point see their own deadline
//! expire; the order client always has one when built from config.
//!
//! ## Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging for the process. See
//! [`ordaa_actor::tracing`] for the filter rules and example output.

pub mod order_system;

pub use order_system::*;
pub use ordaa_actor::tracing::setup_tracing;
