//! # ActionHandler Trait
//!
//! The `ActionHandler` trait is the contract between the generic
//! [`Coordinator`](crate::Coordinator) and the thing it serializes access to.
//! The coordinator owns the handler exclusively and calls [`ActionHandler::handle`]
//! for one action at a time, so a handler never needs its own locking for writes.
//!
//! # Architecture Note
//! The associated types keep the queue strongly typed: a coordinator for an
//! order registry accepts only the registry's `Action` enum and yields only its
//! `Output` enum and `Error` type. A handler for a different domain cannot be
//! fed the wrong message.
//!
//! # Provided Methods (Hooks)
//! - [`ActionHandler::on_start`] runs once before the first action is dequeued.
//! - [`ActionHandler::on_stop`] runs once after the loop exits.
//!
//! Both default to doing nothing.

use crate::error::FrameworkError;
use crate::message::Action;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait implemented by the single owner of shared mutable state.
///
/// # Async & Context
/// The trait is `#[async_trait]` so that `handle` can await a store or another
/// service. The `Context` type is injected at `run()` time ("late binding"),
/// which lets callers wire in collaborators created after the coordinator.
///
/// # Design Note: Error Type
/// `Error` must absorb [`FrameworkError`] so a client returns one error enum for
/// both business rejections and plumbing failures (closed queue, timeout).
#[async_trait]
pub trait ActionHandler: Send + 'static {
    /// The message enum accepted by this handler.
    type Action: Action;

    /// The result returned on success.
    type Output: Send + Debug + 'static;

    /// The runtime context (collaborators) injected into the worker.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync + 'static;

    /// Business error type; also carries framework failures.
    type Error: std::error::Error + From<FrameworkError> + Send + Sync + 'static;

    /// Apply one action. Called strictly sequentially.
    async fn handle(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::Output, Self::Error>;

    /// Called once before the first action is processed.
    async fn on_start(&mut self, _ctx: &Self::Context) {}

    /// Called once after the worker loop exits.
    async fn on_stop(&mut self, _ctx: &Self::Context) {}
}
