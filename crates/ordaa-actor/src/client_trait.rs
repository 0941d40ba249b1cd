//! # ActorClient Trait
//!
//! Provides a common interface for domain-specific clients, adding default
//! `submit` plumbing (with an optional per-client deadline) on top of a generic
//! [`CoordinatorClient`].
use crate::{Action, ActionHandler, CoordinatorClient, Reply};
use async_trait::async_trait;
use std::time::Duration;

/// Trait for domain clients that wrap a [`CoordinatorClient`].
///
/// Implementors provide `inner()` and optionally `deadline()`; `submit` then
/// applies the deadline uniformly, so domain methods reduce to building an
/// action and unwrapping the result variant they expect.
///
/// # Example
///
/// ```rust
/// use ordaa_actor::{Action, ActionHandler, ActorClient, CoordinatorClient, FrameworkError};
/// use async_trait::async_trait;
/// use std::time::Duration;
///
/// #[derive(Debug)] struct Ping;
/// impl Action for Ping { fn kind(&self) -> &'static str { "ping" } }
///
/// #[derive(Debug, thiserror::Error)]
/// #[error(transparent)]
/// struct PingError(#[from] FrameworkError);
///
/// struct Pong;
///
/// #[async_trait]
/// impl ActionHandler for Pong {
///     type Action = Ping;
///     type Output = &'static str;
///     type Context = ();
///     type Error = PingError;
///     async fn handle(&mut self, _: Ping, _: &()) -> Result<&'static str, PingError> { Ok("pong") }
/// }
///
/// struct PingClient {
///     inner: CoordinatorClient<Pong>,
/// }
///
/// impl ActorClient<Pong> for PingClient {
///     fn inner(&self) -> &CoordinatorClient<Pong> {
///         &self.inner
///     }
///
///     fn deadline(&self) -> Option<Duration> {
///         Some(Duration::from_secs(1))
///     }
/// }
///
/// async fn usage(client: PingClient) {
///     // submit() is provided automatically and honours the deadline
///     let _ = client.submit(Ping).await;
/// }
/// ```
#[async_trait]
pub trait ActorClient<H: ActionHandler>: Send + Sync {
    /// Access the inner generic client.
    fn inner(&self) -> &CoordinatorClient<H>;

    /// Deadline applied to every `submit`; `None` waits indefinitely.
    fn deadline(&self) -> Option<Duration> {
        None
    }

    /// Submit an action and await its correlated result.
    #[tracing::instrument(skip_all, fields(kind = action.kind()))]
    async fn submit(&self, action: H::Action) -> Reply<H> {
        tracing::debug!("Sending request");
        match self.deadline() {
            Some(deadline) => self.inner().submit_within(action, deadline).await,
            None => self.inner().submit(action).await,
        }
    }
}
