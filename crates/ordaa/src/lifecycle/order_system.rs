use crate::clients::OrderClient;
use crate::config::{ConfigError, CoordinatorConfig};
use crate::registry::{self, OrderContext};
use crate::store::{MemoryStore, OrderStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// The runtime orchestrator for the order registry.
///
/// `OrderSystem` is responsible for:
/// - **Lifecycle Management**: starting and stopping the coordinator worker
/// - **Dependency Wiring**: injecting the [`OrderContext`] when the worker starts
/// - **Client Construction**: building the [`OrderClient`] every front end clones
///
/// # Example
///
/// ```rust
/// use ordaa::config::CoordinatorConfig;
/// use ordaa::lifecycle::OrderSystem;
///
/// #[tokio::main]
/// async fn main() {
///     let system = OrderSystem::in_memory(&CoordinatorConfig::default()).unwrap();
///     let alice = system.order_client.register_user("alice").await.unwrap();
///     assert_eq!(system.order_client.user_by_name("alice").await.unwrap(), alice);
///     system.shutdown().await;
/// }
/// ```
pub struct OrderSystem {
    /// Client for interacting with the order registry
    pub order_client: OrderClient,
    shutdown: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl OrderSystem {
    /// Creates the registry over `store`, spawns its worker and returns the
    /// running system. Must be called inside a Tokio runtime.
    ///
    /// Fails without spawning anything if `config` does not validate.
    pub fn new(
        config: &CoordinatorConfig,
        store: Arc<dyn OrderStore>,
        context: OrderContext,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let shutdown = CancellationToken::new();
        let (coordinator, client, reader) =
            registry::new(store, config.queue_capacity, shutdown.clone());

        let handle = tokio::spawn(coordinator.run(context));
        info!(
            queue_capacity = config.queue_capacity,
            request_timeout_ms = config.request_timeout_ms,
            "Order system started"
        );

        Ok(Self {
            order_client: OrderClient::new(client, reader, Some(config.request_timeout())),
            shutdown,
            handle,
        })
    }

    /// A system over a fresh [`MemoryStore`] with no publisher.
    pub fn in_memory(config: &CoordinatorConfig) -> Result<Self, ConfigError> {
        Self::new(config, Arc::new(MemoryStore::new()), OrderContext::default())
    }

    /// Cancels the worker and waits for it to exit.
    pub async fn shutdown(self) {
        info!("Shutting down order system");
        self.shutdown.cancel();
        if let Err(e) = self.handle.await {
            error!(error = %e, "Coordinator task failed");
        }
        info!("Order system shut down");
    }
}
