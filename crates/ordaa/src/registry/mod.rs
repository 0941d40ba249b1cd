//! # Order Registry
//!
//! The registry is the only place the order invariants are enforced. Each
//! mutating operation runs inside one store transaction: it reads what it
//! needs, applies the rules from [`crate::model::state`], writes, and commits.
//! Any error rolls the transaction back, so a rejected operation leaves no
//! trace.
//!
//! ## Structure
//!
//! - [`OrderRegistry`] - mutating operations; owned by the coordinator worker
//! - [`RegistryReader`] - read-only queries against the last committed state
//! - [`actions`] - [`OrderAction`] and [`OrderActionResult`]
//! - [`handler`] - the [`ActionHandler`](ordaa_actor::ActionHandler) impl and its [`OrderContext`]
//! - [`new()`] - factory that creates the coordinator, client and reader
//!
//! ## Usage
//!
//! ```rust
//! use ordaa::model::NewMenu;
//! use ordaa::registry::{self, OrderAction, OrderActionResult, OrderContext};
//! use ordaa::store::MemoryStore;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let shutdown = CancellationToken::new();
//!     let (coordinator, client, reader) =
//!         registry::new(Arc::new(MemoryStore::new()), 16, shutdown.clone());
//!     tokio::spawn(coordinator.run(OrderContext::default()));
//!
//!     let menu = NewMenu { name: "pizza".into(), url: None, items: vec![] };
//!     let result = client.submit(OrderAction::CreateMenu { menu }).await.unwrap();
//!     assert!(matches!(result, OrderActionResult::CreateMenu(_)));
//!     assert_eq!(reader.menu_by_name("pizza").await.unwrap().menu.name, "pizza");
//!     shutdown.cancel();
//! }
//! ```

pub mod actions;
pub mod handler;
mod ops;
pub mod reader;

pub use actions::*;
pub use handler::*;
pub use reader::RegistryReader;

use crate::error::{EntityKind, OrderError};
use crate::store::{OrderStore, StoreError};
use ordaa_actor::{Coordinator, CoordinatorClient};
use std::fmt::Display;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Transactional owner of all order mutations.
pub struct OrderRegistry {
    store: Arc<dyn OrderStore>,
    reader: RegistryReader,
}

impl OrderRegistry {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        let reader = RegistryReader::new(store.clone());
        Self { store, reader }
    }

    /// A read handle sharing this registry's store.
    pub fn reader(&self) -> RegistryReader {
        self.reader.clone()
    }
}

/// Creates the registry coordinator, its client and a reader.
pub fn new(
    store: Arc<dyn OrderStore>,
    queue_capacity: usize,
    shutdown: CancellationToken,
) -> (
    Coordinator<OrderRegistry>,
    CoordinatorClient<OrderRegistry>,
    RegistryReader,
) {
    let registry = OrderRegistry::new(store);
    let reader = registry.reader();
    let (coordinator, client) = Coordinator::new(registry, queue_capacity, shutdown);
    (coordinator, client, reader)
}

/// Attaches the operation name to a store failure.
pub(crate) trait During<T> {
    fn during(self, op: &'static str) -> Result<T, OrderError>;
}

impl<T> During<T> for Result<T, StoreError> {
    fn during(self, op: &'static str) -> Result<T, OrderError> {
        self.map_err(|e| OrderError::store(op, e))
    }
}

pub(crate) fn found<T>(record: Option<T>, kind: EntityKind, key: impl Display) -> Result<T, OrderError> {
    record.ok_or_else(|| OrderError::not_found(kind, key))
}
