//! Type-safe wrappers around [`CoordinatorClient`](ordaa_actor::CoordinatorClient).

pub mod order_client;

pub use order_client::*;
