//! # ordaa
//!
//! Group food order coordination. Participants open an order against a shared
//! menu, add items, one of them collects the money ("sugar person"), and the
//! order moves through `open → finalized → ordered → delivered`.
//!
//! Chat, REST and queue front ends all mutate the same orders concurrently.
//! Every mutation is funnelled through one [`ordaa_actor::Coordinator`] that
//! owns the [`registry::OrderRegistry`], so invariants are checked against a
//! single, serialized view of the store.

pub mod clients;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod registry;
pub mod store;
pub mod transport;
