//! Plain domain records shared by the registry, the store and the transports.
//!
//! None of these types know about persistence or the coordinator.

pub mod ids;
pub mod menu;
pub mod order;
pub mod order_item;
pub mod state;
pub mod user;

pub use ids::*;
pub use menu::*;
pub use order::*;
pub use order_item::*;
pub use user::*;
