//! # Persistence Port
//!
//! The registry talks to storage only through [`OrderStore`] and [`StoreTx`].
//! Every registry operation opens exactly one transaction, and either commits
//! it or rolls it back; dropping an uncommitted transaction discards it.
//!
//! Lookups return `Ok(None)` for a missing record so that "not found" is never
//! confused with an infrastructure failure.

pub mod memory;

pub use memory::MemoryStore;

use crate::model::{
    Menu, MenuId, MenuItem, MenuItemId, Order, OrderId, OrderItem, OrderItemId, User, UserId,
};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a store backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Another commit landed since this transaction began.
    #[error("Concurrent commit; transaction discarded")]
    Conflict,
    #[error("Store backend error: {0}")]
    Backend(String),
    /// Raised on purpose by a fault-injecting store.
    #[error("Injected failure: {0}")]
    Injected(String),
}

/// Factory for transactions.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;
}

/// One unit of work against the store.
#[async_trait]
pub trait StoreTx: Send + Sync {
    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;
    async fn orders(&self) -> Result<Vec<Order>, StoreError>;
    /// The order for `menu` whose state is not `Delivered`, if any.
    async fn active_order_for_menu(&self, menu: MenuId) -> Result<Option<Order>, StoreError>;
    async fn insert_order(&mut self, order: Order) -> Result<(), StoreError>;
    async fn update_order(&mut self, order: Order) -> Result<(), StoreError>;
    async fn delete_order(&mut self, id: OrderId) -> Result<(), StoreError>;

    async fn order_item(&self, id: OrderItemId) -> Result<Option<OrderItem>, StoreError>;
    async fn items_for_order(&self, order: OrderId) -> Result<Vec<OrderItem>, StoreError>;
    async fn items_for_user(
        &self,
        order: OrderId,
        user: UserId,
    ) -> Result<Vec<OrderItem>, StoreError>;
    async fn insert_item(&mut self, item: OrderItem) -> Result<(), StoreError>;
    async fn update_item(&mut self, item: OrderItem) -> Result<(), StoreError>;
    async fn delete_item(&mut self, id: OrderItemId) -> Result<(), StoreError>;

    async fn menu(&self, id: MenuId) -> Result<Option<Menu>, StoreError>;
    async fn menus(&self) -> Result<Vec<Menu>, StoreError>;
    async fn menu_by_name(&self, name: &str) -> Result<Option<Menu>, StoreError>;
    async fn insert_menu(&mut self, menu: Menu) -> Result<(), StoreError>;
    async fn update_menu(&mut self, menu: Menu) -> Result<(), StoreError>;
    /// Removes the menu together with all of its menu items.
    async fn delete_menu(&mut self, id: MenuId) -> Result<(), StoreError>;
    async fn menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, StoreError>;
    async fn menu_item_by_short_name(
        &self,
        menu: MenuId,
        short_name: &str,
    ) -> Result<Option<MenuItem>, StoreError>;
    async fn menu_items(&self, menu: MenuId) -> Result<Vec<MenuItem>, StoreError>;
    async fn insert_menu_item(&mut self, item: MenuItem) -> Result<(), StoreError>;
    async fn update_menu_item(&mut self, item: MenuItem) -> Result<(), StoreError>;
    async fn delete_menu_item(&mut self, id: MenuItemId) -> Result<(), StoreError>;

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn user_by_name(&self, name: &str) -> Result<Option<User>, StoreError>;
    async fn insert_user(&mut self, user: User) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
