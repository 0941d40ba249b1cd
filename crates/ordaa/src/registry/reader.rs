//! Read path of the registry.
//!
//! Queries do not go through the coordinator. Each one opens its own
//! transaction, reads the last committed state and drops the transaction, so a
//! reader never sees a half-applied action and never waits behind the queue.

use crate::error::{EntityKind, OrderError};
use crate::model::{
    Menu, MenuId, MenuItem, MenuSnapshot, Order, OrderId, OrderItem, OrderItemId, OrderSnapshot,
    User, UserId,
};
use crate::registry::{found, During};
use crate::store::{OrderStore, StoreTx};
use std::sync::Arc;

#[derive(Clone)]
pub struct RegistryReader {
    store: Arc<dyn OrderStore>,
}

impl RegistryReader {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    async fn view(&self, op: &'static str) -> Result<Box<dyn StoreTx>, OrderError> {
        self.store.begin().await.during(op)
    }

    pub async fn order(&self, id: OrderId) -> Result<Order, OrderError> {
        let op = "order";
        let tx = self.view(op).await?;
        found(tx.order(id).await.during(op)?, EntityKind::Order, id)
    }

    pub async fn order_snapshot(&self, id: OrderId) -> Result<OrderSnapshot, OrderError> {
        let op = "order_snapshot";
        let tx = self.view(op).await?;
        let order = found(tx.order(id).await.during(op)?, EntityKind::Order, id)?;
        let items = tx.items_for_order(id).await.during(op)?;
        Ok(OrderSnapshot { order, items })
    }

    pub async fn orders(&self) -> Result<Vec<Order>, OrderError> {
        let op = "orders";
        self.view(op).await?.orders().await.during(op)
    }

    /// The non-delivered order for the menu called `menu_name`.
    pub async fn active_order_for_menu_name(&self, menu_name: &str) -> Result<Order, OrderError> {
        let op = "active_order_for_menu_name";
        let tx = self.view(op).await?;
        let menu = found(
            tx.menu_by_name(menu_name).await.during(op)?,
            EntityKind::Menu,
            menu_name,
        )?;
        found(
            tx.active_order_for_menu(menu.id).await.during(op)?,
            EntityKind::ActiveOrder,
            menu_name,
        )
    }

    pub async fn menus(&self) -> Result<Vec<Menu>, OrderError> {
        let op = "menus";
        self.view(op).await?.menus().await.during(op)
    }

    pub async fn menu(&self, id: MenuId) -> Result<MenuSnapshot, OrderError> {
        let op = "menu";
        let tx = self.view(op).await?;
        let menu = found(tx.menu(id).await.during(op)?, EntityKind::Menu, id)?;
        let items = tx.menu_items(id).await.during(op)?;
        Ok(MenuSnapshot { menu, items })
    }

    pub async fn menu_by_name(&self, name: &str) -> Result<MenuSnapshot, OrderError> {
        let op = "menu_by_name";
        let tx = self.view(op).await?;
        let menu = found(tx.menu_by_name(name).await.during(op)?, EntityKind::Menu, name)?;
        let items = tx.menu_items(menu.id).await.during(op)?;
        Ok(MenuSnapshot { menu, items })
    }

    pub async fn menu_item_by_short_name(
        &self,
        menu_id: MenuId,
        short_name: &str,
    ) -> Result<MenuItem, OrderError> {
        let op = "menu_item_by_short_name";
        let tx = self.view(op).await?;
        found(
            tx.menu_item_by_short_name(menu_id, short_name)
                .await
                .during(op)?,
            EntityKind::MenuItem,
            short_name,
        )
    }

    pub async fn user(&self, id: UserId) -> Result<User, OrderError> {
        let op = "user";
        let tx = self.view(op).await?;
        found(tx.user(id).await.during(op)?, EntityKind::User, id)
    }

    pub async fn user_by_name(&self, name: &str) -> Result<User, OrderError> {
        let op = "user_by_name";
        let tx = self.view(op).await?;
        found(tx.user_by_name(name).await.during(op)?, EntityKind::User, name)
    }

    pub async fn order_item(&self, id: OrderItemId) -> Result<OrderItem, OrderError> {
        let op = "order_item";
        let tx = self.view(op).await?;
        found(tx.order_item(id).await.during(op)?, EntityKind::OrderItem, id)
    }

    pub async fn items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>, OrderError> {
        let op = "items_for_order";
        let tx = self.view(op).await?;
        found(tx.order(order_id).await.during(op)?, EntityKind::Order, order_id)?;
        tx.items_for_order(order_id).await.during(op)
    }

    pub async fn items_for_user(
        &self,
        order_id: OrderId,
        user: UserId,
    ) -> Result<Vec<OrderItem>, OrderError> {
        let op = "items_for_user";
        let tx = self.view(op).await?;
        found(tx.order(order_id).await.during(op)?, EntityKind::Order, order_id)?;
        tx.items_for_user(order_id, user).await.during(op)
    }
}
