//! In-memory reference store.
//!
//! Committed tables live behind a `tokio::sync::RwLock` as an `Arc<Tables>`.
//! A transaction starts from a clone of that `Arc` and copies the tables on its
//! first write, so read-only transactions cost nothing. `commit` swaps the copy
//! in if no other commit happened in between, and fails with
//! [`StoreError::Conflict`] otherwise.

use crate::model::{
    Menu, MenuId, MenuItem, MenuItemId, Order, OrderId, OrderItem, OrderItemId, User, UserId,
};
use crate::store::{OrderStore, StoreError, StoreTx};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct Tables {
    orders: BTreeMap<OrderId, Order>,
    items: BTreeMap<OrderItemId, OrderItem>,
    menus: BTreeMap<MenuId, Menu>,
    menu_items: BTreeMap<MenuItemId, MenuItem>,
    users: BTreeMap<UserId, User>,
}

#[derive(Debug, Default)]
struct Committed {
    version: u64,
    tables: Arc<Tables>,
}

const DISARMED: usize = usize::MAX;

/// Remaining order item writes before injected failures start.
#[derive(Debug)]
struct Faults {
    item_writes_left: AtomicUsize,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            item_writes_left: AtomicUsize::new(DISARMED),
        }
    }
}

impl Faults {
    fn item_write(&self) -> Result<(), StoreError> {
        let step = self
            .item_writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                DISARMED => None,
                0 => Some(0),
                n => Some(n - 1),
            });
        match step {
            Ok(0) => Err(StoreError::Injected("order item write".into())),
            _ => Ok(()),
        }
    }
}

/// Transactional in-memory implementation of [`OrderStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    committed: Arc<RwLock<Committed>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets the next `n` order item writes succeed and fails every one after.
    #[cfg(any(test, feature = "testing"))]
    pub fn fail_item_writes_after(&self, n: usize) {
        self.faults.item_writes_left.store(n, Ordering::SeqCst);
    }

    #[cfg(any(test, feature = "testing"))]
    pub fn clear_faults(&self) {
        self.faults.item_writes_left.store(DISARMED, Ordering::SeqCst);
    }

    /// Number of successful commits so far.
    pub async fn version(&self) -> u64 {
        self.committed.read().await.version
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let committed = self.committed.read().await;
        Ok(Box::new(MemoryTx {
            committed: self.committed.clone(),
            faults: self.faults.clone(),
            base_version: committed.version,
            tables: committed.tables.clone(),
        }))
    }
}

struct MemoryTx {
    committed: Arc<RwLock<Committed>>,
    faults: Arc<Faults>,
    base_version: u64,
    tables: Arc<Tables>,
}

impl MemoryTx {
    fn write(&mut self) -> &mut Tables {
        Arc::make_mut(&mut self.tables)
    }
}

fn missing(what: &str, id: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("{} {} does not exist", what, id))
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.tables.orders.get(&id).cloned())
    }

    async fn orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.tables.orders.values().cloned().collect())
    }

    async fn active_order_for_menu(&self, menu: MenuId) -> Result<Option<Order>, StoreError> {
        Ok(self
            .tables
            .orders
            .values()
            .find(|order| order.menu_id == menu && order.state.is_active())
            .cloned())
    }

    async fn insert_order(&mut self, order: Order) -> Result<(), StoreError> {
        self.write().orders.insert(order.id, order);
        Ok(())
    }

    async fn update_order(&mut self, order: Order) -> Result<(), StoreError> {
        let slot = self
            .write()
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| missing("order", order.id))?;
        *slot = order;
        Ok(())
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<(), StoreError> {
        self.write()
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| missing("order", id))
    }

    async fn order_item(&self, id: OrderItemId) -> Result<Option<OrderItem>, StoreError> {
        Ok(self.tables.items.get(&id).cloned())
    }

    async fn items_for_order(&self, order: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        Ok(self
            .tables
            .items
            .values()
            .filter(|item| item.order_id == order)
            .cloned()
            .collect())
    }

    async fn items_for_user(
        &self,
        order: OrderId,
        user: UserId,
    ) -> Result<Vec<OrderItem>, StoreError> {
        Ok(self
            .tables
            .items
            .values()
            .filter(|item| item.order_id == order && item.user == user)
            .cloned()
            .collect())
    }

    async fn insert_item(&mut self, item: OrderItem) -> Result<(), StoreError> {
        self.faults.item_write()?;
        self.write().items.insert(item.id, item);
        Ok(())
    }

    async fn update_item(&mut self, item: OrderItem) -> Result<(), StoreError> {
        self.faults.item_write()?;
        let slot = self
            .write()
            .items
            .get_mut(&item.id)
            .ok_or_else(|| missing("order item", item.id))?;
        *slot = item;
        Ok(())
    }

    async fn delete_item(&mut self, id: OrderItemId) -> Result<(), StoreError> {
        self.write()
            .items
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| missing("order item", id))
    }

    async fn menu(&self, id: MenuId) -> Result<Option<Menu>, StoreError> {
        Ok(self.tables.menus.get(&id).cloned())
    }

    async fn menus(&self) -> Result<Vec<Menu>, StoreError> {
        Ok(self.tables.menus.values().cloned().collect())
    }

    async fn menu_by_name(&self, name: &str) -> Result<Option<Menu>, StoreError> {
        Ok(self
            .tables
            .menus
            .values()
            .find(|menu| menu.name == name)
            .cloned())
    }

    async fn insert_menu(&mut self, menu: Menu) -> Result<(), StoreError> {
        self.write().menus.insert(menu.id, menu);
        Ok(())
    }

    async fn update_menu(&mut self, menu: Menu) -> Result<(), StoreError> {
        let slot = self
            .write()
            .menus
            .get_mut(&menu.id)
            .ok_or_else(|| missing("menu", menu.id))?;
        *slot = menu;
        Ok(())
    }

    async fn delete_menu(&mut self, id: MenuId) -> Result<(), StoreError> {
        let tables = self.write();
        tables.menus.remove(&id).ok_or_else(|| missing("menu", id))?;
        tables.menu_items.retain(|_, item| item.menu_id != id);
        Ok(())
    }

    async fn menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>, StoreError> {
        Ok(self.tables.menu_items.get(&id).cloned())
    }

    async fn menu_item_by_short_name(
        &self,
        menu: MenuId,
        short_name: &str,
    ) -> Result<Option<MenuItem>, StoreError> {
        Ok(self
            .tables
            .menu_items
            .values()
            .find(|item| item.menu_id == menu && item.short_name == short_name)
            .cloned())
    }

    async fn menu_items(&self, menu: MenuId) -> Result<Vec<MenuItem>, StoreError> {
        Ok(self
            .tables
            .menu_items
            .values()
            .filter(|item| item.menu_id == menu)
            .cloned()
            .collect())
    }

    async fn insert_menu_item(&mut self, item: MenuItem) -> Result<(), StoreError> {
        self.write().menu_items.insert(item.id, item);
        Ok(())
    }

    async fn update_menu_item(&mut self, item: MenuItem) -> Result<(), StoreError> {
        let slot = self
            .write()
            .menu_items
            .get_mut(&item.id)
            .ok_or_else(|| missing("menu item", item.id))?;
        *slot = item;
        Ok(())
    }

    async fn delete_menu_item(&mut self, id: MenuItemId) -> Result<(), StoreError> {
        self.write()
            .menu_items
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| missing("menu item", id))
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.tables.users.get(&id).cloned())
    }

    async fn user_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables
            .users
            .values()
            .find(|user| user.name == name)
            .cloned())
    }

    async fn insert_user(&mut self, user: User) -> Result<(), StoreError> {
        self.write().users.insert(user.id, user);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx {
            committed: shared,
            base_version,
            tables,
            ..
        } = *self;
        let mut committed = shared.write().await;
        if committed.version != base_version {
            return Err(StoreError::Conflict);
        }
        if Arc::ptr_eq(&committed.tables, &tables) {
            // Nothing was written.
            return Ok(());
        }
        committed.version += 1;
        committed.tables = tables;
        debug!(version = committed.version, "Committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
