//! Mutating registry operations. Called only from the coordinator worker.

use crate::error::{EntityKind, OrderError};
use crate::model::state::{
    check_item_update, check_paid_change, check_patch, check_sugar_person, check_transition,
    toggled_paid, Transition,
};
use crate::model::{
    Menu, MenuId, MenuItem, MenuItemId, MenuSnapshot, NewMenu, Order, OrderId, OrderItem,
    OrderItemId, OrderItemUpdate, OrderPatch, OrderState, PaidToggle, User, UserId,
};
use crate::registry::{found, During, OrderRegistry};
use crate::store::StoreTx;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

impl OrderRegistry {
    async fn begin(&self, op: &'static str) -> Result<Box<dyn StoreTx>, OrderError> {
        self.store.begin().await.during(op)
    }

    /// Commits on success, rolls back on failure.
    async fn finish<T>(
        op: &'static str,
        tx: Box<dyn StoreTx>,
        outcome: Result<T, OrderError>,
    ) -> Result<T, OrderError> {
        match outcome {
            Ok(value) => {
                tx.commit().await.during(op)?;
                debug!(op, "Committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(e) = tx.rollback().await {
                    warn!(op, error = %e, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    pub async fn create_order(
        &mut self,
        initiator: UserId,
        menu_id: MenuId,
    ) -> Result<Order, OrderError> {
        let op = "create_order";
        let mut tx = self.begin(op).await?;
        let outcome: Result<Order, OrderError> = async {
            let menu = found(tx.menu(menu_id).await.during(op)?, EntityKind::Menu, menu_id)?;
            found(tx.user(initiator).await.during(op)?, EntityKind::User, initiator)?;
            if tx.active_order_for_menu(menu.id).await.during(op)?.is_some() {
                return Err(OrderError::ActiveOrderAlreadyExists(menu.name));
            }
            let order = Order::open(initiator, menu.id);
            tx.insert_order(order.clone()).await.during(op)?;
            Ok(order)
        }
        .await;

        let order = Self::finish(op, tx, outcome).await?;
        info!(order_id = %order.id, menu_id = %order.menu_id, "Order created");
        Ok(order)
    }

    pub async fn add_order_item(
        &mut self,
        order_id: OrderId,
        user: UserId,
        menu_item_id: MenuItemId,
    ) -> Result<OrderItem, OrderError> {
        let op = "add_order_item";
        let mut tx = self.begin(op).await?;
        let outcome: Result<OrderItem, OrderError> = async {
            let order = found(tx.order(order_id).await.during(op)?, EntityKind::Order, order_id)?;
            if order.state != OrderState::Open {
                return Err(OrderError::OrderNotOpenForItems(order.state));
            }
            let menu_item = tx
                .menu_item(menu_item_id)
                .await
                .during(op)?
                .filter(|item| item.menu_id == order.menu_id);
            let menu_item = found(menu_item, EntityKind::MenuItem, menu_item_id)?;
            found(tx.user(user).await.during(op)?, EntityKind::User, user)?;

            let item = OrderItem {
                id: OrderItemId::new(),
                order_id,
                menu_item_id,
                user,
                price: menu_item.price,
                paid: false,
            };
            tx.insert_item(item.clone()).await.during(op)?;
            Ok(item)
        }
        .await;

        let item = Self::finish(op, tx, outcome).await?;
        info!(order_id = %item.order_id, item_id = %item.id, "Order item added");
        Ok(item)
    }

    /// Validates and applies a transition. The returned [`Transition`] tells
    /// the caller whether an edge was taken.
    pub async fn transition_order(
        &mut self,
        caller: UserId,
        order_id: OrderId,
        target: OrderState,
        patch: OrderPatch,
    ) -> Result<(Order, Transition), OrderError> {
        let op = "transition_order";
        let mut tx = self.begin(op).await?;
        let outcome: Result<(Order, Transition), OrderError> = async {
            found(tx.user(caller).await.during(op)?, EntityKind::User, caller)?;
            let mut order = found(tx.order(order_id).await.during(op)?, EntityKind::Order, order_id)?;
            let transition = check_transition(&order, caller, target)?;
            check_patch(order.state, target, &patch)?;

            if let Some(candidate) = patch.sugar_person {
                found(tx.user(candidate).await.during(op)?, EntityKind::User, candidate)?;
                check_sugar_person(&order, candidate)?;
                order.sugar_person = Some(candidate);
            }
            if let Some(deadline) = patch.order_deadline {
                order.order_deadline = Some(deadline);
            }
            if let Some(eta) = patch.eta {
                order.eta = Some(eta);
            }
            order.state = target;

            if transition != Transition::Stay || !patch.is_empty() {
                tx.update_order(order.clone()).await.during(op)?;
            }
            Ok((order, transition))
        }
        .await;

        let (order, transition) = Self::finish(op, tx, outcome).await?;
        match transition {
            Transition::Move { from, to } => {
                info!(order_id = %order.id, %from, %to, "Order state changed")
            }
            Transition::Stay => debug!(order_id = %order.id, "Order patched"),
        }
        Ok((order, transition))
    }

    pub async fn set_sugar_person(
        &mut self,
        caller: UserId,
        order_id: OrderId,
    ) -> Result<Order, OrderError> {
        let op = "set_sugar_person";
        let mut tx = self.begin(op).await?;
        let outcome: Result<Order, OrderError> = async {
            found(tx.user(caller).await.during(op)?, EntityKind::User, caller)?;
            let mut order = found(tx.order(order_id).await.during(op)?, EntityKind::Order, order_id)?;
            if check_sugar_person(&order, caller)? {
                order.sugar_person = Some(caller);
                tx.update_order(order.clone()).await.during(op)?;
            }
            Ok(order)
        }
        .await;

        let order = Self::finish(op, tx, outcome).await?;
        info!(order_id = %order.id, sugar_person = %caller, "Sugar person set");
        Ok(order)
    }

    /// Marks all of `target_user`'s items paid if any is unpaid, otherwise
    /// marks them all unpaid. All writes land together or not at all.
    pub async fn toggle_paid_for_user(
        &mut self,
        caller: UserId,
        order_id: OrderId,
        target_user: UserId,
    ) -> Result<PaidToggle, OrderError> {
        let op = "toggle_paid_for_user";
        let mut tx = self.begin(op).await?;
        let outcome: Result<PaidToggle, OrderError> = async {
            let order = found(tx.order(order_id).await.during(op)?, EntityKind::Order, order_id)?;
            check_paid_change(&order, caller)?;
            let user = found(tx.user(target_user).await.during(op)?, EntityKind::User, target_user)?;

            let items = tx.items_for_user(order_id, target_user).await.during(op)?;
            let Some(paid) = toggled_paid(&items) else {
                return Err(OrderError::NoItemsForUser(user.name));
            };

            let mut flipped = Vec::with_capacity(items.len());
            for mut item in items {
                item.paid = paid;
                if let Err(e) = tx.update_item(item.clone()).await {
                    warn!(item_id = %item.id, error = %e, "Paid flag write failed; aborting group");
                    return Err(OrderError::Conflict);
                }
                flipped.push(item);
            }
            Ok(PaidToggle {
                user: target_user,
                paid,
                items: flipped,
            })
        }
        .await;

        let toggle = Self::finish(op, tx, outcome).await?;
        info!(%order_id, user = %target_user, paid = toggle.paid, count = toggle.items.len(), "Paid status toggled");
        Ok(toggle)
    }

    pub async fn update_order_item(
        &mut self,
        caller: UserId,
        item_id: OrderItemId,
        update: OrderItemUpdate,
    ) -> Result<OrderItem, OrderError> {
        let op = "update_order_item";
        let mut tx = self.begin(op).await?;
        let outcome: Result<OrderItem, OrderError> = async {
            let mut item = found(tx.order_item(item_id).await.during(op)?, EntityKind::OrderItem, item_id)?;
            if check_item_update(&item, &update)? {
                let order = found(
                    tx.order(item.order_id).await.during(op)?,
                    EntityKind::Order,
                    item.order_id,
                )?;
                check_paid_change(&order, caller)?;
                item.paid = update.paid;
                tx.update_item(item.clone()).await.during(op)?;
            }
            Ok(item)
        }
        .await;

        let item = Self::finish(op, tx, outcome).await?;
        debug!(item_id = %item.id, paid = item.paid, "Order item updated");
        Ok(item)
    }

    pub async fn remove_order_item(
        &mut self,
        caller: UserId,
        item_id: OrderItemId,
    ) -> Result<OrderItem, OrderError> {
        let op = "remove_order_item";
        let mut tx = self.begin(op).await?;
        let outcome: Result<OrderItem, OrderError> = async {
            let item = found(tx.order_item(item_id).await.during(op)?, EntityKind::OrderItem, item_id)?;
            if item.user != caller {
                return Err(OrderError::PermissionDenied(
                    "only the owner of an item may remove it".into(),
                ));
            }
            let order = found(
                tx.order(item.order_id).await.during(op)?,
                EntityKind::Order,
                item.order_id,
            )?;
            if order.state != OrderState::Open {
                return Err(OrderError::OrderNotOpenForItems(order.state));
            }
            tx.delete_item(item.id).await.during(op)?;
            Ok(item)
        }
        .await;

        let item = Self::finish(op, tx, outcome).await?;
        info!(order_id = %item.order_id, item_id = %item.id, "Order item removed");
        Ok(item)
    }

    pub async fn delete_order(&mut self, order_id: OrderId) -> Result<Order, OrderError> {
        let op = "delete_order";
        let mut tx = self.begin(op).await?;
        let outcome: Result<Order, OrderError> = async {
            let order = found(tx.order(order_id).await.during(op)?, EntityKind::Order, order_id)?;
            for item in tx.items_for_order(order_id).await.during(op)? {
                tx.delete_item(item.id).await.during(op)?;
            }
            tx.delete_order(order_id).await.during(op)?;
            Ok(order)
        }
        .await;

        let order = Self::finish(op, tx, outcome).await?;
        info!(order_id = %order.id, "Order deleted");
        Ok(order)
    }

    pub async fn register_user(&mut self, name: String) -> Result<User, OrderError> {
        let op = "register_user";
        let mut tx = self.begin(op).await?;
        let outcome: Result<User, OrderError> = async {
            if tx.user_by_name(&name).await.during(op)?.is_some() {
                return Err(OrderError::UserAlreadyRegistered(name));
            }
            let user = User::new(name);
            tx.insert_user(user.clone()).await.during(op)?;
            Ok(user)
        }
        .await;

        let user = Self::finish(op, tx, outcome).await?;
        info!(user_id = %user.id, name = %user.name, "User registered");
        Ok(user)
    }

    pub async fn create_menu(&mut self, new: NewMenu) -> Result<MenuSnapshot, OrderError> {
        let op = "create_menu";
        let mut tx = self.begin(op).await?;
        let outcome: Result<MenuSnapshot, OrderError> = async {
            check_new_menu(&new)?;
            if tx.menu_by_name(&new.name).await.during(op)?.is_some() {
                return Err(OrderError::MenuAlreadyExists(new.name));
            }

            let menu = Menu {
                id: MenuId::new(),
                name: new.name,
                url: new.url,
            };
            tx.insert_menu(menu.clone()).await.during(op)?;
            let mut items = Vec::with_capacity(new.items.len());
            for entry in new.items {
                let item = MenuItem {
                    id: MenuItemId::new(),
                    menu_id: menu.id,
                    short_name: entry.short_name,
                    name: entry.name,
                    price: entry.price,
                };
                tx.insert_menu_item(item.clone()).await.during(op)?;
                items.push(item);
            }
            Ok(MenuSnapshot { menu, items })
        }
        .await;

        let snapshot = Self::finish(op, tx, outcome).await?;
        info!(menu_id = %snapshot.menu.id, name = %snapshot.menu.name, items = snapshot.items.len(), "Menu created");
        Ok(snapshot)
    }

    /// Replaces name, url and items of a menu. Items are matched by short
    /// name: a matching item keeps its id, the rest are added or removed.
    pub async fn update_menu(
        &mut self,
        menu_id: MenuId,
        new: NewMenu,
    ) -> Result<MenuSnapshot, OrderError> {
        let op = "update_menu";
        let mut tx = self.begin(op).await?;
        let outcome: Result<MenuSnapshot, OrderError> = async {
            let mut menu = found(tx.menu(menu_id).await.during(op)?, EntityKind::Menu, menu_id)?;
            check_new_menu(&new)?;
            if let Some(other) = tx.menu_by_name(&new.name).await.during(op)? {
                if other.id != menu_id {
                    return Err(OrderError::MenuAlreadyExists(new.name));
                }
            }
            if tx.active_order_for_menu(menu_id).await.during(op)?.is_some() {
                return Err(OrderError::MenuInUse(menu.name));
            }

            let mut existing: HashMap<String, MenuItem> = tx
                .menu_items(menu_id)
                .await
                .during(op)?
                .into_iter()
                .map(|item| (item.short_name.clone(), item))
                .collect();
            let mut items = Vec::with_capacity(new.items.len());
            for entry in new.items {
                match existing.remove(&entry.short_name) {
                    Some(mut item) => {
                        item.name = entry.name;
                        item.price = entry.price;
                        tx.update_menu_item(item.clone()).await.during(op)?;
                        items.push(item);
                    }
                    None => {
                        let item = MenuItem {
                            id: MenuItemId::new(),
                            menu_id,
                            short_name: entry.short_name,
                            name: entry.name,
                            price: entry.price,
                        };
                        tx.insert_menu_item(item.clone()).await.during(op)?;
                        items.push(item);
                    }
                }
            }
            for stale in existing.into_values() {
                tx.delete_menu_item(stale.id).await.during(op)?;
            }

            menu.name = new.name;
            menu.url = new.url;
            tx.update_menu(menu.clone()).await.during(op)?;
            Ok(MenuSnapshot { menu, items })
        }
        .await;

        let snapshot = Self::finish(op, tx, outcome).await?;
        info!(%menu_id, name = %snapshot.menu.name, items = snapshot.items.len(), "Menu updated");
        Ok(snapshot)
    }

    /// Removes a menu and its items. Refused while the menu has an active order.
    pub async fn delete_menu(&mut self, menu_id: MenuId) -> Result<MenuSnapshot, OrderError> {
        let op = "delete_menu";
        let mut tx = self.begin(op).await?;
        let outcome: Result<MenuSnapshot, OrderError> = async {
            let menu = found(tx.menu(menu_id).await.during(op)?, EntityKind::Menu, menu_id)?;
            if tx.active_order_for_menu(menu_id).await.during(op)?.is_some() {
                return Err(OrderError::MenuInUse(menu.name));
            }
            let items = tx.menu_items(menu_id).await.during(op)?;
            tx.delete_menu(menu_id).await.during(op)?;
            Ok(MenuSnapshot { menu, items })
        }
        .await;

        let snapshot = Self::finish(op, tx, outcome).await?;
        info!(%menu_id, name = %snapshot.menu.name, "Menu deleted");
        Ok(snapshot)
    }
}

/// Name must be non-empty and short names unique within the menu.
fn check_new_menu(new: &NewMenu) -> Result<(), OrderError> {
    if new.name.trim().is_empty() {
        return Err(OrderError::InvalidMenu("menu name must not be empty".into()));
    }
    let mut short_names = HashSet::new();
    if let Some(dup) = new
        .items
        .iter()
        .find(|item| !short_names.insert(item.short_name.as_str()))
    {
        return Err(OrderError::InvalidMenu(format!(
            "duplicate short name '{}'",
            dup.short_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewMenuItem, Price};
    use crate::registry::RegistryReader;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use std::sync::Arc;

    struct Fixture {
        store: MemoryStore,
        registry: OrderRegistry,
        reader: RegistryReader,
        alice: User,
        bob: User,
        menu: MenuSnapshot,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let mut registry = OrderRegistry::new(Arc::new(store.clone()));
        let reader = registry.reader();
        let alice = registry.register_user("alice".into()).await.unwrap();
        let bob = registry.register_user("bob".into()).await.unwrap();
        let menu = registry
            .create_menu(NewMenu {
                name: "pizza".into(),
                url: None,
                items: vec![
                    NewMenuItem {
                        short_name: "1".into(),
                        name: "Margherita".into(),
                        price: Price(850),
                    },
                    NewMenuItem {
                        short_name: "2".into(),
                        name: "Funghi".into(),
                        price: Price(950),
                    },
                ],
            })
            .await
            .unwrap();
        Fixture {
            store,
            registry,
            reader,
            alice,
            bob,
            menu,
        }
    }

    #[tokio::test]
    async fn second_active_order_for_menu_is_rejected() {
        let mut f = fixture().await;
        let order = f.registry.create_order(f.alice.id, f.menu.menu.id).await.unwrap();
        assert_eq!(order.state, OrderState::Open);

        assert_eq!(
            f.registry.create_order(f.bob.id, f.menu.menu.id).await,
            Err(OrderError::ActiveOrderAlreadyExists("pizza".into()))
        );

        for target in [OrderState::Finalized, OrderState::Ordered, OrderState::Delivered] {
            f.registry
                .transition_order(f.alice.id, order.id, target, OrderPatch::default())
                .await
                .unwrap();
        }
        assert!(f.registry.create_order(f.bob.id, f.menu.menu.id).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_menu_and_user_are_not_found() {
        let mut f = fixture().await;
        assert!(matches!(
            f.registry.create_order(f.alice.id, MenuId::new()).await,
            Err(OrderError::NotFound { kind: EntityKind::Menu, .. })
        ));
        assert!(matches!(
            f.registry.create_order(UserId::new(), f.menu.menu.id).await,
            Err(OrderError::NotFound { kind: EntityKind::User, .. })
        ));
    }

    #[tokio::test]
    async fn items_snapshot_price_and_need_open_order() {
        let mut f = fixture().await;
        let order = f.registry.create_order(f.alice.id, f.menu.menu.id).await.unwrap();
        let margherita = &f.menu.items[0];

        let item = f
            .registry
            .add_order_item(order.id, f.bob.id, margherita.id)
            .await
            .unwrap();
        assert_eq!(item.price, Price(850));
        assert!(!item.paid);

        f.registry
            .transition_order(f.alice.id, order.id, OrderState::Finalized, OrderPatch::default())
            .await
            .unwrap();
        assert_eq!(
            f.registry.add_order_item(order.id, f.bob.id, margherita.id).await,
            Err(OrderError::OrderNotOpenForItems(OrderState::Finalized))
        );
        assert_eq!(f.reader.order_snapshot(order.id).await.unwrap().items, vec![item]);
    }

    #[tokio::test]
    async fn menu_item_from_another_menu_is_not_found() {
        let mut f = fixture().await;
        let other = f
            .registry
            .create_menu(NewMenu {
                name: "sushi".into(),
                url: None,
                items: vec![NewMenuItem {
                    short_name: "1".into(),
                    name: "Maki".into(),
                    price: Price(400),
                }],
            })
            .await
            .unwrap();
        let order = f.registry.create_order(f.alice.id, f.menu.menu.id).await.unwrap();
        assert!(matches!(
            f.registry.add_order_item(order.id, f.alice.id, other.items[0].id).await,
            Err(OrderError::NotFound { kind: EntityKind::MenuItem, .. })
        ));
    }

    #[tokio::test]
    async fn transition_applies_patch_and_sugar_person() {
        let mut f = fixture().await;
        let order = f.registry.create_order(f.alice.id, f.menu.menu.id).await.unwrap();
        let eta = Utc::now();

        f.registry
            .transition_order(f.alice.id, order.id, OrderState::Finalized, OrderPatch::default())
            .await
            .unwrap();
        let (ordered, transition) = f
            .registry
            .transition_order(
                f.bob.id,
                order.id,
                OrderState::Ordered,
                OrderPatch {
                    eta: Some(eta),
                    sugar_person: Some(f.bob.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(transition.enters(OrderState::Ordered));
        assert_eq!(ordered.eta, Some(eta));
        assert_eq!(ordered.sugar_person, Some(f.bob.id));

        // Same-state request with the same sugar person is a no-op success.
        let (_, stay) = f
            .registry
            .transition_order(
                f.alice.id,
                order.id,
                OrderState::Ordered,
                OrderPatch {
                    sugar_person: Some(f.bob.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(stay, Transition::Stay);

        assert_eq!(
            f.registry.set_sugar_person(f.alice.id, order.id).await,
            Err(OrderError::SugarPersonImmutable)
        );
    }

    #[tokio::test]
    async fn toggle_paid_flips_the_whole_group() {
        let mut f = fixture().await;
        let order = f.registry.create_order(f.alice.id, f.menu.menu.id).await.unwrap();
        for menu_item in &f.menu.items {
            f.registry
                .add_order_item(order.id, f.bob.id, menu_item.id)
                .await
                .unwrap();
        }

        assert_eq!(
            f.registry.toggle_paid_for_user(f.alice.id, order.id, f.bob.id).await,
            Err(OrderError::SugarPersonNotSet)
        );
        f.registry.set_sugar_person(f.alice.id, order.id).await.unwrap();
        assert_eq!(
            f.registry.toggle_paid_for_user(f.bob.id, order.id, f.bob.id).await,
            Err(OrderError::PaidChangeForbidden)
        );
        assert_eq!(
            f.registry.toggle_paid_for_user(f.alice.id, order.id, f.alice.id).await,
            Err(OrderError::NoItemsForUser("alice".into()))
        );

        let toggle = f
            .registry
            .toggle_paid_for_user(f.alice.id, order.id, f.bob.id)
            .await
            .unwrap();
        assert!(toggle.paid);
        assert_eq!(toggle.items.len(), 2);

        let untoggle = f
            .registry
            .toggle_paid_for_user(f.alice.id, order.id, f.bob.id)
            .await
            .unwrap();
        assert!(!untoggle.paid);
    }

    #[tokio::test]
    async fn toggle_paid_rolls_back_on_partial_write_failure() {
        let mut f = fixture().await;
        let order = f.registry.create_order(f.alice.id, f.menu.menu.id).await.unwrap();
        for menu_item in &f.menu.items {
            f.registry
                .add_order_item(order.id, f.bob.id, menu_item.id)
                .await
                .unwrap();
        }
        f.registry.set_sugar_person(f.alice.id, order.id).await.unwrap();

        f.store.fail_item_writes_after(1);
        assert_eq!(
            f.registry.toggle_paid_for_user(f.alice.id, order.id, f.bob.id).await,
            Err(OrderError::Conflict)
        );
        f.store.clear_faults();

        let items = f.reader.items_for_user(order.id, f.bob.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| !item.paid));
    }

    #[tokio::test]
    async fn item_updates_only_touch_paid() {
        let mut f = fixture().await;
        let order = f.registry.create_order(f.alice.id, f.menu.menu.id).await.unwrap();
        let item = f
            .registry
            .add_order_item(order.id, f.bob.id, f.menu.items[0].id)
            .await
            .unwrap();

        let mut moved = OrderItemUpdate::from(&item);
        moved.menu_item_id = f.menu.items[1].id;
        assert_eq!(
            f.registry.update_order_item(f.alice.id, item.id, moved).await,
            Err(OrderError::ImmutableFieldChanged("menu_item_id"))
        );

        let mut paid = OrderItemUpdate::from(&item);
        paid.paid = true;
        assert_eq!(
            f.registry.update_order_item(f.alice.id, item.id, paid.clone()).await,
            Err(OrderError::SugarPersonNotSet)
        );
        f.registry.set_sugar_person(f.alice.id, order.id).await.unwrap();
        let updated = f.registry.update_order_item(f.alice.id, item.id, paid).await.unwrap();
        assert!(updated.paid);
        assert_eq!(updated.price, item.price);
    }

    #[tokio::test]
    async fn only_owner_removes_item_while_open() {
        let mut f = fixture().await;
        let order = f.registry.create_order(f.alice.id, f.menu.menu.id).await.unwrap();
        let item = f
            .registry
            .add_order_item(order.id, f.bob.id, f.menu.items[0].id)
            .await
            .unwrap();

        assert!(matches!(
            f.registry.remove_order_item(f.alice.id, item.id).await,
            Err(OrderError::PermissionDenied(_))
        ));
        assert_eq!(f.registry.remove_order_item(f.bob.id, item.id).await, Ok(item));
        assert!(f.reader.order_snapshot(order.id).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn delete_order_removes_items_and_frees_menu() {
        let mut f = fixture().await;
        let order = f.registry.create_order(f.alice.id, f.menu.menu.id).await.unwrap();
        f.registry
            .add_order_item(order.id, f.bob.id, f.menu.items[0].id)
            .await
            .unwrap();

        f.registry.delete_order(order.id).await.unwrap();
        assert!(matches!(
            f.reader.order(order.id).await,
            Err(OrderError::NotFound { kind: EntityKind::Order, .. })
        ));
        assert!(f.registry.create_order(f.bob.id, f.menu.menu.id).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let mut f = fixture().await;
        assert_eq!(
            f.registry.register_user("alice".into()).await,
            Err(OrderError::UserAlreadyRegistered("alice".into()))
        );
        assert_eq!(
            f.registry
                .create_menu(NewMenu {
                    name: "pizza".into(),
                    url: None,
                    items: vec![],
                })
                .await,
            Err(OrderError::MenuAlreadyExists("pizza".into()))
        );
        let dup = NewMenuItem {
            short_name: "x".into(),
            name: "X".into(),
            price: Price(1),
        };
        assert!(matches!(
            f.registry
                .create_menu(NewMenu {
                    name: "burger".into(),
                    url: None,
                    items: vec![dup.clone(), dup],
                })
                .await,
            Err(OrderError::InvalidMenu(_))
        ));
        assert!(f.reader.menu_by_name("burger").await.is_err());
    }

    #[tokio::test]
    async fn update_menu_keeps_matching_items_and_drops_the_rest() {
        let mut f = fixture().await;
        let marg = f.menu.items[0].clone();
        let updated = f
            .registry
            .update_menu(
                f.menu.menu.id,
                NewMenu {
                    name: "pizzeria".into(),
                    url: Some("https://example.com".into()),
                    items: vec![
                        NewMenuItem {
                            short_name: "1".into(),
                            name: "Margherita".into(),
                            price: Price(900),
                        },
                        NewMenuItem {
                            short_name: "3".into(),
                            name: "Diavola".into(),
                            price: Price(1050),
                        },
                    ],
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.menu.name, "pizzeria");
        assert_eq!(updated.items.len(), 2);
        assert_eq!(updated.items[0].id, marg.id);
        assert_eq!(updated.items[0].price, Price(900));

        let stored = f.reader.menu(f.menu.menu.id).await.unwrap();
        assert_eq!(stored.items.len(), 2);
        assert!(stored.items.iter().all(|item| item.short_name != "2"));
        assert!(f.reader.menu_by_name("pizza").await.is_err());
    }

    #[tokio::test]
    async fn menus_with_an_active_order_cannot_change() {
        let mut f = fixture().await;
        let order = f.registry.create_order(f.alice.id, f.menu.menu.id).await.unwrap();
        let rename = NewMenu {
            name: "pizzeria".into(),
            url: None,
            items: vec![],
        };
        assert_eq!(
            f.registry.update_menu(f.menu.menu.id, rename).await,
            Err(OrderError::MenuInUse("pizza".into()))
        );
        assert_eq!(
            f.registry.delete_menu(f.menu.menu.id).await,
            Err(OrderError::MenuInUse("pizza".into()))
        );

        for target in [OrderState::Finalized, OrderState::Ordered, OrderState::Delivered] {
            f.registry
                .transition_order(f.alice.id, order.id, target, OrderPatch::default())
                .await
                .unwrap();
        }
        let deleted = f.registry.delete_menu(f.menu.menu.id).await.unwrap();
        assert_eq!(deleted.items.len(), 2);
        assert!(f.reader.menus().await.unwrap().is_empty());
        assert!(matches!(
            f.registry.delete_menu(f.menu.menu.id).await,
            Err(OrderError::NotFound { kind: EntityKind::Menu, .. })
        ));
    }

    #[tokio::test]
    async fn update_menu_refuses_a_taken_name() {
        let mut f = fixture().await;
        let sushi = f
            .registry
            .create_menu(NewMenu {
                name: "sushi".into(),
                url: None,
                items: vec![],
            })
            .await
            .unwrap();
        let taken = NewMenu {
            name: "pizza".into(),
            url: None,
            items: vec![],
        };
        assert_eq!(
            f.registry.update_menu(sushi.menu.id, taken).await,
            Err(OrderError::MenuAlreadyExists("pizza".into()))
        );
    }
}
