//! # Order Client
//!
//! Provides a high-level API for the order registry. Mutations are submitted
//! as [`OrderAction`]s through the coordinator and the matching
//! [`OrderActionResult`] variant is unwrapped; queries go straight to the
//! [`RegistryReader`].
use crate::error::OrderError;
use crate::model::{
    Menu, MenuId, MenuItem, MenuItemId, MenuSnapshot, NewMenu, Order, OrderId, OrderItem, OrderItemId,
    OrderItemUpdate, OrderPatch, OrderSnapshot, OrderState, PaidToggle, User, UserId,
};
use crate::registry::{OrderAction, OrderActionResult, OrderRegistry, RegistryReader};
use ordaa_actor::{ActorClient, CoordinatorClient, CorrelationId};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Client for interacting with the order registry.
///
/// Cheap to clone; every front end holds its own copy.
#[derive(Clone)]
pub struct OrderClient {
    inner: CoordinatorClient<OrderRegistry>,
    reader: RegistryReader,
    deadline: Option<Duration>,
}

impl ActorClient<OrderRegistry> for OrderClient {
    fn inner(&self) -> &CoordinatorClient<OrderRegistry> {
        &self.inner
    }

    fn deadline(&self) -> Option<Duration> {
        self.deadline
    }
}

impl OrderClient {
    /// `deadline` bounds every mutation; `None` waits as long as it takes.
    pub fn new(
        inner: CoordinatorClient<OrderRegistry>,
        reader: RegistryReader,
        deadline: Option<Duration>,
    ) -> Self {
        Self {
            inner,
            reader,
            deadline,
        }
    }

    pub fn reader(&self) -> &RegistryReader {
        &self.reader
    }

    #[instrument(skip(self))]
    pub async fn create_order(&self, initiator: UserId, menu_id: MenuId) -> Result<Order, OrderError> {
        match self.submit(OrderAction::CreateOrder { initiator, menu_id }).await? {
            OrderActionResult::CreateOrder(order) => Ok(order),
            _ => unreachable!("CreateOrder action must return CreateOrder result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn add_order_item(
        &self,
        order_id: OrderId,
        user: UserId,
        menu_item_id: MenuItemId,
    ) -> Result<OrderItem, OrderError> {
        let action = OrderAction::AddOrderItem {
            order_id,
            user,
            menu_item_id,
        };
        match self.submit(action).await? {
            OrderActionResult::AddOrderItem(item) => Ok(item),
            _ => unreachable!("AddOrderItem action must return AddOrderItem result"),
        }
    }

    /// Moves the order to `target`, applying `patch` along the way.
    #[instrument(skip(self, patch))]
    pub async fn transition_order(
        &self,
        caller: UserId,
        order_id: OrderId,
        target: OrderState,
        patch: OrderPatch,
    ) -> Result<Order, OrderError> {
        debug!(?patch, "transition_order called");
        let action = OrderAction::TransitionOrder {
            caller,
            order_id,
            target,
            patch,
        };
        match self.submit(action).await? {
            OrderActionResult::TransitionOrder(order) => Ok(order),
            _ => unreachable!("TransitionOrder action must return TransitionOrder result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn set_sugar_person(&self, caller: UserId, order_id: OrderId) -> Result<Order, OrderError> {
        match self.submit(OrderAction::SetSugarPerson { caller, order_id }).await? {
            OrderActionResult::SetSugarPerson(order) => Ok(order),
            _ => unreachable!("SetSugarPerson action must return SetSugarPerson result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn toggle_paid_for_user(
        &self,
        caller: UserId,
        order_id: OrderId,
        target_user: UserId,
    ) -> Result<PaidToggle, OrderError> {
        let action = OrderAction::TogglePaidForUser {
            caller,
            order_id,
            target_user,
        };
        match self.submit(action).await? {
            OrderActionResult::TogglePaidForUser(toggle) => Ok(toggle),
            _ => unreachable!("TogglePaidForUser action must return TogglePaidForUser result"),
        }
    }

    #[instrument(skip(self, update))]
    pub async fn update_order_item(
        &self,
        caller: UserId,
        item_id: OrderItemId,
        update: OrderItemUpdate,
    ) -> Result<OrderItem, OrderError> {
        let action = OrderAction::UpdateOrderItem {
            caller,
            item_id,
            update,
        };
        match self.submit(action).await? {
            OrderActionResult::UpdateOrderItem(item) => Ok(item),
            _ => unreachable!("UpdateOrderItem action must return UpdateOrderItem result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn remove_order_item(
        &self,
        caller: UserId,
        item_id: OrderItemId,
    ) -> Result<OrderItem, OrderError> {
        match self.submit(OrderAction::RemoveOrderItem { caller, item_id }).await? {
            OrderActionResult::RemoveOrderItem(item) => Ok(item),
            _ => unreachable!("RemoveOrderItem action must return RemoveOrderItem result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        match self.submit(OrderAction::DeleteOrder { order_id }).await? {
            OrderActionResult::DeleteOrder(order) => Ok(order),
            _ => unreachable!("DeleteOrder action must return DeleteOrder result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn register_user(&self, name: &str) -> Result<User, OrderError> {
        let action = OrderAction::RegisterUser {
            name: name.to_string(),
        };
        match self.submit(action).await? {
            OrderActionResult::RegisterUser(user) => Ok(user),
            _ => unreachable!("RegisterUser action must return RegisterUser result"),
        }
    }

    #[instrument(skip(self, menu), fields(name = %menu.name))]
    pub async fn create_menu(&self, menu: NewMenu) -> Result<MenuSnapshot, OrderError> {
        match self.submit(OrderAction::CreateMenu { menu }).await? {
            OrderActionResult::CreateMenu(snapshot) => Ok(snapshot),
            _ => unreachable!("CreateMenu action must return CreateMenu result"),
        }
    }

    #[instrument(skip(self, menu), fields(name = %menu.name))]
    pub async fn update_menu(&self, menu_id: MenuId, menu: NewMenu) -> Result<MenuSnapshot, OrderError> {
        match self.submit(OrderAction::UpdateMenu { menu_id, menu }).await? {
            OrderActionResult::UpdateMenu(snapshot) => Ok(snapshot),
            _ => unreachable!("UpdateMenu action must return UpdateMenu result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_menu(&self, menu_id: MenuId) -> Result<MenuSnapshot, OrderError> {
        match self.submit(OrderAction::DeleteMenu { menu_id }).await? {
            OrderActionResult::DeleteMenu(snapshot) => Ok(snapshot),
            _ => unreachable!("DeleteMenu action must return DeleteMenu result"),
        }
    }

    /// Submits a raw action under a correlation id chosen by the producer.
    /// The client deadline still applies.
    #[instrument(skip(self, action), fields(kind = ordaa_actor::Action::kind(&action)))]
    pub async fn submit_as(
        &self,
        correlation_id: CorrelationId,
        action: OrderAction,
    ) -> Result<OrderActionResult, OrderError> {
        let pending = self.inner.submit_as(correlation_id, action);
        match self.deadline {
            None => pending.await,
            Some(deadline) => match tokio::time::timeout(deadline, pending).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(%correlation_id, ?deadline, "Gave up waiting for result");
                    Err(OrderError::CallerTimeout(deadline))
                }
            },
        }
    }

    // Reads bypass the coordinator.

    pub async fn order(&self, id: OrderId) -> Result<Order, OrderError> {
        self.reader.order(id).await
    }

    pub async fn order_snapshot(&self, id: OrderId) -> Result<OrderSnapshot, OrderError> {
        self.reader.order_snapshot(id).await
    }

    pub async fn orders(&self) -> Result<Vec<Order>, OrderError> {
        self.reader.orders().await
    }

    pub async fn active_order_for_menu_name(&self, menu_name: &str) -> Result<Order, OrderError> {
        self.reader.active_order_for_menu_name(menu_name).await
    }

    pub async fn menus(&self) -> Result<Vec<Menu>, OrderError> {
        self.reader.menus().await
    }

    pub async fn menu(&self, id: MenuId) -> Result<MenuSnapshot, OrderError> {
        self.reader.menu(id).await
    }

    pub async fn menu_by_name(&self, name: &str) -> Result<MenuSnapshot, OrderError> {
        self.reader.menu_by_name(name).await
    }

    pub async fn menu_item_by_short_name(
        &self,
        menu_id: MenuId,
        short_name: &str,
    ) -> Result<MenuItem, OrderError> {
        self.reader.menu_item_by_short_name(menu_id, short_name).await
    }

    pub async fn user(&self, id: UserId) -> Result<User, OrderError> {
        self.reader.user(id).await
    }

    pub async fn user_by_name(&self, name: &str) -> Result<User, OrderError> {
        self.reader.user_by_name(name).await
    }

    pub async fn order_item(&self, id: OrderItemId) -> Result<OrderItem, OrderError> {
        self.reader.order_item(id).await
    }

    pub async fn items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>, OrderError> {
        self.reader.items_for_order(order_id).await
    }

    pub async fn items_for_user(
        &self,
        order_id: OrderId,
        user: UserId,
    ) -> Result<Vec<OrderItem>, OrderError> {
        self.reader.items_for_user(order_id, user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use ordaa_actor::mock::{create_mock_client, expect_action, MockCoordinator};
    use std::sync::Arc;

    fn reader() -> RegistryReader {
        RegistryReader::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_order_unwraps_result() {
        let (client, mut receiver) = create_mock_client::<OrderRegistry>(10);
        let order_client = OrderClient::new(client, reader(), None);
        let (initiator, menu_id) = (UserId::new(), MenuId::new());

        let task = tokio::spawn(async move { order_client.create_order(initiator, menu_id).await });

        let (action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected CreateOrder request");
        assert_eq!(action, OrderAction::CreateOrder { initiator, menu_id });

        let order = Order::open(initiator, menu_id);
        assert!(responder.send(Ok(OrderActionResult::CreateOrder(order.clone()))));

        assert_eq!(task.await.unwrap().unwrap(), order);
    }

    #[tokio::test]
    async fn test_business_error_passes_through_typed() {
        let mock = MockCoordinator::<OrderRegistry>::new();
        mock.expect("transition_order")
            .return_err(OrderError::InvalidTransition {
                from: OrderState::Open,
                to: OrderState::Ordered,
            });

        let order_client = OrderClient::new(mock.client(), reader(), None);
        let result = order_client
            .transition_order(UserId::new(), OrderId::new(), OrderState::Ordered, OrderPatch::default())
            .await;

        assert_eq!(
            result,
            Err(OrderError::InvalidTransition {
                from: OrderState::Open,
                to: OrderState::Ordered
            })
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_toggle_paid_with_expectations() {
        let mock = MockCoordinator::<OrderRegistry>::new();
        let user = UserId::new();
        mock.expect("toggle_paid_for_user")
            .return_ok(OrderActionResult::TogglePaidForUser(PaidToggle {
                user,
                paid: true,
                items: vec![],
            }));

        let order_client = OrderClient::new(mock.client(), reader(), None);
        let toggle = order_client
            .toggle_paid_for_user(UserId::new(), OrderId::new(), user)
            .await
            .unwrap();
        assert!(toggle.paid);
        assert_eq!(toggle.user, user);
        mock.verify();
    }

    #[tokio::test]
    async fn test_deadline_expiry_abandons_request() {
        let (client, mut receiver) = create_mock_client::<OrderRegistry>(10);
        let order_client = OrderClient::new(client.clone(), reader(), Some(Duration::from_millis(20)));

        let task = tokio::spawn(async move { order_client.delete_order(OrderId::new()).await });

        // Take the action but never answer it.
        let (_action, responder) = expect_action(&mut receiver).await.unwrap();
        let result = task.await.unwrap();
        assert_eq!(result, Err(OrderError::CallerTimeout(Duration::from_millis(20))));

        assert_eq!(client.broker().pending(), 0);
        assert!(!responder.send(Err(OrderError::Conflict)));
    }

    #[tokio::test]
    async fn test_submit_as_echoes_correlation_id() {
        let (client, mut receiver) = create_mock_client::<OrderRegistry>(10);
        let order_client = OrderClient::new(client, reader(), None);
        let id = CorrelationId::new();

        let task = tokio::spawn(async move {
            order_client
                .submit_as(id, OrderAction::RegisterUser { name: "zoe".into() })
                .await
        });

        let (_action, responder) = expect_action(&mut receiver).await.unwrap();
        assert_eq!(responder.correlation_id(), id);
        let user = User::new("zoe");
        responder.send(Ok(OrderActionResult::RegisterUser(user.clone())));

        assert_eq!(task.await.unwrap().unwrap(), OrderActionResult::RegisterUser(user));
    }

    #[tokio::test]
    async fn test_delete_menu_passes_menu_in_use_through() {
        let mock = MockCoordinator::<OrderRegistry>::new();
        mock.expect("delete_menu")
            .return_err(OrderError::MenuInUse("pizza".into()));

        let order_client = OrderClient::new(mock.client(), reader(), None);
        let result = order_client.delete_menu(MenuId::new()).await;
        assert_eq!(result, Err(OrderError::MenuInUse("pizza".into())));
        mock.verify();
    }
}
