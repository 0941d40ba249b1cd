//! [`ActionHandler`] implementation for [`OrderRegistry`].
//!
//! The coordinator calls [`handle`](ActionHandler::handle) for one
//! [`OrderAction`] at a time. After a committed move into `Ordered`, the
//! handler publishes the order snapshot through the [`OrderContext`]; a failed
//! publish is logged and never undoes the commit.

use crate::error::OrderError;
use crate::model::{OrderId, OrderSnapshot, OrderState};
use crate::registry::{OrderAction, OrderActionResult, OrderRegistry};
use async_trait::async_trait;
use ordaa_actor::ActionHandler;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, thiserror::Error)]
#[error("Publish failed: {0}")]
pub struct PublishError(pub String);

/// Outbound sink for order snapshots, e.g. a message queue producer.
#[async_trait]
pub trait SnapshotPublisher: Send + Sync {
    async fn publish(&self, snapshot: &OrderSnapshot) -> Result<(), PublishError>;
}

/// Collaborators injected into the registry worker at `run()` time.
#[derive(Clone, Default)]
pub struct OrderContext {
    pub publisher: Option<Arc<dyn SnapshotPublisher>>,
}

impl OrderContext {
    pub fn with_publisher(publisher: Arc<dyn SnapshotPublisher>) -> Self {
        Self {
            publisher: Some(publisher),
        }
    }
}

impl OrderRegistry {
    async fn publish_ordered(&self, ctx: &OrderContext, order_id: OrderId) {
        let Some(publisher) = &ctx.publisher else {
            return;
        };
        let snapshot = match self.reader.order_snapshot(order_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(%order_id, error = %e, "Could not load snapshot to publish");
                return;
            }
        };
        match publisher.publish(&snapshot).await {
            Ok(()) => info!(%order_id, items = snapshot.items.len(), "Order snapshot published"),
            Err(e) => warn!(%order_id, error = %e, "Order snapshot not published"),
        }
    }
}

#[async_trait]
impl ActionHandler for OrderRegistry {
    type Action = OrderAction;
    type Output = OrderActionResult;
    type Context = OrderContext;
    type Error = OrderError;

    async fn handle(
        &mut self,
        action: OrderAction,
        ctx: &OrderContext,
    ) -> Result<OrderActionResult, OrderError> {
        match action {
            OrderAction::CreateOrder { initiator, menu_id } => self
                .create_order(initiator, menu_id)
                .await
                .map(OrderActionResult::CreateOrder),
            OrderAction::AddOrderItem {
                order_id,
                user,
                menu_item_id,
            } => self
                .add_order_item(order_id, user, menu_item_id)
                .await
                .map(OrderActionResult::AddOrderItem),
            OrderAction::TransitionOrder {
                caller,
                order_id,
                target,
                patch,
            } => {
                let (order, transition) = self
                    .transition_order(caller, order_id, target, patch)
                    .await?;
                if transition.enters(OrderState::Ordered) {
                    self.publish_ordered(ctx, order.id).await;
                }
                Ok(OrderActionResult::TransitionOrder(order))
            }
            OrderAction::SetSugarPerson { caller, order_id } => self
                .set_sugar_person(caller, order_id)
                .await
                .map(OrderActionResult::SetSugarPerson),
            OrderAction::TogglePaidForUser {
                caller,
                order_id,
                target_user,
            } => self
                .toggle_paid_for_user(caller, order_id, target_user)
                .await
                .map(OrderActionResult::TogglePaidForUser),
            OrderAction::UpdateOrderItem {
                caller,
                item_id,
                update,
            } => self
                .update_order_item(caller, item_id, update)
                .await
                .map(OrderActionResult::UpdateOrderItem),
            OrderAction::RemoveOrderItem { caller, item_id } => self
                .remove_order_item(caller, item_id)
                .await
                .map(OrderActionResult::RemoveOrderItem),
            OrderAction::DeleteOrder { order_id } => self
                .delete_order(order_id)
                .await
                .map(OrderActionResult::DeleteOrder),
            OrderAction::RegisterUser { name } => self
                .register_user(name)
                .await
                .map(OrderActionResult::RegisterUser),
            OrderAction::CreateMenu { menu } => self
                .create_menu(menu)
                .await
                .map(OrderActionResult::CreateMenu),
            OrderAction::UpdateMenu { menu_id, menu } => self
                .update_menu(menu_id, menu)
                .await
                .map(OrderActionResult::UpdateMenu),
            OrderAction::DeleteMenu { menu_id } => self
                .delete_menu(menu_id)
                .await
                .map(OrderActionResult::DeleteMenu),
        }
    }

    async fn on_start(&mut self, ctx: &OrderContext) {
        info!(publisher = ctx.publisher.is_some(), "Order registry ready");
    }
}
