//! Mutating operations accepted by the registry coordinator.
//!
//! Every variant of [`OrderAction`] has exactly one matching
//! [`OrderActionResult`] variant of the same name. Both enums serialize with a
//! snake_case tag so the queue transport can carry them as JSON.

use crate::model::{
    MenuId, MenuItemId, MenuSnapshot, NewMenu, Order, OrderId, OrderItem, OrderItemId,
    OrderItemUpdate, OrderPatch, OrderState, PaidToggle, User, UserId,
};
use ordaa_actor::Action;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OrderAction {
    /// Opens a new order for a menu that has no active order.
    CreateOrder { initiator: UserId, menu_id: MenuId },
    /// Adds one dish for `user` to an open order.
    AddOrderItem {
        order_id: OrderId,
        user: UserId,
        menu_item_id: MenuItemId,
    },
    /// Moves an order along the lifecycle, optionally patching its fields.
    TransitionOrder {
        caller: UserId,
        order_id: OrderId,
        target: OrderState,
        #[serde(default)]
        patch: OrderPatch,
    },
    /// Makes the caller the sugar person.
    SetSugarPerson { caller: UserId, order_id: OrderId },
    /// Flips the paid flag of all of `target_user`'s items as one group.
    TogglePaidForUser {
        caller: UserId,
        order_id: OrderId,
        target_user: UserId,
    },
    UpdateOrderItem {
        caller: UserId,
        item_id: OrderItemId,
        update: OrderItemUpdate,
    },
    RemoveOrderItem { caller: UserId, item_id: OrderItemId },
    /// Administrative removal of an order and its items.
    DeleteOrder { order_id: OrderId },
    RegisterUser { name: String },
    CreateMenu { menu: NewMenu },
    /// Replaces a menu's name, url and items; refused while it has an active order.
    UpdateMenu { menu_id: MenuId, menu: NewMenu },
    DeleteMenu { menu_id: MenuId },
}

impl Action for OrderAction {
    fn kind(&self) -> &'static str {
        match self {
            OrderAction::CreateOrder { .. } => "create_order",
            OrderAction::AddOrderItem { .. } => "add_order_item",
            OrderAction::TransitionOrder { .. } => "transition_order",
            OrderAction::SetSugarPerson { .. } => "set_sugar_person",
            OrderAction::TogglePaidForUser { .. } => "toggle_paid_for_user",
            OrderAction::UpdateOrderItem { .. } => "update_order_item",
            OrderAction::RemoveOrderItem { .. } => "remove_order_item",
            OrderAction::DeleteOrder { .. } => "delete_order",
            OrderAction::RegisterUser { .. } => "register_user",
            OrderAction::CreateMenu { .. } => "create_menu",
            OrderAction::UpdateMenu { .. } => "update_menu",
            OrderAction::DeleteMenu { .. } => "delete_menu",
        }
    }
}

/// Results from OrderActions - variants match 1:1 with OrderAction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OrderActionResult {
    CreateOrder(Order),
    AddOrderItem(OrderItem),
    TransitionOrder(Order),
    SetSugarPerson(Order),
    TogglePaidForUser(PaidToggle),
    UpdateOrderItem(OrderItem),
    RemoveOrderItem(OrderItem),
    /// The order as it was just before deletion.
    DeleteOrder(Order),
    RegisterUser(User),
    CreateMenu(MenuSnapshot),
    UpdateMenu(MenuSnapshot),
    /// The menu and its items as they were just before deletion.
    DeleteMenu(MenuSnapshot),
}
