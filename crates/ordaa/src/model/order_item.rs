use crate::model::{MenuItemId, OrderId, OrderItemId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A price in integer cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub i64);

impl Price {
    pub fn cents(self) -> i64 {
        self.0
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Self {
        Price(iter.map(|p| p.0).sum())
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// One dish a participant added to an order.
///
/// `order_id`, `menu_item_id` and `user` never change after creation. `price`
/// is copied from the menu item when the item is added and is not recomputed
/// if the menu changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub menu_item_id: MenuItemId,
    pub user: UserId,
    pub price: Price,
    pub paid: bool,
}

/// Full replacement of an item as submitted by a caller. Only `paid` may
/// differ from the stored item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemUpdate {
    pub order_id: OrderId,
    pub menu_item_id: MenuItemId,
    pub user: UserId,
    pub paid: bool,
}

impl From<&OrderItem> for OrderItemUpdate {
    fn from(item: &OrderItem) -> Self {
        Self {
            order_id: item.order_id,
            menu_item_id: item.menu_item_id,
            user: item.user,
            paid: item.paid,
        }
    }
}

/// Outcome of toggling the paid flag for all of one user's items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidToggle {
    pub user: UserId,
    /// The value every item now carries.
    pub paid: bool,
    pub items: Vec<OrderItem>,
}
