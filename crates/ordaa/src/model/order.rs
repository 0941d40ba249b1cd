//! The order record and its lifecycle states.

use crate::model::{MenuId, OrderId, OrderItem, Price, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Lifecycle state of an [`Order`]. See [`crate::model::state`] for the
/// legal edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Open,
    Finalized,
    Ordered,
    Delivered,
}

impl OrderState {
    pub const ALL: [OrderState; 4] = [
        OrderState::Open,
        OrderState::Finalized,
        OrderState::Ordered,
        OrderState::Delivered,
    ];

    /// `true` for every state except `Delivered`. At most one active order may
    /// exist per menu.
    pub fn is_active(self) -> bool {
        self != OrderState::Delivered
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::Open => "open",
            OrderState::Finalized => "finalized",
            OrderState::Ordered => "ordered",
            OrderState::Delivered => "delivered",
        }
    }
}

impl Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for OrderState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

/// A group order against one menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Who started the order. Only they may re-open a finalized order.
    pub initiator: UserId,
    /// Payment collector; write-once.
    pub sugar_person: Option<UserId>,
    pub state: OrderState,
    pub menu_id: MenuId,
    pub order_deadline: Option<DateTime<Utc>>,
    pub eta: Option<DateTime<Utc>>,
}

impl Order {
    /// A fresh `Open` order.
    pub fn open(initiator: UserId, menu_id: MenuId) -> Self {
        Self {
            id: OrderId::new(),
            initiator,
            sugar_person: None,
            state: OrderState::Open,
            menu_id,
            order_deadline: None,
            eta: None,
        }
    }
}

/// Optional field changes that ride along with a state transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderPatch {
    pub order_deadline: Option<DateTime<Utc>>,
    pub eta: Option<DateTime<Utc>>,
    pub sugar_person: Option<UserId>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        self == &OrderPatch::default()
    }
}

/// An order together with all of its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderSnapshot {
    pub fn total(&self) -> Price {
        self.items.iter().map(|item| item.price).sum()
    }
}
