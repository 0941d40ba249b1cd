//! Error types for the order registry.

use crate::model::OrderState;
use crate::store::StoreError;
use ordaa_actor::{CorrelationId, FrameworkError};
use std::fmt::{self, Display};
use std::time::Duration;
use thiserror::Error;

/// Which kind of record a lookup missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Order,
    /// The non-delivered order of a menu, looked up by menu name.
    ActiveOrder,
    OrderItem,
    Menu,
    MenuItem,
    User,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Order => "order",
            EntityKind::ActiveOrder => "active order for menu",
            EntityKind::OrderItem => "order item",
            EntityKind::Menu => "menu",
            EntityKind::MenuItem => "menu item",
            EntityKind::User => "user",
        })
    }
}

/// Errors that can occur during order operations.
///
/// Business rejections and coordinator plumbing failures share this one enum,
/// so every front end matches on a single type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("No {kind} '{key}'")]
    NotFound { kind: EntityKind, key: String },

    #[error("Cannot move an order from {from} to {to}")]
    InvalidTransition { from: OrderState, to: OrderState },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("The sugar person cannot be changed after it has been set")]
    SugarPersonImmutable,

    #[error("The sugar person has not been set yet")]
    SugarPersonNotSet,

    #[error("Only the sugar person may change the paid status")]
    PaidChangeForbidden,

    #[error("Order is {0}; items can only be added or removed while it is open")]
    OrderNotOpenForItems(OrderState),

    #[error("There is already an active order for menu '{0}'")]
    ActiveOrderAlreadyExists(String),

    #[error("Field '{0}' of an order item cannot be changed")]
    ImmutableFieldChanged(&'static str),

    #[error("Field '{field}' cannot be set while the order is {state}")]
    FieldNotSettable {
        field: &'static str,
        state: OrderState,
    },

    #[error("Order has already been delivered")]
    OrderDelivered,

    #[error("No order items for user '{0}'")]
    NoItemsForUser(String),

    #[error("Concurrent modification; nothing was changed")]
    Conflict,

    #[error("User '{0}' is already registered")]
    UserAlreadyRegistered(String),

    #[error("Menu '{0}' already exists")]
    MenuAlreadyExists(String),

    #[error("Menu '{0}' has an active order and cannot be changed")]
    MenuInUse(String),

    #[error("Invalid menu: {0}")]
    InvalidMenu(String),

    #[error("{op} failed: {source}")]
    Persistence {
        op: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("No result within {0:?}")]
    CallerTimeout(Duration),

    #[error("Correlation id already pending: {0}")]
    DuplicateCorrelation(CorrelationId),

    #[error("Order coordinator unavailable: {0}")]
    CoordinatorUnavailable(String),
}

impl OrderError {
    pub fn not_found(kind: EntityKind, key: impl Display) -> Self {
        OrderError::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// Wraps a store failure with the name of the operation it interrupted.
    /// A lost optimistic commit surfaces as [`OrderError::Conflict`].
    pub fn store(op: &'static str, source: StoreError) -> Self {
        match source {
            StoreError::Conflict => OrderError::Conflict,
            source => OrderError::Persistence { op, source },
        }
    }

    /// Stable snake_case tag used by the REST and queue replies.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::NotFound { .. } => "not_found",
            OrderError::InvalidTransition { .. } => "invalid_transition",
            OrderError::PermissionDenied(_) => "permission_denied",
            OrderError::SugarPersonImmutable => "sugar_person_immutable",
            OrderError::SugarPersonNotSet => "sugar_person_not_set",
            OrderError::PaidChangeForbidden => "paid_change_forbidden",
            OrderError::OrderNotOpenForItems(_) => "order_not_open_for_items",
            OrderError::ActiveOrderAlreadyExists(_) => "active_order_already_exists",
            OrderError::ImmutableFieldChanged(_) => "immutable_field_changed",
            OrderError::FieldNotSettable { .. } => "field_not_settable",
            OrderError::OrderDelivered => "order_delivered",
            OrderError::NoItemsForUser(_) => "no_items_for_user",
            OrderError::Conflict => "conflict",
            OrderError::UserAlreadyRegistered(_) => "user_already_registered",
            OrderError::MenuAlreadyExists(_) => "menu_already_exists",
            OrderError::MenuInUse(_) => "menu_in_use",
            OrderError::InvalidMenu(_) => "invalid_menu",
            OrderError::Persistence { .. } => "persistence",
            OrderError::CallerTimeout(_) => "caller_timeout",
            OrderError::DuplicateCorrelation(_) => "duplicate_correlation",
            OrderError::CoordinatorUnavailable(_) => "coordinator_unavailable",
        }
    }
}

impl From<FrameworkError> for OrderError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::Timeout(deadline) => OrderError::CallerTimeout(deadline),
            FrameworkError::DuplicateCorrelation(id) => OrderError::DuplicateCorrelation(id),
            other => OrderError::CoordinatorUnavailable(other.to_string()),
        }
    }
}
