//! # Order Lifecycle Rules
//!
//! Pure checks with no I/O. The registry calls these inside its transactions;
//! nothing else decides whether a change is legal.
//!
//! ```text
//!  Open ──> Finalized ──> Ordered ──> Delivered
//!   ^           │
//!   └───────────┘  (initiator only)
//! ```

use crate::error::OrderError;
use crate::model::{Order, OrderItem, OrderItemUpdate, OrderPatch, OrderState, UserId};

/// What a transition request amounts to once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A real edge of the lifecycle.
    Move { from: OrderState, to: OrderState },
    /// Target equals the current state: only the patch is applied.
    Stay,
}

impl Transition {
    /// `true` when this is an edge ending in `state`.
    pub fn enters(self, state: OrderState) -> bool {
        matches!(self, Transition::Move { to, .. } if to == state)
    }
}

impl OrderState {
    /// Legal targets from this state.
    pub fn successors(self) -> &'static [OrderState] {
        match self {
            OrderState::Open => &[OrderState::Finalized],
            OrderState::Finalized => &[OrderState::Open, OrderState::Ordered],
            OrderState::Ordered => &[OrderState::Delivered],
            OrderState::Delivered => &[],
        }
    }

    pub fn can_move_to(self, target: OrderState) -> bool {
        self.successors().contains(&target)
    }
}

/// Validates moving `order` to `target` on behalf of `caller`.
pub fn check_transition(
    order: &Order,
    caller: UserId,
    target: OrderState,
) -> Result<Transition, OrderError> {
    let from = order.state;
    if from == OrderState::Delivered {
        return Err(OrderError::InvalidTransition { from, to: target });
    }
    if from == target {
        return Ok(Transition::Stay);
    }
    if !from.can_move_to(target) {
        return Err(OrderError::InvalidTransition { from, to: target });
    }
    if from == OrderState::Finalized && target == OrderState::Open && caller != order.initiator {
        return Err(OrderError::PermissionDenied(
            "only the initiator may re-open a finalized order".into(),
        ));
    }
    Ok(Transition::Move { from, to: target })
}

fn deadline_settable(state: OrderState) -> bool {
    matches!(state, OrderState::Open | OrderState::Finalized)
}

fn eta_settable(state: OrderState) -> bool {
    state == OrderState::Ordered
}

/// Validates the optional fields of a transition from `from` to `to`.
///
/// A field is accepted when either end of the transition allows it, so the
/// ETA can be given together with the move into `Ordered`.
pub fn check_patch(from: OrderState, to: OrderState, patch: &OrderPatch) -> Result<(), OrderError> {
    if patch.order_deadline.is_some() && !(deadline_settable(from) || deadline_settable(to)) {
        return Err(OrderError::FieldNotSettable {
            field: "order_deadline",
            state: from,
        });
    }
    if patch.eta.is_some() && !(eta_settable(from) || eta_settable(to)) {
        return Err(OrderError::FieldNotSettable {
            field: "eta",
            state: from,
        });
    }
    Ok(())
}

/// Validates making `candidate` the sugar person. Returns `true` when the
/// order actually changes, `false` for a repeat of the current value.
pub fn check_sugar_person(order: &Order, candidate: UserId) -> Result<bool, OrderError> {
    if order.state == OrderState::Delivered {
        return Err(OrderError::OrderDelivered);
    }
    match order.sugar_person {
        None => Ok(true),
        Some(current) if current == candidate => Ok(false),
        Some(_) => Err(OrderError::SugarPersonImmutable),
    }
}

/// Only the sugar person may flip `paid`, and only once one is set.
pub fn check_paid_change(order: &Order, caller: UserId) -> Result<(), OrderError> {
    match order.sugar_person {
        None => Err(OrderError::SugarPersonNotSet),
        Some(sugar_person) if sugar_person != caller => Err(OrderError::PaidChangeForbidden),
        Some(_) => Ok(()),
    }
}

/// The value every item of a group should carry after a toggle: paid if any
/// of them is still unpaid, otherwise unpaid. `None` for an empty group.
pub fn toggled_paid(items: &[OrderItem]) -> Option<bool> {
    if items.is_empty() {
        return None;
    }
    Some(items.iter().any(|item| !item.paid))
}

/// Rejects updates that touch anything but `paid`. Returns `true` when `paid`
/// changes.
pub fn check_item_update(existing: &OrderItem, update: &OrderItemUpdate) -> Result<bool, OrderError> {
    if update.order_id != existing.order_id {
        return Err(OrderError::ImmutableFieldChanged("order_id"));
    }
    if update.menu_item_id != existing.menu_item_id {
        return Err(OrderError::ImmutableFieldChanged("menu_item_id"));
    }
    if update.user != existing.user {
        return Err(OrderError::ImmutableFieldChanged("user"));
    }
    Ok(update.paid != existing.paid)
}
