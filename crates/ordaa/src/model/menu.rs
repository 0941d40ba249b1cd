//! Menus and the items that can be ordered from them.

use crate::model::{MenuId, MenuItemId, Price};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub id: MenuId,
    /// Unique across all menus.
    pub name: String,
    pub url: Option<String>,
}

/// One orderable dish. `short_name` is unique within its menu and is what chat
/// users type (`add pizza 42`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub menu_id: MenuId,
    pub short_name: String,
    pub name: String,
    pub price: Price,
}

/// Payload for creating a menu together with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenu {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub items: Vec<NewMenuItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenuItem {
    pub short_name: String,
    pub name: String,
    pub price: Price,
}

/// A menu with all of its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuSnapshot {
    pub menu: Menu,
    pub items: Vec<MenuItem>,
}
