//! Text command bot.
//!
//! A chat message is parsed into a [`ChatCommand`], run against the order
//! client on behalf of the sender, and answered with a single text reply.
//! Senders are identified by their registered user name.

use crate::clients::OrderClient;
use crate::error::{EntityKind, OrderError};
use crate::model::{MenuSnapshot, Order, OrderId, OrderPatch, OrderState, User, UserId};
use std::fmt::Write as _;
use thiserror::Error;
use tracing::{debug, warn};

const HELP: &str = "\
Commands:
  register                        register yourself
  start <menu>                    start an order for a menu
  add <menu> <item>               add an item to the active order
  remove <menu> <item>            remove one of your items
  finalize <menu>                 stop accepting items
  re-open <menu>                  accept items again (initiator only)
  ordered <menu>                  the order has been placed
  delivered <menu>                the food has arrived
  paid <menu>                     become the sugar person
  toggle_paid <menu|order> <user> flip the paid flag of a user's items
  status <menu>                   show the active order";

/// Order reference accepted by `toggle_paid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderRef {
    Id(OrderId),
    /// The active order of the named menu.
    Menu(String),
}

impl OrderRef {
    fn parse(arg: &str) -> Self {
        match arg.parse::<OrderId>() {
            Ok(id) => OrderRef::Id(id),
            Err(_) => OrderRef::Menu(arg.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Help,
    Register,
    Start { menu: String },
    Add { menu: String, item: String },
    Remove { menu: String, item: String },
    Transition { menu: String, target: OrderState },
    Paid { menu: String },
    TogglePaid { order: OrderRef, user: String },
    Status { menu: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatParseError {
    #[error("message must be in the format '{0}'")]
    Usage(&'static str),
    #[error("Command not recognized: {0}")]
    Unrecognized(String),
}

impl ChatCommand {
    pub fn parse(text: &str) -> Result<Self, ChatParseError> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let Some((keyword, args)) = words.split_first() else {
            return Err(ChatParseError::Unrecognized(String::new()));
        };

        let menu = |usage: &'static str| match args {
            [menu] => Ok(menu.to_string()),
            _ => Err(ChatParseError::Usage(usage)),
        };
        let menu_and_item = |usage: &'static str| match args {
            [menu, item] => Ok((menu.to_string(), item.to_string())),
            _ => Err(ChatParseError::Usage(usage)),
        };

        let command = match keyword.to_ascii_lowercase().as_str() {
            "help" => ChatCommand::Help,
            "register" => ChatCommand::Register,
            "start" => ChatCommand::Start {
                menu: menu("start [menu_name]")?,
            },
            "add" => {
                let (menu, item) = menu_and_item("add [menu_name] [short_name]")?;
                ChatCommand::Add { menu, item }
            }
            "remove" => {
                let (menu, item) = menu_and_item("remove [menu_name] [short_name]")?;
                ChatCommand::Remove { menu, item }
            }
            "finalize" => ChatCommand::Transition {
                menu: menu("finalize [menu_name]")?,
                target: OrderState::Finalized,
            },
            "re-open" | "reopen" => ChatCommand::Transition {
                menu: menu("re-open [menu_name]")?,
                target: OrderState::Open,
            },
            "ordered" => ChatCommand::Transition {
                menu: menu("ordered [menu_name]")?,
                target: OrderState::Ordered,
            },
            "delivered" => ChatCommand::Transition {
                menu: menu("delivered [menu_name]")?,
                target: OrderState::Delivered,
            },
            "paid" => ChatCommand::Paid {
                menu: menu("paid [menu_name]")?,
            },
            "toggle_paid" => match args {
                [order, user] => ChatCommand::TogglePaid {
                    order: OrderRef::parse(order),
                    user: user.to_string(),
                },
                _ => return Err(ChatParseError::Usage("toggle_paid [menu_name] [username]")),
            },
            "status" => ChatCommand::Status {
                menu: menu("status [menu_name]")?,
            },
            _ => return Err(ChatParseError::Unrecognized(text.trim().to_string())),
        };
        Ok(command)
    }
}

/// Answers chat messages through an [`OrderClient`].
#[derive(Clone)]
pub struct ChatBot {
    client: OrderClient,
}

impl ChatBot {
    pub fn new(client: OrderClient) -> Self {
        Self { client }
    }

    /// Runs `text` on behalf of `sender` and returns the reply. Rejections are
    /// replies too.
    pub async fn handle(&self, sender: &str, text: &str) -> String {
        let command = match ChatCommand::parse(text) {
            Ok(command) => command,
            Err(e) => return e.to_string(),
        };
        debug!(sender, ?command, "Chat command");
        match self.execute(sender, command).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(sender, error = %e, "Chat command rejected");
                render(&e, sender)
            }
        }
    }

    async fn execute(&self, sender: &str, command: ChatCommand) -> Result<String, OrderError> {
        match command {
            ChatCommand::Help => Ok(HELP.to_string()),
            ChatCommand::Register => {
                let user = self.client.register_user(sender).await?;
                Ok(format!("successfully registered user: {}", user.name))
            }
            ChatCommand::Start { menu } => {
                let user = self.client.user_by_name(sender).await?;
                let snapshot = self.client.menu_by_name(&menu).await?;
                self.client.create_order(user.id, snapshot.menu.id).await?;
                Ok(format!("started new order for {}", snapshot.menu.name))
            }
            ChatCommand::Add { menu, item } => {
                let user = self.client.user_by_name(sender).await?;
                let order = self.client.active_order_for_menu_name(&menu).await?;
                let menu_item = self
                    .client
                    .menu_item_by_short_name(order.menu_id, &item)
                    .await?;
                self.client
                    .add_order_item(order.id, user.id, menu_item.id)
                    .await?;
                Ok(format!("added '{}' to order '{}'", menu_item.name, menu))
            }
            ChatCommand::Remove { menu, item } => {
                let user = self.client.user_by_name(sender).await?;
                let order = self.client.active_order_for_menu_name(&menu).await?;
                let menu_item = self
                    .client
                    .menu_item_by_short_name(order.menu_id, &item)
                    .await?;
                let owned = self.client.items_for_user(order.id, user.id).await?;
                let Some(target) = owned.iter().find(|i| i.menu_item_id == menu_item.id) else {
                    return Ok(format!("you have no '{}' in order '{}'", item, menu));
                };
                self.client.remove_order_item(user.id, target.id).await?;
                Ok(format!("removed '{}' from order '{}'", menu_item.name, menu))
            }
            ChatCommand::Transition { menu, target } => {
                let user = self.client.user_by_name(sender).await?;
                let order = self.client.active_order_for_menu_name(&menu).await?;
                if order.state == target {
                    return Ok(format!("order '{}' is already in state {}", menu, target));
                }
                let order = self
                    .client
                    .transition_order(user.id, order.id, target, OrderPatch::default())
                    .await?;
                Ok(format!(
                    "successfully set state of order '{}' to {}",
                    menu, order.state
                ))
            }
            ChatCommand::Paid { menu } => {
                let user = self.client.user_by_name(sender).await?;
                let order = self.client.active_order_for_menu_name(&menu).await?;
                self.client.set_sugar_person(user.id, order.id).await?;
                Ok("You are now the sugar person. This cannot be undone!".to_string())
            }
            ChatCommand::TogglePaid { order, user } => {
                let caller = self.client.user_by_name(sender).await?;
                let target = self.client.user_by_name(&user).await?;
                let (order, label) = self.resolve(&order).await?;
                let toggle = self
                    .client
                    .toggle_paid_for_user(caller.id, order.id, target.id)
                    .await?;
                let paid = if toggle.paid { "paid" } else { "not paid" };
                Ok(format!(
                    "successfully marked all items of user '{}' in order '{}' as {}",
                    target.name, label, paid
                ))
            }
            ChatCommand::Status { menu } => {
                let order = self.client.active_order_for_menu_name(&menu).await?;
                let snapshot = self.client.menu_by_name(&menu).await?;
                self.status(order, &snapshot).await
            }
        }
    }

    async fn resolve(&self, order: &OrderRef) -> Result<(Order, String), OrderError> {
        match order {
            OrderRef::Id(id) => Ok((self.client.order(*id).await?, id.to_string())),
            OrderRef::Menu(menu) => Ok((
                self.client.active_order_for_menu_name(menu).await?,
                menu.clone(),
            )),
        }
    }

    async fn status(&self, order: Order, menu: &MenuSnapshot) -> Result<String, OrderError> {
        let snapshot = self.client.order_snapshot(order.id).await?;
        let mut reply = format!(
            "order '{}' is {} ({} items, total {})",
            menu.menu.name,
            order.state,
            snapshot.items.len(),
            snapshot.total()
        );

        let sugar_person = match order.sugar_person {
            Some(id) => self.name_of(id).await?,
            None => "not set".to_string(),
        };
        let _ = write!(reply, "\nsugar person: {}", sugar_person);

        for item in &snapshot.items {
            let dish = menu
                .items
                .iter()
                .find(|m| m.id == item.menu_item_id)
                .map_or("?", |m| m.name.as_str());
            let paid = if item.paid { " (paid)" } else { "" };
            let _ = write!(
                reply,
                "\n- {}: {} {}{}",
                self.name_of(item.user).await?,
                dish,
                item.price,
                paid
            );
        }
        Ok(reply)
    }

    async fn name_of(&self, id: UserId) -> Result<String, OrderError> {
        self.client.user(id).await.map(|User { name, .. }| name)
    }
}

/// Human-readable reason for a rejected command. Only an unregistered
/// `sender` is told to register; other unknown users are just named.
fn render(e: &OrderError, sender: &str) -> String {
    match e {
        OrderError::NotFound {
            kind: EntityKind::ActiveOrder,
            key,
        } => format!("there is no active order for menu '{}'", key),
        OrderError::NotFound {
            kind: EntityKind::MenuItem,
            key,
        } => format!("could not get menu item '{}'", key),
        OrderError::NotFound {
            kind: EntityKind::User,
            key,
        } if key == sender => format!("user '{}' is not registered; send 'register' first", key),
        OrderError::NotFound {
            kind: EntityKind::User,
            key,
        } => format!("user '{}' is not registered", key),
        OrderError::OrderNotOpenForItems(state) => format!("order is not open (it is {})", state),
        OrderError::NoItemsForUser(user) => format!("no order items for user '{}' found", user),
        other => other.to_string(),
    }
}
