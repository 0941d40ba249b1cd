//! Front ends over the [`OrderClient`](crate::clients::OrderClient).
//!
//! Each adapter only translates: it parses its own input format, calls the
//! client, and renders the result or the [`OrderError`](crate::error::OrderError)
//! back in its own format. None of them touches the store directly.

pub mod chat;
pub mod queue;
pub mod rest;

pub use chat::{ChatBot, ChatCommand, ChatParseError};
pub use queue::{ActionMessage, ActionReply, ChannelPublisher, OrderEvent, QueueConsumer, ReplyError};
pub use rest::{router, serve, ApiError, AppState};
