//! Handler types, dependencies, and customer identity helpers

use std::sync::Arc;

use teloxide::types::{Message, User};

use crate::api::types::NewCustomer;
use crate::api::StoreApi;
use crate::telegram::session::SessionStore;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies shared by all handlers of one bot instance
///
/// The session store is owned per-instance; the API client is shared by the
/// whole fleet.
#[derive(Clone)]
pub struct HandlerDeps {
    pub api: Arc<StoreApi>,
    pub bot_id: String,
    pub sessions: Arc<SessionStore>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(api: Arc<StoreApi>, bot_id: impl Into<String>, sessions: Arc<SessionStore>) -> Self {
        Self {
            api,
            bot_id: bot_id.into(),
            sessions,
        }
    }
}

/// Customer get-or-create payload from a Telegram user
pub fn profile_from_user(user: &User) -> NewCustomer {
    NewCustomer {
        telegram_id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

/// Customer payload from a message, falling back to the chat identity when
/// the sender is hidden (channels, anonymous admins)
pub fn profile_from_message(msg: &Message) -> NewCustomer {
    match msg.from.as_ref() {
        Some(user) => profile_from_user(user),
        None => NewCustomer {
            telegram_id: msg.chat.id.0,
            username: None,
            first_name: "User".to_string(),
            last_name: None,
        },
    }
}
