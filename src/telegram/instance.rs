//! One live bot per tenant
//!
//! A `BotInstance` owns a long-polling dispatcher, its session store and
//! nothing else; stopping it tears down the connection and drops in-flight
//! sessions for that tenant only.

use std::sync::Arc;

use teloxide::dispatching::ShutdownToken;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::api::StoreApi;
use crate::core::config;
use crate::telegram::handlers::{schema, HandlerDeps};
use crate::telegram::session::SessionStore;

/// Creates a Bot for the given token, honoring a BOT_API_URL override
/// (local Bot API server or a test double)
pub fn create_bot(token: &str) -> Bot {
    match std::env::var("BOT_API_URL") {
        Ok(api_url) => match api_url.parse() {
            Ok(url) => Bot::new(token).set_api_url(url),
            Err(e) => {
                log::warn!("Invalid BOT_API_URL '{}', using default: {}", api_url, e);
                Bot::new(token)
            }
        },
        Err(_) => Bot::new(token),
    }
}

/// Registers the customer-facing command list in the Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(vec![
        BotCommand::new("start", "главное меню"),
        BotCommand::new("catalog", "каталог товаров"),
        BotCommand::new("cart", "корзина"),
        BotCommand::new("orders", "мои заказы"),
        BotCommand::new("support", "написать в поддержку"),
        BotCommand::new("cancel", "отменить текущее действие"),
    ])
    .await?;
    Ok(())
}

/// A running tenant bot: dispatcher task + shutdown handle
pub struct BotInstance {
    bot_id: String,
    shutdown: ShutdownToken,
    handle: JoinHandle<()>,
}

impl BotInstance {
    /// Start long polling for one tenant
    ///
    /// The dispatcher runs on its own task; this returns as soon as the
    /// instance is registered, so launching many tenants never serializes
    /// on connection setup.
    pub fn launch(bot_id: &str, token: &str, api: Arc<StoreApi>) -> Self {
        let bot = create_bot(token);
        let deps = HandlerDeps::new(api, bot_id, Arc::new(SessionStore::new()));

        let mut dispatcher = Dispatcher::builder(bot.clone(), schema(deps))
            .default_handler(|_| async {})
            .build();
        let shutdown = dispatcher.shutdown_token();

        let task_bot_id = bot_id.to_string();
        let handle = tokio::spawn(async move {
            if let Err(e) = setup_bot_commands(&bot).await {
                log::warn!("Failed to set commands for bot {}: {}", task_bot_id, e);
            }
            log::info!("Bot instance {} polling", task_bot_id);
            dispatcher.dispatch().await;
            log::info!("Bot instance {} dispatcher exited", task_bot_id);
        });

        Self {
            bot_id: bot_id.to_string(),
            shutdown,
            handle,
        }
    }

    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    /// Tear down the polling connection
    ///
    /// Safe on an instance whose dispatcher already exited (an idle
    /// shutdown is not an error), and bounded: a tenant that hangs in
    /// teardown is abandoned after the configured timeout so it cannot
    /// starve the reconciliation loop.
    pub async fn stop(self) {
        match self.shutdown.shutdown() {
            Ok(wait) => {
                if timeout(config::fleet::stop_timeout(), wait).await.is_err() {
                    log::warn!("Bot instance {} did not stop in time, aborting its task", self.bot_id);
                    self.handle.abort();
                }
            }
            Err(_) => {
                // Dispatcher never started polling or already finished
                log::debug!("Bot instance {} was already stopped", self.bot_id);
            }
        }
    }
}

impl std::fmt::Debug for BotInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotInstance").field("bot_id", &self.bot_id).finish()
    }
}
