//! Command handler implementations (/start, /catalog, /cart, /orders, /support)

use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;

use crate::telegram::catalog;
use crate::telegram::checkout;
use crate::telegram::handlers::types::{profile_from_message, HandlerDeps};

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    #[command(description = "главное меню")]
    Start,
    #[command(description = "каталог товаров")]
    Catalog,
    #[command(description = "корзина")]
    Cart,
    #[command(description = "мои заказы")]
    Orders,
    #[command(description = "написать в поддержку")]
    Support,
    #[command(description = "отменить текущее действие")]
    Cancel,
}

/// Map a reply-menu button text onto its command
///
/// Menu buttons arrive as plain text with a merchant-configured emoji
/// prefix, so matching is by contained label rather than equality.
pub fn menu_command_for(text: &str) -> Option<Command> {
    let text = text.trim();
    if text.starts_with('/') {
        return None;
    }
    if text.contains("Каталог") {
        Some(Command::Catalog)
    } else if text.contains("Корзина") {
        Some(Command::Cart)
    } else if text.contains("Мои заказы") {
        Some(Command::Orders)
    } else if text.contains("Поддержка") {
        Some(Command::Support)
    } else {
        None
    }
}

/// Dispatch one command to its catalog/checkout operation
pub async fn handle_command(bot: &Bot, deps: &HandlerDeps, msg: &Message, command: Command) {
    let chat_id = msg.chat.id;
    let profile = profile_from_message(msg);

    match command {
        Command::Start => catalog::send_welcome(bot, deps, chat_id).await,
        Command::Catalog => catalog::show_catalog(bot, deps, chat_id).await,
        Command::Cart => catalog::show_cart(bot, deps, chat_id, &profile).await,
        Command::Orders => catalog::show_orders(bot, deps, chat_id, &profile).await,
        Command::Support => checkout::begin_support(bot, deps, chat_id).await,
        Command::Cancel => {
            // Normally intercepted by the dedicated cancel branch; kept
            // here so the command is handled wherever it slips through
            deps.sessions.clear(chat_id).await;
            catalog::send_text(bot, chat_id, "✅ Действие отменено.").await;
        }
    }
}
