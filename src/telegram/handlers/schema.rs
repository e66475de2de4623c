//! Dispatcher schema and handler chain builders
//!
//! Routing priority, top to bottom:
//! 1. `/cancel` — universal escape hatch, valid from every state
//! 2. Flow router — text while the session awaits a specific input
//! 3. Commands and recognized menu-button texts
//! 4. Callback queries, parsed by the fixed payload vocabulary
//!
//! Anything else falls through to the default handler and is ignored.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::telegram::callbacks::CallbackAction;
use crate::telegram::catalog;
use crate::telegram::checkout;
use crate::telegram::handlers::commands::{handle_command, menu_command_for, Command};
use crate::telegram::handlers::types::{profile_from_message, profile_from_user, HandlerDeps, HandlerError};
use crate::telegram::session::FlowState;

fn is_cancel_text(text: &str) -> bool {
    let text = text.trim();
    text == "/cancel" || text.starts_with("/cancel@") || text.starts_with("/cancel ")
}

/// Creates the dispatcher schema for one tenant bot
///
/// The same tree is used in production and in integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_cancel = deps.clone();
    let deps_flow_filter = deps.clone();
    let deps_flow = deps.clone();
    let deps_commands = deps.clone();
    let deps_menu = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        // Universal escape hatch: must run before any state routing
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().map(is_cancel_text).unwrap_or(false))
                .endpoint(move |bot: Bot, msg: Message| {
                    let deps = deps_cancel.clone();
                    async move {
                        deps.sessions.clear(msg.chat.id).await;
                        catalog::send_text(&bot, msg.chat.id, "✅ Действие отменено.").await;
                        Ok(())
                    }
                }),
        )
        // Awaiting* states own the next text message, commands included
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().is_some())
                .filter_async(move |msg: Message| {
                    let deps = deps_flow_filter.clone();
                    async move { deps.sessions.flow(msg.chat.id).await.expects_input() }
                })
                .endpoint(move |bot: Bot, msg: Message| {
                    let deps = deps_flow.clone();
                    async move {
                        let flow = deps.sessions.flow(msg.chat.id).await;
                        let profile = profile_from_message(&msg);
                        let text = msg.text().unwrap_or_default();
                        checkout::handle_flow_text(&bot, &deps, msg.chat.id, &profile, text, flow).await;
                        Ok(())
                    }
                }),
        )
        // Slash commands
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(move |bot: Bot, msg: Message, command: Command| {
                    let deps = deps_commands.clone();
                    async move {
                        handle_command(&bot, &deps, &msg, command).await;
                        Ok(())
                    }
                }),
        )
        // Reply-keyboard menu buttons arrive as plain text
        .branch(
            Update::filter_message()
                .filter_map(|msg: Message| msg.text().and_then(menu_command_for))
                .endpoint(move |bot: Bot, msg: Message, command: Command| {
                    let deps = deps_menu.clone();
                    async move {
                        handle_command(&bot, &deps, &msg, command).await;
                        Ok(())
                    }
                }),
        )
        // Inline-keyboard taps
        .branch(Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
            let deps = deps_callback.clone();
            async move {
                handle_callback(&bot, &deps, &q).await;
                // Ack unconditionally so the client's loading indicator
                // clears even when the handler above failed
                if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                    log::warn!("Failed to answer callback query: {}", e);
                }
                Ok(())
            }
        }))
}

/// Dispatch one callback query by its parsed action and session state
pub(crate) async fn handle_callback(bot: &Bot, deps: &HandlerDeps, q: &CallbackQuery) {
    let Some(data) = q.data.as_deref() else {
        return;
    };
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(q.from.id.0 as i64));
    let message_id = q.message.as_ref().map(|m| m.id());

    let Some(action) = CallbackAction::parse(data) else {
        log::debug!("Ignoring unrecognized callback payload '{}' from chat {}", data, chat_id);
        return;
    };
    let profile = profile_from_user(&q.from);

    // A parked flow owns every tap until it completes or is cancelled
    let flow = deps.sessions.flow(chat_id).await;
    if flow.expects_input() {
        match (flow, action) {
            (FlowState::AwaitingPaymentMethod { phone, address }, CallbackAction::Payment { method }) => {
                checkout::choose_payment(bot, deps, chat_id, &profile, phone, address, method).await;
            }
            // The reply affordance re-targets the admin chat; the latest
            // tapped ticket wins
            (_, CallbackAction::SupportReply { ticket_id }) => {
                checkout::begin_support_reply(bot, deps, chat_id, &ticket_id).await;
            }
            (_, CallbackAction::Noop) => {}
            (flow, _) => checkout::reprompt_flow(bot, chat_id, &flow).await,
        }
        return;
    }

    match action {
        CallbackAction::OpenCategory { category_id } => {
            catalog::show_category_page(bot, deps, chat_id, &category_id, 0, None).await;
        }
        CallbackAction::CategoryPage { category_id, page } => {
            catalog::show_category_page(bot, deps, chat_id, &category_id, page, message_id).await;
        }
        CallbackAction::ShowProduct { product_id } => {
            catalog::show_product(bot, deps, chat_id, &product_id).await;
        }
        CallbackAction::AddToCart { product_id } => {
            catalog::add_to_cart(bot, deps, chat_id, &profile, &product_id).await;
        }
        CallbackAction::Checkout => {
            checkout::start_checkout(bot, deps, chat_id, &profile).await;
        }
        CallbackAction::Payment { .. } => {
            // Stale tap on an old payment keyboard after the flow ended
            log::debug!("Stray payment callback from chat {} outside checkout", chat_id);
        }
        CallbackAction::SupportReply { ticket_id } => {
            checkout::begin_support_reply(bot, deps, chat_id, &ticket_id).await;
        }
        CallbackAction::BackToCatalog => {
            catalog::show_catalog(bot, deps, chat_id).await;
        }
        CallbackAction::Noop => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_matches_bare_and_addressed_forms() {
        assert!(is_cancel_text("/cancel"));
        assert!(is_cancel_text("  /cancel  "));
        assert!(is_cancel_text("/cancel@my_shop_bot"));
        assert!(is_cancel_text("/cancel please"));
        assert!(!is_cancel_text("/cancelx"));
        assert!(!is_cancel_text("cancel"));
    }
}
