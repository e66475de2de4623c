//! Checkout and support conversation flows
//!
//! A linear state machine per chat: checkout → phone → address → payment
//! method → order submission, plus the support sub-flow. `/cancel` is the
//! universal escape hatch and is handled before anything here runs. Any
//! backend failure mid-flow clears the session back to `Idle` so the
//! customer is never stuck re-submitting into a flow that already failed.

use once_cell::sync::Lazy;
use regex::Regex;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::api::types::{NewCustomer, NewOrder, OrderItem, TicketMessage};
use crate::core::error::{AppError, AppResult};
use crate::telegram::callbacks::PaymentMethod;
use crate::telegram::catalog::{resolve_customer, send_text};
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::html::{escape_html, format_price};
use crate::telegram::keyboards;
use crate::telegram::notifications;
use crate::telegram::session::FlowState;

/// Accepts international and local formats with common separators
static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?\d[\d\s\-()]{5,19}$").expect("Failed to compile phone regex"));

/// A phone must match the shape and carry at least 7 digits
fn is_valid_phone(text: &str) -> bool {
    let text = text.trim();
    PHONE_REGEX.is_match(text) && text.chars().filter(char::is_ascii_digit).count() >= 7
}

/// Entry point of the checkout flow (the cart's "checkout" button)
///
/// Guard: only a non-empty cart enters the flow; an empty one renders a
/// message and leaves the session untouched.
pub async fn start_checkout(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, profile: &NewCustomer) {
    if let Err(e) = start_checkout_inner(bot, deps, chat_id, profile).await {
        log::error!("Failed to start checkout for chat {}: {}", chat_id, e);
        deps.sessions.clear(chat_id).await;
        send_text(bot, chat_id, "❌ Не получилось оформить заказ. Попробуйте ещё раз.").await;
    }
}

async fn start_checkout_inner(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    profile: &NewCustomer,
) -> AppResult<()> {
    let customer = resolve_customer(deps, profile).await?;
    let cart = deps.api.cart(&customer.id).await?;

    if cart.map(|c| c.is_empty()).unwrap_or(true) {
        bot.send_message(chat_id, "🛒 Ваша корзина пуста").await?;
        return Ok(());
    }

    deps.sessions.set_flow(chat_id, FlowState::AwaitingPhone).await;
    bot.send_message(chat_id, "📱 Введите ваш номер телефона:").await?;
    Ok(())
}

/// Route a text message arriving while the chat is parked in an
/// `Awaiting*` state
pub async fn handle_flow_text(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    profile: &NewCustomer,
    text: &str,
    flow: FlowState,
) {
    match flow {
        FlowState::AwaitingPhone => handle_phone(bot, deps, chat_id, text).await,
        FlowState::AwaitingAddress { phone } => handle_address(bot, deps, chat_id, &phone, text).await,
        FlowState::AwaitingPaymentMethod { .. } => {
            // A button tap is expected here, not text
            reprompt_payment(bot, chat_id).await;
        }
        FlowState::AwaitingSupportMessage => {
            handle_support_message(bot, deps, chat_id, profile, text).await
        }
        FlowState::AwaitingSupportReply { ticket_id } => {
            handle_support_reply(bot, deps, chat_id, &ticket_id, text).await
        }
        FlowState::Idle | FlowState::BrowsingCategory { .. } => {
            log::debug!("Flow text for chat {} in non-awaiting state, ignoring", chat_id);
        }
    }
}

async fn handle_phone(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, text: &str) {
    if !is_valid_phone(text) {
        send_text(
            bot,
            chat_id,
            "Пожалуйста, отправьте корректный номер телефона (например, +79990000000):",
        )
        .await;
        return;
    }

    deps.sessions
        .set_flow(chat_id, FlowState::AwaitingAddress { phone: text.trim().to_string() })
        .await;
    send_text(bot, chat_id, "📍 Введите адрес доставки:").await;
}

async fn handle_address(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, phone: &str, text: &str) {
    let address = text.trim();
    if address.is_empty() {
        send_text(bot, chat_id, "Адрес не может быть пустым. Введите адрес доставки:").await;
        return;
    }

    deps.sessions
        .set_flow(
            chat_id,
            FlowState::AwaitingPaymentMethod {
                phone: phone.to_string(),
                address: address.to_string(),
            },
        )
        .await;

    if let Err(e) = bot
        .send_message(chat_id, "💳 Выберите способ оплаты:")
        .reply_markup(keyboards::payment_keyboard())
        .await
    {
        log::warn!("Failed to send payment keyboard to chat {}: {}", chat_id, e);
    }
}

/// Terminal transition: a payment-method button was tapped while the flow
/// held phone and address
pub async fn choose_payment(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    profile: &NewCustomer,
    phone: String,
    address: String,
    method: PaymentMethod,
) {
    if let Err(e) = submit_order(bot, deps, chat_id, profile, &phone, &address, method).await {
        log::error!("Checkout failed for chat {}: {}", chat_id, e);
        deps.sessions.clear(chat_id).await;
        send_text(bot, chat_id, "❌ Не получилось оформить заказ. Попробуйте ещё раз.").await;
    }
}

/// The ordered terminal sequence of the checkout flow
///
/// Phone is persisted before the cart snapshot is taken, and the cart is
/// cleared only after the backend confirmed the order; clearing earlier
/// would lose the order contents on a failed submission.
async fn submit_order(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    profile: &NewCustomer,
    phone: &str,
    address: &str,
    method: PaymentMethod,
) -> AppResult<()> {
    let customer = resolve_customer(deps, profile).await?;
    deps.api.set_customer_phone(&customer.id, phone).await?;

    // Authoritative snapshot: the cart may have changed since checkout began
    let cart = deps.api.cart(&customer.id).await?;
    let cart = match cart {
        Some(cart) if !cart.is_empty() => cart,
        _ => {
            deps.sessions.clear(chat_id).await;
            bot.send_message(chat_id, "🛒 Ваша корзина пуста").await?;
            return Ok(());
        }
    };
    let total = cart.total();

    let items: Vec<OrderItem> = cart
        .items
        .iter()
        .map(|item| OrderItem {
            product_id: item.product.id.clone(),
            product_name: item.product.name.clone(),
            price: item.product.price,
            quantity: item.quantity,
            image_url: item.product.images.first().map(|i| deps.api.resolve_image_url(&i.url)),
        })
        .collect();

    let order = deps
        .api
        .create_order(
            &deps.bot_id,
            &NewOrder {
                customer_id: customer.id.clone(),
                items,
                payment_method: method.label().to_string(),
                delivery_address: address.to_string(),
                customer_comment: None,
            },
        )
        .await?;

    if let Err(e) = deps.api.clear_cart(&customer.id).await {
        // The order is already confirmed; re-prompting here would invite a
        // duplicate submission, so log and move on
        log::error!("Failed to clear cart for customer {}: {}", customer.id, e);
    }

    let confirmation = format!(
        "🎉 Заказ #{} оформлен!\n💰 Сумма: {} ₽\n\nМы свяжемся с вами в ближайшее время.",
        escape_html(&order.order_number),
        format_price(total),
    );
    if let Err(e) = bot.send_message(chat_id, confirmation).parse_mode(ParseMode::Html).await {
        log::warn!("Failed to send order confirmation to chat {}: {}", chat_id, e);
    }

    notifications::spawn_order_notification(
        bot.clone(),
        deps.clone(),
        customer,
        order.order_number.clone(),
        total,
        cart.items.clone(),
        phone.to_string(),
        address.to_string(),
        method,
    );

    deps.sessions.clear(chat_id).await;
    log::info!("Order {} submitted for chat {} (total {})", order.order_number, chat_id, total);
    Ok(())
}

/// Nudge the chat back to the input its flow is waiting on
///
/// Used when a tap on some older keyboard arrives while the session is
/// parked mid-flow; the stray event must not derail the flow state.
pub async fn reprompt_flow(bot: &Bot, chat_id: ChatId, flow: &FlowState) {
    match flow {
        FlowState::AwaitingPhone => send_text(bot, chat_id, "📱 Введите ваш номер телефона:").await,
        FlowState::AwaitingAddress { .. } => send_text(bot, chat_id, "📍 Введите адрес доставки:").await,
        FlowState::AwaitingPaymentMethod { .. } => reprompt_payment(bot, chat_id).await,
        FlowState::AwaitingSupportMessage => {
            send_text(bot, chat_id, "💬 Напишите ваш вопрос, и мы обязательно ответим!").await
        }
        FlowState::AwaitingSupportReply { .. } => {
            send_text(bot, chat_id, "✍️ Введите ответ для клиента:").await
        }
        FlowState::Idle | FlowState::BrowsingCategory { .. } => {}
    }
}

/// Re-send the payment keyboard when a stray tap arrives mid-step
pub async fn reprompt_payment(bot: &Bot, chat_id: ChatId) {
    if let Err(e) = bot
        .send_message(chat_id, "💳 Пожалуйста, выберите способ оплаты кнопкой ниже:")
        .reply_markup(keyboards::payment_keyboard())
        .await
    {
        log::warn!("Failed to re-prompt payment for chat {}: {}", chat_id, e);
    }
}

// ─── Support sub-flow ──────────────────────────────────────────────────

/// `/support`: park the chat and wait for the question text
pub async fn begin_support(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId) {
    deps.sessions.set_flow(chat_id, FlowState::AwaitingSupportMessage).await;
    send_text(bot, chat_id, "💬 Напишите ваш вопрос, и мы обязательно ответим!").await;
}

async fn handle_support_message(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    profile: &NewCustomer,
    text: &str,
) {
    let text = text.trim();
    if text.is_empty() {
        send_text(bot, chat_id, "💬 Напишите ваш вопрос, и мы обязательно ответим!").await;
        return;
    }

    if let Err(e) = create_ticket(bot, deps, chat_id, profile, text).await {
        log::error!("Failed to create support ticket for chat {}: {}", chat_id, e);
        deps.sessions.clear(chat_id).await;
        send_text(bot, chat_id, crate::telegram::catalog::TRY_AGAIN).await;
    }
}

async fn create_ticket(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    profile: &NewCustomer,
    text: &str,
) -> AppResult<()> {
    let customer = resolve_customer(deps, profile).await?;
    let ticket = deps.api.create_support_ticket(&deps.bot_id, &customer.id, text).await?;

    notifications::spawn_support_notification(
        bot.clone(),
        deps.clone(),
        customer,
        ticket.id.clone(),
        text.to_string(),
    );

    deps.sessions.clear(chat_id).await;
    bot.send_message(chat_id, "✅ Сообщение отправлено! Мы ответим вам в ближайшее время.")
        .await?;
    Ok(())
}

/// Admin tapped "reply" under a ticket notification; park the admin chat
/// on that ticket.
///
/// Correlation is by admin chat identity only: a second reply action before
/// the first completes overwrites the target ticket.
pub async fn begin_support_reply(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, ticket_id: &str) {
    deps.sessions
        .set_flow(chat_id, FlowState::AwaitingSupportReply { ticket_id: ticket_id.to_string() })
        .await;
    send_text(bot, chat_id, "✍️ Введите ответ для клиента:").await;
}

async fn handle_support_reply(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, ticket_id: &str, text: &str) {
    if let Err(e) = send_reply(bot, deps, chat_id, ticket_id, text).await {
        log::error!("Failed to send support reply for ticket {}: {}", ticket_id, e);
        deps.sessions.clear(chat_id).await;
        send_text(bot, chat_id, crate::telegram::catalog::TRY_AGAIN).await;
    }
}

async fn send_reply(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, ticket_id: &str, text: &str) -> AppResult<()> {
    deps.api
        .add_ticket_message(
            ticket_id,
            &TicketMessage {
                sender_type: "admin".to_string(),
                sender_id: chat_id.to_string(),
                text: text.to_string(),
            },
        )
        .await?;

    let ticket = deps.api.support_ticket(ticket_id).await?;
    let customer = ticket
        .customer
        .ok_or_else(|| AppError::MissingData(format!("customer of ticket {}", ticket_id)))?;
    let customer_chat = customer
        .telegram_id
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| AppError::Validation(format!("bad telegramId on ticket {}", ticket_id)))?;

    // Relay straight to the customer's chat as well as the ticket record
    if let Err(e) = bot
        .send_message(customer_chat, format!("💬 <b>Ответ поддержки:</b>\n{}", escape_html(text)))
        .parse_mode(ParseMode::Html)
        .await
    {
        log::warn!("Failed to relay support reply to chat {}: {}", customer_chat, e);
    }

    deps.sessions.clear(chat_id).await;
    bot.send_message(chat_id, "✅ Ответ отправлен клиенту.").await?;
    Ok(())
}
