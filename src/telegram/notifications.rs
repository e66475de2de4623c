//! Best-effort admin notifications
//!
//! Orders and support tickets notify the tenant's admin chat. This is a
//! side channel: it runs spawned off the main flow, every failure is
//! logged, and nothing here ever surfaces to the customer.

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::api::types::{CartItem, Customer};
use crate::telegram::callbacks::PaymentMethod;
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::html::{escape_html, format_price};
use crate::telegram::keyboards;

/// Resolve the tenant's admin chat, if one is configured
async fn admin_chat_id(deps: &HandlerDeps) -> Option<ChatId> {
    let profile = match deps.api.bot_profile(&deps.bot_id).await {
        Ok(profile) => profile,
        Err(e) => {
            log::error!("Failed to fetch bot profile for admin notification: {}", e);
            return None;
        }
    };
    match profile.admin_telegram_id.as_deref().and_then(|id| id.parse::<i64>().ok()) {
        Some(id) => Some(ChatId(id)),
        None => {
            log::info!("Admin notification skipped: no adminTelegramId configured for bot {}", deps.bot_id);
            None
        }
    }
}

fn customer_mention(customer: &Customer) -> String {
    let first_name = escape_html(&customer.first_name);
    let last_name = customer.last_name.as_deref().map(escape_html).unwrap_or_default();
    let full_name = if last_name.is_empty() {
        first_name
    } else {
        format!("{} {}", first_name, last_name)
    };
    format!(r#"<a href="tg://user?id={}">{}</a>"#, customer.telegram_id, full_name)
}

fn customer_username(customer: &Customer) -> String {
    match customer.username.as_deref() {
        Some(username) if !username.is_empty() => format!("@{}", escape_html(username)),
        _ => "не указан".to_string(),
    }
}

/// Fire an order notification without blocking the checkout flow
#[allow(clippy::too_many_arguments)]
pub fn spawn_order_notification(
    bot: Bot,
    deps: HandlerDeps,
    customer: Customer,
    order_number: String,
    total: f64,
    items: Vec<CartItem>,
    phone: String,
    address: String,
    method: PaymentMethod,
) {
    tokio::spawn(async move {
        notify_admin_new_order(
            &bot, &deps, &customer, &order_number, total, &items, &phone, &address, method,
        )
        .await;
    });
}

/// Sends a new-order notification to the tenant's admin chat
///
/// Field layout mirrors what merchants already see from the platform, all
/// user-supplied values entity-escaped.
#[allow(clippy::too_many_arguments)]
pub async fn notify_admin_new_order(
    bot: &Bot,
    deps: &HandlerDeps,
    customer: &Customer,
    order_number: &str,
    total: f64,
    items: &[CartItem],
    phone: &str,
    address: &str,
    method: PaymentMethod,
) {
    let Some(admin_chat) = admin_chat_id(deps).await else {
        return;
    };

    let mut product_list = String::new();
    for item in items {
        product_list.push_str(&format!(
            "• {} - {} - {} шт.\n",
            escape_html(&item.product.name),
            escape_html(item.product.article.as_deref().unwrap_or("N/A")),
            item.quantity,
        ));
    }

    let message = format!(
        "🔔 <b>Новый заказ #{}</b>\n\n\
         👤 <b>Покупатель:</b>\n\
         {}\n\
         Username: {}\n\n\
         📦 <b>Товары:</b>\n{}\n\
         📍 <b>Адрес доставки:</b> {}\n\
         📱 <b>Телефон:</b> {}\n\
         💳 <b>Способ оплаты:</b> {}\n\n\
         💰 <b>Итого:</b> {} ₽",
        escape_html(order_number),
        customer_mention(customer),
        customer_username(customer),
        product_list,
        escape_html(address),
        escape_html(phone),
        escape_html(method.label()),
        format_price(total),
    );

    match bot.send_message(admin_chat, message).parse_mode(ParseMode::Html).await {
        Ok(_) => log::info!("Admin notification sent for order {}", order_number),
        Err(e) => log::error!("Failed to send admin notification for order {}: {}", order_number, e),
    }
}

/// Fire a support-ticket notification without blocking the support flow
pub fn spawn_support_notification(
    bot: Bot,
    deps: HandlerDeps,
    customer: Customer,
    ticket_id: String,
    text: String,
) {
    tokio::spawn(async move {
        notify_admin_support_ticket(&bot, &deps, &customer, &ticket_id, &text).await;
    });
}

/// Sends a new-ticket notification with a reply affordance to the admin chat
pub async fn notify_admin_support_ticket(
    bot: &Bot,
    deps: &HandlerDeps,
    customer: &Customer,
    ticket_id: &str,
    text: &str,
) {
    let Some(admin_chat) = admin_chat_id(deps).await else {
        return;
    };

    let message = format!(
        "💬 <b>Новое обращение в поддержку</b>\n\n\
         👤 {}\n\
         Username: {}\n\n\
         {}",
        customer_mention(customer),
        customer_username(customer),
        escape_html(text),
    );

    let result = bot
        .send_message(admin_chat, message)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboards::support_reply_keyboard(ticket_id))
        .await;

    match result {
        Ok(_) => log::info!("Admin notification sent for ticket {}", ticket_id),
        Err(e) => log::error!("Failed to send admin notification for ticket {}: {}", ticket_id, e),
    }
}
