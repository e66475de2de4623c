//! Catalog, cart and order rendering
//!
//! Read-through layer over the backend: every operation fetches fresh data,
//! translates it into a chat-native rendering and sends exactly one message
//! (or edit). Backend failures are caught here and surfaced as a generic
//! retry message; they never unwind into the dispatcher.

use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ParseMode};

use crate::api::types::{Customer, NewCustomer};
use crate::core::error::AppResult;
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::html::{escape_html, format_price};
use crate::telegram::keyboards;
use crate::telegram::session::FlowState;

/// Generic user-facing failure text for backend errors
pub(crate) const TRY_AGAIN: &str = "⚠️ Что-то пошло не так. Попробуйте ещё раз позже.";

/// Send plain text, logging instead of propagating transport failures
pub(crate) async fn send_text(bot: &Bot, chat_id: ChatId, text: &str) {
    if let Err(e) = bot.send_message(chat_id, text).await {
        log::warn!("Failed to send message to chat {}: {}", chat_id, e);
    }
}

/// Resolve the chat's customer record, creating it on first contact
pub(crate) async fn resolve_customer(deps: &HandlerDeps, profile: &NewCustomer) -> AppResult<Customer> {
    deps.api.get_or_create_customer(&deps.bot_id, profile).await
}

/// Welcome message with the tenant's template and reply-keyboard menu
///
/// Falls back to a hardcoded greeting when the backend is unreachable, so a
/// fresh chat always gets an answer to /start.
pub async fn send_welcome(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId) {
    if let Err(e) = send_welcome_inner(bot, deps, chat_id).await {
        log::error!("Failed to send welcome for chat {}: {}", chat_id, e);
        send_text(bot, chat_id, "Добро пожаловать! 🛍️").await;
    }
}

async fn send_welcome_inner(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId) -> AppResult<()> {
    let template = deps.api.welcome_template(&deps.bot_id).await?;
    let menu = deps.api.menu(&deps.bot_id).await?;

    bot.send_message(chat_id, template.text)
        .reply_markup(keyboards::main_menu_keyboard(&menu))
        .await?;
    Ok(())
}

/// Category list entry point
pub async fn show_catalog(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId) {
    if let Err(e) = show_catalog_inner(bot, deps, chat_id).await {
        log::error!("Failed to show catalog for chat {}: {}", chat_id, e);
        send_text(bot, chat_id, TRY_AGAIN).await;
    }
}

async fn show_catalog_inner(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId) -> AppResult<()> {
    let categories = deps.api.categories(&deps.bot_id).await?;

    if categories.is_empty() {
        bot.send_message(chat_id, "Категории пока не добавлены").await?;
        return Ok(());
    }

    bot.send_message(chat_id, "Выберите категорию:")
        .reply_markup(keyboards::categories_keyboard(&categories))
        .await?;
    Ok(())
}

/// One page of a category's products
///
/// `edit_message` switches to editing in place, used by pagination taps so
/// the listing does not pile up in the chat. Out-of-range pages are clamped.
pub async fn show_category_page(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    category_id: &str,
    page: usize,
    edit_message: Option<MessageId>,
) {
    if let Err(e) = show_category_page_inner(bot, deps, chat_id, category_id, page, edit_message).await {
        log::error!(
            "Failed to show category {} page {} for chat {}: {}",
            category_id,
            page,
            chat_id,
            e
        );
        send_text(bot, chat_id, TRY_AGAIN).await;
    }
}

async fn show_category_page_inner(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    category_id: &str,
    page: usize,
    edit_message: Option<MessageId>,
) -> AppResult<()> {
    let products = deps.api.products(&deps.bot_id, Some(category_id)).await?;

    if products.is_empty() {
        bot.send_message(chat_id, "В этой категории пока нет товаров").await?;
        return Ok(());
    }

    deps.sessions
        .set_flow(chat_id, FlowState::BrowsingCategory { category_id: category_id.to_string() })
        .await;
    deps.sessions.remember_category(chat_id, category_id).await;

    let page = keyboards::clamp_page(products.len(), page);
    let markup = keyboards::product_page_keyboard(category_id, &products, page);

    match edit_message {
        Some(message_id) => {
            bot.edit_message_text(chat_id, message_id, "Выберите товар:")
                .reply_markup(markup)
                .await?;
        }
        None => {
            bot.send_message(chat_id, "Выберите товар:").reply_markup(markup).await?;
        }
    }
    Ok(())
}

/// Product card: photo with caption when an image exists, plain text
/// otherwise
pub async fn show_product(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, product_id: &str) {
    if let Err(e) = show_product_inner(bot, deps, chat_id, product_id).await {
        log::error!("Failed to show product {} for chat {}: {}", product_id, chat_id, e);
        send_text(bot, chat_id, TRY_AGAIN).await;
    }
}

async fn show_product_inner(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, product_id: &str) -> AppResult<()> {
    let product = deps.api.product(product_id).await?;

    let mut text = format!("<b>{}</b>", escape_html(&product.name));
    if let Some(description) = product.description.as_deref().filter(|d| !d.trim().is_empty()) {
        text.push_str("\n\n");
        text.push_str(&escape_html(description));
    }
    text.push_str(&format!("\n\n💰 Цена: {} ₽", format_price(product.price)));

    let back_category = deps.sessions.last_category(chat_id).await;
    let markup = keyboards::product_card_keyboard(&product.id, back_category.as_deref());

    let photo_url = product
        .images
        .first()
        .map(|i| deps.api.resolve_image_url(&i.url))
        .and_then(|u| u.parse::<url::Url>().ok());

    match photo_url {
        Some(photo_url) => {
            bot.send_photo(chat_id, InputFile::url(photo_url))
                .caption(text)
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(markup)
                .await?;
        }
    }
    Ok(())
}

/// Put one unit of a product into the chat's cart
pub async fn add_to_cart(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    profile: &NewCustomer,
    product_id: &str,
) {
    if let Err(e) = add_to_cart_inner(bot, deps, chat_id, profile, product_id).await {
        log::error!("Failed to add product {} to cart for chat {}: {}", product_id, chat_id, e);
        send_text(bot, chat_id, "Ошибка при добавлении в корзину. Попробуйте ещё раз.").await;
    }
}

async fn add_to_cart_inner(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    profile: &NewCustomer,
    product_id: &str,
) -> AppResult<()> {
    let customer = resolve_customer(deps, profile).await?;
    deps.api.add_to_cart(&deps.bot_id, &customer.id, product_id, 1).await?;
    bot.send_message(chat_id, "✅ Товар добавлен в корзину!").await?;
    Ok(())
}

/// Cart contents with line subtotals and a checkout button
pub async fn show_cart(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, profile: &NewCustomer) {
    if let Err(e) = show_cart_inner(bot, deps, chat_id, profile).await {
        log::error!("Failed to show cart for chat {}: {}", chat_id, e);
        send_text(bot, chat_id, TRY_AGAIN).await;
    }
}

async fn show_cart_inner(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, profile: &NewCustomer) -> AppResult<()> {
    let customer = resolve_customer(deps, profile).await?;
    let cart = deps.api.cart(&customer.id).await?;

    let cart = match cart {
        Some(cart) if !cart.is_empty() => cart,
        _ => {
            bot.send_message(chat_id, "🛒 Ваша корзина пуста").await?;
            return Ok(());
        }
    };

    let mut text = String::from("🛒 <b>Ваша корзина:</b>\n\n");
    for item in &cart.items {
        text.push_str(&format!(
            "{} ×{} — {} ₽\n",
            escape_html(&item.product.name),
            item.quantity,
            format_price(item.subtotal()),
        ));
    }
    text.push_str(&format!("\n💰 <b>Итого: {} ₽</b>", format_price(cart.total())));

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboards::cart_keyboard())
        .await?;
    Ok(())
}

/// The chat's recent orders, newest first, in a single message
pub async fn show_orders(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, profile: &NewCustomer) {
    if let Err(e) = show_orders_inner(bot, deps, chat_id, profile).await {
        log::error!("Failed to show orders for chat {}: {}", chat_id, e);
        send_text(bot, chat_id, TRY_AGAIN).await;
    }
}

async fn show_orders_inner(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, profile: &NewCustomer) -> AppResult<()> {
    let customer = resolve_customer(deps, profile).await?;
    let orders = deps.api.orders(&deps.bot_id, &customer.id).await?;

    if orders.is_empty() {
        bot.send_message(chat_id, "У вас пока нет заказов").await?;
        return Ok(());
    }

    let mut blocks = Vec::new();
    for order in orders.iter().take(5) {
        let mut block = format!(
            "📦 Заказ #{}\nСтатус: {}\nСумма: {} ₽",
            escape_html(&order.order_number),
            escape_html(order.status_name()),
            format_price(order.total),
        );
        if let Some(created_at) = order.created_at {
            block.push_str(&format!("\nДата: {}", created_at.format("%d.%m.%Y")));
        }
        blocks.push(block);
    }

    bot.send_message(chat_id, blocks.join("\n\n"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
