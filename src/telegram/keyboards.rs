//! Inline and reply keyboard construction
//!
//! Product listings paginate at a fixed page size with two buttons per row;
//! navigation controls carry `catpage_` payloads and the page indicator is
//! an inert `noop` button.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::api::types::{Category, Menu, Product};
use crate::core::config;
use crate::telegram::html::format_price;

/// Number of product pages needed for `total` items; never zero, so an
/// empty listing still renders page 1/1
pub fn page_count(total: usize) -> usize {
    total.div_ceil(config::catalog::PAGE_SIZE).max(1)
}

/// Clamp a requested page into the valid range for `total` items
pub fn clamp_page(total: usize, page: usize) -> usize {
    page.min(page_count(total) - 1)
}

/// Reply keyboard for the tenant's main menu
pub fn main_menu_keyboard(menu: &Menu) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = menu
        .buttons
        .iter()
        .map(|row| row.iter().map(|b| KeyboardButton::new(b.label())).collect())
        .collect();
    KeyboardMarkup::new(rows).resize_keyboard()
}

/// One category per row, full width for long merchant-set names
pub fn categories_keyboard(categories: &[Category]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = categories
        .iter()
        .map(|c| vec![InlineKeyboardButton::callback(c.label(), format!("category_{}", c.id))])
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Paginated product listing for one category
///
/// `page` must already be clamped. Navigation row appears only when there
/// is more than one page; prev/next buttons appear only where a previous or
/// next page exists.
pub fn product_page_keyboard(category_id: &str, products: &[Product], page: usize) -> InlineKeyboardMarkup {
    let pages = page_count(products.len());
    let start = page * config::catalog::PAGE_SIZE;
    let page_items = products
        .iter()
        .skip(start)
        .take(config::catalog::PAGE_SIZE);

    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    let mut row: Vec<InlineKeyboardButton> = Vec::new();
    for product in page_items {
        row.push(InlineKeyboardButton::callback(
            format!("{} — {} ₽", product.name, format_price(product.price)),
            format!("product_{}", product.id),
        ));
        if row.len() == config::catalog::PAGE_COLUMNS {
            rows.push(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }

    if pages > 1 {
        let mut nav = Vec::new();
        if page > 0 {
            nav.push(InlineKeyboardButton::callback(
                "◀️",
                format!("catpage_{}_{}", category_id, page - 1),
            ));
        }
        nav.push(InlineKeyboardButton::callback(format!("{}/{}", page + 1, pages), "noop"));
        if page + 1 < pages {
            nav.push(InlineKeyboardButton::callback(
                "▶️",
                format!("catpage_{}_{}", category_id, page + 1),
            ));
        }
        rows.push(nav);
    }

    rows.push(vec![InlineKeyboardButton::callback("⬅️ К категориям", "back_to_catalog")]);
    InlineKeyboardMarkup::new(rows)
}

/// Buttons under a product card; the back button returns to the last
/// viewed category when one is known
pub fn product_card_keyboard(product_id: &str, back_category_id: Option<&str>) -> InlineKeyboardMarkup {
    let back = match back_category_id {
        Some(category_id) => {
            InlineKeyboardButton::callback("⬅️ Назад", format!("category_{}", category_id))
        }
        None => InlineKeyboardButton::callback("⬅️ К категориям", "back_to_catalog"),
    };
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🛒 Добавить в корзину",
            format!("add_to_cart_{}", product_id),
        )],
        vec![back],
    ])
}

pub fn cart_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "✅ Оформить заказ",
        "checkout",
    )]])
}

pub fn payment_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("💵 Наличные при получении", "payment_cash")],
        vec![InlineKeyboardButton::callback("💳 Перевод на карту", "payment_bank")],
    ])
}

/// Admin affordance attached to support-ticket notifications
pub fn support_reply_keyboard(ticket_id: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "✍️ Ответить",
        format!("support_reply_{}", ticket_id),
    )]])
}
