//! Wire types for the backend REST API
//!
//! Field names follow the backend's camelCase JSON. Monetary fields come out
//! of the backend's ORM as either JSON numbers or decimal strings depending
//! on the column, so they go through a tolerant deserializer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Standard `{success, data}` envelope used by most backend responses
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[allow(dead_code)]
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
}

/// Deserialize a decimal that may arrive as a JSON number or a string
pub(crate) fn de_decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

/// One tenant bot from the desired-state poll (`GET /bots/active`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl ActiveBot {
    /// Token usable for launching an instance, if one is configured
    pub fn usable_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Tenant bot details (`GET /bots/:botId`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub admin_telegram_id: Option<String>,
    #[serde(default)]
    pub welcome_message: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// Message template (`GET /bots/:botId/templates?key=...`)
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub text: String,
}

/// One reply-keyboard button of the tenant's main menu
#[derive(Debug, Clone, Deserialize)]
pub struct MenuButton {
    pub text: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl MenuButton {
    /// Button label as shown to the customer, emoji prefix included
    pub fn label(&self) -> String {
        match self.emoji.as_deref() {
            Some(emoji) if !emoji.is_empty() => format!("{} {}", emoji, self.text),
            _ => self.text.clone(),
        }
    }
}

/// Main menu layout (`GET /bots/:botId/menu`)
#[derive(Debug, Clone, Deserialize)]
pub struct Menu {
    #[serde(default)]
    pub buttons: Vec<Vec<MenuButton>>,
}

/// Product category
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl Category {
    pub fn label(&self) -> String {
        match self.emoji.as_deref() {
            Some(emoji) if !emoji.is_empty() => format!("{} {}", emoji, self.name),
            _ => self.name.clone(),
        }
    }
}

/// Product image, order-sorted by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct ProductImage {
    pub url: String,
}

/// Product as returned by catalog reads
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "de_decimal")]
    pub price: f64,
    #[serde(default)]
    pub article: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

/// Customer record, keyed server-side by Telegram identity
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub telegram_id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Payload for customer get-or-create (`POST /customers/bots/:botId/telegram`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// One cart line
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub quantity: i64,
    pub product: Product,
}

impl CartItem {
    /// Line subtotal (unit price × quantity)
    pub fn subtotal(&self) -> f64 {
        self.product.price * self.quantity as f64
    }
}

/// Customer cart (`GET /carts/:customerId`); may be absent entirely
#[derive(Debug, Clone, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Order total as the sum over line subtotals
    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::subtotal).sum()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatus {
    pub name: String,
}

/// Order as returned by the backend, with generated number and computed total
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    #[serde(deserialize_with = "de_decimal")]
    pub total: f64,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Status name for rendering, with a placeholder when the backend
    /// returned none
    pub fn status_name(&self) -> &str {
        self.status.as_ref().map(|s| s.name.as_str()).unwrap_or("—")
    }
}

/// One line of an order submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub price: f64,
    pub quantity: i64,
    pub image_url: Option<String>,
}

/// Payload for order submission (`POST /orders/bots/:botId`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub payment_method: String,
    pub delivery_address: String,
    pub customer_comment: Option<String>,
}

/// Support ticket (`POST /support/bots/:botId`, `GET /support/tickets/:id`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicket {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
}

/// Payload for appending a message to a ticket
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketMessage {
    pub sender_type: String,
    pub sender_id: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_accepts_number_and_string() {
        let from_number: Product =
            serde_json::from_str(r#"{"id":"p1","name":"Чай","price":150}"#).unwrap();
        assert_eq!(from_number.price, 150.0);

        let from_string: Product =
            serde_json::from_str(r#"{"id":"p2","name":"Кофе","price":"249.90"}"#).unwrap();
        assert_eq!(from_string.price, 249.9);
    }

    #[test]
    fn decimal_rejects_garbage() {
        let result: Result<Product, _> =
            serde_json::from_str(r#"{"id":"p3","name":"x","price":"дорого"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn active_bot_token_must_be_non_blank() {
        let with_token: ActiveBot =
            serde_json::from_str(r#"{"id":"b1","name":"Shop","token":"123:abc","isActive":true}"#)
                .unwrap();
        assert_eq!(with_token.usable_token(), Some("123:abc"));

        let blank: ActiveBot =
            serde_json::from_str(r#"{"id":"b2","name":"Shop","token":"  ","isActive":true}"#).unwrap();
        assert_eq!(blank.usable_token(), None);

        let missing: ActiveBot =
            serde_json::from_str(r#"{"id":"b3","name":"Shop","isActive":true}"#).unwrap();
        assert_eq!(missing.usable_token(), None);
    }

    #[test]
    fn cart_total_sums_line_subtotals() {
        let cart: Cart = serde_json::from_str(
            r#"{"items":[
                {"quantity":2,"product":{"id":"p1","name":"a","price":"100"}},
                {"quantity":1,"product":{"id":"p2","name":"b","price":49.5}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(cart.total(), 249.5);
        assert!(!cart.is_empty());
    }
}
