//! HTTP client for the backend REST API
//!
//! Thin request/response translation; no caching, no retries. Results are
//! read fresh on every call (stale-read tolerant by design) and any non-2xx
//! status becomes an `AppError::Api` for the caller to surface.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::types::*;
use crate::core::config;
use crate::core::error::{AppError, AppResult};

/// Client for the platform backend, shared by all bot instances
#[derive(Debug, Clone)]
pub struct StoreApi {
    http: reqwest::Client,
    base_url: String,
}

impl StoreApi {
    /// Create a client against the given base URL (including the `/api`
    /// prefix); a trailing slash is tolerated
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(config::network::timeout())
            .build()?;
        Ok(Self { http, base_url })
    }

    /// Create a client from the STORE_API_URL environment variable
    pub fn from_env() -> AppResult<Self> {
        Self::new(config::STORE_API_URL.as_str())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Resolve a possibly-relative image path against the backend origin
    ///
    /// The backend stores upload paths like `/uploads/abc.jpg`; the transport
    /// needs absolute URLs to attach photos.
    pub fn resolve_image_url(&self, raw: &str) -> String {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return raw.to_string();
        }
        let origin = self.base_url.strip_suffix("/api").unwrap_or(&self.base_url);
        format!("{}/{}", origin.trim_end_matches('/'), raw.trim_start_matches('/'))
    }

    async fn read<T: DeserializeOwned>(req: RequestBuilder) -> AppResult<T> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::api(status, body));
        }
        Ok(resp.json().await?)
    }

    async fn read_data<T: DeserializeOwned>(req: RequestBuilder, what: &str) -> AppResult<T> {
        let envelope: Envelope<T> = Self::read(req).await?;
        envelope
            .data
            .ok_or_else(|| AppError::MissingData(what.to_string()))
    }

    /// Fire a request where only the status matters
    async fn read_ack(req: RequestBuilder) -> AppResult<()> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::api(status, body));
        }
        Ok(())
    }

    // ─── Fleet ──────────────────────────────────────────────────────────

    /// Desired-state poll: every tenant bot that should be running.
    /// This endpoint returns a bare array, not the usual envelope.
    pub async fn active_bots(&self) -> AppResult<Vec<ActiveBot>> {
        Self::read(self.http.get(self.url("/bots/active"))).await
    }

    // ─── Catalog reads ──────────────────────────────────────────────────

    pub async fn bot_profile(&self, bot_id: &str) -> AppResult<BotProfile> {
        Self::read_data(self.http.get(self.url(&format!("/bots/{}", bot_id))), "bot profile").await
    }

    pub async fn welcome_template(&self, bot_id: &str) -> AppResult<Template> {
        let req = self
            .http
            .get(self.url(&format!("/bots/{}/templates", bot_id)))
            .query(&[("key", "welcome")]);
        Self::read_data(req, "welcome template").await
    }

    pub async fn menu(&self, bot_id: &str) -> AppResult<Menu> {
        Self::read_data(self.http.get(self.url(&format!("/bots/{}/menu", bot_id))), "menu").await
    }

    pub async fn categories(&self, bot_id: &str) -> AppResult<Vec<Category>> {
        Self::read_data(
            self.http.get(self.url(&format!("/bots/{}/categories", bot_id))),
            "categories",
        )
        .await
    }

    /// Products of a tenant, optionally narrowed to one category
    pub async fn products(&self, bot_id: &str, category_id: Option<&str>) -> AppResult<Vec<Product>> {
        let mut req = self.http.get(self.url(&format!("/bots/{}/products", bot_id)));
        if let Some(category_id) = category_id {
            req = req.query(&[("categoryId", category_id)]);
        }
        Self::read_data(req, "products").await
    }

    pub async fn product(&self, product_id: &str) -> AppResult<Product> {
        Self::read_data(self.http.get(self.url(&format!("/products/{}", product_id))), "product")
            .await
    }

    // ─── Customers ──────────────────────────────────────────────────────

    /// Get-or-create a customer keyed by Telegram identity; idempotent on
    /// the backend side, so double taps never mint a second record
    pub async fn get_or_create_customer(
        &self,
        bot_id: &str,
        profile: &NewCustomer,
    ) -> AppResult<Customer> {
        let req = self
            .http
            .post(self.url(&format!("/customers/bots/{}/telegram", bot_id)))
            .json(profile);
        Self::read_data(req, "customer").await
    }

    pub async fn set_customer_phone(&self, customer_id: &str, phone: &str) -> AppResult<Customer> {
        let req = self
            .http
            .patch(self.url(&format!("/customers/{}", customer_id)))
            .json(&json!({ "phone": phone }));
        Self::read_data(req, "customer").await
    }

    // ─── Cart ───────────────────────────────────────────────────────────

    /// A customer who never added anything has no cart at all; that reads
    /// as `None`, same as an empty one for flow purposes
    pub async fn cart(&self, customer_id: &str) -> AppResult<Option<Cart>> {
        let envelope: Envelope<Cart> =
            Self::read(self.http.get(self.url(&format!("/carts/{}", customer_id)))).await?;
        Ok(envelope.data)
    }

    pub async fn add_to_cart(
        &self,
        bot_id: &str,
        customer_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> AppResult<()> {
        let req = self.http.post(self.url("/carts")).json(&json!({
            "botId": bot_id,
            "customerId": customer_id,
            "productId": product_id,
            "quantity": quantity,
        }));
        Self::read_ack(req).await
    }

    /// Set a line's quantity; the backend deletes the line when it drops
    /// to zero or below
    pub async fn update_cart_item(
        &self,
        customer_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> AppResult<()> {
        let req = self
            .http
            .put(self.url(&format!("/carts/{}/items/{}", customer_id, product_id)))
            .json(&json!({ "quantity": quantity }));
        Self::read_ack(req).await
    }

    pub async fn clear_cart(&self, customer_id: &str) -> AppResult<()> {
        Self::read_ack(self.http.delete(self.url(&format!("/carts/{}", customer_id)))).await
    }

    // ─── Orders ─────────────────────────────────────────────────────────

    pub async fn create_order(&self, bot_id: &str, order: &NewOrder) -> AppResult<Order> {
        let req = self
            .http
            .post(self.url(&format!("/orders/bots/{}", bot_id)))
            .json(order);
        Self::read_data(req, "order").await
    }

    pub async fn orders(&self, bot_id: &str, customer_id: &str) -> AppResult<Vec<Order>> {
        let req = self
            .http
            .get(self.url(&format!("/bots/{}/orders", bot_id)))
            .query(&[("customerId", customer_id)]);
        Self::read_data(req, "orders").await
    }

    // ─── Support ────────────────────────────────────────────────────────

    pub async fn create_support_ticket(
        &self,
        bot_id: &str,
        customer_id: &str,
        message: &str,
    ) -> AppResult<SupportTicket> {
        let req = self
            .http
            .post(self.url(&format!("/support/bots/{}", bot_id)))
            .json(&json!({ "customerId": customer_id, "message": message }));
        Self::read_data(req, "support ticket").await
    }

    pub async fn support_ticket(&self, ticket_id: &str) -> AppResult<SupportTicket> {
        Self::read_data(
            self.http.get(self.url(&format!("/support/tickets/{}", ticket_id))),
            "support ticket",
        )
        .await
    }

    pub async fn add_ticket_message(&self, ticket_id: &str, message: &TicketMessage) -> AppResult<()> {
        let req = self
            .http
            .post(self.url(&format!("/support/tickets/{}/messages", ticket_id)))
            .json(message);
        Self::read_ack(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_urls_resolve_against_backend_origin() {
        let api = StoreApi::new("http://shop.example:3001/api").unwrap();

        assert_eq!(
            api.resolve_image_url("/uploads/tea.jpg"),
            "http://shop.example:3001/uploads/tea.jpg"
        );
        assert_eq!(
            api.resolve_image_url("uploads/tea.jpg"),
            "http://shop.example:3001/uploads/tea.jpg"
        );
        assert_eq!(
            api.resolve_image_url("https://cdn.example/tea.jpg"),
            "https://cdn.example/tea.jpg"
        );
    }

    #[test]
    fn trailing_slash_in_base_url_is_tolerated() {
        let api = StoreApi::new("http://localhost:3001/api/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:3001/api");
    }
}
