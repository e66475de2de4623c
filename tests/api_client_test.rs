//! Integration tests for the backend API client
//!
//! Run with: cargo test --test api_client_test

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lavka::api::types::NewCustomer;
use lavka::{AppError, StoreApi};

fn ivan() -> NewCustomer {
    NewCustomer {
        telegram_id: 42,
        username: Some("ivan".to_string()),
        first_name: "Иван".to_string(),
        last_name: None,
    }
}

#[tokio::test]
async fn active_bots_is_a_bare_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bots/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "b1", "name": "Чайная лавка", "token": "111:aaa", "isActive": true},
            {"id": "b2", "name": "Без токена", "token": null, "isActive": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let api = StoreApi::new(server.uri()).unwrap();
    let bots = api.active_bots().await.unwrap();

    assert_eq!(bots.len(), 2);
    assert_eq!(bots[0].usable_token(), Some("111:aaa"));
    assert_eq!(bots[1].usable_token(), None);
}

#[tokio::test]
async fn customer_get_or_create_returns_one_identity_for_repeat_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/customers/bots/b1/telegram"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"id": "c1", "telegramId": "42", "firstName": "Иван", "username": "ivan"}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let api = StoreApi::new(server.uri()).unwrap();
    let first = api.get_or_create_customer("b1", &ivan()).await.unwrap();
    let second = api.get_or_create_customer("b1", &ivan()).await.unwrap();

    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn absent_cart_reads_as_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/carts/c1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": null})),
        )
        .mount(&server)
        .await;

    let api = StoreApi::new(server.uri()).unwrap();
    assert!(api.cart("c1").await.unwrap().is_none());
}

#[tokio::test]
async fn cart_items_deserialize_with_string_prices() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/carts/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"items": [
                {"quantity": 2, "product": {"id": "p1", "name": "Чай", "price": "100"}}
            ]}
        })))
        .mount(&server)
        .await;

    let api = StoreApi::new(server.uri()).unwrap();
    let cart = api.cart("c1").await.unwrap().unwrap();
    assert_eq!(cart.total(), 200.0);
}

#[tokio::test]
async fn update_cart_item_sends_the_quantity_payload() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/carts/c1/items/p1"))
        .and(body_json(json!({"quantity": 0})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "message": "Cart updated"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = StoreApi::new(server.uri()).unwrap();
    api.update_cart_item("c1", "p1", 0).await.unwrap();
}

#[tokio::test]
async fn products_query_carries_the_category_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bots/b1/products"))
        .and(query_param("categoryId", "cat7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = StoreApi::new(server.uri()).unwrap();
    let products = api.products("b1", Some("cat7")).await.unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn backend_errors_become_api_errors_not_panics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bots/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "Bot not found"})),
        )
        .mount(&server)
        .await;

    let api = StoreApi::new(server.uri()).unwrap();
    let err = api.bot_profile("missing").await.unwrap_err();

    match err {
        AppError::Api { status, .. } => assert_eq!(status.as_u16(), 404),
        other => panic!("expected AppError::Api, got {:?}", other),
    }
}
