//! Catalog and cart rendering tests
//!
//! Run with: cargo test --test catalog_test

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use teloxide::types::ChatId;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{mount_telegram, sent_texts, test_bot, test_deps, test_user};
use lavka::telegram::handlers::profile_from_user;
use lavka::telegram::{catalog, FlowState};

const CHAT: ChatId = ChatId(42);

fn product_json(i: usize) -> serde_json::Value {
    json!({"id": format!("p{}", i), "name": format!("Товар {}", i), "price": 100, "images": []})
}

#[tokio::test]
async fn welcome_falls_back_when_the_backend_is_down() {
    let telegram = MockServer::start().await;
    mount_telegram(&telegram).await;
    let store = MockServer::start().await;
    // No mounts: every backend call 404s

    let bot = test_bot(&telegram);
    let deps = test_deps(&store, "b1");

    catalog::send_welcome(&bot, &deps, CHAT).await;

    let texts = sent_texts(&telegram).await;
    assert!(texts.iter().any(|t| t.contains("Добро пожаловать")));
}

#[tokio::test]
async fn empty_category_renders_a_message_not_a_keyboard() {
    let telegram = MockServer::start().await;
    mount_telegram(&telegram).await;
    let store = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bots/b1/products"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})),
        )
        .mount(&store)
        .await;

    let bot = test_bot(&telegram);
    let deps = test_deps(&store, "b1");

    catalog::show_category_page(&bot, &deps, CHAT, "c1", 0, None).await;

    let texts = sent_texts(&telegram).await;
    assert!(texts.iter().any(|t| t.contains("нет товаров")));
    // An empty category is not entered as a browsing state
    assert_eq!(deps.sessions.flow(CHAT).await, FlowState::Idle);
}

#[tokio::test]
async fn out_of_range_page_clamps_to_the_last() {
    let telegram = MockServer::start().await;
    mount_telegram(&telegram).await;
    let store = MockServer::start().await;
    let products: Vec<serde_json::Value> = (1..=17).map(product_json).collect();
    Mock::given(method("GET"))
        .and(path("/bots/b1/products"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": products})),
        )
        .mount(&store)
        .await;

    let bot = test_bot(&telegram);
    let deps = test_deps(&store, "b1");

    catalog::show_category_page(&bot, &deps, CHAT, "c1", 99, None).await;

    let request = telegram
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.url.path().to_ascii_lowercase().ends_with("/sendmessage"))
        .expect("no listing sent");
    let body = String::from_utf8_lossy(&request.body).to_string();

    // Landed on the last page: item 17, prev control, no next control
    assert!(body.contains("product_p17"));
    assert!(body.contains("catpage_c1_1"));
    assert!(!body.contains("catpage_c1_3"));

    assert_eq!(
        deps.sessions.flow(CHAT).await,
        FlowState::BrowsingCategory { category_id: "c1".into() }
    );
    assert_eq!(deps.sessions.last_category(CHAT).await, Some("c1".to_string()));
}

#[tokio::test]
async fn cart_renders_line_subtotals_and_grand_total() {
    let telegram = MockServer::start().await;
    mount_telegram(&telegram).await;
    let store = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/customers/bots/b1/telegram"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"id": "c1", "telegramId": "42", "firstName": "Иван"}
        })))
        .mount(&store)
        .await;
    Mock::given(method("GET"))
        .and(path("/carts/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"items": [
                {"quantity": 2, "product": {"id": "p1", "name": "Чай", "price": "100"}},
                {"quantity": 1, "product": {"id": "p2", "name": "Кофе", "price": 49.5}}
            ]}
        })))
        .mount(&store)
        .await;

    let bot = test_bot(&telegram);
    let deps = test_deps(&store, "b1");
    let profile = profile_from_user(&test_user(42));

    catalog::show_cart(&bot, &deps, CHAT, &profile).await;

    let texts = sent_texts(&telegram).await;
    let cart_text = texts.iter().find(|t| t.contains("корзина")).expect("no cart rendering");
    assert!(cart_text.contains("Чай ×2 — 200 ₽"));
    assert!(cart_text.contains("Кофе ×1 — 49.50 ₽"));
    assert!(cart_text.contains("Итого: 249.50 ₽"));
}

#[tokio::test]
async fn product_with_image_goes_out_as_a_photo_card() {
    let telegram = MockServer::start().await;
    mount_telegram(&telegram).await;
    let store = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "id": "p1",
                "name": "Чай чёрный",
                "description": "Цейлонский, 100 г",
                "price": "249.90",
                "images": [{"url": "/uploads/tea.jpg"}]
            }
        })))
        .mount(&store)
        .await;

    let bot = test_bot(&telegram);
    let deps = test_deps(&store, "b1");

    catalog::show_product(&bot, &deps, CHAT, "p1").await;

    let request = telegram
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.url.path().to_ascii_lowercase().ends_with("/sendphoto"))
        .expect("no photo sent");
    let body = String::from_utf8_lossy(&request.body).to_string();

    // Relative upload path resolved against the backend origin
    assert!(body.contains(&format!("{}/uploads/tea.jpg", store.uri())));
    assert!(body.contains("Чай чёрный"));
    assert!(body.contains("249.90"));
    assert!(body.contains("add_to_cart_p1"));
}

#[tokio::test]
async fn backend_failure_surfaces_as_a_retry_message() {
    let telegram = MockServer::start().await;
    mount_telegram(&telegram).await;
    let store = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bots/b1/categories"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&store)
        .await;

    let bot = test_bot(&telegram);
    let deps = test_deps(&store, "b1");

    catalog::show_catalog(&bot, &deps, CHAT).await;

    let texts = sent_texts(&telegram).await;
    assert!(texts.iter().any(|t| t.contains("Что-то пошло не так")));
}
