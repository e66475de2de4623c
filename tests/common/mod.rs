//! Common test utilities
//!
//! Both external collaborators are wiremock servers: one standing in for
//! the Telegram Bot API, one for the platform backend. Handlers run for
//! real against them.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use teloxide::types::User;
use teloxide::Bot;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lavka::{HandlerDeps, SessionStore, StoreApi};

/// Bot pointed at a mock Telegram API server
pub fn test_bot(telegram: &MockServer) -> Bot {
    Bot::new("1234567890:TEST-TOKEN").set_api_url(telegram.uri().parse().unwrap())
}

/// Handler dependencies against a mock backend, with a fresh session store
pub fn test_deps(store: &MockServer, bot_id: &str) -> HandlerDeps {
    let api = Arc::new(StoreApi::new(store.uri()).unwrap());
    HandlerDeps::new(api, bot_id, Arc::new(SessionStore::new()))
}

/// A plausible sendMessage/editMessageText result payload
fn message_result() -> serde_json::Value {
    json!({
        "ok": true,
        "result": {
            "message_id": 42,
            "date": 1735992000,
            "chat": { "id": 42, "type": "private", "first_name": "Test" },
            "text": "ok"
        }
    })
}

/// Mount success responses for every Telegram method the handlers use
pub async fn mount_telegram(telegram: &MockServer) {
    // teloxide builds method URLs from the PascalCase payload name
    // (e.g. `/SendMessage`); match case-insensitively so the mounts line up.
    for api_method in ["sendMessage", "editMessageText", "sendPhoto"] {
        Mock::given(method("POST"))
            .and(path_regex(format!(r"(?i)^/bot[^/]+/{}$", api_method)))
            .respond_with(ResponseTemplate::new(200).set_body_json(message_result()))
            .mount(telegram)
            .await;
    }
    for api_method in ["answerCallbackQuery", "setMyCommands", "deleteWebhook"] {
        Mock::given(path_regex(format!(r"(?i)^/bot[^/]+/{}$", api_method)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
            .mount(telegram)
            .await;
    }
    // The dispatcher resolves its own identity before polling
    Mock::given(path_regex(r"(?i)^/bot[^/]+/getMe$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {
                "id": 123456789,
                "is_bot": true,
                "first_name": "Лавка",
                "username": "lavka_test_bot",
                "can_join_groups": true,
                "can_read_all_group_messages": false,
                "supports_inline_queries": false,
                "can_connect_to_business": false,
                "has_main_web_app": false
            }
        })))
        .mount(telegram)
        .await;
    Mock::given(path_regex(r"(?i)^/bot[^/]+/getUpdates$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": []})))
        .mount(telegram)
        .await;
}

/// A Telegram user as handlers see it
pub fn test_user(id: u64) -> User {
    serde_json::from_value(json!({
        "id": id,
        "is_bot": false,
        "first_name": "Иван",
        "last_name": "Петров",
        "username": "ivan"
    }))
    .unwrap()
}

/// Every text sent to the mock Telegram server, in order
pub async fn sent_texts(telegram: &MockServer) -> Vec<String> {
    telegram
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().to_ascii_lowercase().ends_with("/sendmessage"))
        .filter_map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).ok())
        .filter_map(|b| b.get("text").and_then(|t| t.as_str()).map(str::to_string))
        .collect()
}
