//! Per-chat conversation state
//!
//! Each bot instance owns one `SessionStore`; nothing here is shared across
//! tenants, so stopping one instance can never disturb another's chats.
//! State is in-memory only: a restart drops in-flight checkouts by design.

use std::collections::HashMap;
use teloxide::types::ChatId;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::core::config;

/// Current step of a chat's multi-turn interaction
///
/// Each variant carries the fields accumulated so far, so a transition can
/// never leave the flow with half-parsed state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    /// Customer is paging through one category's products
    BrowsingCategory { category_id: String },
    /// Checkout: waiting for a phone number
    AwaitingPhone,
    /// Checkout: phone captured, waiting for a delivery address
    AwaitingAddress { phone: String },
    /// Checkout: waiting for a payment-method button tap
    AwaitingPaymentMethod { phone: String, address: String },
    /// Support: waiting for the customer's question
    AwaitingSupportMessage,
    /// Support: the admin chat is composing a reply to this ticket
    AwaitingSupportReply { ticket_id: String },
}

impl FlowState {
    pub fn is_idle(&self) -> bool {
        matches!(self, FlowState::Idle)
    }

    /// True while the flow is parked on a specific expected input; such
    /// states take routing priority over commands and menu buttons
    pub fn expects_input(&self) -> bool {
        matches!(
            self,
            FlowState::AwaitingPhone
                | FlowState::AwaitingAddress { .. }
                | FlowState::AwaitingPaymentMethod { .. }
                | FlowState::AwaitingSupportMessage
                | FlowState::AwaitingSupportReply { .. }
        )
    }
}

#[derive(Debug, Clone)]
struct Session {
    flow: FlowState,
    last_category_id: Option<String>,
    last_activity: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            flow: FlowState::Idle,
            last_category_id: None,
            last_activity: Instant::now(),
        }
    }
}

/// In-memory store of chat sessions, keyed by chat identity
///
/// Sessions are created lazily on first access and reset to `Idle` rather
/// than removed; chat identities are unbounded over a long-running process,
/// so idle entries past a configured age are evicted opportunistically once
/// the map grows past its soft cap.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<ChatId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current flow state for a chat, creating an `Idle` session if absent
    pub async fn flow(&self, chat_id: ChatId) -> FlowState {
        let mut sessions = self.inner.lock().await;
        sessions.entry(chat_id).or_insert_with(Session::new).flow.clone()
    }

    /// Replace a chat's flow state
    pub async fn set_flow(&self, chat_id: ChatId, flow: FlowState) {
        let mut sessions = self.inner.lock().await;
        Self::evict_if_crowded(&mut sessions);
        let session = sessions.entry(chat_id).or_insert_with(Session::new);
        session.flow = flow;
        session.last_activity = Instant::now();
    }

    /// Reset a chat to `Idle`; used on completion, cancellation and error
    /// recovery
    pub async fn clear(&self, chat_id: ChatId) {
        let mut sessions = self.inner.lock().await;
        if let Some(session) = sessions.get_mut(&chat_id) {
            session.flow = FlowState::Idle;
            session.last_activity = Instant::now();
        }
    }

    /// Remember the category a chat last viewed, for back-navigation from
    /// product cards
    pub async fn remember_category(&self, chat_id: ChatId, category_id: &str) {
        let mut sessions = self.inner.lock().await;
        Self::evict_if_crowded(&mut sessions);
        let session = sessions.entry(chat_id).or_insert_with(Session::new);
        session.last_category_id = Some(category_id.to_string());
        session.last_activity = Instant::now();
    }

    pub async fn last_category(&self, chat_id: ChatId) -> Option<String> {
        let sessions = self.inner.lock().await;
        sessions.get(&chat_id).and_then(|s| s.last_category_id.clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    /// Drop idle sessions that have aged out, but only once the map is
    /// past its soft cap; in-flight flows are never evicted
    fn evict_if_crowded(sessions: &mut HashMap<ChatId, Session>) {
        if sessions.len() < config::session::MAX_SESSIONS {
            return;
        }
        let cutoff = config::session::idle_evict_after();
        let now = Instant::now();
        sessions.retain(|_, s| !s.flow.is_idle() || now.duration_since(s.last_activity) < cutoff);
    }
}
