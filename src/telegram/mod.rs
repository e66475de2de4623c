//! Telegram bot integration and handlers

pub mod broadcast;
pub mod callbacks;
pub mod catalog;
pub mod checkout;
pub mod handlers;
pub mod html;
pub mod instance;
pub mod keyboards;
pub mod notifications;
pub mod session;

// Re-exports for convenience
pub use broadcast::{broadcast_text, BroadcastReport};
pub use callbacks::{CallbackAction, PaymentMethod};
pub use handlers::{schema, Command, HandlerDeps, HandlerError};
pub use instance::BotInstance;
pub use session::{FlowState, SessionStore};
