//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for a tenant bot.
//! The handlers are organized in a testable way: integration tests build
//! the same handler tree as production code, against mock endpoints.

mod commands;
mod schema;
mod types;

pub use commands::{handle_command, menu_command_for, Command};
pub use schema::schema;
pub use types::{profile_from_message, profile_from_user, HandlerDeps, HandlerError};
