//! Typed client for the platform REST backend
//!
//! The runtime never talks to a database of its own: catalog, carts, orders,
//! customers and support tickets all live behind the backend's public bot
//! API. This module is the only place that knows the wire contract.

pub mod client;
pub mod types;

pub use client::StoreApi;
pub use types::{
    ActiveBot, BotProfile, Cart, CartItem, Category, Customer, Menu, MenuButton, NewCustomer,
    NewOrder, Order, OrderItem, Product, ProductImage, SupportTicket, TicketMessage,
};
