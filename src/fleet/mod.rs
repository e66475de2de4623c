//! Fleet reconciliation: desired-state polling and instance lifecycle

pub mod manager;

pub use manager::{plan, FleetManager, ReconcilePlan};
