use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot runtime

/// Base URL of the platform REST backend, including the `/api` prefix
/// Read once at startup from the STORE_API_URL environment variable
pub static STORE_API_URL: Lazy<String> =
    Lazy::new(|| env::var("STORE_API_URL").unwrap_or_else(|_| "http://localhost:3001/api".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "lavka.log".to_string()));

/// Fleet reconciliation configuration
pub mod fleet {
    use super::{env, Duration, Lazy};

    /// Default interval between desired-state polls (in seconds)
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

    /// Interval between desired-state polls, tunable via FLEET_POLL_INTERVAL_SECS
    pub static POLL_INTERVAL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("FLEET_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
    });

    /// How long to wait for a bot instance to wind down before abandoning it
    pub const STOP_TIMEOUT_SECS: u64 = 5;

    /// Poll interval duration
    pub fn poll_interval() -> Duration {
        Duration::from_secs(*POLL_INTERVAL_SECS)
    }

    /// Instance stop timeout duration
    pub fn stop_timeout() -> Duration {
        Duration::from_secs(STOP_TIMEOUT_SECS)
    }
}

/// Catalog rendering configuration
pub mod catalog {
    /// Products shown per page of an inline keyboard
    pub const PAGE_SIZE: usize = 8;

    /// Product buttons per keyboard row
    pub const PAGE_COLUMNS: usize = 2;
}

/// Broadcast fan-out configuration
pub mod broadcast {
    use super::Duration;

    /// Delay between consecutive sends (in milliseconds)
    /// Keeps throughput under the transport's ~30 messages/sec limit
    pub const SEND_DELAY_MS: u64 = 35;

    /// Inter-send delay duration
    pub fn send_delay() -> Duration {
        Duration::from_millis(SEND_DELAY_MS)
    }
}

/// Session store configuration
pub mod session {
    use super::Duration;

    /// Soft cap on tracked sessions per bot instance; beyond this, idle
    /// entries become eligible for eviction
    pub const MAX_SESSIONS: usize = 10_000;

    /// Age after which an idle session may be evicted (in seconds)
    pub const IDLE_EVICT_AFTER_SECS: u64 = 3600;

    /// Idle eviction age duration
    pub fn idle_evict_after() -> Duration {
        Duration::from_secs(IDLE_EVICT_AFTER_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for backend HTTP requests (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
