//! Bulk message fan-out with a fixed sequential throttle
//!
//! Correctness does not depend on throughput here, only on staying under
//! the transport's ~30 messages/sec limit, so a plain delay between sends
//! is enough. A failed recipient is counted and skipped; the rest of the
//! run continues.

use teloxide::prelude::*;
use tokio::time::sleep;

use crate::core::config;

/// Outcome of one broadcast run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.failed
    }
}

/// Send `text` to every recipient sequentially, spacing sends by the
/// configured delay
pub async fn broadcast_text(bot: &Bot, recipients: &[ChatId], text: &str) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for (i, &chat_id) in recipients.iter().enumerate() {
        if i > 0 {
            sleep(config::broadcast::send_delay()).await;
        }
        match bot.send_message(chat_id, text).await {
            Ok(_) => report.sent += 1,
            Err(e) => {
                report.failed += 1;
                log::warn!("Broadcast send to chat {} failed: {}", chat_id, e);
            }
        }
    }

    log::info!(
        "Broadcast finished: {} sent, {} failed of {}",
        report.sent,
        report.failed,
        recipients.len()
    );
    report
}
