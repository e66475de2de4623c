//! Desired-state reconciliation over the running instance pool
//!
//! Every cycle re-fetches the full active-bots list and diffs it against
//! what is running; no incremental events. Simple, and adequate for tens to
//! low hundreds of tenants. The diff itself is a pure function so the
//! lifecycle rules are testable without any transport.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::time::interval;

use crate::api::types::ActiveBot;
use crate::api::StoreApi;
use crate::core::error::AppResult;
use crate::telegram::instance::BotInstance;

/// Actions one reconciliation cycle decided on
#[derive(Debug, Default, PartialEq)]
pub struct ReconcilePlan {
    /// Running bot ids that left the desired state
    pub to_stop: Vec<String>,
    /// Desired entries not yet running, token present
    pub to_start: Vec<ActiveBot>,
    /// Desired entries unusable for lack of a token
    pub skipped: Vec<String>,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.to_stop.is_empty() && self.to_start.is_empty()
    }
}

/// Diff the running set against the desired state
///
/// Rules:
/// - a running id absent from the desired state stops;
/// - a desired id not running starts, if its token is non-empty;
/// - tokenless entries are skipped, not errors;
/// - entries already running are left untouched even if other fields
///   changed, so live conversations survive the cycle;
/// - duplicate desired ids collapse to one instance.
pub fn plan(running: &HashSet<String>, desired: &[ActiveBot]) -> ReconcilePlan {
    let desired_ids: HashSet<&str> = desired.iter().map(|b| b.id.as_str()).collect();

    let mut to_stop: Vec<String> = running
        .iter()
        .filter(|id| !desired_ids.contains(id.as_str()))
        .cloned()
        .collect();
    to_stop.sort();

    let mut to_start = Vec::new();
    let mut skipped = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for bot in desired {
        if running.contains(&bot.id) || !seen.insert(bot.id.as_str()) {
            continue;
        }
        if bot.usable_token().is_some() {
            to_start.push(bot.clone());
        } else {
            skipped.push(bot.id.clone());
        }
    }

    ReconcilePlan { to_stop, to_start, skipped }
}

/// Owns the map of running bot instances and reconciles it against the
/// backend's desired state
pub struct FleetManager {
    api: Arc<StoreApi>,
    instances: HashMap<String, BotInstance>,
}

impl FleetManager {
    pub fn new(api: Arc<StoreApi>) -> Self {
        Self {
            api,
            instances: HashMap::new(),
        }
    }

    /// Ids of currently running instances
    pub fn running_ids(&self) -> HashSet<String> {
        self.instances.keys().cloned().collect()
    }

    /// One reconciliation cycle: fetch desired state and apply the diff
    ///
    /// A failed fetch skips the cycle; running bots keep running and the
    /// next interval retries.
    pub async fn reconcile(&mut self) -> AppResult<ReconcilePlan> {
        let desired = self.api.active_bots().await?;
        Ok(self.apply(&desired))
    }

    /// Apply lifecycle actions for a known desired state
    pub fn apply(&mut self, desired: &[ActiveBot]) -> ReconcilePlan {
        let decided = plan(&self.running_ids(), desired);

        for bot_id in &decided.to_stop {
            if let Some(instance) = self.instances.remove(bot_id) {
                log::info!("Stopping bot instance {}", bot_id);
                // Fire and forget: a tenant hanging in teardown must not
                // stall the rest of the cycle
                tokio::spawn(instance.stop());
            }
        }

        for bot_id in &decided.skipped {
            log::warn!("Bot {} is active but has no token, skipping", bot_id);
        }

        for bot in &decided.to_start {
            // plan() only emits entries with a usable token
            let Some(token) = bot.usable_token() else { continue };
            log::info!("Starting bot instance {} ({})", bot.id, bot.name);
            self.instances
                .insert(bot.id.clone(), BotInstance::launch(&bot.id, token, Arc::clone(&self.api)));
        }

        decided
    }

    /// Reconcile once at startup, then on the fixed interval, forever
    pub async fn run(mut self, poll_interval: std::time::Duration) {
        log::info!("Fleet manager polling every {:?}", poll_interval);
        let mut ticker = interval(poll_interval);
        loop {
            ticker.tick().await;
            match self.reconcile().await {
                Ok(decided) => {
                    if !decided.is_noop() {
                        log::info!(
                            "Reconciled fleet: {} started, {} stopped, {} running",
                            decided.to_start.len(),
                            decided.to_stop.len(),
                            self.instances.len()
                        );
                    }
                }
                Err(e) => {
                    log::error!("Desired-state fetch failed, skipping cycle: {}", e);
                }
            }
        }
    }

    /// Stop every running instance (process shutdown)
    pub async fn shutdown(&mut self) {
        for (bot_id, instance) in self.instances.drain() {
            log::info!("Stopping bot instance {}", bot_id);
            instance.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot(id: &str, token: Option<&str>) -> ActiveBot {
        serde_json::from_str(&format!(
            r#"{{"id":"{}","name":"{}","token":{},"isActive":true}}"#,
            id,
            id,
            token.map(|t| format!("\"{}\"", t)).unwrap_or_else(|| "null".to_string()),
        ))
        .unwrap()
    }

    fn running(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn stops_removed_keeps_running_starts_new() {
        let desired = [bot("B", Some("tok-b")), bot("C", Some("tok-c"))];
        let decided = plan(&running(&["A", "B"]), &desired);

        assert_eq!(decided.to_stop, vec!["A".to_string()]);
        assert_eq!(decided.to_start.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(), vec!["C"]);
        assert!(decided.skipped.is_empty());
    }

    #[test]
    fn unchanged_desired_state_is_a_noop() {
        let desired = [bot("B", Some("tok-b")), bot("C", Some("tok-c"))];
        let decided = plan(&running(&["B", "C"]), &desired);
        assert!(decided.is_noop());
    }

    #[test]
    fn tokenless_entries_are_skipped_not_started() {
        let desired = [bot("A", None), bot("B", Some("  ")), bot("C", Some("tok-c"))];
        let decided = plan(&running(&[]), &desired);

        assert_eq!(decided.to_start.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(), vec!["C"]);
        assert_eq!(decided.skipped, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn running_entry_is_never_restarted_on_field_changes() {
        // Same id, new name and token: presence alone drives lifecycle
        let desired = [bot("A", Some("rotated-token"))];
        let decided = plan(&running(&["A"]), &desired);
        assert!(decided.is_noop());
    }

    #[test]
    fn duplicate_desired_ids_collapse_to_one_start() {
        let desired = [bot("A", Some("t1")), bot("A", Some("t2"))];
        let decided = plan(&running(&[]), &desired);
        assert_eq!(decided.to_start.len(), 1);
    }

    #[test]
    fn empty_desired_state_stops_everything() {
        let decided = plan(&running(&["A", "B"]), &[]);
        assert_eq!(decided.to_stop, vec!["A".to_string(), "B".to_string()]);
        assert!(decided.to_start.is_empty());
    }
}
