pub mod activity;
pub mod custom_id;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod observability;
pub mod persistence;
pub mod platform;
pub mod render;
pub mod store;
pub mod sweep;
pub mod window;

#[cfg(test)]
mod testing;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::activity::ActivityLog;
use crate::engine::VoteEngine;
use crate::store::PollStore;

/// Entries returned by the recent-activity command.
pub const RECENT_LOG_LIMIT: usize = 10;

/// Poll behaviour knobs read from the config file.
#[derive(Clone, Debug)]
pub struct PollSettings {
    /// Edit the public post with live counts after every vote.
    pub echo_counts_publicly: bool,
    pub recent_log_capacity: usize,
    pub sweep_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            echo_counts_publicly: false,
            recent_log_capacity: 100,
            sweep_interval: Duration::from_secs(300),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PollStore>,
    pub engine: VoteEngine,
    pub settings: PollSettings,
    pub activity: Arc<ActivityLog>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: PollStore, engine: VoteEngine, settings: PollSettings) -> Self {
        let activity = Arc::new(ActivityLog::new(settings.recent_log_capacity));
        Self {
            store: Arc::new(store),
            engine,
            settings,
            activity,
            started_at: Utc::now(),
        }
    }
}
