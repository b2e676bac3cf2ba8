use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::BotConfig;
use crate::poll::Poll;

/// The full persisted document: config, every poll keyed by id, and the save time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub bot_config: BotConfig,
    #[serde(default)]
    pub poll_stats: BTreeMap<i64, Poll>,
    #[serde(default)]
    pub last_update: DateTime<Utc>,
}
