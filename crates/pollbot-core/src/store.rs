use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pollbot_models::config::BotConfig;
use pollbot_models::poll::Poll;
use pollbot_models::snapshot::Snapshot;
use std::sync::RwLock;
use tokio::sync::Mutex;

use crate::error::CoreError;
use crate::observability;
use crate::persistence::SnapshotMedium;

/// In-memory poll map plus bot config, backed by a snapshot medium.
///
/// Memory is authoritative: mutations apply here first and are then saved with
/// `persist`. Each poll is guarded by its map shard's lock, so `update` is the
/// atomic unit for check-window/vote/reset sequences.
pub struct PollStore {
    polls: DashMap<i64, Poll>,
    config: RwLock<BotConfig>,
    medium: SnapshotMedium,
    save_lock: Mutex<()>,
}

impl PollStore {
    pub fn new(medium: SnapshotMedium) -> Self {
        Self {
            polls: DashMap::new(),
            config: RwLock::new(BotConfig::default()),
            medium,
            save_lock: Mutex::new(()),
        }
    }

    /// Build a store from whatever the medium last saved.
    pub async fn load(medium: SnapshotMedium) -> Result<Self, CoreError> {
        let store = Self::new(medium);
        if let Some(snapshot) = store.medium.load().await? {
            tracing::info!(
                polls = snapshot.poll_stats.len(),
                last_update = %snapshot.last_update,
                "Loaded poll snapshot"
            );
            *write(&store.config) = snapshot.bot_config;
            for (id, mut poll) in snapshot.poll_stats {
                poll.id = id;
                store.polls.insert(id, poll);
            }
        } else {
            tracing::info!("No saved snapshot found, starting empty");
        }
        Ok(store)
    }

    pub fn medium(&self) -> &SnapshotMedium {
        &self.medium
    }

    pub fn get(&self, id: i64) -> Option<Poll> {
        self.polls.get(&id).map(|poll| poll.clone())
    }

    pub fn contains(&self, id: i64) -> bool {
        self.polls.contains_key(&id)
    }

    /// Insert or overwrite a poll under its own id.
    pub fn put(&self, poll: Poll) {
        self.polls.insert(poll.id, poll);
    }

    pub fn delete(&self, id: i64) -> Option<Poll> {
        self.polls.remove(&id).map(|(_, poll)| poll)
    }

    pub fn len(&self) -> usize {
        self.polls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polls.is_empty()
    }

    /// Every poll, oldest first.
    pub fn all(&self) -> Vec<Poll> {
        let mut polls: Vec<Poll> = self.polls.iter().map(|entry| entry.value().clone()).collect();
        polls.sort_by_key(Poll::creation_key);
        polls
    }

    pub fn ids(&self) -> Vec<i64> {
        self.polls.iter().map(|entry| *entry.key()).collect()
    }

    /// Run `f` against one poll while holding that poll's lock.
    ///
    /// `f` must not call back into the store.
    pub fn update<T>(&self, id: i64, f: impl FnOnce(&mut Poll) -> T) -> Result<T, CoreError> {
        let mut entry = self.polls.get_mut(&id).ok_or(CoreError::PollNotFound)?;
        Ok(f(entry.value_mut()))
    }

    /// Remove the most recently created poll.
    pub fn remove_latest(&self) -> Option<Poll> {
        let latest = self
            .polls
            .iter()
            .max_by_key(|entry| entry.value().creation_key())
            .map(|entry| *entry.key())?;
        self.delete(latest)
    }

    pub fn bot_config(&self) -> BotConfig {
        read(&self.config).clone()
    }

    pub fn set_admin_channel(&self, channel_id: Option<i64>) {
        write(&self.config).admin_channel = channel_id;
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        Snapshot {
            bot_config: self.bot_config(),
            poll_stats: self
                .polls
                .iter()
                .map(|entry| (*entry.key(), entry.value().clone()))
                .collect(),
            last_update: now,
        }
    }

    /// Save a fresh snapshot. Saves are serialized and each one captures state
    /// after acquiring the lock, so an older state never overwrites a newer one.
    pub async fn persist(&self) -> Result<(), CoreError> {
        let _guard = self.save_lock.lock().await;
        let snapshot = self.snapshot(Utc::now());
        self.medium.save(&snapshot).await
    }

    /// `persist`, with failures logged instead of returned.
    pub async fn persist_or_log(&self) -> bool {
        match self.persist().await {
            Ok(()) => true,
            Err(e) => {
                observability::persist_failed();
                tracing::warn!("Failed to persist poll snapshot: {e}");
                false
            }
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
