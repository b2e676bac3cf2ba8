use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

const COMMAND_FALLBACK: &str = "other";
const MAX_COMMAND_LEN: usize = 32;
const MAX_COMMAND_KEYS: usize = 64;

static VOTES_RECORDED: AtomicU64 = AtomicU64::new(0);
static VOTES_REJECTED: AtomicU64 = AtomicU64::new(0);
static WINDOW_RESETS: AtomicU64 = AtomicU64::new(0);
static PERSIST_FAILURES: AtomicU64 = AtomicU64::new(0);
static NOTIFY_FAILURES: AtomicU64 = AtomicU64::new(0);
static COMMANDS_BY_NAME: OnceLock<Mutex<HashMap<String, u64>>> = OnceLock::new();

fn lock_commands_by_name() -> std::sync::MutexGuard<'static, HashMap<String, u64>> {
    match COMMANDS_BY_NAME.get_or_init(|| Mutex::new(HashMap::new())).lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn normalize_command(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('/').to_ascii_lowercase();
    if trimmed.is_empty() || trimmed.len() > MAX_COMMAND_LEN {
        return COMMAND_FALLBACK.to_string();
    }
    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-' || ch == ' ')
    {
        return COMMAND_FALLBACK.to_string();
    }
    trimmed
}

pub fn vote_recorded() {
    VOTES_RECORDED.fetch_add(1, Ordering::Relaxed);
}

pub fn vote_rejected() {
    VOTES_REJECTED.fetch_add(1, Ordering::Relaxed);
}

pub fn windows_reset(count: usize) {
    WINDOW_RESETS.fetch_add(count as u64, Ordering::Relaxed);
}

pub fn persist_failed() {
    PERSIST_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn notification_failed() {
    NOTIFY_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn command_invoked(name: &str) {
    let mut normalized = normalize_command(name);
    let mut by_name = lock_commands_by_name();
    if !by_name.contains_key(&normalized) && by_name.len() >= MAX_COMMAND_KEYS {
        normalized = COMMAND_FALLBACK.to_string();
    }
    let entry = by_name.entry(normalized).or_insert(0);
    *entry = entry.saturating_add(1);
}

#[derive(Clone, Debug, Default)]
pub struct MetricsSnapshot {
    pub votes_recorded: u64,
    pub votes_rejected: u64,
    pub window_resets: u64,
    pub persist_failures: u64,
    pub notification_failures: u64,
    pub commands_by_name: Vec<(String, u64)>,
}

pub fn metrics_snapshot() -> MetricsSnapshot {
    let mut commands_by_name: Vec<(String, u64)> = lock_commands_by_name()
        .iter()
        .map(|(name, count)| (name.clone(), *count))
        .collect();
    commands_by_name.sort_by(|a, b| a.0.cmp(&b.0));

    MetricsSnapshot {
        votes_recorded: VOTES_RECORDED.load(Ordering::Relaxed),
        votes_rejected: VOTES_REJECTED.load(Ordering::Relaxed),
        window_resets: WINDOW_RESETS.load(Ordering::Relaxed),
        persist_failures: PERSIST_FAILURES.load(Ordering::Relaxed),
        notification_failures: NOTIFY_FAILURES.load(Ordering::Relaxed),
        commands_by_name,
    }
}
