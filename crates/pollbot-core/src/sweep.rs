use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::dispatch::{Dispatcher, Followup};
use crate::observability;
use crate::platform::ChatPlatform;
use crate::AppState;

/// Reset every poll whose window has ended. Returns the ids that were reset.
pub fn sweep_windows(state: &AppState, now: DateTime<Utc>) -> Vec<i64> {
    let mut reset = Vec::new();
    for id in state.store.ids() {
        // A poll cancelled between `ids` and `update` is simply skipped.
        if let Ok(true) = state
            .store
            .update(id, |poll| state.engine.ensure_current_window(poll, now))
        {
            tracing::debug!(poll_id = id, "Weekly window reset");
            reset.push(id);
        }
    }
    observability::windows_reset(reset.len());
    reset
}

/// Sweep, persist, and re-render public posts that show live counts.
pub async fn run_sweep<P: ChatPlatform>(dispatcher: &Dispatcher<P>, now: DateTime<Utc>) -> usize {
    let state = dispatcher.state();
    let reset = sweep_windows(state, now);
    if reset.is_empty() {
        return 0;
    }
    tracing::info!(polls = reset.len(), "Reset weekly vote windows");
    state.store.persist_or_log().await;

    let count = reset.len();
    if state.settings.echo_counts_publicly {
        let refreshes = reset
            .into_iter()
            .map(|poll_id| Followup::RefreshPublicPoll { poll_id })
            .collect();
        dispatcher.run_followups(refreshes).await;
    }
    count
}

/// Spawn the periodic sweep. The first tick fires immediately, which also
/// catches up on windows that rolled over while the bot was down.
pub fn spawn_sweeper<P: ChatPlatform>(dispatcher: Dispatcher<P>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            run_sweep(&dispatcher, Utc::now()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Ballot, PollDraft, VoteEngine};
    use crate::persistence::{MemoryMedium, SnapshotMedium};
    use crate::store::PollStore;
    use crate::testing::{Call, FakePlatform};
    use crate::PollSettings;
    use chrono::{TimeDelta, TimeZone};
    use pollbot_models::poll::VoteChoice;
    use std::sync::Arc;

    fn sweeper_with_polls(
        medium: MemoryMedium,
        created: DateTime<Utc>,
        echo: bool,
    ) -> (Dispatcher<FakePlatform>, Arc<FakePlatform>) {
        let engine = VoteEngine::default();
        let store = PollStore::new(SnapshotMedium::Memory(medium));
        for id in [1, 2] {
            let mut poll = engine
                .allocate(
                    PollDraft {
                        title: format!("Poll {id}"),
                        description: None,
                        option1: "A".into(),
                        option2: Some("B".into()),
                        channel_id: 9,
                    },
                    created,
                )
                .unwrap()
                .bind(id);
            engine
                .cast_vote(
                    &mut poll,
                    Ballot {
                        user_id: 100,
                        display_name: "V".into(),
                        username: "v".into(),
                        choice: VoteChoice::Second,
                        reason: String::new(),
                    },
                    created,
                )
                .unwrap();
            store.put(poll);
        }
        let settings = PollSettings {
            echo_counts_publicly: echo,
            ..PollSettings::default()
        };
        let platform = Arc::new(FakePlatform::default());
        let state = AppState::new(store, engine, settings);
        (Dispatcher::new(state, platform.clone()), platform)
    }

    #[tokio::test]
    async fn sweep_resets_stale_polls_and_persists() {
        let wednesday = Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap();
        let medium = MemoryMedium::new();
        let (dispatcher, platform) = sweeper_with_polls(medium.clone(), wednesday, false);

        assert_eq!(run_sweep(&dispatcher, wednesday + TimeDelta::days(1)).await, 0);
        assert!(medium.saved().is_none());

        let next_week = wednesday + TimeDelta::days(5);
        assert_eq!(run_sweep(&dispatcher, next_week).await, 2);
        let saved = medium.saved().expect("sweep should persist");
        assert!(saved.poll_stats.values().all(|p| p.counts.total() == 0));
        // Counts are hidden, so the public posts are left alone.
        assert!(platform.calls().is_empty());

        assert_eq!(run_sweep(&dispatcher, next_week).await, 0);
    }

    #[tokio::test]
    async fn sweep_refreshes_public_counts_when_echo_enabled() {
        let wednesday = Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap();
        let (dispatcher, platform) = sweeper_with_polls(MemoryMedium::new(), wednesday, true);

        assert_eq!(run_sweep(&dispatcher, wednesday + TimeDelta::days(5)).await, 2);

        let mut calls = platform.calls();
        calls.sort_by_key(|call| match call {
            Call::Edit(_, message_id, _) => *message_id,
            _ => i64::MAX,
        });
        assert_eq!(calls, vec![Call::Edit(9, 1, 2), Call::Edit(9, 2, 2)]);
        let edited = platform.edited.lock().unwrap().clone();
        assert!(edited
            .iter()
            .all(|payload| payload.embeds[0].fields[1].value == "0"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_task_runs_on_interval() {
        let long_ago = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let medium = MemoryMedium::new();
        let (dispatcher, _) = sweeper_with_polls(medium.clone(), long_ago, false);

        let handle = spawn_sweeper(dispatcher.clone(), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.abort();

        assert!(medium.saved().is_some());
        assert_eq!(dispatcher.state().store.get(1).unwrap().counts.total(), 0);
    }
}
