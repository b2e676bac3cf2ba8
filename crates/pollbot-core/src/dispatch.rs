//! Turns decoded commands into store/engine operations and platform calls.
//!
//! `dispatch` only does work that has to finish before the interaction is
//! answered. Everything else is returned as [`Followup`]s for the caller to
//! run after the response has been sent.

use chrono::{DateTime, Utc};
use pollbot_models::poll::{Poll, VoteChoice, VoteRecord};
use std::sync::Arc;

use crate::engine::{Ballot, PollDraft};
use crate::error::CoreError;
use crate::observability;
use crate::platform::{ChatPlatform, UserProfile};
use crate::render;
use crate::AppState;
use crate::RECENT_LOG_LIMIT;
use pollbot_models::interaction::InteractionResponse;

const UNKNOWN_VOTER: &str = "Unknown voter";

#[derive(Debug, Clone)]
pub struct Invoker {
    pub user_id: i64,
    pub username: String,
    /// Guild nickname or global name, when the platform sent one.
    pub display_name: Option<String>,
    pub is_admin: bool,
}

impl Invoker {
    fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    CreatePoll {
        title: String,
        option1: String,
        option2: Option<String>,
        description: Option<String>,
    },
    SetAdminChannel {
        channel_id: i64,
    },
    ShowAdminPanel,
    ShowRecentLog,
    CancelLatestPoll,
    /// Vote button pressed: validate, then ask for a reason.
    BeginVote {
        poll_id: i64,
        choice: VoteChoice,
    },
    /// Reason form submitted: record the vote.
    CastVote {
        poll_id: i64,
        choice: VoteChoice,
        reason: String,
    },
}

impl Command {
    /// Name shown in the activity log and used as the metrics key.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "/help",
            Command::CreatePoll { .. } => "/poll create",
            Command::SetAdminChannel { .. } => "/channel",
            Command::ShowAdminPanel => "/admin",
            Command::ShowRecentLog => "/log",
            Command::CancelLatestPoll => "/cancel",
            Command::BeginVote { .. } => "vote button",
            Command::CastVote { .. } => "vote form",
        }
    }

    fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::SetAdminChannel { .. }
                | Command::ShowAdminPanel
                | Command::ShowRecentLog
                | Command::CancelLatestPoll
        )
    }
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub invoker: Invoker,
    /// Channel the interaction came from.
    pub channel_id: Option<i64>,
    pub command: Command,
}

/// Work deferred until after the interaction response.
#[derive(Debug, Clone)]
pub enum Followup {
    NotifyAdmin {
        channel_id: i64,
        poll: Poll,
        record: VoteRecord,
    },
    /// Re-render the public post from whatever the store holds when this runs.
    RefreshPublicPoll {
        poll_id: i64,
    },
    DeletePublicPost {
        channel_id: i64,
        message_id: i64,
    },
}

#[derive(Debug)]
pub struct Outcome {
    pub response: InteractionResponse,
    pub followups: Vec<Followup>,
}

impl Outcome {
    fn reply(response: InteractionResponse) -> Self {
        Self {
            response,
            followups: Vec::new(),
        }
    }

    fn failed(err: &CoreError, command: &Command) -> Self {
        match err {
            CoreError::PollNotFound
            | CoreError::AlreadyVoted
            | CoreError::InvalidChoice(_)
            | CoreError::Forbidden
            | CoreError::BadRequest(_) => {
                tracing::debug!(command = command.name(), "Command rejected: {err}");
            }
            _ => tracing::warn!(command = command.name(), "Command failed: {err}"),
        }
        Self::reply(InteractionResponse::ephemeral_text(format!(
            "❌ {}",
            err.user_message()
        )))
    }
}

pub struct Dispatcher<P> {
    state: AppState,
    platform: Arc<P>,
}

impl<P> Clone for Dispatcher<P> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            platform: self.platform.clone(),
        }
    }
}

impl<P: ChatPlatform> Dispatcher<P> {
    pub fn new(state: AppState, platform: Arc<P>) -> Self {
        Self { state, platform }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn platform(&self) -> &Arc<P> {
        &self.platform
    }

    pub async fn dispatch(&self, invocation: Invocation, now: DateTime<Utc>) -> Outcome {
        let Invocation {
            invoker,
            channel_id,
            command,
        } = invocation;

        observability::command_invoked(command.name());
        self.state.activity.record(now, invoker.label(), command.name());

        if command.requires_admin() && !invoker.is_admin {
            return Outcome::failed(&CoreError::Forbidden, &command);
        }

        let result = match &command {
            Command::Help => Ok(Outcome::reply(render::help())),
            Command::CreatePoll {
                title,
                option1,
                option2,
                description,
            } => match channel_id {
                Some(channel_id) => {
                    let draft = PollDraft {
                        title: title.clone(),
                        description: description.clone(),
                        option1: option1.clone(),
                        option2: option2.clone(),
                        channel_id,
                    };
                    self.create_poll(draft, now).await
                }
                None => Err(CoreError::BadRequest(
                    "Polls can only be created in a channel.".into(),
                )),
            },
            Command::SetAdminChannel { channel_id } => self.set_admin_channel(*channel_id).await,
            Command::ShowAdminPanel => Ok(self.admin_panel(now)),
            Command::ShowRecentLog => Ok(Outcome::reply(render::recent_log(
                &self.state.activity.recent(RECENT_LOG_LIMIT),
            ))),
            Command::CancelLatestPoll => self.cancel_latest_poll().await,
            Command::BeginVote { poll_id, choice } => {
                self.begin_vote(&invoker, *poll_id, *choice, now).await
            }
            Command::CastVote {
                poll_id,
                choice,
                reason,
            } => {
                self.cast_vote(&invoker, *poll_id, *choice, reason.clone(), now)
                    .await
            }
        };

        result.unwrap_or_else(|err| Outcome::failed(&err, &command))
    }

    async fn create_poll(&self, draft: PollDraft, now: DateTime<Utc>) -> Result<Outcome, CoreError> {
        let channel_id = draft.channel_id;
        let window = *self.state.engine.window();
        let pending = self.state.engine.allocate(draft, now)?;

        let message_id = self
            .platform
            .create_message(channel_id, &render::pending_poll(&pending, &window))
            .await?;
        let poll = pending.bind(message_id);
        self.state.store.put(poll.clone());

        let payload = render::public_poll(&poll, &window, self.state.settings.echo_counts_publicly);
        if let Err(e) = self.platform.edit_message(channel_id, message_id, &payload).await {
            self.state.store.delete(message_id);
            if let Err(cleanup) = self.platform.delete_message(channel_id, message_id).await {
                tracing::warn!(message_id, "Failed to remove half-created poll post: {cleanup}");
            }
            return Err(e.into());
        }

        tracing::info!(poll_id = poll.id, channel_id, title = %poll.title, "Poll created");
        self.state.store.persist_or_log().await;
        Ok(Outcome::reply(InteractionResponse::ephemeral_text(format!(
            "✅ Poll **{}** created.",
            poll.title
        ))))
    }

    async fn set_admin_channel(&self, channel_id: i64) -> Result<Outcome, CoreError> {
        self.state.store.set_admin_channel(Some(channel_id));
        tracing::info!(channel_id, "Admin channel updated");
        self.state.store.persist_or_log().await;
        Ok(Outcome::reply(InteractionResponse::ephemeral_text(format!(
            "✅ Vote notifications will be sent to <#{channel_id}>."
        ))))
    }

    fn admin_panel(&self, now: DateTime<Utc>) -> Outcome {
        Outcome::reply(render::admin_panel(
            &self.state.store.bot_config(),
            self.state.store.len(),
            &observability::metrics_snapshot(),
            self.state.engine.window(),
            self.state.started_at,
            now,
        ))
    }

    async fn cancel_latest_poll(&self) -> Result<Outcome, CoreError> {
        let poll = self
            .state
            .store
            .remove_latest()
            .ok_or(CoreError::PollNotFound)?;
        tracing::info!(poll_id = poll.id, title = %poll.title, "Poll cancelled");
        self.state.store.persist_or_log().await;
        Ok(Outcome {
            response: InteractionResponse::ephemeral_text(format!(
                "🗑️ Poll **{}** has been cancelled.",
                poll.title
            )),
            followups: vec![Followup::DeletePublicPost {
                channel_id: poll.channel_id,
                message_id: poll.id,
            }],
        })
    }

    async fn begin_vote(
        &self,
        invoker: &Invoker,
        poll_id: i64,
        choice: VoteChoice,
        now: DateTime<Utc>,
    ) -> Result<Outcome, CoreError> {
        let engine = self.state.engine;
        let (reset, poll) = self.state.store.update(poll_id, |poll| {
            (engine.ensure_current_window(poll, now), poll.clone())
        })?;
        let mut followups = Vec::new();
        if reset {
            observability::windows_reset(1);
            self.state.store.persist_or_log().await;
            if self.state.settings.echo_counts_publicly {
                followups.push(Followup::RefreshPublicPoll { poll_id });
            }
        }
        if poll.has_voted(invoker.user_id) {
            observability::vote_rejected();
            return Err(CoreError::AlreadyVoted);
        }
        if poll.option_label(choice).is_none() {
            return Err(CoreError::InvalidChoice(choice.index()));
        }
        Ok(Outcome {
            response: render::vote_form(&poll, choice),
            followups,
        })
    }

    async fn cast_vote(
        &self,
        invoker: &Invoker,
        poll_id: i64,
        choice: VoteChoice,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<Outcome, CoreError> {
        let engine = self.state.engine;
        let ballot = Ballot {
            user_id: invoker.user_id,
            display_name: invoker.label().to_string(),
            username: invoker.username.clone(),
            choice,
            reason: reason.trim().to_string(),
        };
        let (reset, outcome) = self.state.store.update(poll_id, |poll| {
            let reset = engine.ensure_current_window(poll, now);
            let outcome = engine
                .cast_vote(poll, ballot, now)
                .map(|tally| (tally, poll.clone()));
            (reset, outcome)
        })?;
        if reset {
            observability::windows_reset(1);
        }
        let (tally, poll) = match outcome {
            Ok(voted) => voted,
            Err(err) => {
                if matches!(err, CoreError::AlreadyVoted) {
                    observability::vote_rejected();
                }
                if reset {
                    self.state.store.persist_or_log().await;
                }
                return Err(err);
            }
        };

        observability::vote_recorded();
        tracing::info!(poll_id, user_id = invoker.user_id, choice = choice.index(), "Vote recorded");
        self.state.store.persist_or_log().await;

        let show_counts = self.state.settings.echo_counts_publicly;
        let mut followups = Vec::new();
        if let Some(channel_id) = self.state.store.bot_config().admin_channel {
            if let Some(record) = poll.vote_log.last().cloned() {
                followups.push(Followup::NotifyAdmin {
                    channel_id,
                    poll: poll.clone(),
                    record,
                });
            }
        }
        if show_counts {
            followups.push(Followup::RefreshPublicPoll { poll_id });
        }

        Ok(Outcome {
            response: render::vote_recorded(&poll, choice, tally, show_counts),
            followups,
        })
    }

    /// Run deferred work. Failures are logged and never undo a recorded vote.
    pub async fn run_followups(&self, followups: Vec<Followup>) {
        for followup in followups {
            match followup {
                Followup::NotifyAdmin {
                    channel_id,
                    poll,
                    record,
                } => self.notify_admin(channel_id, &poll, &record).await,
                Followup::RefreshPublicPoll { poll_id } => self.refresh_public_poll(poll_id).await,
                Followup::DeletePublicPost {
                    channel_id,
                    message_id,
                } => {
                    if let Err(e) = self.platform.delete_message(channel_id, message_id).await {
                        tracing::warn!(message_id, "Failed to delete cancelled poll post: {e}");
                    }
                }
            }
        }
    }

    async fn refresh_public_poll(&self, poll_id: i64) {
        // Cancelled since the follow-up was queued.
        let Some(poll) = self.state.store.get(poll_id) else {
            return;
        };
        let payload = render::public_poll(&poll, self.state.engine.window(), true);
        if let Err(e) = self.platform.edit_message(poll.channel_id, poll.id, &payload).await {
            tracing::warn!(poll_id, "Failed to refresh public poll: {e}");
        }
    }

    async fn notify_admin(&self, channel_id: i64, poll: &Poll, record: &VoteRecord) {
        let profile = match self.platform.resolve_user(record.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::debug!(user_id = record.user_id, "Display name lookup failed: {e}");
                let display_name = Some(record.display_name.trim())
                    .filter(|name| !name.is_empty())
                    .unwrap_or(UNKNOWN_VOTER);
                UserProfile {
                    display_name: display_name.to_string(),
                    avatar_url: None,
                }
            }
        };
        let payload = render::admin_notification(poll, record, &profile, poll.tally());
        if let Err(e) = self.platform.create_message(channel_id, &payload).await {
            observability::notification_failed();
            tracing::warn!(poll_id = poll.id, channel_id, "Failed to deliver vote notification: {e}");
        }
    }
}
