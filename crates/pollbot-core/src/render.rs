//! Builds every message and interaction reply the bot sends.

use chrono::{DateTime, Utc};
use pollbot_models::component::{ButtonStyle, Component, TextInputStyle};
use pollbot_models::config::BotConfig;
use pollbot_models::embed::Embed;
use pollbot_models::interaction::{InteractionCallbackData, InteractionResponse};
use pollbot_models::message::{MessagePayload, MESSAGE_FLAG_EPHEMERAL};
use pollbot_models::poll::{Poll, VoteChoice, VoteCounts, VoteRecord, VoteTally};

use crate::activity::ActivityEntry;
use crate::custom_id::{CustomId, REASON_INPUT};
use crate::engine::PendingPoll;
use crate::observability::MetricsSnapshot;
use crate::platform::UserProfile;
use crate::window::WeekWindow;

const COLOR_POLL: u32 = 0xf1c40f;
const COLOR_HELP: u32 = 0x3498db;
const COLOR_ADMIN: u32 = 0x2c3e50;
const COLOR_NOTIFY: u32 = 0x2ecc71;

const REASON_MAX_LEN: u32 = 1000;
/// Embed field values are capped at 1024 characters.
const FIELD_VALUE_MAX: usize = 1024;
const EMBED_TITLE_MAX: usize = 256;

struct PollView<'a> {
    title: &'a str,
    description: Option<&'a str>,
    option1: &'a str,
    option2: Option<&'a str>,
}

fn poll_embed(view: &PollView<'_>, counts: Option<VoteCounts>, window: &WeekWindow) -> Embed {
    let title = truncate(&format!("📝 {}", view.title), EMBED_TITLE_MAX);
    let mut embed = Embed::new(title, COLOR_POLL);
    if let Some(description) = view.description {
        embed = embed.description(description);
    }
    let shown = |choice: VoteChoice| match counts {
        Some(counts) => counts.get(choice).to_string(),
        None => "🔒".to_string(),
    };
    embed = embed.field(format!("1️⃣ {}", view.option1), shown(VoteChoice::First), true);
    if let Some(option2) = view.option2 {
        embed = embed.field(format!("2️⃣ {option2}"), shown(VoteChoice::Second), true);
    }
    embed.footer(format!(
        "One vote per person per week · resets every {:?} 00:00 (UTC{})",
        window.anchor(),
        window.offset()
    ))
}

/// Placeholder post created before the poll id exists. It carries no buttons.
pub fn pending_poll(pending: &PendingPoll, window: &WeekWindow) -> MessagePayload {
    let view = PollView {
        title: pending.title(),
        description: pending.description(),
        option1: pending.option1(),
        option2: pending.option2(),
    };
    MessagePayload::embed(poll_embed(&view, None, window))
}

/// The public poll post with its vote buttons.
pub fn public_poll(poll: &Poll, window: &WeekWindow, show_counts: bool) -> MessagePayload {
    let view = PollView {
        title: &poll.title,
        description: poll.description.as_deref(),
        option1: &poll.option1,
        option2: poll.option2.as_deref(),
    };
    let counts = show_counts.then_some(poll.counts);

    let mut buttons = vec![Component::button(
        CustomId::VoteButton {
            poll_id: poll.id,
            choice: VoteChoice::First,
        }
        .encode(),
        &poll.option1,
        ButtonStyle::Primary,
    )];
    if let Some(option2) = poll.option2.as_deref() {
        buttons.push(Component::button(
            CustomId::VoteButton {
                poll_id: poll.id,
                choice: VoteChoice::Second,
            }
            .encode(),
            option2,
            ButtonStyle::Secondary,
        ));
    }

    MessagePayload {
        content: None,
        embeds: vec![poll_embed(&view, counts, window)],
        components: vec![Component::action_row(buttons)],
    }
}

/// Justification form shown after a vote button is pressed.
pub fn vote_form(poll: &Poll, choice: VoteChoice) -> InteractionResponse {
    let label = poll.option_label(choice).unwrap_or_default();
    let title: String = format!("Why {label}?").chars().take(45).collect();
    InteractionResponse::modal(
        CustomId::BallotForm {
            poll_id: poll.id,
            choice,
        }
        .encode(),
        title,
        vec![Component::action_row(vec![Component::text_input(
            REASON_INPUT,
            "Reason",
            TextInputStyle::Paragraph,
            REASON_MAX_LEN,
        )])],
    )
}

pub fn vote_recorded(poll: &Poll, choice: VoteChoice, tally: VoteTally, show_counts: bool) -> InteractionResponse {
    let label = poll.option_label(choice).unwrap_or_default();
    let mut text = format!("✅ Your vote for **{label}** has been recorded.");
    if show_counts {
        text.push_str(&format!(" ({} vote(s) so far this week)", tally.total));
    }
    InteractionResponse::ephemeral_text(text)
}

/// Audit message posted to the admin channel for each accepted vote.
pub fn admin_notification(
    poll: &Poll,
    record: &VoteRecord,
    profile: &UserProfile,
    tally: VoteTally,
) -> MessagePayload {
    let label = poll.option_label(record.choice).unwrap_or_default();
    let reason = if record.reason.trim().is_empty() {
        "(no reason given)".to_string()
    } else {
        truncate(&record.reason, FIELD_VALUE_MAX)
    };
    let mut embed = Embed::new("🔔 New vote", COLOR_NOTIFY)
        .description(format!(
            "**{}** (@{}) chose **{label}** on **{}**",
            profile.display_name, record.username, poll.title
        ))
        .field("Reason", reason, false)
        .field(
            "Tally this week",
            format!("{} / {} (total {})", tally.count1, tally.count2, tally.total),
            false,
        )
        .timestamp(record.timestamp);
    if let Some(url) = profile.avatar_url.as_deref() {
        embed = embed.thumbnail(url);
    }
    MessagePayload::embed(embed)
}

pub fn help() -> InteractionResponse {
    let embed = Embed::new("📖 Poll bot help", COLOR_HELP)
        .field("`/poll create`", "Post a new poll. Each member can vote once per week.", false)
        .field("`/channel`", "Choose the channel that receives vote notifications.", false)
        .field("`/log`", "Show recent bot activity.", false)
        .field("`/admin`", "Show bot status and configuration.", false)
        .field("`/cancel`", "Remove the most recently created poll.", false);
    reply_embed(embed, false)
}

pub fn admin_panel(
    config: &BotConfig,
    poll_count: usize,
    metrics: &MetricsSnapshot,
    window: &WeekWindow,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> InteractionResponse {
    let channel = config
        .admin_channel
        .map(|id| format!("<#{id}>"))
        .unwrap_or_else(|| "Not configured".to_string());
    let mut embed = Embed::new("⚙️ Bot admin panel", COLOR_ADMIN)
        .field("Log channel", channel, true)
        .field("Polls", poll_count.to_string(), true)
        .field("Status", format!("🟢 Up since {}", started_at.format("%Y-%m-%d %H:%M UTC")), true)
        .field(
            "Current window",
            format!(
                "{} → {}",
                window.current_window_start(now).format("%Y-%m-%d %H:%M UTC"),
                window.next_window_start(now).format("%Y-%m-%d %H:%M UTC")
            ),
            false,
        )
        .field(
            "Votes",
            format!(
                "{} recorded · {} duplicate(s) rejected · {} window reset(s)",
                metrics.votes_recorded, metrics.votes_rejected, metrics.window_resets
            ),
            false,
        )
        .field(
            "Failures",
            format!(
                "{} save · {} notification",
                metrics.persist_failures, metrics.notification_failures
            ),
            false,
        );
    if !metrics.commands_by_name.is_empty() {
        let usage = metrics
            .commands_by_name
            .iter()
            .map(|(name, count)| format!("`{name}` × {count}"))
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("Command usage", truncate(&usage, FIELD_VALUE_MAX), false);
    }
    reply_embed(embed, true)
}

pub fn recent_log(entries: &[ActivityEntry]) -> InteractionResponse {
    let body = if entries.is_empty() {
        "No activity yet.".to_string()
    } else {
        entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    };
    InteractionResponse::ephemeral_text(format!(
        "**Recent activity:**\n```\n{}\n```",
        truncate(&body, 1800)
    ))
}

fn reply_embed(embed: Embed, ephemeral: bool) -> InteractionResponse {
    InteractionResponse::message(InteractionCallbackData {
        embeds: vec![embed],
        flags: ephemeral.then_some(MESSAGE_FLAG_EPHEMERAL),
        ..InteractionCallbackData::default()
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
