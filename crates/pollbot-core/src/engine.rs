use chrono::{DateTime, Utc};
use pollbot_models::poll::{Poll, VoteChoice, VoteCounts, VoteRecord, VoteTally};
use std::collections::HashSet;

use crate::error::CoreError;
use crate::window::WeekWindow;

const MAX_TITLE_LEN: usize = 256;
const MAX_DESCRIPTION_LEN: usize = 2048;
/// Option labels double as button labels, which the platform caps at 80.
const MAX_OPTION_LEN: usize = 80;

/// User input for a new poll, before anything has been posted.
#[derive(Debug, Clone)]
pub struct PollDraft {
    pub title: String,
    pub description: Option<String>,
    pub option1: String,
    pub option2: Option<String>,
    pub channel_id: i64,
}

/// Poll state allocated before the public post exists.
///
/// It has no id, so it can't be stored; `bind` turns it into a `Poll` once the
/// platform has assigned the message id.
#[derive(Debug, Clone)]
pub struct PendingPoll {
    title: String,
    description: Option<String>,
    option1: String,
    option2: Option<String>,
    channel_id: i64,
    created_at: DateTime<Utc>,
    window_start: DateTime<Utc>,
}

impl PendingPoll {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn option1(&self) -> &str {
        &self.option1
    }

    pub fn option2(&self) -> Option<&str> {
        self.option2.as_deref()
    }

    pub fn channel_id(&self) -> i64 {
        self.channel_id
    }

    pub fn bind(self, id: i64) -> Poll {
        Poll {
            id,
            title: self.title,
            description: self.description,
            option1: self.option1,
            option2: self.option2,
            channel_id: self.channel_id,
            created_at: self.created_at,
            counts: VoteCounts::default(),
            voters: HashSet::new(),
            vote_log: Vec::new(),
            window_start: self.window_start,
        }
    }
}

/// A vote attempt with the voter metadata shown in the audit trail.
#[derive(Debug, Clone)]
pub struct Ballot {
    pub user_id: i64,
    pub display_name: String,
    pub username: String,
    pub choice: VoteChoice,
    pub reason: String,
}

/// Weekly one-vote-per-user rules. Holds no poll state itself; callers hand in
/// the poll under whatever lock they use.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoteEngine {
    window: WeekWindow,
}

impl VoteEngine {
    pub fn new(window: WeekWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> &WeekWindow {
        &self.window
    }

    /// Zero the poll's counters if a new window began since they were last
    /// reset. Returns `true` when a reset happened.
    pub fn ensure_current_window(&self, poll: &mut Poll, now: DateTime<Utc>) -> bool {
        let current = self.window.current_window_start(now);
        if poll.window_start >= current {
            return false;
        }
        poll.voters.clear();
        poll.counts = VoteCounts::default();
        poll.vote_log.clear();
        poll.window_start = current;
        true
    }

    pub fn cast_vote(
        &self,
        poll: &mut Poll,
        ballot: Ballot,
        now: DateTime<Utc>,
    ) -> Result<VoteTally, CoreError> {
        self.ensure_current_window(poll, now);

        if poll.has_voted(ballot.user_id) {
            return Err(CoreError::AlreadyVoted);
        }
        if poll.option_label(ballot.choice).is_none() {
            return Err(CoreError::InvalidChoice(ballot.choice.index()));
        }

        poll.counts.increment(ballot.choice);
        poll.vote_log.push(VoteRecord {
            user_id: ballot.user_id,
            display_name: ballot.display_name,
            username: ballot.username,
            choice: ballot.choice,
            reason: ballot.reason,
            timestamp: now,
        });
        poll.voters.insert(ballot.user_id);

        Ok(poll.tally())
    }

    /// First phase of poll creation: validate input and allocate state.
    pub fn allocate(&self, draft: PollDraft, now: DateTime<Utc>) -> Result<PendingPoll, CoreError> {
        let title = required_text(&draft.title, "Title", MAX_TITLE_LEN)?;
        let option1 = required_text(&draft.option1, "Option 1", MAX_OPTION_LEN)?;
        let option2 = optional_text(draft.option2.as_deref(), "Option 2", MAX_OPTION_LEN)?;
        let description =
            optional_text(draft.description.as_deref(), "Description", MAX_DESCRIPTION_LEN)?;

        Ok(PendingPoll {
            title,
            description,
            option1,
            option2,
            channel_id: draft.channel_id,
            created_at: now,
            window_start: self.window.current_window_start(now),
        })
    }
}

fn required_text(raw: &str, field: &str, max_len: usize) -> Result<String, CoreError> {
    optional_text(Some(raw), field, max_len)?
        .ok_or_else(|| CoreError::BadRequest(format!("{field} must not be empty.")))
}

fn optional_text(raw: Option<&str>, field: &str, max_len: usize) -> Result<Option<String>, CoreError> {
    let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > max_len {
        return Err(CoreError::BadRequest(format!(
            "{field} must be at most {max_len} characters."
        )));
    }
    Ok(Some(text.to_string()))
}
