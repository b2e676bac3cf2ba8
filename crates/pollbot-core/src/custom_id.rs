//! `custom_id` strings attached to vote buttons and the justification form.
//!
//! Format: `<kind>:<poll id>:<choice>`, e.g. `vote:1203:2`.

use pollbot_models::poll::VoteChoice;

const VOTE_BUTTON: &str = "vote";
const BALLOT_FORM: &str = "ballot";

/// Text input inside the justification form.
pub const REASON_INPUT: &str = "reason";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomId {
    VoteButton { poll_id: i64, choice: VoteChoice },
    BallotForm { poll_id: i64, choice: VoteChoice },
}

impl CustomId {
    pub fn encode(&self) -> String {
        let (kind, poll_id, choice) = match self {
            CustomId::VoteButton { poll_id, choice } => (VOTE_BUTTON, poll_id, choice),
            CustomId::BallotForm { poll_id, choice } => (BALLOT_FORM, poll_id, choice),
        };
        format!("{kind}:{poll_id}:{}", choice.index())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(3, ':');
        let kind = parts.next()?;
        let poll_id = parts.next()?.parse::<i64>().ok()?;
        let choice = VoteChoice::from_index(parts.next()?.parse::<u8>().ok()?)?;
        match kind {
            VOTE_BUTTON => Some(CustomId::VoteButton { poll_id, choice }),
            BALLOT_FORM => Some(CustomId::BallotForm { poll_id, choice }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_and_parses() {
        let id = CustomId::BallotForm {
            poll_id: 1_300_000_000_000_000_000,
            choice: VoteChoice::Second,
        };
        assert_eq!(id.encode(), "ballot:1300000000000000000:2");
        assert_eq!(CustomId::parse(&id.encode()), Some(id));
    }

    #[test]
    fn rejects_malformed_ids() {
        assert_eq!(CustomId::parse("vote:12"), None);
        assert_eq!(CustomId::parse("vote:12:3"), None);
        assert_eq!(CustomId::parse("vote:abc:1"), None);
        assert_eq!(CustomId::parse("p_1_12"), None);
        assert_eq!(CustomId::parse("other:12:1"), None);
    }
}
