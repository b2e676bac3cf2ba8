use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VoteChoice {
    First = 1,
    Second = 2,
}

impl VoteChoice {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

impl Serialize for VoteChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for VoteChoice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::from_index(value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown VoteChoice: {value}")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCounts {
    pub option1: u32,
    pub option2: u32,
}

impl VoteCounts {
    pub fn get(&self, choice: VoteChoice) -> u32 {
        match choice {
            VoteChoice::First => self.option1,
            VoteChoice::Second => self.option2,
        }
    }

    pub fn increment(&mut self, choice: VoteChoice) {
        let slot = match choice {
            VoteChoice::First => &mut self.option1,
            VoteChoice::Second => &mut self.option2,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.option1.saturating_add(self.option2)
    }
}

/// Counts reported back to the caller after a successful vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub count1: u32,
    pub count2: u32,
    pub total: u32,
}

impl From<VoteCounts> for VoteTally {
    fn from(counts: VoteCounts) -> Self {
        Self {
            count1: counts.option1,
            count2: counts.option2,
            total: counts.total(),
        }
    }
}

/// One accepted vote, kept until the next window reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    #[serde(with = "crate::snowflake")]
    pub user_id: i64,
    pub display_name: String,
    pub username: String,
    pub choice: VoteChoice,
    /// Free-text justification typed into the vote form.
    #[serde(default)]
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    /// Id of the public poll message.
    #[serde(with = "crate::snowflake")]
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "op1")]
    pub option1: String,
    #[serde(default, alias = "op2")]
    pub option2: Option<String>,
    #[serde(rename = "createdInChannel", with = "crate::snowflake")]
    pub channel_id: i64,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub counts: VoteCounts,
    #[serde(default, with = "crate::snowflake::set")]
    pub voters: HashSet<i64>,
    /// Older snapshots predate the vote log; they load with an empty one.
    #[serde(default)]
    pub vote_log: Vec<VoteRecord>,
    #[serde(default)]
    pub window_start: DateTime<Utc>,
}

impl Poll {
    pub fn option_label(&self, choice: VoteChoice) -> Option<&str> {
        match choice {
            VoteChoice::First => Some(self.option1.as_str()),
            VoteChoice::Second => self.option2.as_deref(),
        }
    }

    pub fn has_voted(&self, user_id: i64) -> bool {
        self.voters.contains(&user_id)
    }

    pub fn tally(&self) -> VoteTally {
        VoteTally::from(self.counts)
    }

    /// Ordering key for "most recently created".
    pub fn creation_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.id)
    }
}
