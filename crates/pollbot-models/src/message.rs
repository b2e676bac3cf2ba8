use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::embed::Embed;

/// Message flag: only the invoking user can see the reply.
pub const MESSAGE_FLAG_EPHEMERAL: u32 = 1 << 6;

/// The subset of a platform message the bot reads back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(with = "crate::snowflake")]
    pub id: i64,
    #[serde(with = "crate::snowflake")]
    pub channel_id: i64,
}

/// Body for creating or editing a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// Serialized even when empty so that an edit can strip buttons.
    #[serde(default)]
    pub components: Vec<Component>,
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }
}
