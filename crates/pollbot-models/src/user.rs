use serde::{Deserialize, Serialize};

use crate::permissions::Permissions;

const CDN_BASE: &str = "https://cdn.discordapp.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(with = "crate::snowflake")]
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// Global display name, falling back to the username.
    pub fn display_name(&self) -> &str {
        self.global_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("{CDN_BASE}/avatars/{}/{hash}.png", self.id))
    }
}

/// Guild member attached to guild interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    /// Effective permissions in the interaction's channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
}
