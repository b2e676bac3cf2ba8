use serde::{Deserialize, Serialize};

/// Process-wide bot settings changed at runtime by admins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Channel that receives one audit message per vote.
    #[serde(default, with = "crate::snowflake::option")]
    pub admin_channel: Option<i64>,
}
