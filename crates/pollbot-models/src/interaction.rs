use serde::{Deserialize, Serialize};

use crate::command::{ApplicationCommandType, CommandOptionType};
use crate::component::Component;
use crate::embed::Embed;
use crate::message::{Message, MESSAGE_FLAG_EPHEMERAL};
use crate::user::{Member, User};

wire_enum! {
    pub enum InteractionType: u8 {
        Ping = 1,
        ApplicationCommand = 2,
        MessageComponent = 3,
        ApplicationCommandAutocomplete = 4,
        ModalSubmit = 5,
    }
}

wire_enum! {
    pub enum InteractionCallbackType: u8 {
        Pong = 1,
        ChannelMessageWithSource = 4,
        DeferredChannelMessageWithSource = 5,
        DeferredUpdateMessage = 6,
        UpdateMessage = 7,
        ApplicationCommandAutocompleteResult = 8,
        Modal = 9,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedCommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub option_type: CommandOptionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub options: Vec<ResolvedCommandOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionData {
    /// Command name (for application command interactions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub command_type: Option<ApplicationCommandType>,
    #[serde(default)]
    pub options: Vec<ResolvedCommandOption>,
    /// Custom ID (for message component and modal interactions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_type: Option<u8>,
    /// Modal components (for modal submit)
    #[serde(default)]
    pub components: Vec<Component>,
}

impl InteractionData {
    /// Options of the invoked leaf command, descending through subcommands.
    pub fn leaf_options(&self) -> (Vec<&str>, &[ResolvedCommandOption]) {
        let mut path = Vec::new();
        let mut options = self.options.as_slice();
        while let [only] = options {
            match only.option_type {
                CommandOptionType::SubCommand | CommandOptionType::SubCommandGroup => {
                    path.push(only.name.as_str());
                    options = only.options.as_slice();
                }
                _ => break,
            }
        }
        (path, options)
    }
}

/// Looks up a string-valued option by name.
pub fn option_str<'a>(options: &'a [ResolvedCommandOption], name: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_ref())
        .and_then(|value| value.as_str())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(with = "crate::snowflake")]
    pub id: i64,
    #[serde(with = "crate::snowflake")]
    pub application_id: i64,
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionData>,
    #[serde(default, with = "crate::snowflake::option", skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<i64>,
    #[serde(default, with = "crate::snowflake::option", skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<Member>,
    /// Present for DM interactions; guild interactions carry `member.user`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub token: String,
    pub version: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Box<Message>>,
}

impl Interaction {
    pub fn invoker(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|member| member.user.as_ref())
            .or(self.user.as_ref())
    }

    /// Guild nickname, then global name, then username.
    pub fn invoker_display_name(&self) -> Option<&str> {
        let nick = self
            .member
            .as_ref()
            .and_then(|member| member.nick.as_deref())
            .filter(|nick| !nick.trim().is_empty());
        nick.or_else(|| self.invoker().map(User::display_name))
    }

    pub fn invoker_is_admin(&self) -> bool {
        self.member
            .as_ref()
            .and_then(|member| member.permissions)
            .is_some_and(|perms| perms.is_admin())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub response_type: InteractionCallbackType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionCallbackData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionCallbackData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    /// Modal title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Modal custom_id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            response_type: InteractionCallbackType::Pong,
            data: None,
        }
    }

    pub fn message(data: InteractionCallbackData) -> Self {
        Self {
            response_type: InteractionCallbackType::ChannelMessageWithSource,
            data: Some(data),
        }
    }

    pub fn ephemeral_text(content: impl Into<String>) -> Self {
        Self::message(InteractionCallbackData {
            content: Some(content.into()),
            flags: Some(MESSAGE_FLAG_EPHEMERAL),
            ..InteractionCallbackData::default()
        })
    }

    pub fn modal(custom_id: impl Into<String>, title: impl Into<String>, components: Vec<Component>) -> Self {
        Self {
            response_type: InteractionCallbackType::Modal,
            data: Some(InteractionCallbackData {
                custom_id: Some(custom_id.into()),
                title: Some(title.into()),
                components,
                ..InteractionCallbackData::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLASH_COMMAND: &str = r#"{
        "id": "1100",
        "application_id": "500",
        "type": 2,
        "guild_id": "7",
        "channel_id": "8",
        "token": "tok",
        "version": 1,
        "member": {
            "nick": "Captain",
            "permissions": "8",
            "user": {"id": "42", "username": "cap", "global_name": "Cap"}
        },
        "data": {
            "id": "900",
            "name": "poll",
            "type": 1,
            "options": [{
                "name": "create",
                "type": 1,
                "options": [
                    {"name": "title", "type": 3, "value": "Lunch?"},
                    {"name": "op1", "type": 3, "value": "Pho"}
                ]
            }]
        }
    }"#;

    #[test]
    fn decodes_guild_slash_command() {
        let interaction: Interaction = serde_json::from_str(SLASH_COMMAND).unwrap();
        assert_eq!(interaction.interaction_type, InteractionType::ApplicationCommand);
        assert_eq!(interaction.invoker().map(|u| u.id), Some(42));
        assert_eq!(interaction.invoker_display_name(), Some("Captain"));
        assert!(interaction.invoker_is_admin());

        let data = interaction.data.as_ref().unwrap();
        let (path, options) = data.leaf_options();
        assert_eq!(path, vec!["create"]);
        assert_eq!(option_str(options, "title"), Some("Lunch?"));
        assert_eq!(option_str(options, "op2"), None);
    }

    #[test]
    fn ephemeral_reply_sets_flag() {
        let json = serde_json::to_value(InteractionResponse::ephemeral_text("hi")).unwrap();
        assert_eq!(json["type"], 4);
        assert_eq!(json["data"]["flags"], 64);
    }

    #[test]
    fn pong_has_no_data() {
        let json = serde_json::to_value(InteractionResponse::pong()).unwrap();
        assert_eq!(json, serde_json::json!({"type": 1}));
    }
}
