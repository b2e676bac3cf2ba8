//! Maps platform interactions onto dispatcher commands, and describes the
//! slash commands the bot registers.

use pollbot_core::custom_id::{CustomId, REASON_INPUT};
use pollbot_core::dispatch::{Command, Invocation, Invoker};
use pollbot_models::command::{CommandDefinition, CommandOption, CommandOptionType};
use pollbot_models::component::Component;
use pollbot_models::interaction::{option_str, Interaction, InteractionData, InteractionType, ResolvedCommandOption};

use crate::error::ApiError;

const POLL: &str = "poll";
const POLL_CREATE: &str = "create";
const HELP: &str = "help";
const CHANNEL: &str = "channel";
const LOG: &str = "log";
const ADMIN: &str = "admin";
const CANCEL: &str = "cancel";

const OPT_TITLE: &str = "title";
const OPT_OPTION1: &str = "op1";
const OPT_OPTION2: &str = "op2";
const OPT_DESCRIPTION: &str = "description";
const OPT_CHANNEL: &str = "select";

pub fn command_definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(POLL, "Manage polls").option(
            CommandOption::new(POLL_CREATE, "Create a new weekly poll", CommandOptionType::SubCommand)
                .with_options(vec![
                    CommandOption::new(OPT_TITLE, "Poll title", CommandOptionType::String)
                        .required()
                        .max_length(256),
                    CommandOption::new(OPT_OPTION1, "First option", CommandOptionType::String)
                        .required()
                        .max_length(80),
                    CommandOption::new(OPT_OPTION2, "Second option", CommandOptionType::String)
                        .max_length(80),
                    CommandOption::new(OPT_DESCRIPTION, "Poll description", CommandOptionType::String)
                        .max_length(2048),
                ]),
        ),
        CommandDefinition::new(HELP, "Show the available commands"),
        CommandDefinition::new(CHANNEL, "Set the channel that receives vote notifications")
            .option(
                CommandOption::new(OPT_CHANNEL, "Notification channel", CommandOptionType::Channel)
                    .required(),
            )
            .admin_only(),
        CommandDefinition::new(LOG, "Show recent bot activity").admin_only(),
        CommandDefinition::new(ADMIN, "Show the admin panel").admin_only(),
        CommandDefinition::new(CANCEL, "Cancel the most recently created poll").admin_only(),
    ]
}

/// Decode a non-ping interaction.
pub fn decode(interaction: &Interaction) -> Result<Invocation, ApiError> {
    let user = interaction
        .invoker()
        .ok_or_else(|| ApiError::BadRequest("interaction has no user".into()))?;
    let invoker = Invoker {
        user_id: user.id,
        username: user.username.clone(),
        display_name: interaction.invoker_display_name().map(str::to_string),
        is_admin: interaction.invoker_is_admin(),
    };
    let data = interaction
        .data
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("interaction has no data".into()))?;

    let command = match interaction.interaction_type {
        InteractionType::ApplicationCommand => decode_command(data)?,
        InteractionType::MessageComponent => match parse_custom_id(data)? {
            CustomId::VoteButton { poll_id, choice } => Command::BeginVote { poll_id, choice },
            CustomId::BallotForm { .. } => return Err(ApiError::Unsupported),
        },
        InteractionType::ModalSubmit => match parse_custom_id(data)? {
            CustomId::BallotForm { poll_id, choice } => Command::CastVote {
                poll_id,
                choice,
                reason: Component::find_value(&data.components, REASON_INPUT)
                    .unwrap_or_default()
                    .to_string(),
            },
            CustomId::VoteButton { .. } => return Err(ApiError::Unsupported),
        },
        InteractionType::Ping | InteractionType::ApplicationCommandAutocomplete => {
            return Err(ApiError::Unsupported)
        }
    };

    Ok(Invocation {
        invoker,
        channel_id: interaction.channel_id,
        command,
    })
}

fn parse_custom_id(data: &InteractionData) -> Result<CustomId, ApiError> {
    data.custom_id
        .as_deref()
        .and_then(CustomId::parse)
        .ok_or(ApiError::Unsupported)
}

fn decode_command(data: &InteractionData) -> Result<Command, ApiError> {
    let name = data.name.as_deref().unwrap_or_default();
    let (path, options) = data.leaf_options();
    let command = match (name, path.as_slice()) {
        (POLL, [POLL_CREATE]) => Command::CreatePoll {
            title: required(options, OPT_TITLE)?,
            option1: required(options, OPT_OPTION1)?,
            option2: option_str(options, OPT_OPTION2).map(str::to_string),
            description: option_str(options, OPT_DESCRIPTION).map(str::to_string),
        },
        (HELP, []) => Command::Help,
        (CHANNEL, []) => Command::SetAdminChannel {
            channel_id: channel_option(options, OPT_CHANNEL)?,
        },
        (LOG, []) => Command::ShowRecentLog,
        (ADMIN, []) => Command::ShowAdminPanel,
        (CANCEL, []) => Command::CancelLatestPoll,
        _ => return Err(ApiError::Unsupported),
    };
    Ok(command)
}

fn required(options: &[ResolvedCommandOption], name: &str) -> Result<String, ApiError> {
    option_str(options, name)
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest(format!("missing option '{name}'")))
}

/// Channel options arrive as snowflake strings.
fn channel_option(options: &[ResolvedCommandOption], name: &str) -> Result<i64, ApiError> {
    let value = options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_ref());
    value
        .and_then(|v| match v {
            serde_json::Value::String(s) => s.parse().ok(),
            other => other.as_i64(),
        })
        .ok_or_else(|| ApiError::BadRequest(format!("missing option '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollbot_models::poll::VoteChoice;
    use serde_json::json;

    fn interaction(kind: u8, data: serde_json::Value, permissions: &str) -> Interaction {
        serde_json::from_value(json!({
            "id": "1",
            "application_id": "2",
            "type": kind,
            "channel_id": "50",
            "guild_id": "60",
            "token": "t",
            "version": 1,
            "member": {
                "permissions": permissions,
                "user": {"id": "10", "username": "ann", "global_name": "Ann"}
            },
            "data": data,
        }))
        .unwrap()
    }

    #[test]
    fn decodes_poll_create() {
        let invocation = decode(&interaction(
            2,
            json!({
                "name": "poll",
                "type": 1,
                "options": [{"name": "create", "type": 1, "options": [
                    {"name": "title", "type": 3, "value": "Lunch"},
                    {"name": "op1", "type": 3, "value": "Pho"},
                    {"name": "description", "type": 3, "value": "Friday"}
                ]}]
            }),
            "0",
        ))
        .unwrap();

        assert_eq!(invocation.channel_id, Some(50));
        assert_eq!(invocation.invoker.display_name.as_deref(), Some("Ann"));
        assert!(!invocation.invoker.is_admin);
        assert_eq!(
            invocation.command,
            Command::CreatePoll {
                title: "Lunch".into(),
                option1: "Pho".into(),
                option2: None,
                description: Some("Friday".into()),
            }
        );
    }

    #[test]
    fn decodes_admin_commands() {
        let invocation = decode(&interaction(
            2,
            json!({"name": "channel", "type": 1, "options": [
                {"name": "select", "type": 7, "value": "777"}
            ]}),
            "8",
        ))
        .unwrap();
        assert!(invocation.invoker.is_admin);
        assert_eq!(invocation.command, Command::SetAdminChannel { channel_id: 777 });

        let invocation = decode(&interaction(2, json!({"name": "cancel", "type": 1}), "8")).unwrap();
        assert_eq!(invocation.command, Command::CancelLatestPoll);
    }

    #[test]
    fn decodes_button_and_modal() {
        let invocation = decode(&interaction(
            3,
            json!({"custom_id": "vote:900:2", "component_type": 2}),
            "0",
        ))
        .unwrap();
        assert_eq!(
            invocation.command,
            Command::BeginVote {
                poll_id: 900,
                choice: VoteChoice::Second
            }
        );

        let invocation = decode(&interaction(
            5,
            json!({
                "custom_id": "ballot:900:1",
                "components": [{"type": 1, "components": [
                    {"type": 4, "custom_id": "reason", "value": "tastier"}
                ]}]
            }),
            "0",
        ))
        .unwrap();
        assert_eq!(
            invocation.command,
            Command::CastVote {
                poll_id: 900,
                choice: VoteChoice::First,
                reason: "tastier".into(),
            }
        );
    }

    #[test]
    fn unknown_inputs_are_unsupported() {
        let result = decode(&interaction(2, json!({"name": "dance", "type": 1}), "0"));
        assert!(matches!(result, Err(ApiError::Unsupported)));
        let result = decode(&interaction(3, json!({"custom_id": "other"}), "0"));
        assert!(matches!(result, Err(ApiError::Unsupported)));
    }

    #[test]
    fn admin_commands_register_with_admin_default_permissions() {
        let definitions = command_definitions();
        let names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["poll", "help", "channel", "log", "admin", "cancel"]);
        for definition in &definitions {
            let admin_only = definition.default_member_permissions.is_some();
            assert_eq!(admin_only, !matches!(definition.name.as_str(), "poll" | "help"));
        }
    }
}
