use serde::{Deserialize, Serialize};

use crate::permissions::Permissions;

wire_enum! {
    pub enum ApplicationCommandType: i16 {
        ChatInput = 1,
        User = 2,
        Message = 3,
    }
}

impl Default for ApplicationCommandType {
    fn default() -> Self {
        Self::ChatInput
    }
}

wire_enum! {
    pub enum CommandOptionType: i16 {
        SubCommand = 1,
        SubCommandGroup = 2,
        String = 3,
        Integer = 4,
        Boolean = 5,
        User = 6,
        Channel = 7,
        Role = 8,
        Mentionable = 9,
        Number = 10,
        Attachment = 11,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub option_type: CommandOptionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl CommandOption {
    pub fn new(name: &str, description: &str, option_type: CommandOptionType) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            option_type,
            required: false,
            options: Vec::new(),
            max_length: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max_length(mut self, max: u32) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn with_options(mut self, options: Vec<CommandOption>) -> Self {
        self.options = options;
        self
    }
}

/// Body of one entry in a bulk command overwrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub command_type: ApplicationCommandType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_member_permissions: Option<Permissions>,
    #[serde(default = "default_true")]
    pub dm_permission: bool,
}

impl CommandDefinition {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            command_type: ApplicationCommandType::ChatInput,
            options: Vec::new(),
            default_member_permissions: None,
            dm_permission: false,
        }
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.default_member_permissions = Some(Permissions::ADMINISTRATOR);
        self
    }
}

fn default_true() -> bool {
    true
}
