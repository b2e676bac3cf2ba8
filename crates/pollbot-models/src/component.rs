use serde::{Deserialize, Serialize};

wire_enum! {
    pub enum ComponentType: u8 {
        ActionRow = 1,
        Button = 2,
        StringSelect = 3,
        TextInput = 4,
        UserSelect = 5,
        RoleSelect = 6,
        MentionableSelect = 7,
        ChannelSelect = 8,
    }
}

wire_enum! {
    pub enum ButtonStyle: u8 {
        Primary = 1,
        Secondary = 2,
        Success = 3,
        Danger = 4,
        Link = 5,
    }
}

wire_enum! {
    pub enum TextInputStyle: u8 {
        Short = 1,
        Paragraph = 2,
    }
}

/// A flat component struct that uses `component_type` to distinguish variants.
///
/// Fields that don't apply to a given component type are simply `None` / empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    /// Child components (only for ActionRow)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    /// Button style or text input style, depending on `component_type`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Submitted value of a text input (modal submit payloads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Component {
    fn empty(component_type: ComponentType) -> Self {
        Self {
            component_type,
            components: Vec::new(),
            custom_id: None,
            style: None,
            label: None,
            disabled: false,
            placeholder: None,
            min_length: None,
            max_length: None,
            required: None,
            value: None,
        }
    }

    pub fn action_row(components: Vec<Component>) -> Self {
        Self {
            components,
            ..Self::empty(ComponentType::ActionRow)
        }
    }

    pub fn button(custom_id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id: Some(custom_id.into()),
            label: Some(label.into()),
            style: Some(style as u8),
            ..Self::empty(ComponentType::Button)
        }
    }

    pub fn text_input(
        custom_id: impl Into<String>,
        label: impl Into<String>,
        style: TextInputStyle,
        max_length: u32,
    ) -> Self {
        Self {
            custom_id: Some(custom_id.into()),
            label: Some(label.into()),
            style: Some(style as u8),
            min_length: Some(1),
            max_length: Some(max_length),
            required: Some(true),
            ..Self::empty(ComponentType::TextInput)
        }
    }

    /// Depth-first search for a submitted text input value by `custom_id`.
    pub fn find_value<'a>(components: &'a [Component], custom_id: &str) -> Option<&'a str> {
        components.iter().find_map(|component| {
            if component.custom_id.as_deref() == Some(custom_id) {
                if let Some(value) = component.value.as_deref() {
                    return Some(value);
                }
            }
            Self::find_value(&component.components, custom_id)
        })
    }
}
