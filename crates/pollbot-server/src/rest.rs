use pollbot_core::platform::{ChatPlatform, PlatformError, UserProfile};
use pollbot_models::command::CommandDefinition;
use pollbot_models::message::{Message, MessagePayload};
use pollbot_models::user::User;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Error bodies are cut to this many bytes before being logged.
const MAX_ERROR_BODY: usize = 512;

/// Chat platform REST client authenticated as the bot.
#[derive(Debug, Clone)]
pub struct RestPlatform {
    http: Client,
    api_base: String,
    bot_token: String,
}

impl RestPlatform {
    pub fn new(api_base: &str, bot_token: &str) -> Result<Self, PlatformError> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("DiscordBot (pollbot, ", env!("CARGO_PKG_VERSION"), ")"))
            .build()
            .map_err(|e| PlatformError::Http(e.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_base, path))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.bot_token))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, PlatformError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| PlatformError::Http(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(PlatformError::NotFound);
        }
        let mut body = resp.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(PlatformError::Status(status.as_u16(), body))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, PlatformError> {
        self.send(builder)
            .await?
            .json()
            .await
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))
    }

    /// Replace every global command of the application with `commands`.
    pub async fn register_commands(
        &self,
        application_id: i64,
        commands: &[CommandDefinition],
    ) -> Result<usize, PlatformError> {
        let path = format!("/applications/{application_id}/commands");
        let registered: Vec<serde_json::Value> = self
            .send_json(self.request(Method::PUT, &path).json(commands))
            .await?;
        Ok(registered.len())
    }
}

impl ChatPlatform for RestPlatform {
    async fn create_message(&self, channel_id: i64, payload: &MessagePayload) -> Result<i64, PlatformError> {
        let path = format!("/channels/{channel_id}/messages");
        let message: Message = self
            .send_json(self.request(Method::POST, &path).json(payload))
            .await?;
        Ok(message.id)
    }

    async fn edit_message(
        &self,
        channel_id: i64,
        message_id: i64,
        payload: &MessagePayload,
    ) -> Result<(), PlatformError> {
        let path = format!("/channels/{channel_id}/messages/{message_id}");
        self.send(self.request(Method::PATCH, &path).json(payload))
            .await?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: i64, message_id: i64) -> Result<(), PlatformError> {
        let path = format!("/channels/{channel_id}/messages/{message_id}");
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn resolve_user(&self, user_id: i64) -> Result<UserProfile, PlatformError> {
        let user: User = self
            .send_json(self.request(Method::GET, &format!("/users/{user_id}")))
            .await?;
        Ok(UserProfile {
            display_name: user.display_name().to_string(),
            avatar_url: user.avatar_url(),
        })
    }
}
