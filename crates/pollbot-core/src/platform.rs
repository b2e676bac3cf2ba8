use pollbot_models::message::MessagePayload;
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("http error: {0}")]
    Http(String),
    #[error("platform returned {0}: {1}")]
    Status(u16, String),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    #[error("not found")]
    NotFound,
}

/// Public profile used to decorate audit notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Outbound operations the bot needs from the chat platform.
///
/// Every method returns a `Send` future so that implementations can be driven
/// from spawned follow-up tasks.
pub trait ChatPlatform: Send + Sync + 'static {
    /// Post a message, returning the platform-assigned message id.
    fn create_message(
        &self,
        channel_id: i64,
        payload: &MessagePayload,
    ) -> impl Future<Output = Result<i64, PlatformError>> + Send;

    fn edit_message(
        &self,
        channel_id: i64,
        message_id: i64,
        payload: &MessagePayload,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    fn delete_message(
        &self,
        channel_id: i64,
        message_id: i64,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    fn resolve_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<UserProfile, PlatformError>> + Send;
}
