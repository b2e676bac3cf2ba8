use thiserror::Error;

use crate::platform::PlatformError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("poll not found")]
    PollNotFound,
    #[error("already voted in the current window")]
    AlreadyVoted,
    #[error("option {0} does not exist on this poll")]
    InvalidChoice(u8),
    #[error("forbidden")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short text safe to show to any member. Internal detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::PollNotFound => "This poll no longer exists.".to_string(),
            CoreError::AlreadyVoted => {
                "You have already voted on this poll this week.".to_string()
            }
            CoreError::InvalidChoice(_) => "That option is not available on this poll.".to_string(),
            CoreError::Forbidden => {
                "You need the Administrator permission to use this command.".to_string()
            }
            CoreError::BadRequest(msg) => msg.clone(),
            CoreError::Persistence(_) | CoreError::Platform(_) | CoreError::Internal(_) => {
                "Something went wrong, please try again later.".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Persistence(format!("snapshot encoding: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_failures_hide_detail() {
        let err = CoreError::Persistence("disk full at /var/lib/pollbot".into());
        assert!(!err.user_message().contains("/var/lib"));
        let err = CoreError::Platform(PlatformError::Status(500, "boom".into()));
        assert!(!err.user_message().contains("boom"));
    }

    #[test]
    fn bad_request_message_is_shown_verbatim() {
        let err = CoreError::BadRequest("Title must not be empty.".into());
        assert_eq!(err.user_message(), "Title must not be empty.");
    }
}
