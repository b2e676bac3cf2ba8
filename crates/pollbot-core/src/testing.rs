//! In-memory [`ChatPlatform`] shared by the unit tests.

use pollbot_models::message::MessagePayload;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use crate::platform::{ChatPlatform, PlatformError, UserProfile};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Create(i64),
    /// Channel, message, number of buttons in the first row.
    Edit(i64, i64, usize),
    Delete(i64, i64),
    Resolve(i64),
}

#[derive(Default)]
pub(crate) struct FakePlatform {
    pub next_id: AtomicI64,
    pub calls: Mutex<Vec<Call>>,
    pub sent: Mutex<Vec<MessagePayload>>,
    pub edited: Mutex<Vec<MessagePayload>>,
    pub fail_edits: AtomicBool,
    pub fail_resolve: AtomicBool,
}

impl FakePlatform {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_sent(&self) -> MessagePayload {
        self.sent.lock().unwrap().last().cloned().unwrap()
    }

    pub fn last_edit(&self) -> MessagePayload {
        self.edited.lock().unwrap().last().cloned().unwrap()
    }

    pub fn edit_count(&self) -> usize {
        self.edited.lock().unwrap().len()
    }
}

impl ChatPlatform for FakePlatform {
    async fn create_message(
        &self,
        channel_id: i64,
        payload: &MessagePayload,
    ) -> Result<i64, PlatformError> {
        self.calls.lock().unwrap().push(Call::Create(channel_id));
        self.sent.lock().unwrap().push(payload.clone());
        Ok(1000 + self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn edit_message(
        &self,
        channel_id: i64,
        message_id: i64,
        payload: &MessagePayload,
    ) -> Result<(), PlatformError> {
        let buttons = payload
            .components
            .first()
            .map(|row| row.components.len())
            .unwrap_or(0);
        self.calls
            .lock()
            .unwrap()
            .push(Call::Edit(channel_id, message_id, buttons));
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(PlatformError::Status(500, "edit failed".into()));
        }
        self.edited.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn delete_message(&self, channel_id: i64, message_id: i64) -> Result<(), PlatformError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Delete(channel_id, message_id));
        Ok(())
    }

    async fn resolve_user(&self, user_id: i64) -> Result<UserProfile, PlatformError> {
        self.calls.lock().unwrap().push(Call::Resolve(user_id));
        if self.fail_resolve.load(Ordering::SeqCst) {
            return Err(PlatformError::NotFound);
        }
        Ok(UserProfile {
            display_name: format!("Resolved {user_id}"),
            avatar_url: None,
        })
    }
}
