pub mod background;

pub use background::{spawn_background, BackgroundHandle};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::browser::BrowserError;
use crate::store::StoreError;

/// Requests sent to the background process.
///
/// Serialized as `{"action": "updateBadge", "payload": 2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "camelCase")]
pub enum Message {
    /// The badge counter changed to this value
    UpdateBadge(i64),
    /// Ask for the active tab's URL
    GetCurrentTabUrl,
}

impl Message {
    pub fn action(&self) -> &'static str {
        match self {
            Message::UpdateBadge(_) => "updateBadge",
            Message::GetCurrentTabUrl => "getCurrentTabUrl",
        }
    }
}

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Background process is not running")]
    Closed,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// Single round-trip to the background process
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, message: Message) -> Result<Value, MessagingError>;
}

/// Messenger for contexts with no background process; every message is dropped
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMessenger;

#[async_trait]
impl Messenger for NullMessenger {
    async fn send(&self, _message: Message) -> Result<Value, MessagingError> {
        Ok(Value::Null)
    }
}
