//! Messaging platform seam: the [`ChatPlatform`] trait and its Telegram Bot API client.

mod bot_api;
mod types;

pub use bot_api::BotApiClient;
pub use types::{Chat, Message, Update, User};

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A chat addressed either by numeric id or by `@username`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl ChatId {
    /// Optionally negative integers become [`ChatId::Id`]; anything else is kept as a username.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let digits = raw.strip_prefix('-').unwrap_or(raw);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = raw.parse() {
                return ChatId::Id(id);
            }
        }
        ChatId::Username(raw.to_string())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{id}"),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("telegram response could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("telegram response to `{0}` carried no result")]
    MissingResult(&'static str),
}

impl TelegramError {
    /// Telegram refuses edits that would not change anything.
    pub fn is_not_modified(&self) -> bool {
        matches!(
            self,
            TelegramError::Api { description, .. } if description.contains("is not modified")
        )
    }
}

/// Operations the bot needs from the messaging platform.
///
/// One client is shared by the scheduled pipeline and the command responder.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// The bot's own account.
    async fn get_me(&self) -> Result<User, TelegramError>;

    /// Long-polls for inbound updates with `update_id >= offset`.
    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError>;

    async fn send_message(
        &self,
        chat: &ChatId,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), TelegramError>;

    async fn edit_message_text(
        &self,
        chat: &ChatId,
        message_id: i64,
        text: &str,
    ) -> Result<(), TelegramError>;

    async fn set_chat_description(
        &self,
        chat: &ChatId,
        description: &str,
    ) -> Result<(), TelegramError>;
}
