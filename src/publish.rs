//! Pushes a rendered update to the messaging platform.

use crate::config::TargetConfig;
use crate::format::RenderedUpdate;
use crate::telegram::{ChatId, ChatPlatform, TelegramError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one of the two platform updates.
#[derive(Debug)]
pub enum PublishOutcome {
    Updated,
    /// The platform already showed this exact text.
    Unchanged,
    Failed(TelegramError),
}

impl PublishOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, PublishOutcome::Failed(_))
    }
}

impl From<Result<(), TelegramError>> for PublishOutcome {
    fn from(result: Result<(), TelegramError>) -> Self {
        match result {
            Ok(()) => PublishOutcome::Updated,
            Err(err) if err.is_not_modified() => PublishOutcome::Unchanged,
            Err(err) => PublishOutcome::Failed(err),
        }
    }
}

/// Outcomes of the message edit and the description update, kept separately.
#[derive(Debug)]
pub struct PublishReport {
    pub edit: PublishOutcome,
    pub bio: PublishOutcome,
}

impl PublishReport {
    /// Neither update failed.
    pub fn is_complete(&self) -> bool {
        !self.edit.is_failed() && !self.bio.is_failed()
    }
}

pub struct Publisher {
    platform: Arc<dyn ChatPlatform>,
    chat: ChatId,
    message_id: i64,
}

impl Publisher {
    pub fn new(platform: Arc<dyn ChatPlatform>, target: &TargetConfig) -> Self {
        Self {
            platform,
            chat: target.chat.clone(),
            message_id: target.message_id,
        }
    }

    /// Edits the pinned message and sets the chat description concurrently.
    ///
    /// Both calls always run to completion; a failure in one never affects the other.
    pub async fn publish(&self, update: &RenderedUpdate) -> PublishReport {
        let (edit, bio) = tokio::join!(
            self.platform
                .edit_message_text(&self.chat, self.message_id, &update.channel_text),
            self.platform
                .set_chat_description(&self.chat, &update.bio_text),
        );

        let report = PublishReport {
            edit: edit.into(),
            bio: bio.into(),
        };
        self.log(&report);
        report
    }

    fn log(&self, report: &PublishReport) {
        match &report.edit {
            PublishOutcome::Updated => {
                info!(chat = %self.chat, message_id = self.message_id, "message edited")
            }
            PublishOutcome::Unchanged => {
                debug!(
                    chat = %self.chat,
                    message_id = self.message_id,
                    "message already up to date"
                )
            }
            PublishOutcome::Failed(err) => {
                warn!(
                    chat = %self.chat,
                    message_id = self.message_id,
                    error = %err,
                    "message edit failed"
                )
            }
        }
        match &report.bio {
            PublishOutcome::Updated => info!(chat = %self.chat, "chat description updated"),
            PublishOutcome::Unchanged => {
                debug!(chat = %self.chat, "chat description already up to date")
            }
            PublishOutcome::Failed(err) => {
                warn!(chat = %self.chat, error = %err, "chat description update failed")
            }
        }
    }
}
