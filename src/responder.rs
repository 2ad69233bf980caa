//! Replies to liveness commands such as `/ping`.

use crate::config::ResponderConfig;
use crate::telegram::{ChatId, ChatPlatform, Update};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Long-poll timeout passed to `getUpdates`.
const POLL_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause after a failed poll before asking again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct CommandResponder {
    platform: Arc<dyn ChatPlatform>,
    commands: Vec<String>,
    reply_text: String,
    bot_username: Option<String>,
}

impl CommandResponder {
    /// `bot_username` limits `/cmd@name` forms to commands addressed to this bot.
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        config: &ResponderConfig,
        bot_username: Option<String>,
    ) -> Self {
        Self {
            platform,
            commands: config.commands.clone(),
            reply_text: config.reply_text.clone(),
            bot_username,
        }
    }

    /// Whether `text` is one of the configured commands.
    ///
    /// Accepts `/cmd`, `/cmd args` and `/cmd@botname`; names compare case-insensitively.
    pub fn matches(&self, text: &str) -> bool {
        let Some(head) = text.split(char::is_whitespace).next() else {
            return false;
        };
        let Some(command) = head.strip_prefix('/') else {
            return false;
        };

        let name = match command.split_once('@') {
            Some((name, addressee)) => {
                if let Some(me) = &self.bot_username {
                    if !addressee.eq_ignore_ascii_case(me) {
                        return false;
                    }
                }
                name
            }
            None => command,
        };

        self.commands.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Replies to `update` if it carries a matching command; returns whether a reply was sent.
    pub async fn handle_update(&self, update: &Update) -> bool {
        let Some(message) = &update.message else {
            return false;
        };
        let Some(text) = message.text.as_deref() else {
            return false;
        };
        if !self.matches(text) {
            return false;
        }

        debug!(chat = message.chat.id, command = text, "answering command");
        let chat = ChatId::Id(message.chat.id);
        match self
            .platform
            .send_message(&chat, &self.reply_text, Some(message.message_id))
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(chat = message.chat.id, error = %err, "failed to answer command");
                false
            }
        }
    }

    /// Polls for inbound messages until the returned future is dropped.
    pub async fn run(self) {
        info!(commands = ?self.commands, "command responder listening");

        let mut offset = None;
        loop {
            match self.platform.get_updates(offset, POLL_TIMEOUT).await {
                Ok(updates) => {
                    for update in &updates {
                        offset = Some(update.update_id + 1);
                        self.handle_update(update).await;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "polling for updates failed");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                }
            }
        }
    }
}
