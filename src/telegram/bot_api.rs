use super::types::{ApiResponse, Update, User};
use super::{ChatId, ChatPlatform, TelegramError};
use crate::config::TelegramConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::trace;

/// Telegram Bot HTTP API client.
///
/// Each call is a JSON `POST {api_url}/bot{token}/{method}`.
#[derive(Clone)]
pub struct BotApiClient {
    client: Client,
    api_url: String,
    token: String,
}

impl BotApiClient {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
        }
    }

    async fn call<T, P>(&self, method: &'static str, params: &P) -> Result<T, TelegramError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        trace!(method, "calling Bot API");

        // The URL embeds the token, so it is stripped from any request error.
        let url = format!("{}/bot{}/{}", self.api_url, self.token, method);
        let resp = self
            .client
            .post(url)
            .json(params)
            .send()
            .await
            .map_err(|e| TelegramError::Request(e.without_url()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TelegramError::Request(e.without_url()))?;

        let envelope: ApiResponse<T> =
            serde_json::from_slice(&body).map_err(TelegramError::Decode)?;

        if !envelope.ok {
            return Err(TelegramError::Api {
                code: envelope
                    .error_code
                    .unwrap_or_else(|| i64::from(status.as_u16())),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        envelope.result.ok_or(TelegramError::MissingResult(method))
    }
}

#[async_trait]
impl ChatPlatform for BotApiClient {
    async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &json!({})).await
    }

    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let params = json!({
            "offset": offset,
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        self.call("getUpdates", &params).await
    }

    async fn send_message(
        &self,
        chat: &ChatId,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), TelegramError> {
        let mut params = json!({ "chat_id": chat, "text": text });
        if let Some(message_id) = reply_to {
            params["reply_parameters"] = json!({
                "message_id": message_id,
                "allow_sending_without_reply": true,
            });
        }
        self.call::<IgnoredAny, _>("sendMessage", &params).await?;
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat: &ChatId,
        message_id: i64,
        text: &str,
    ) -> Result<(), TelegramError> {
        let params = json!({ "chat_id": chat, "message_id": message_id, "text": text });
        // Answers with the edited message, or `true` for inline messages.
        self.call::<IgnoredAny, _>("editMessageText", &params).await?;
        Ok(())
    }

    async fn set_chat_description(
        &self,
        chat: &ChatId,
        description: &str,
    ) -> Result<(), TelegramError> {
        let params = json!({ "chat_id": chat, "description": description });
        self.call::<IgnoredAny, _>("setChatDescription", &params).await?;
        Ok(())
    }
}
