use crate::format::Templates;
use crate::price::FieldPath;
use crate::scheduler::MAX_PERIOD;
use crate::telegram::ChatId;
use anyhow::{Context, Result};
use derive_builder::Builder;
use reqwest::Url;
use std::env;
use std::time::Duration;

mod load;

use load::{ensure_present, optional, parsed, required};

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";
pub const DEFAULT_FIELD_PATH: &str = "data.0.quote.USD.price";
pub const DEFAULT_INTERVAL_SECS: u64 = 5 * 60;
pub const DEFAULT_JITTER_SECS: u64 = 60;
pub const DEFAULT_COMMANDS: &[&str] = &["start", "help", "ping"];
pub const DEFAULT_ALIVE_MSG: &str = "Hello there, I'm alive & running!";

/// Keys that must be present and non-blank before anything is started.
pub const REQUIRED_KEYS: &[&str] = &[
    "CHAT_ID",
    "MESSAGE_ID",
    "BOT_TOKEN",
    "CMC_URL",
    "CHANNEL_MSG",
    "BIO_MSG",
];

#[derive(Builder, Clone)]
pub struct TelegramConfig {
    /// Bot API token, never logged
    #[builder(setter(into))]
    pub(crate) bot_token: String,
    /// Base URL of the Bot API
    #[builder(setter(into), default = "String::from(DEFAULT_TELEGRAM_API_URL)")]
    pub(crate) api_url: String,
}

impl TelegramConfig {
    pub fn builder() -> TelegramConfigBuilder {
        TelegramConfigBuilder::default()
    }
}

/// The chat and pinned message that receive price updates.
#[derive(Builder, Clone, Debug)]
pub struct TargetConfig {
    pub chat: ChatId,
    pub message_id: i64,
}

impl TargetConfig {
    pub fn builder() -> TargetConfigBuilder {
        TargetConfigBuilder::default()
    }
}

#[derive(Builder, Clone)]
pub struct PriceSourceConfig {
    /// Price endpoint
    pub(crate) url: Url,
    /// Raw query string appended to `url`
    #[builder(setter(into, strip_option), default)]
    pub(crate) params: Option<String>,
    /// Price API key, never logged
    #[builder(setter(into, strip_option), default)]
    pub(crate) api_key: Option<String>,
    /// Header carrying `api_key`
    #[builder(setter(into), default = "String::from(DEFAULT_API_KEY_HEADER)")]
    pub(crate) api_key_header: String,
    /// Where the price lives in the JSON response
    #[builder(default = "FieldPath::from_segments(DEFAULT_FIELD_PATH.split('.'))")]
    pub(crate) field_path: FieldPath,
}

impl PriceSourceConfig {
    pub fn builder() -> PriceSourceConfigBuilder {
        PriceSourceConfigBuilder::default()
    }

    /// The endpoint with `params` appended to any query it already carries.
    pub fn request_url(&self) -> Url {
        let mut url = self.url.clone();
        let extra = self
            .params
            .as_deref()
            .map(|p| p.trim().trim_start_matches('?'))
            .filter(|p| !p.is_empty());

        if let Some(extra) = extra {
            let query = match url.query().filter(|q| !q.is_empty()) {
                Some(existing) => format!("{existing}&{extra}"),
                None => extra.to_string(),
            };
            url.set_query(Some(&query));
        }
        url
    }
}

#[derive(Builder, Clone, Debug)]
pub struct ScheduleConfig {
    /// Base delay between runs
    #[builder(default = "Duration::from_secs(DEFAULT_INTERVAL_SECS)")]
    pub interval: Duration,
    /// Upper bound of the random delay added to each run
    #[builder(default = "Duration::from_secs(DEFAULT_JITTER_SECS)")]
    pub jitter: Duration,
    /// Fire once right away instead of waiting a full interval
    #[builder(default)]
    pub run_on_start: bool,
}

impl ScheduleConfig {
    pub fn builder() -> ScheduleConfigBuilder {
        ScheduleConfigBuilder::default()
    }
}

#[derive(Builder, Clone, Debug)]
pub struct ResponderConfig {
    /// Command names without the leading slash
    #[builder(default = "DEFAULT_COMMANDS.iter().map(|c| c.to_string()).collect()")]
    pub commands: Vec<String>,
    #[builder(setter(into), default = "String::from(DEFAULT_ALIVE_MSG)")]
    pub reply_text: String,
}

impl ResponderConfig {
    pub fn builder() -> ResponderConfigBuilder {
        ResponderConfigBuilder::default()
    }
}

/// Everything the bot needs, read once at startup and never mutated.
#[derive(Clone)]
pub struct BotConfig {
    pub telegram: TelegramConfig,
    pub target: TargetConfig,
    pub price: PriceSourceConfig,
    pub templates: Templates,
    pub schedule: ScheduleConfig,
    pub responder: ResponderConfig,
}

impl BotConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`; fails on the first missing or
    /// malformed value, listing every absent required key at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        ensure_present(&lookup, REQUIRED_KEYS)?;

        let telegram = TelegramConfig::builder()
            .bot_token(required(&lookup, "BOT_TOKEN")?.trim())
            .api_url(
                optional(&lookup, "TELEGRAM_API_URL")
                    .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            )
            .build()
            .context("Failed to build Telegram configuration")?;

        let message_id: i64 = required(&lookup, "MESSAGE_ID")?
            .trim()
            .parse()
            .context("`MESSAGE_ID` must be an integer")?;
        let target = TargetConfig::builder()
            .chat(ChatId::parse(&required(&lookup, "CHAT_ID")?))
            .message_id(message_id)
            .build()
            .context("Failed to build target configuration")?;

        let url: Url = required(&lookup, "CMC_URL")?
            .trim()
            .parse()
            .context("`CMC_URL` must be a valid URL")?;
        let mut price = PriceSourceConfig::builder();
        price.url(url);
        if let Some(params) = optional(&lookup, "CMC_PARAMS") {
            price.params(params);
        }
        if let Some(api_key) = optional(&lookup, "CMC_API_KEY") {
            price.api_key(api_key);
        }
        if let Some(header) = optional(&lookup, "CMC_API_KEY_HEADER") {
            price.api_key_header(header);
        }
        if let Some(path) = optional(&lookup, "PRICE_FIELD_PATH") {
            price.field_path(path.parse().context("Invalid `PRICE_FIELD_PATH`")?);
        }
        let price = price
            .build()
            .context("Failed to build price source configuration")?;

        let templates = Templates::parse(
            &required(&lookup, "CHANNEL_MSG")?,
            &required(&lookup, "BIO_MSG")?,
        )
        .context("Invalid message template")?;

        let max_secs = MAX_PERIOD.as_secs();
        let interval = parsed(&lookup, "UPDATE_INTERVAL_SECS", DEFAULT_INTERVAL_SECS)?;
        anyhow::ensure!(
            (1..=max_secs).contains(&interval),
            "`UPDATE_INTERVAL_SECS` must be between 1 and {max_secs}"
        );
        let jitter = parsed(&lookup, "UPDATE_JITTER_SECS", DEFAULT_JITTER_SECS)?;
        anyhow::ensure!(jitter <= max_secs, "`UPDATE_JITTER_SECS` must be at most {max_secs}");
        let schedule = ScheduleConfig::builder()
            .interval(Duration::from_secs(interval))
            .jitter(Duration::from_secs(jitter))
            .run_on_start(parsed(&lookup, "RUN_ON_START", false)?)
            .build()
            .context("Failed to build schedule configuration")?;

        let mut responder = ResponderConfig::builder();
        if let Some(commands) = optional(&lookup, "COMMANDS") {
            responder.commands(
                commands
                    .split(',')
                    .map(|c| c.trim().trim_start_matches('/').to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
            );
        }
        if let Some(reply) = optional(&lookup, "ALIVE_MSG") {
            responder.reply_text(reply);
        }
        let responder = responder
            .build()
            .context("Failed to build responder configuration")?;

        Ok(Self {
            telegram,
            target,
            price,
            templates,
            schedule,
            responder,
        })
    }
}
