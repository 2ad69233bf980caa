use super::{extract_quote, FetchError, FieldPath, PriceQuote, PriceSource};
use crate::config::PriceSourceConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

/// Price source backed by a JSON HTTP endpoint (CoinMarketCap by default).
#[derive(Debug, Clone)]
pub struct HttpPriceSource {
    client: Client,
    url: Url,
    headers: HeaderMap,
    field_path: FieldPath,
}

impl HttpPriceSource {
    pub fn new(config: &PriceSourceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &config.api_key {
            let name = HeaderName::from_bytes(config.api_key_header.as_bytes())
                .with_context(|| format!("Invalid API key header `{}`", config.api_key_header))?;
            let mut value = HeaderValue::from_str(api_key)
                .context("Price API key is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        Ok(Self {
            client: Client::new(),
            url: config.request_url(),
            headers,
            field_path: config.field_path.clone(),
        })
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn fetch(&self) -> Result<PriceQuote, FetchError> {
        debug!(url = %self.url.path(), "requesting price");

        let resp = self
            .client
            .get(self.url.clone())
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        let body = resp.bytes().await.map_err(FetchError::Request)?;
        extract_quote(&body, &self.field_path, Local::now())
    }
}
