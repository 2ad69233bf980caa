//! Price fetching: one HTTP GET, one numeric field, one [`PriceQuote`].

mod field_path;
mod http;

pub use field_path::{FieldPath, FieldPathError};
pub use http::HttpPriceSource;

use crate::utils::serialization::{decimal_from_value, float_from_value};
use async_trait::async_trait;
use chrono::{DateTime, Local, SubsecRound};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

/// Number of fractional digits kept on a fetched price.
pub const PRICE_SCALE: u32 = 5;

/// A single price observation. Created per run, consumed once by the formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    /// Wall-clock capture time, truncated to whole seconds.
    pub captured_at: DateTime<Local>,
    /// Price rounded to [`PRICE_SCALE`] fractional digits.
    pub price: Decimal,
}

impl PriceQuote {
    pub fn new(price: Decimal, captured_at: DateTime<Local>) -> Self {
        Self {
            captured_at: captured_at.trunc_subsecs(0),
            price: price.round_dp(PRICE_SCALE).normalize(),
        }
    }
}

/// Why a fetch produced no quote.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("price request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("price API answered with status {0}")]
    Status(StatusCode),

    #[error("price response is not valid JSON: {0}")]
    Body(#[source] serde_json::Error),

    #[error("price field `{0}` is missing from the response")]
    MissingField(FieldPath),

    #[error("price field `{path}` is not numeric: {value}")]
    NotNumeric { path: FieldPath, value: String },

    #[error("price field `{path}` is too large to represent: {value}")]
    OutOfRange { path: FieldPath, value: String },
}

/// Source of the current price.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self) -> Result<PriceQuote, FetchError>;
}

/// Decodes a response body and pulls the price found at `path`.
pub fn extract_quote(
    body: &[u8],
    path: &FieldPath,
    captured_at: DateTime<Local>,
) -> Result<PriceQuote, FetchError> {
    let json: Value = serde_json::from_slice(body).map_err(FetchError::Body)?;

    let raw = path
        .resolve(&json)
        .ok_or_else(|| FetchError::MissingField(path.clone()))?;

    let price = decimal_from_value(raw).ok_or_else(|| {
        let (path, value) = (path.clone(), raw.to_string());
        match float_from_value(raw) {
            Some(_) => FetchError::OutOfRange { path, value },
            None => FetchError::NotNumeric { path, value },
        }
    })?;

    Ok(PriceQuote::new(price, captured_at))
}
