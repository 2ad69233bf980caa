//! Renders a [`PriceQuote`] into the channel message and the chat bio.

mod template;

pub use template::{Template, TemplateError};

use crate::price::PriceQuote;
use rust_decimal::Decimal;

/// Timestamp layout used in the channel message (`YYYY-MM-DD HH:MM:SS`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Channel template arguments: price, timestamp.
const CHANNEL_ARITY: usize = 2;
/// Bio template arguments: price.
const BIO_ARITY: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedUpdate {
    pub channel_text: String,
    pub bio_text: String,
}

#[derive(Debug, Clone)]
pub struct Templates {
    channel: Template,
    bio: Template,
}

impl Templates {
    pub fn parse(channel: &str, bio: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            channel: Template::parse(channel, CHANNEL_ARITY)?,
            bio: Template::parse(bio, BIO_ARITY)?,
        })
    }

    pub fn render(&self, quote: &PriceQuote) -> RenderedUpdate {
        let price = price_text(quote.price);
        let time = quote.captured_at.format(TIMESTAMP_FORMAT).to_string();

        RenderedUpdate {
            channel_text: self.channel.render(&[&price, &time]),
            bio_text: self.bio.render(&[&price]),
        }
    }
}

/// Whole numbers keep one fractional digit (`42.0`).
fn price_text(price: Decimal) -> String {
    if price.fract().is_zero() {
        format!("{price:.1}")
    } else {
        price.to_string()
    }
}
