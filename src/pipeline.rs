//! One scheduled run: fetch, format, publish.

use crate::format::Templates;
use crate::price::{FetchError, PriceQuote, PriceSource};
use crate::publish::{PublishReport, Publisher};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub enum RunOutcome {
    /// A quote was fetched and both updates were attempted.
    Published {
        quote: PriceQuote,
        report: PublishReport,
    },
    /// Nothing was published this run.
    FetchFailed(FetchError),
}

pub struct Pipeline {
    source: Arc<dyn PriceSource>,
    templates: Templates,
    publisher: Publisher,
}

impl Pipeline {
    pub fn new(source: Arc<dyn PriceSource>, templates: Templates, publisher: Publisher) -> Self {
        Self {
            source,
            templates,
            publisher,
        }
    }

    /// Runs the stages strictly in order. Failures are logged and returned as
    /// an outcome; they never escape as errors.
    pub async fn run_once(&self) -> RunOutcome {
        info!("Fetching price...");
        let quote = match self.source.fetch().await {
            Ok(quote) => quote,
            Err(err) => {
                warn!(error = %err, "price fetch failed, skipping this run");
                return RunOutcome::FetchFailed(err);
            }
        };
        info!(price = %quote.price, captured_at = %quote.captured_at, "price fetched");

        let update = self.templates.render(&quote);
        info!("Publishing: {}", update.channel_text);

        let report = self.publisher.publish(&update).await;
        RunOutcome::Published { quote, report }
    }
}
