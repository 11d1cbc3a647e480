use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use pricewatch_core::{AppConfig, ExtractionResult, ProductDescriptor};

use crate::debug_sink::{DebugSink, JsonFileSink, NoopSink};
use crate::error::{ExtractionError, FetchError};
use crate::fetch::Fetcher;
use crate::sites::SiteParser;

/// Outcome of one descriptor in a batch, paired with the product name.
#[derive(Debug)]
pub struct BatchOutcome {
    pub product_name: String,
    pub result: Result<ExtractionResult, ExtractionError>,
}

/// Fetches and parses product pages. Holds no per-product state, so one
/// instance can serve any number of concurrent extractions.
#[derive(Clone)]
pub struct Extractor {
    fetcher: Fetcher,
    sink: Arc<dyn DebugSink>,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl Extractor {
    #[must_use]
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            sink: Arc::new(NoopSink),
        }
    }

    #[must_use]
    pub fn with_debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Builds the fetcher from config and installs a [`JsonFileSink`] when
    /// `debug_json_path` is set.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the fetcher cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, FetchError> {
        let extractor = Self::new(Fetcher::from_app_config(config)?);
        Ok(match &config.debug_json_path {
            Some(path) => extractor.with_debug_sink(Arc::new(JsonFileSink::new(path))),
            None => extractor,
        })
    }

    /// Extracts one product.
    ///
    /// Descriptors with a `capture` path are read from disk instead of the
    /// network. Unsupported sites fail before any I/O.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] tagged with the stage that failed.
    pub async fn extract(
        &self,
        descriptor: &ProductDescriptor,
    ) -> Result<ExtractionResult, ExtractionError> {
        let Some(parser) = SiteParser::for_site(&descriptor.site) else {
            tracing::warn!(
                product = %descriptor.name,
                site = %descriptor.site,
                "unsupported site"
            );
            return Err(ExtractionError::unsupported_site(
                &descriptor.name,
                descriptor.site.as_str(),
            ));
        };

        let page = match &descriptor.capture {
            Some(path) => self.fetcher.fetch_from_capture(path).await,
            None => self.fetcher.fetch(&descriptor.url).await,
        }
        .map_err(|e| ExtractionError::fetch(&descriptor.name, e))?;

        let facts = parser
            .parse(&page, descriptor, self.sink.as_ref())
            .map_err(|e| ExtractionError::parse(&descriptor.name, e))?;

        let result = ExtractionResult::from_facts(descriptor, facts, Utc::now());
        tracing::info!(
            product = %result.product_name,
            site = %descriptor.site,
            price = ?result.price,
            availability = %result.availability,
            "extracted product"
        );
        Ok(result)
    }

    /// Extracts every descriptor with at most `max_concurrent` in flight.
    ///
    /// A failure is recorded in its outcome and never stops the batch.
    /// Outcomes come back in descriptor order.
    pub async fn extract_batch(
        &self,
        descriptors: &[ProductDescriptor],
        max_concurrent: usize,
    ) -> Vec<BatchOutcome> {
        // Futures are built up front; a lazily mapped stream over borrowed
        // descriptors is not `Send` and cannot be spawned.
        let pending: Vec<_> = descriptors
            .iter()
            .map(|descriptor| self.extract_logged(descriptor))
            .collect();

        stream::iter(pending)
            .buffered(max_concurrent.max(1))
            .collect()
            .await
    }

    async fn extract_logged(&self, descriptor: &ProductDescriptor) -> BatchOutcome {
        let result = self.extract(descriptor).await;
        if let Err(e) = &result {
            tracing::error!(
                product = %descriptor.name,
                stage = %e.stage,
                error = %e,
                "extraction failed"
            );
        }
        BatchOutcome {
            product_name: descriptor.name.clone(),
            result,
        }
    }
}
