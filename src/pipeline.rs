use crate::delivery::{OnScrapped, RowDelivery};
use crate::error::ListingError;
use crate::models::ScrappedRow;
use crate::scrapers::{DocumentQuery, RowAssembler};
use std::time::Duration;
use tracing::debug;

/// Result of handling one listing document
#[derive(Debug)]
pub enum ListingOutcome {
    /// Row handed to the consumer (or its batch buffer)
    Delivered { id: String },
    /// Terminal skip; not worth retrying
    Skipped(ListingError),
}

/// Entry point for listing documents: assembles each one and delivers the
/// row.
///
/// Retryable failures (missing title, non-positive price) and consumer
/// errors are returned as `Err`; the caller decides whether to re-queue.
pub struct ListingScrapper {
    assembler: RowAssembler,
    delivery: RowDelivery,
}

impl ListingScrapper {
    pub fn new(on_scrapped: OnScrapped, parser_timeout: Duration) -> Self {
        Self {
            assembler: RowAssembler::new(parser_timeout),
            delivery: on_scrapped.into(),
        }
    }

    pub async fn handle_detail(&self, doc: &dyn DocumentQuery) -> Result<ListingOutcome, ListingError> {
        match self.assembler.assemble(doc).await {
            Ok(row) => {
                let id = row.id.clone();
                self.delivery.deliver(row).map_err(ListingError::Delivery)?;
                debug!(property_id = %id, "Row delivered");
                Ok(ListingOutcome::Delivered { id })
            }
            Err(err) if err.is_skip() => Ok(ListingOutcome::Skipped(err)),
            Err(err) => Err(err),
        }
    }

    /// Sends the partial batch, if any. Nothing is flushed implicitly.
    pub fn flush(&self) -> anyhow::Result<usize> {
        self.delivery.flush()
    }

    pub fn buffered_rows(&self) -> Vec<ScrappedRow> {
        self.delivery.buffered_rows()
    }
}
