use thiserror::Error;

/// Why a listing document did not produce a row
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("no listing identifier in {url}")]
    MissingIdentifier { url: String },

    #[error("listing {id} has expired")]
    Expired { id: String },

    #[error("could not find the title for this ad at {url}")]
    MissingTitle { url: String },

    #[error("could not find a positive price for this ad at {url} (parsed {price:?})")]
    InvalidPrice { url: String, price: Option<u64> },

    #[error("location structure could not be parsed for listing {id}")]
    UnresolvedLocation { id: String },

    #[error("row delivery failed: {0}")]
    Delivery(#[source] anyhow::Error),
}

impl ListingError {
    /// The document may have been caught mid-render; the crawler should
    /// re-queue it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MissingTitle { .. } | Self::InvalidPrice { .. })
    }

    /// Terminal outcome: drop the listing without retrying.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::MissingIdentifier { .. } | Self::Expired { .. } | Self::UnresolvedLocation { .. }
        )
    }
}

/// Failure of a single document-query call
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    #[error("timed out waiting for `{0}`")]
    Timeout(String),

    #[error("no element matches `{0}`")]
    NotFound(String),

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    #[error("document driver error: {0}")]
    Driver(String),
}
