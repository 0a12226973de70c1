use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Failures of the ingestion pipeline.
///
/// `FetchFailure` comes from a `CsvSource` and is recovered by the fetchers,
/// which treat the source as contributing no rows. The rest abort the request.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("fetch failed for {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    #[error("no valid CSV header found in any source")]
    NoValidHeader,

    #[error("CSV data is empty or malformed ({rows} rows, need a header and at least one data row)")]
    EmptyOrMalformed { rows: usize },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl IngestError {
    pub fn fetch(url: &str, reason: impl ToString) -> IngestError {
        IngestError::FetchFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
