use log::{info, warn};

use crate::error::{IngestError, Result};

pub mod actuals;
pub mod forecast;

/// Something that can hand back the body of a CSV URL.
///
/// The pipeline only ever talks to this trait, so tests can swap the network
/// for canned text.
#[allow(async_fn_in_trait)]
pub trait CsvSource {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Plain HTTP GET via reqwest. Timeouts and retries are whatever the client
/// was built with.
#[derive(Clone, Debug, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(client: reqwest::Client) -> HttpSource {
        HttpSource { client }
    }
}

impl CsvSource for HttpSource {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IngestError::fetch(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IngestError::fetch(url, format!("HTTP {status}")));
        }

        resp.text().await.map_err(|e| IngestError::fetch(url, e))
    }
}

/// Fetches one URL, turning any failure into `None`.
pub(crate) async fn fetch_or_none<S: CsvSource>(source: &S, url: &str) -> Option<String> {
    info!("fetching {url}");
    match source.fetch_text(url).await {
        Ok(text) => {
            info!("fetched {url} ({} bytes)", text.len());
            Some(text)
        }
        Err(e) => {
            warn!("{e}");
            None
        }
    }
}
