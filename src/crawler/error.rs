use thiserror::Error;

use crate::fetch_error::FetchError;

/// Run-level crawl failures; page-level problems are `FetchError`s and only get logged
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Crawl target unreachable: no listing page could be fetched from {url} ({source})")]
    SourceUnavailable {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Page directory not found: {0}")]
    PageDirNotFound(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid listing URL: {0}")]
    InvalidUrl(String),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
