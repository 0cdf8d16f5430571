use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::ProgressBar;
use reqwest::Url;
use tracing::{debug, info, instrument, warn};

use crate::config::{CrawlerConfig, PageRange};
use crate::crawler::error::CrawlError;
use crate::crawler::facility_parser::parse_facility;
use crate::crawler::listing_parser::parse_listing;
use crate::crawler::output::write_records;
use crate::crawler::record::DataCenterRecord;
use crate::fetch_error::FetchError;

/// Name of the merged CSV written after every page range has been crawled
pub const FINAL_FILE_NAME: &str = "final.csv";

/// Records and failure counts for one page range
#[derive(Debug, Default)]
pub struct RangeOutcome {
    pub records: Vec<DataCenterRecord>,
    pub pages_ok: usize,
    pub pages_failed: usize,
    pub facilities_failed: usize,
    /// Most recent listing failure, kept to explain an unreachable target
    pub last_listing_error: Option<FetchError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub records: usize,
    pub pages_ok: usize,
    pub pages_failed: usize,
    pub facilities_failed: usize,
    pub files_written: Vec<PathBuf>,
}

/// Sequential crawler over the paginated datacenters.com locations index
#[derive(Clone)]
pub struct DataCenterCrawler {
    client: reqwest::Client,
    listing_url: Url,
    request_delay: Duration,
    progress: ProgressBar,
}

impl DataCenterCrawler {
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let listing_url = Url::parse(&config.listing_url)
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {e}", config.listing_url)))?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            listing_url,
            request_delay: Duration::from_millis(config.request_delay_ms),
            progress: ProgressBar::hidden(),
        })
    }

    /// Report listing-page progress on `progress` (one tick per page)
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// URL of listing page `page`, e.g. `https://www.datacenters.com/locations?page=3`
    pub fn listing_page_url(&self, page: u32) -> Url {
        let mut url = self.listing_url.clone();
        url.query_pairs_mut().append_pair("page", &page.to_string());
        url
    }

    #[instrument(skip(self))]
    pub async fn fetch_listing_page(&self, page: u32) -> Result<Vec<Url>, FetchError> {
        let url = self.listing_page_url(page);
        let html = self.fetch_html(&url).await?;
        let urls = parse_listing(&html, &url);
        info!("Found {} data center URLs on page {}", urls.len(), page);
        Ok(urls)
    }

    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_facility(&self, url: &Url) -> Result<DataCenterRecord, FetchError> {
        let html = self.fetch_html(url).await?;
        parse_facility(&html, url.as_str())
    }

    async fn fetch_html(&self, url: &Url) -> Result<String, FetchError> {
        self.pause().await;

        debug!("Sending HTTP request to {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        debug!("Received HTTP response with status: {}", status);

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await?;
        debug!("Retrieved HTML content, size: {} bytes", html.len());
        Ok(html)
    }

    async fn pause(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }

    /// Crawl every listing page in `range`, then every facility those pages link to
    ///
    /// Failed pages and facilities are logged and counted; they never abort the range.
    #[instrument(skip(self), fields(start = range.start, end = range.end))]
    pub async fn crawl_range(&self, range: PageRange) -> RangeOutcome {
        let mut outcome = RangeOutcome::default();

        for page in range.pages() {
            self.progress.set_message(format!("page {page}"));
            debug!("Processing page {}", page);

            let urls = match self.fetch_listing_page(page).await {
                Ok(urls) => {
                    outcome.pages_ok += 1;
                    urls
                }
                Err(e) => {
                    warn!("Failed to fetch listing page {}: {}", page, e);
                    outcome.pages_failed += 1;
                    outcome.last_listing_error = Some(e);
                    self.progress.inc(1);
                    continue;
                }
            };

            for url in urls {
                debug!("Processing {}", url);
                match self.fetch_facility(&url).await {
                    Ok(record) => outcome.records.push(record),
                    Err(e) => {
                        warn!("Skipping {}: {}", url, e);
                        outcome.facilities_failed += 1;
                    }
                }
            }
            self.progress.inc(1);
        }

        info!(
            "Pages {}-{}: {} records, {} listing pages failed, {} facilities skipped",
            range.start,
            range.end,
            outcome.records.len(),
            outcome.pages_failed,
            outcome.facilities_failed
        );
        outcome
    }

    /// Crawl all ranges, writing one CSV per range plus a merged `final.csv`
    ///
    /// Fails only when not a single listing page could be fetched.
    pub async fn crawl(
        &self,
        ranges: &[PageRange],
        output_dir: &Path,
    ) -> Result<CrawlSummary, CrawlError> {
        let mut summary = CrawlSummary::default();
        let mut all_records = Vec::new();
        let mut last_listing_error = None;

        for range in ranges {
            let outcome = self.crawl_range(*range).await;

            summary.pages_ok += outcome.pages_ok;
            summary.pages_failed += outcome.pages_failed;
            summary.facilities_failed += outcome.facilities_failed;
            if outcome.last_listing_error.is_some() {
                last_listing_error = outcome.last_listing_error;
            }

            if outcome.pages_ok == 0 {
                warn!(
                    "No listing page in {}-{} could be fetched, not writing {}",
                    range.start,
                    range.end,
                    range.file_name()
                );
                continue;
            }

            let path = output_dir.join(range.file_name());
            write_records(&path, &outcome.records)?;
            summary.files_written.push(path);
            all_records.extend(outcome.records);
        }
        self.progress.finish_and_clear();

        if summary.pages_ok == 0 {
            if let Some(source) = last_listing_error {
                return Err(CrawlError::SourceUnavailable {
                    url: self.listing_url.to_string(),
                    source,
                });
            }
        }

        let final_path = output_dir.join(FINAL_FILE_NAME);
        write_records(&final_path, &all_records)?;
        summary.files_written.push(final_path);
        summary.records = all_records.len();

        info!(
            "Crawl finished: {} records from {} listing pages ({} pages failed, {} facilities skipped)",
            summary.records, summary.pages_ok, summary.pages_failed, summary.facilities_failed
        );
        Ok(summary)
    }
}
