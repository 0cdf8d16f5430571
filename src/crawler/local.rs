use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::crawler::error::CrawlError;
use crate::crawler::facility_parser::parse_facility;
use crate::crawler::fetcher::RangeOutcome;
use crate::fetch_error::FetchError;

/// A directory of saved facility pages, crawled instead of the live site
pub struct LocalPageSet {
    dir: PathBuf,
}

impl LocalPageSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `*.html` / `*.htm` files in the directory, sorted by file name
    pub fn page_files(&self) -> Result<Vec<PathBuf>, CrawlError> {
        if !self.dir.is_dir() {
            return Err(CrawlError::PageDirNotFound(self.dir.display().to_string()));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_html(path))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Parse every page in the set; unreadable or unparseable pages are skipped
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn crawl(&self) -> Result<RangeOutcome, CrawlError> {
        let files = self.page_files()?;
        info!("Found {} saved facility pages", files.len());

        let mut outcome = RangeOutcome::default();
        for path in files {
            match read_facility(&path) {
                Ok(record) => {
                    outcome.pages_ok += 1;
                    outcome.records.push(record);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    outcome.facilities_failed += 1;
                }
            }
        }

        info!(
            "Parsed {} records, skipped {} pages",
            outcome.records.len(),
            outcome.facilities_failed
        );
        Ok(outcome)
    }
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

fn read_facility(path: &Path) -> Result<crate::crawler::DataCenterRecord, FetchError> {
    let html = fs::read_to_string(path)?;
    parse_facility(&html, &path.display().to_string())
}
