// Data center crawler
//
// Walks the paginated datacenters.com locations index, follows every facility
// tile to its detail page and flattens the embedded location JSON into CSV rows.
// A directory of saved facility pages can stand in for the live site.

pub mod error;
pub mod facility_parser;
pub mod fetcher;
pub mod listing_parser;
pub mod local;
pub mod output;
pub mod record;

pub use error::CrawlError;
pub use fetcher::{CrawlSummary, DataCenterCrawler, RangeOutcome, FINAL_FILE_NAME};
pub use local::LocalPageSet;
pub use record::DataCenterRecord;
