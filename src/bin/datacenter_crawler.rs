use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use datacenter_emissions::config::{parse_page_ranges, CrawlerConfig};
use datacenter_emissions::crawler::output::write_records;
use datacenter_emissions::crawler::{DataCenterCrawler, LocalPageSet, FINAL_FILE_NAME};
use datacenter_emissions::logging::init_tracing;

#[derive(Parser)]
#[command(name = "datacenter-crawler")]
#[command(about = "Collect data center facility metadata from datacenters.com into CSV", long_about = None)]
struct Cli {
    /// Locations index URL; listing pages are requested as ?page=N
    #[arg(long)]
    listing_url: Option<String>,

    /// Listing page ranges, one intermediate CSV per range (e.g. "1-50,51-100,101-105")
    #[arg(long)]
    pages: Option<String>,

    /// Parse saved facility pages from this directory instead of crawling the site
    #[arg(long)]
    pages_dir: Option<PathBuf>,

    /// Directory for the per-range and final CSV files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Pause before each HTTP request, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Debug-level logging for this crate
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = CrawlerConfig::from_env()?;
    if let Some(url) = cli.listing_url {
        config.listing_url = url;
    }
    if let Some(pages) = cli.pages.as_deref() {
        config.page_ranges = parse_page_ranges(pages)?;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(delay) = cli.delay_ms {
        config.request_delay_ms = delay;
    }

    if let Some(dir) = cli.pages_dir {
        info!("Parsing saved facility pages from {}", dir.display());
        let outcome = LocalPageSet::new(dir).crawl()?;
        let final_path = config.output_dir.join(FINAL_FILE_NAME);
        write_records(&final_path, &outcome.records)?;
        info!(
            "Wrote {} records ({} pages skipped)",
            outcome.records.len(),
            outcome.facilities_failed
        );
        return Ok(());
    }

    info!("Starting crawl with config: {:?}", config);

    let total_pages: u64 = config.page_ranges.iter().map(|r| r.page_count()).sum();
    let pb = ProgressBar::new(total_pages);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let crawler = DataCenterCrawler::new(&config)?.with_progress(pb);
    let summary = crawler.crawl(&config.page_ranges, &config.output_dir).await?;

    for path in &summary.files_written {
        info!("Wrote {}", path.display());
    }
    Ok(())
}
