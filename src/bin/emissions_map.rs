use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use datacenter_emissions::config::RendererConfig;
use datacenter_emissions::emissions::{
    write_html, ChoroplethMap, RenderOptions, SpreadsheetDownloader, SpreadsheetLoader,
};
use datacenter_emissions::logging::init_tracing;

#[derive(Parser)]
#[command(name = "emissions-map")]
#[command(about = "Render U.S. commercial-sector CO2 emissions by state as an interactive choropleth", long_about = None)]
struct Cli {
    /// Spreadsheet with state, year and emissions columns
    #[arg(long)]
    file: Option<PathBuf>,

    /// Fetch the spreadsheet from this URL when the file does not exist yet
    #[arg(long)]
    download_url: Option<String>,

    /// Sheet to read (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Header of the state column
    #[arg(long)]
    state_column: Option<String>,

    /// Header of the year column
    #[arg(long)]
    year_column: Option<String>,

    /// Header of the emissions value column
    #[arg(long)]
    value_column: Option<String>,

    /// First year to render
    #[arg(long)]
    min_year: Option<i32>,

    /// Last year to render
    #[arg(long)]
    max_year: Option<i32>,

    /// Page title (default derived from the rendered years)
    #[arg(long)]
    title: Option<String>,

    /// Plotly colorscale name
    #[arg(long, default_value = "Reds")]
    colorscale: String,

    /// Output HTML file
    #[arg(short, long)]
    output: Option<PathBuf>,

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

    let mut config = RendererConfig::from_env()?;
    if let Some(file) = cli.file {
        config.input_path = file;
    }
    if cli.download_url.is_some() {
        config.download_url = cli.download_url;
    }
    if cli.sheet.is_some() {
        config.sheet = cli.sheet;
    }
    if let Some(col) = cli.state_column {
        config.columns.state = col;
    }
    if let Some(col) = cli.year_column {
        config.columns.year = col;
    }
    if let Some(col) = cli.value_column {
        config.columns.value = col;
    }
    if let Some(year) = cli.min_year {
        config.min_year = year;
    }
    if let Some(year) = cli.max_year {
        config.max_year = year;
    }
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    config.validate()?;
    info!("Rendering emissions map with config: {:?}", config);

    if let Some(url) = config.download_url.as_deref() {
        SpreadsheetDownloader::new()?
            .ensure_local(&config.input_path, url)
            .await?;
    }

    let loader = SpreadsheetLoader::new(config.input_path.clone())
        .with_sheet(config.sheet.clone())
        .with_columns(config.columns.clone());
    let sheet = loader.load()?;

    let map = ChoroplethMap::build(&sheet.rows, config.year_range());
    let report = map.report(&sheet.rejected);
    for excluded in &report.excluded {
        warn!(
            "Excluded '{}' ({}): {}",
            excluded.state,
            excluded
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "no year".to_string()),
            excluded.reason
        );
    }

    let options = RenderOptions {
        title: cli.title,
        colorscale: cli.colorscale,
        ..RenderOptions::default()
    };
    write_html(&config.output_path, &map, &options)?;

    info!(
        "Rendered {} states across {} year layers ({} rows excluded)",
        report.states_rendered,
        report.years.len(),
        report.excluded.len()
    );
    Ok(())
}
