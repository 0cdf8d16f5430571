use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_LISTING_URL: &str = "https://www.datacenters.com/locations";
pub const DEFAULT_PAGE_RANGES: &str = "1-50,51-100,101-105";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid page range '{0}': expected START-END with 1 <= START <= END")]
    InvalidPageRange(String),
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
    #[error("Invalid year range: min year {min} is after max year {max}")]
    InvalidYearRange { min: i32, max: i32 },
}

/// Inclusive span of listing pages; each span gets its own intermediate CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Result<Self, ConfigError> {
        if start == 0 || start > end {
            return Err(ConfigError::InvalidPageRange(format!("{start}-{end}")));
        }
        Ok(Self { start, end })
    }

    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }

    pub fn page_count(&self) -> u64 {
        u64::from(self.end - self.start + 1)
    }

    /// File name used for the intermediate CSV of this range
    pub fn file_name(&self) -> String {
        format!("data_page_{}_to_{}.csv", self.start, self.end)
    }
}

impl FromStr for PageRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || ConfigError::InvalidPageRange(trimmed.to_string());

        let (start, end) = match trimmed.split_once('-') {
            Some((start, end)) => (start.trim(), end.trim()),
            None => (trimmed, trimmed),
        };
        let start = start.parse::<u32>().map_err(|_| invalid())?;
        let end = end.parse::<u32>().map_err(|_| invalid())?;

        PageRange::new(start, end).map_err(|_| invalid())
    }
}

/// Parse a comma-separated list such as `1-50,51-100,101-105`
pub fn parse_page_ranges(value: &str) -> Result<Vec<PageRange>, ConfigError> {
    let ranges = value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(PageRange::from_str)
        .collect::<Result<Vec<_>, _>>()?;

    if ranges.is_empty() {
        return Err(ConfigError::InvalidPageRange(value.to_string()));
    }
    Ok(ranges)
}

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub listing_url: String,
    pub page_ranges: Vec<PageRange>,
    pub output_dir: PathBuf,
    pub request_delay_ms: u64,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl CrawlerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(CrawlerConfig {
            listing_url: env::var("CRAWL_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_LISTING_URL.to_string()),
            page_ranges: parse_page_ranges(
                &env::var("CRAWL_PAGE_RANGES").unwrap_or_else(|_| DEFAULT_PAGE_RANGES.to_string()),
            )?,
            output_dir: env::var("CRAWL_OUTPUT_DIR")
                .unwrap_or_else(|_| "output".to_string())
                .into(),
            request_delay_ms: parse_var("CRAWL_REQUEST_DELAY_MS", 500)?,
            user_agent: env::var("CRAWL_USER_AGENT").unwrap_or_else(|_| default_user_agent()),
            timeout_secs: parse_var("CRAWL_TIMEOUT_SECS", 30)?,
        })
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            page_ranges: vec![
                PageRange { start: 1, end: 50 },
                PageRange { start: 51, end: 100 },
                PageRange { start: 101, end: 105 },
            ],
            output_dir: PathBuf::from("output"),
            request_delay_ms: 500,
            user_agent: default_user_agent(),
            timeout_secs: 30,
        }
    }
}

/// Column names looked up (case-insensitively) in the spreadsheet header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub state: String,
    pub year: String,
    pub value: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            state: "state".to_string(),
            year: "year".to_string(),
            value: "emissions".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub input_path: PathBuf,
    pub download_url: Option<String>,
    pub sheet: Option<String>,
    pub columns: ColumnNames,
    pub min_year: i32,
    pub max_year: i32,
    pub output_path: PathBuf,
}

impl RendererConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = ColumnNames::default();
        let config = RendererConfig {
            input_path: env::var("EMISSIONS_FILE")
                .unwrap_or_else(|_| "eia_emissions_commercial.xlsx".to_string())
                .into(),
            download_url: env::var("EMISSIONS_DOWNLOAD_URL").ok().filter(|s| !s.is_empty()),
            sheet: env::var("EMISSIONS_SHEET").ok().filter(|s| !s.is_empty()),
            columns: ColumnNames {
                state: env::var("EMISSIONS_STATE_COLUMN").unwrap_or(defaults.state),
                year: env::var("EMISSIONS_YEAR_COLUMN").unwrap_or(defaults.year),
                value: env::var("EMISSIONS_VALUE_COLUMN").unwrap_or(defaults.value),
            },
            min_year: parse_var("EMISSIONS_MIN_YEAR", 1970)?,
            max_year: parse_var("EMISSIONS_MAX_YEAR", 2022)?,
            output_path: env::var("EMISSIONS_OUTPUT")
                .unwrap_or_else(|_| "state_emissions_map.html".to_string())
                .into(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_year > self.max_year {
            return Err(ConfigError::InvalidYearRange {
                min: self.min_year,
                max: self.max_year,
            });
        }
        Ok(())
    }

    pub fn year_range(&self) -> std::ops::RangeInclusive<i32> {
        self.min_year..=self.max_year
    }
}

fn default_user_agent() -> String {
    format!("datacenter-emissions/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        Err(_) => Ok(default),
    }
}
