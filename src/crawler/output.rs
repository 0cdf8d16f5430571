use std::fs;
use std::path::Path;

use tracing::{info, instrument};

use crate::crawler::error::CrawlError;
use crate::crawler::record::{header_for, DataCenterRecord};

/// Write records as CSV with a header row, creating parent directories as needed
#[instrument(skip(records), fields(path = %path.display(), records = records.len()))]
pub fn write_records(path: &Path, records: &[DataCenterRecord]) -> Result<(), CrawlError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = fs::File::create(path)?;
    write_records_to(file, records)?;

    info!("Data saved to {}", path.display());
    Ok(())
}

/// Write records as CSV to any writer
pub fn write_records_to<W: std::io::Write>(
    writer: W,
    records: &[DataCenterRecord],
) -> Result<(), CrawlError> {
    let header = header_for(records);
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(&header)?;
    for record in records {
        csv_writer.write_record(header.iter().map(|column| record.cell(column)))?;
    }
    csv_writer.flush()?;

    Ok(())
}
