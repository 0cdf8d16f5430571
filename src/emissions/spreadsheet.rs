use std::path::PathBuf;

use calamine::{open_workbook_auto, Data, Range, Reader};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::ColumnNames;
use crate::emissions::model::{EmissionsRow, ExcludedRow, ExclusionReason};

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Failed to open workbook {path}: {msg}")]
    WorkbookOpen { path: String, msg: String },

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Workbook has no sheets")]
    NoSheets,

    #[error("Sheet is empty")]
    EmptySheet,

    #[error("Missing column '{0}' in header row")]
    MissingColumn(String),
}

/// Parsed rows plus the rows that were dropped while reading
#[derive(Debug, Default)]
pub struct SheetData {
    pub rows: Vec<EmissionsRow>,
    pub rejected: Vec<ExcludedRow>,
}

/// Reads a state/year/value table out of an xlsx/xls/ods workbook
pub struct SpreadsheetLoader {
    path: PathBuf,
    sheet: Option<String>,
    columns: ColumnNames,
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndexes {
    state: usize,
    year: usize,
    value: usize,
}

impl SpreadsheetLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet: None,
            columns: ColumnNames::default(),
        }
    }

    /// Read `sheet` instead of the first sheet
    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn with_columns(mut self, columns: ColumnNames) -> Self {
        self.columns = columns;
        self
    }

    /// Open the workbook and parse the configured sheet
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<SheetData, SpreadsheetError> {
        let open_error = |msg: String| SpreadsheetError::WorkbookOpen {
            path: self.path.display().to_string(),
            msg,
        };

        if !self.path.exists() {
            return Err(open_error("file not found".to_string()));
        }
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| open_error(e.to_string()))?;

        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or(SpreadsheetError::NoSheets)?,
        };
        debug!("Reading sheet '{}'", sheet_name);

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|_| SpreadsheetError::SheetNotFound(sheet_name.clone()))?;

        self.parse_range(&range)
    }

    /// Parse an already-loaded sheet; the first row of `range` is the header
    pub fn parse_range(&self, range: &Range<Data>) -> Result<SheetData, SpreadsheetError> {
        if range.is_empty() {
            return Err(SpreadsheetError::EmptySheet);
        }

        let columns = self.locate_columns(range)?;
        debug!("Column indexes: {:?}", columns);

        let mut data = SheetData::default();

        for row_idx in 1..range.height() {
            let state = cell_text(range.get((row_idx, columns.state)));
            let year_cell = range.get((row_idx, columns.year));
            let value_cell = range.get((row_idx, columns.value));

            // Fully blank trailing rows are common in exported sheets
            if state.is_none() && is_blank(year_cell) && is_blank(value_cell) {
                continue;
            }

            let year = match parse_year(year_cell) {
                Ok(year) => year,
                Err(reason) => {
                    warn!("Row {}: {}", row_idx + 1, reason);
                    data.rejected.push(ExcludedRow {
                        state: state.unwrap_or_default(),
                        year: None,
                        reason,
                    });
                    continue;
                }
            };

            let value = match parse_value(value_cell) {
                Ok(value) => value,
                Err(reason) => {
                    if reason != ExclusionReason::MissingValue {
                        warn!("Row {}: {}", row_idx + 1, reason);
                    }
                    data.rejected.push(ExcludedRow {
                        state: state.unwrap_or_default(),
                        year: Some(year),
                        reason,
                    });
                    continue;
                }
            };

            let Some(state) = state else {
                data.rejected.push(ExcludedRow {
                    state: String::new(),
                    year: Some(year),
                    reason: ExclusionReason::MissingValue,
                });
                continue;
            };

            data.rows.push(EmissionsRow { state, year, value });
        }

        let missing = data
            .rejected
            .iter()
            .filter(|r| r.reason == ExclusionReason::MissingValue)
            .count();
        if missing > 0 {
            info!("Dropped {} rows with a missing state or value", missing);
        }
        info!(
            "Loaded {} emissions rows ({} rejected)",
            data.rows.len(),
            data.rejected.len()
        );
        Ok(data)
    }

    fn locate_columns(&self, range: &Range<Data>) -> Result<ColumnIndexes, SpreadsheetError> {
        let headers: Vec<String> = (0..range.width())
            .map(|col| cell_text(range.get((0, col))).unwrap_or_default())
            .collect();

        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(wanted.trim()))
                .ok_or_else(|| SpreadsheetError::MissingColumn(wanted.to_string()))
        };

        Ok(ColumnIndexes {
            state: find(&self.columns.state)?,
            year: find(&self.columns.year)?,
            value: find(&self.columns.value)?,
        })
    }
}

fn is_blank(cell: Option<&Data>) -> bool {
    match cell {
        None | Some(Data::Empty) => true,
        Some(Data::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

/// Trimmed text of a label cell; blank cells yield `None`
fn cell_text(cell: Option<&Data>) -> Option<String> {
    let text = match cell? {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn parse_year(cell: Option<&Data>) -> Result<i32, ExclusionReason> {
    let unparseable = |shown: String| ExclusionReason::Unparseable(format!("year '{shown}'"));

    match cell {
        Some(Data::Int(i)) => i32::try_from(*i).map_err(|_| unparseable(i.to_string())),
        Some(Data::Float(f)) if f.fract() == 0.0 && f.abs() < f64::from(i32::MAX) => Ok(*f as i32),
        Some(Data::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(ExclusionReason::MissingValue);
            }
            trimmed.parse::<i32>().map_err(|_| unparseable(trimmed.to_string()))
        }
        None | Some(Data::Empty) => Err(ExclusionReason::MissingValue),
        Some(other) => Err(unparseable(other.to_string())),
    }
}

fn parse_value(cell: Option<&Data>) -> Result<f64, ExclusionReason> {
    let value = match cell {
        Some(Data::Float(f)) => *f,
        Some(Data::Int(i)) => *i as f64,
        Some(Data::String(s)) => {
            let trimmed = s.trim().replace(',', "");
            if trimmed.is_empty()
                || trimmed.eq_ignore_ascii_case("n/a")
                || trimmed.eq_ignore_ascii_case("na")
                || trimmed.chars().all(|c| c == '-' || c == '_')
            {
                return Err(ExclusionReason::MissingValue);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| ExclusionReason::Unparseable(format!("value '{}'", s.trim())))?
        }
        None | Some(Data::Empty) | Some(Data::Error(_)) => return Err(ExclusionReason::MissingValue),
        Some(other) => {
            return Err(ExclusionReason::Unparseable(format!("value '{other}'")));
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExclusionReason::Unparseable(format!("value '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[Data]]) -> Range<Data> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    #[test]
    fn test_parse_range_reads_rows() {
        let range = sheet(&[
            &[s("state"), s("year"), s("emissions")],
            &[s("Texas"), Data::Float(2019.0), Data::Float(21.5)],
            &[s("CA"), Data::Int(2020), s("18.25")],
        ]);

        let data = SpreadsheetLoader::new("unused.xlsx").parse_range(&range).unwrap();
        assert_eq!(
            data.rows,
            vec![
                EmissionsRow { state: "Texas".into(), year: 2019, value: 21.5 },
                EmissionsRow { state: "CA".into(), year: 2020, value: 18.25 },
            ]
        );
        assert!(data.rejected.is_empty());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive_and_order_free() {
        let range = sheet(&[
            &[s("Emissions"), s("Note"), s("STATE"), s(" Year ")],
            &[Data::Float(3.0), s("x"), s("Ohio"), Data::Int(2021)],
        ]);

        let data = SpreadsheetLoader::new("unused.xlsx").parse_range(&range).unwrap();
        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0].state, "Ohio");
        assert_eq!(data.rows[0].value, 3.0);
    }

    #[test]
    fn test_custom_column_names() {
        let range = sheet(&[
            &[s("region"), s("yr"), s("co2_mmt")],
            &[s("Utah"), Data::Int(2019), Data::Float(1.5)],
        ]);
        let loader = SpreadsheetLoader::new("unused.xlsx").with_columns(ColumnNames {
            state: "region".into(),
            year: "yr".into(),
            value: "co2_mmt".into(),
        });

        let data = loader.parse_range(&range).unwrap();
        assert_eq!(data.rows.len(), 1);
    }

    #[test]
    fn test_missing_column() {
        let range = sheet(&[&[s("state"), s("year")], &[s("Iowa"), Data::Int(2019)]]);
        let result = SpreadsheetLoader::new("unused.xlsx").parse_range(&range);
        match result {
            Err(SpreadsheetError::MissingColumn(col)) => assert_eq!(col, "emissions"),
            other => panic!("Expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_drops_missing_and_reports_unparseable() {
        let range = sheet(&[
            &[s("state"), s("year"), s("emissions")],
            &[s("Maine"), Data::Int(2019), Data::Empty],
            &[Data::Empty, Data::Int(2019), Data::Float(2.0)],
            &[s("Idaho"), s("twenty"), Data::Float(2.0)],
            &[s("Iowa"), Data::Int(2019), s("lots")],
            &[s("Kansas"), Data::Int(2019), s("--")],
            &[Data::Empty, Data::Empty, Data::Empty],
            &[s("Texas"), Data::Int(2019), s("1,234.5")],
        ]);

        let data = SpreadsheetLoader::new("unused.xlsx").parse_range(&range).unwrap();
        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0].value, 1234.5);

        let reasons: Vec<_> = data.rejected.iter().map(|r| r.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                ExclusionReason::MissingValue,
                ExclusionReason::MissingValue,
                ExclusionReason::Unparseable("year 'twenty'".into()),
                ExclusionReason::Unparseable("value 'lots'".into()),
                ExclusionReason::MissingValue,
            ]
        );
    }

    #[test]
    fn test_fractional_year_is_rejected() {
        assert!(matches!(
            parse_year(Some(&Data::Float(2019.5))),
            Err(ExclusionReason::Unparseable(_))
        ));
    }

    #[test]
    fn test_nan_value_is_rejected() {
        assert!(matches!(
            parse_value(Some(&s("NaN"))),
            Err(ExclusionReason::Unparseable(_))
        ));
    }

    #[test]
    fn test_missing_workbook() {
        let result = SpreadsheetLoader::new("/nonexistent/emissions.xlsx").load();
        match result {
            Err(SpreadsheetError::WorkbookOpen { path, msg }) => {
                assert!(path.contains("emissions.xlsx"));
                assert!(msg.contains("not found"));
            }
            other => panic!("Expected WorkbookOpen error, got {other:?}"),
        }
    }
}
