use std::fmt;

/// One state/year/value row as read from the spreadsheet
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionsRow {
    /// State identifier exactly as written in the sheet (full name or code)
    pub state: String,
    pub year: i32,
    /// Million metric tons CO2 in the EIA series; the sheet's unit is carried through untouched
    pub value: f64,
}

/// A row that did not make it onto the map
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedRow {
    pub state: String,
    pub year: Option<i32>,
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExclusionReason {
    /// State or value cell is blank
    MissingValue,
    /// A cell holds something that is not a year / number
    Unparseable(String),
    /// State name has no map boundary
    UnmappedState,
    YearOutOfRange,
    /// Same state already has a value for this year
    Duplicate,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::MissingValue => write!(f, "missing value"),
            ExclusionReason::Unparseable(detail) => write!(f, "unparseable cell: {detail}"),
            ExclusionReason::UnmappedState => write!(f, "unmapped state"),
            ExclusionReason::YearOutOfRange => write!(f, "year out of range"),
            ExclusionReason::Duplicate => write!(f, "duplicate state/year"),
        }
    }
}
