use std::collections::{BTreeMap, BTreeSet};

/// Columns that always lead the CSV header, in this order
pub const FIXED_COLUMNS: [&str; 12] = [
    "id",
    "name",
    "description",
    "summary",
    "location",
    "operator",
    "capacity",
    "latitude",
    "longitude",
    "created_at",
    "updated_at",
    "source_url",
];

/// One data center facility as extracted from its detail page
#[derive(Debug, Clone, PartialEq)]
pub struct DataCenterRecord {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub summary: Option<String>,
    /// Full street address
    pub location: Option<String>,
    pub operator: Option<String>,
    /// Power or floor-space capacity as published (units vary by listing)
    pub capacity: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
    pub source_url: String,
    /// Every other scalar the page publishes about the facility
    pub extra: BTreeMap<String, String>,
}

impl DataCenterRecord {
    /// Value for a header column; optional fields that are absent yield an empty cell
    pub fn cell(&self, column: &str) -> String {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        let coord = |v: Option<f64>| v.map(|c| c.to_string()).unwrap_or_default();

        match column {
            "id" => opt(&self.id),
            "name" => self.name.clone(),
            "description" => opt(&self.description),
            "summary" => opt(&self.summary),
            "location" => opt(&self.location),
            "operator" => opt(&self.operator),
            "capacity" => opt(&self.capacity),
            "latitude" => coord(self.latitude),
            "longitude" => coord(self.longitude),
            "created_at" => self.created_at.clone(),
            "updated_at" => self.updated_at.clone(),
            "source_url" => self.source_url.clone(),
            other => self.extra.get(other).cloned().unwrap_or_default(),
        }
    }
}

/// Header for a batch of records: fixed columns, then every extra key in sorted order
pub fn header_for(records: &[DataCenterRecord]) -> Vec<String> {
    let dynamic: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.extra.keys().map(String::as_str))
        .filter(|key| !FIXED_COLUMNS.contains(key))
        .collect();

    FIXED_COLUMNS
        .iter()
        .copied()
        .chain(dynamic)
        .map(str::to_string)
        .collect()
}
