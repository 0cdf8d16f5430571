use std::collections::BTreeMap;
use std::sync::OnceLock;

use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::crawler::record::{DataCenterRecord, FIXED_COLUMNS};
use crate::fetch_error::FetchError;
use crate::utils::{clean_text, format_date, MISSING_DATE};

/// Script holding the server-rendered `{"location": {...}}` payload
pub const LOCATION_SCRIPT_SELECTOR: &str = "body > div.page-wrapper > script:nth-child(6)";
const LOCATION_SCRIPT_FALLBACK: &str = "div.page-wrapper > script";
/// React-on-rails props carrying `resources[].created_at/updated_at`
pub const REACT_SCRIPT_SELECTOR: &str = "body > script.js-react-on-rails-component";

const OPERATOR_KEYS: [&str; 3] = ["providerName", "operator", "provider"];
const CAPACITY_KEYS: [&str; 4] = ["capacity", "totalPower", "powerCapacity", "grossBuildingSize"];

fn selector(cell: &'static OnceLock<Selector>, css: &'static str) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(css).expect("static selector parses"))
}

fn location_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    selector(&SELECTOR, LOCATION_SCRIPT_SELECTOR)
}

fn location_fallback_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    selector(&SELECTOR, LOCATION_SCRIPT_FALLBACK)
}

fn react_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    selector(&SELECTOR, REACT_SCRIPT_SELECTOR)
}

/// Parse a facility detail page into a record
///
/// `source` is the URL or file path the HTML came from and is kept on the record.
#[instrument(skip(html), fields(html_size = html.len()))]
pub fn parse_facility(html: &str, source: &str) -> Result<DataCenterRecord, FetchError> {
    let document = Html::parse_document(html);

    let location = find_location_object(&document).ok_or_else(|| {
        debug!(
            "HTML preview (first 300 chars): {}",
            html.chars().take(300).collect::<String>()
        );
        FetchError::LocationDataNotFound
    })?;

    let (created_at, updated_at) = match extract_resource_dates(&document) {
        Ok(dates) => dates,
        Err(e) => {
            warn!("Error extracting created_at/updated_at for {}: {}", source, e);
            (MISSING_DATE.to_string(), MISSING_DATE.to_string())
        }
    };

    build_record(location, created_at, updated_at, source)
}

fn find_location_object(document: &Html) -> Option<Map<String, Value>> {
    if let Some(location) = document
        .select(location_selector())
        .find_map(|s| location_from_script(&script_text(s)))
    {
        return Some(location);
    }

    debug!("Location script not at expected position, scanning page-wrapper scripts");
    document
        .select(location_fallback_selector())
        .find_map(|s| location_from_script(&script_text(s)))
}

fn script_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

fn location_from_script(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(mut root)) => match root.remove("location") {
            Some(Value::Object(location)) => Some(location),
            _ => None,
        },
        Ok(_) => None,
        Err(e) => {
            debug!("Script is not JSON: {}", e);
            None
        }
    }
}

/// Dates of the `resources` entry with `id == 1`, `N/A` when the payload is absent
fn extract_resource_dates(document: &Html) -> Result<(String, String), FetchError> {
    let Some(script) = document.select(react_selector()).next() else {
        return Ok((MISSING_DATE.to_string(), MISSING_DATE.to_string()));
    };

    let props: Value = serde_json::from_str(script_text(script).trim())?;
    let resource = props
        .get("resources")
        .and_then(Value::as_array)
        .and_then(|resources| {
            resources
                .iter()
                .find(|r| r.get("id").and_then(Value::as_i64) == Some(1))
        });

    Ok(match resource {
        Some(r) => (
            format_date(r.get("created_at").and_then(Value::as_str)),
            format_date(r.get("updated_at").and_then(Value::as_str)),
        ),
        None => (MISSING_DATE.to_string(), MISSING_DATE.to_string()),
    })
}

fn build_record(
    mut location: Map<String, Value>,
    created_at: String,
    updated_at: String,
    source: &str,
) -> Result<DataCenterRecord, FetchError> {
    let name = take_text(&mut location, &["name"])
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or(FetchError::MissingField("name"))?;

    let id = take_text(&mut location, &["id"]);
    let description = take_text(&mut location, &["description"]).map(|t| clean_text(&t));
    let summary = take_text(&mut location, &["summary"]).map(|t| clean_text(&t));
    let address = take_text(&mut location, &["fullAddress", "address"]).map(|t| clean_text(&t));
    let operator = take_operator(&mut location);
    let capacity = take_text(&mut location, &CAPACITY_KEYS);
    let latitude = take_coordinate(&mut location, &["latitude", "lat"]);
    let longitude = take_coordinate(&mut location, &["longitude", "lng"]);

    let extra = location
        .into_iter()
        .filter_map(|(key, value)| cell_text(&value).map(|text| (extra_column(key), text)))
        .collect::<BTreeMap<_, _>>();

    Ok(DataCenterRecord {
        id,
        name,
        description,
        summary,
        location: address,
        operator,
        capacity,
        latitude,
        longitude,
        created_at,
        updated_at,
        source_url: source.to_string(),
        extra,
    })
}

/// Leftovers named like a fixed column get a `raw_` prefix so the CSV keeps them
fn extra_column(key: String) -> String {
    if FIXED_COLUMNS.contains(&key.as_str()) {
        format!("raw_{key}")
    } else {
        key
    }
}

/// Remove the first key that holds a usable scalar and return it as text
fn take_text(map: &mut Map<String, Value>, keys: &[&str]) -> Option<String> {
    let key = keys
        .iter()
        .find(|k| map.get(**k).and_then(scalar_text).is_some())?;
    map.remove(*key).as_ref().and_then(scalar_text)
}

fn take_operator(map: &mut Map<String, Value>) -> Option<String> {
    for key in OPERATOR_KEYS {
        let name = match map.get(key) {
            Some(Value::Object(provider)) => provider.get("name").and_then(scalar_text),
            Some(other) => scalar_text(other),
            None => None,
        };
        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            map.remove(key);
            return Some(name.trim().to_string());
        }
    }
    None
}

fn take_coordinate(map: &mut Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let (key, coord) = keys.iter().find_map(|k| {
        let coord = match map.get(*k)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        Some((*k, coord))
    })?;
    map.remove(key);
    Some(coord)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// CSV text for a leftover field; nested values are kept as compact JSON
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
        Value::String(s) => Some(s.clone()),
        other => scalar_text(other),
    }
}
