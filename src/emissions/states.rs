/// U.S. states plus the District of Columbia, keyed by full name
///
/// Codes are the USPS abbreviations Plotly's `USA-states` location mode expects.
pub const STATES: [(&str, &str); 51] = [
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("District of Columbia", "DC"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

/// Map a full state name or two-letter code to its USPS code
///
/// Matching ignores case and surrounding/internal repeated whitespace.
///
/// ```
/// use datacenter_emissions::emissions::states::to_state_code;
///
/// assert_eq!(to_state_code("New York"), Some("NY"));
/// assert_eq!(to_state_code(" district  of columbia "), Some("DC"));
/// assert_eq!(to_state_code("tx"), Some("TX"));
/// assert_eq!(to_state_code("United States"), None);
/// ```
pub fn to_state_code(name: &str) -> Option<&'static str> {
    let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return None;
    }

    STATES
        .iter()
        .find(|(full, code)| {
            full.eq_ignore_ascii_case(&normalized) || code.eq_ignore_ascii_case(&normalized)
        })
        .map(|(_, code)| *code)
}

/// Full name for a USPS code
pub fn state_name(code: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(_, c)| c.eq_ignore_ascii_case(code))
        .map(|(full, _)| *full)
}
