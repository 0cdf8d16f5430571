use std::collections::{BTreeMap, HashSet};
use std::ops::RangeInclusive;
use tracing::{debug, info, instrument, warn};

use crate::emissions::model::{EmissionsRow, ExcludedRow, ExclusionReason};
use crate::emissions::states::{state_name, to_state_code};

/// One state's value within a year layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEntry {
    /// USPS code used as the map location
    pub code: &'static str,
    /// Canonical full state name, shown on hover
    pub name: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearLayer {
    /// Entries in spreadsheet row order
    pub entries: Vec<LayerEntry>,
}

impl YearLayer {
    pub fn value_for(&self, code: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.code == code).map(|e| e.value)
    }
}

/// Year-indexed choropleth data sharing one colour scale
#[derive(Debug, Clone, Default)]
pub struct ChoroplethMap {
    pub layers: BTreeMap<i32, YearLayer>,
    pub zmin: Option<f64>,
    pub zmax: Option<f64>,
    pub excluded: Vec<ExcludedRow>,
}

/// What a render run produced, for logging
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub years: Vec<i32>,
    pub states_rendered: usize,
    pub excluded: Vec<ExcludedRow>,
}

impl ChoroplethMap {
    /// Map states to boundary codes, keep years inside `years`, and group by year
    ///
    /// Rows that cannot be placed on the map are recorded in `excluded`; each
    /// distinct unmapped state name is logged once.
    #[instrument(skip(rows), fields(rows = rows.len()))]
    pub fn build(rows: &[EmissionsRow], years: RangeInclusive<i32>) -> Self {
        let mut map = ChoroplethMap::default();
        let mut reported_unmapped = HashSet::new();

        for row in rows {
            let exclude = |reason| ExcludedRow {
                state: row.state.clone(),
                year: Some(row.year),
                reason,
            };

            let Some(code) = to_state_code(&row.state) else {
                if reported_unmapped.insert(row.state.clone()) {
                    warn!("Unmapped state '{}' excluded from the map", row.state);
                }
                map.excluded.push(exclude(ExclusionReason::UnmappedState));
                continue;
            };

            if !years.contains(&row.year) {
                debug!("Year {} outside {:?}, skipping {}", row.year, years, row.state);
                map.excluded.push(exclude(ExclusionReason::YearOutOfRange));
                continue;
            }

            let layer = map.layers.entry(row.year).or_default();
            if layer.value_for(code).is_some() {
                warn!(
                    "Duplicate value for {} in {}, keeping the first",
                    row.state, row.year
                );
                map.excluded.push(exclude(ExclusionReason::Duplicate));
                continue;
            }

            layer.entries.push(LayerEntry {
                code,
                name: state_name(code).unwrap_or(code),
                value: row.value,
            });
            map.zmin = Some(map.zmin.map_or(row.value, |z| z.min(row.value)));
            map.zmax = Some(map.zmax.map_or(row.value, |z| z.max(row.value)));
        }

        info!(
            "Built {} year layers, {} rows excluded",
            map.layers.len(),
            map.excluded.len()
        );
        map
    }

    pub fn years(&self) -> Vec<i32> {
        self.layers.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Summary for this map; `rejected` are rows the loader already dropped
    pub fn report(&self, rejected: &[ExcludedRow]) -> RenderReport {
        let states: HashSet<&str> = self
            .layers
            .values()
            .flat_map(|layer| layer.entries.iter().map(|e| e.code))
            .collect();

        RenderReport {
            years: self.years(),
            states_rendered: states.len(),
            excluded: rejected.iter().chain(&self.excluded).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(state: &str, year: i32, value: f64) -> EmissionsRow {
        EmissionsRow {
            state: state.to_string(),
            year,
            value,
        }
    }

    #[test]
    fn test_one_layer_per_year() {
        let rows = vec![
            row("Texas", 2020, 20.0),
            row("Texas", 2019, 21.0),
            row("Ohio", 2021, 9.0),
            row("Ohio", 2019, 10.0),
        ];

        let map = ChoroplethMap::build(&rows, 1970..=2022);
        assert_eq!(map.years(), vec![2019, 2020, 2021]);
        assert_eq!(map.layers[&2019].entries.len(), 2);
        assert_eq!(map.layers[&2019].value_for("TX"), Some(21.0));
        assert_eq!(map.layers[&2019].value_for("OH"), Some(10.0));
        assert_eq!(map.zmin, Some(9.0));
        assert_eq!(map.zmax, Some(21.0));
        assert!(map.excluded.is_empty());
    }

    #[test]
    fn test_unmapped_states_excluded() {
        let rows = vec![
            row("United States", 2019, 900.0),
            row("Alaska", 2019, 1.5),
            row("United States", 2020, 880.0),
        ];

        let map = ChoroplethMap::build(&rows, 1970..=2022);
        assert_eq!(map.layers[&2019].entries.len(), 1);
        assert_eq!(map.excluded.len(), 2);
        assert!(map
            .excluded
            .iter()
            .all(|e| e.reason == ExclusionReason::UnmappedState));
        // Totals rows must not stretch the colour scale
        assert_eq!(map.zmax, Some(1.5));
        assert!(!map.layers.contains_key(&2020));
    }

    #[test]
    fn test_year_range_filter() {
        let rows = vec![row("Utah", 1969, 1.0), row("Utah", 1970, 2.0), row("Utah", 2023, 3.0)];

        let map = ChoroplethMap::build(&rows, 1970..=2022);
        assert_eq!(map.years(), vec![1970]);
        assert_eq!(
            map.excluded
                .iter()
                .filter(|e| e.reason == ExclusionReason::YearOutOfRange)
                .count(),
            2
        );
    }

    #[test]
    fn test_duplicate_state_keeps_first() {
        let rows = vec![row("Texas", 2019, 1.0), row("TX", 2019, 2.0)];

        let map = ChoroplethMap::build(&rows, 1970..=2022);
        assert_eq!(map.layers[&2019].value_for("TX"), Some(1.0));
        assert_eq!(map.excluded[0].reason, ExclusionReason::Duplicate);
    }

    #[test]
    fn test_codes_and_names_accepted() {
        let rows = vec![row("ny", 2019, 1.0), row("District of Columbia", 2019, 2.0)];
        let map = ChoroplethMap::build(&rows, 1970..=2022);
        let layer = &map.layers[&2019];
        assert_eq!(layer.entries[0].code, "NY");
        assert_eq!(layer.entries[0].name, "New York");
        assert_eq!(layer.entries[1].code, "DC");
    }

    #[test]
    fn test_report_combines_loader_rejections() {
        let rows = vec![row("Texas", 2019, 1.0), row("Ohio", 2020, 2.0), row("Atlantis", 2019, 3.0)];
        let map = ChoroplethMap::build(&rows, 1970..=2022);
        let rejected = vec![ExcludedRow {
            state: "Maine".to_string(),
            year: Some(2019),
            reason: ExclusionReason::MissingValue,
        }];

        let report = map.report(&rejected);
        assert_eq!(report.years, vec![2019, 2020]);
        assert_eq!(report.states_rendered, 2);
        assert_eq!(report.excluded.len(), 2);
        assert_eq!(report.excluded[0].state, "Maine");
        assert_eq!(report.excluded[1].state, "Atlantis");
    }

    #[test]
    fn test_empty_input() {
        let map = ChoroplethMap::build(&[], 1970..=2022);
        assert!(map.is_empty());
        assert_eq!(map.zmin, None);
    }
}
