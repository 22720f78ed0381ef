//! Grouped counts over a resolved device set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::record::{DeviceRecord, UNKNOWN};

/// Device counts grouped by class, status and manufacturer.
///
/// Map iteration order is unspecified; use [`DeviceStatistics::sorted`] for
/// display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatistics {
    pub class_count: HashMap<String, usize>,
    pub status_count: HashMap<String, usize>,
    pub manufacturer_count: HashMap<String, usize>,
}

impl DeviceStatistics {
    /// Count `records` in one pass.
    pub fn from_records(records: &[DeviceRecord]) -> Self {
        let mut stats = Self::default();
        for r in records {
            bump(&mut stats.class_count, &r.device_class);
            bump(&mut stats.status_count, &r.status);
            bump(&mut stats.manufacturer_count, &r.manufacturer);
        }
        stats
    }

    /// Total number of records counted.
    pub fn total(&self) -> usize {
        self.class_count.values().sum()
    }

    /// Entries of `map` by descending count, then by key.
    pub fn sorted(map: &HashMap<String, usize>) -> Vec<(&str, usize)> {
        let mut rows: Vec<(&str, usize)> = map.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }
}

fn bump(map: &mut HashMap<String, usize>, key: &str) {
    let key = match key.trim() {
        "" => UNKNOWN,
        k => k,
    };
    *map.entry(key.to_string()).or_insert(0) += 1;
}
