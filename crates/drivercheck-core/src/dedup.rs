//! Collapse records that share a device id.

use std::collections::HashSet;

use crate::record::DeviceRecord;

/// Keep the first record for each `device_id`, in input order.
///
/// Device instance ids compare case-insensitively.
pub fn dedup_by_device_id(records: Vec<DeviceRecord>) -> Vec<DeviceRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.device_id.to_ascii_uppercase()))
        .collect()
}
