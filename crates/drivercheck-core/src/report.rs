//! Scan reports: one JSON document per scan.
//!
//! A report bundles the device list with every derived view (problems,
//! statistics, pending updates, recommendations) so it can be archived or
//! diffed without re-running the scan.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InventoryError;
use crate::inventory::{DeviceInventoryService, ScanOutcome};
use crate::record::DeviceRecord;
use crate::recommend::{Recommendation, recommend};
use crate::stats::DeviceStatistics;

/// Report format version.
pub const REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryReport {
    pub version: u32,
    pub id: String,
    /// Seconds since the Unix epoch.
    pub generated_at: u64,
    pub tool_version: String,
    /// Category name, if the scan was started from one.
    pub category: Option<String>,
    pub class_filters: Vec<String>,
    pub cancelled: bool,
    pub devices: Vec<DeviceRecord>,
    pub problems: Vec<DeviceRecord>,
    pub statistics: DeviceStatistics,
    /// `None` when the update search was skipped.
    pub updates: Option<Vec<String>>,
    pub recommendations: Vec<Recommendation>,
}

impl InventoryReport {
    /// Build a report from a finished scan.
    ///
    /// `updates` is `None` when the update search was not run; recommendations
    /// then only cover problem devices.
    pub fn build(
        service: &DeviceInventoryService,
        category: Option<&str>,
        class_filters: &[String],
        outcome: ScanOutcome,
        updates: Option<Vec<String>>,
    ) -> Self {
        let problems = service.get_problem_devices(&outcome.devices);
        let statistics = service.get_statistics(&outcome.devices);
        let recommendations = recommend(&problems, updates.as_deref().unwrap_or_default());
        Self {
            version: REPORT_VERSION,
            id: Uuid::new_v4().to_string(),
            generated_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            tool_version: crate::VERSION.to_string(),
            category: category.map(str::to_string),
            class_filters: class_filters.to_vec(),
            cancelled: outcome.cancelled,
            devices: outcome.devices,
            problems,
            statistics,
            updates,
            recommendations,
        }
    }

    pub fn to_json(&self) -> Result<String, InventoryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<(), InventoryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
