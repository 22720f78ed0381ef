//! Inventory configuration, optionally loaded from a JSON file.
//!
//! ```json
//! {
//!   "workers": 8,
//!   "command_timeout_secs": 20.0,
//!   "instance_id_labels": ["Instanz-ID:"],
//!   "categories": [{ "name": "Printers", "classes": ["Printer", "PrintQueue"] }]
//! }
//! ```
//!
//! Every field is optional. Labels and categories are added on top of the
//! built-in ones.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::category::DeviceCategory;
use crate::error::InventoryError;
use crate::sources::InstanceIdLabels;

/// Default number of resolution workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default timeout for one external command, in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Resolution worker threads; 1 resolves sequentially.
    pub workers: usize,
    /// Timeout for each external command.
    pub command_timeout_secs: f64,
    /// Extra spellings of the pnputil "Instance ID:" label.
    pub instance_id_labels: Vec<String>,
    /// Extra device categories.
    pub categories: Vec<DeviceCategory>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            instance_id_labels: Vec::new(),
            categories: Vec::new(),
        }
    }
}

impl InventoryConfig {
    /// Load a config file. A missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        let config_err = |reason: String| InventoryError::Config {
            path: path.to_path_buf(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| config_err(e.to_string()))?;
        if !config.command_timeout_secs.is_finite() || config.command_timeout_secs <= 0.0 {
            return Err(config_err(format!(
                "command_timeout_secs must be positive, got {}",
                config.command_timeout_secs
            )));
        }
        Ok(config)
    }

    /// Worker count, at least 1.
    pub fn workers(&self) -> usize {
        self.workers.max(1)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.command_timeout_secs.max(0.001))
    }

    /// Built-in labels followed by the configured ones.
    pub fn labels(&self) -> InstanceIdLabels {
        let mut labels = InstanceIdLabels::default();
        labels.extend(self.instance_id_labels.iter().cloned());
        labels
    }

    /// Built-in categories followed by the configured ones.
    pub fn categories(&self) -> Vec<DeviceCategory> {
        let mut all = DeviceCategory::builtin();
        all.extend(self.categories.iter().cloned());
        all
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(text.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults() {
        let c = InventoryConfig::default();
        assert_eq!(c.workers(), DEFAULT_WORKERS);
        assert_eq!(c.command_timeout(), Duration::from_secs(30));
        assert_eq!(c.labels(), InstanceIdLabels::default());
        assert_eq!(c.categories().len(), 7);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let f = write_config(r#"{ "workers": 0, "instance_id_labels": ["Instanz-ID:"] }"#);
        let c = InventoryConfig::load(f.path()).unwrap();
        assert_eq!(c.workers(), 1);
        assert_eq!(c.command_timeout_secs, DEFAULT_COMMAND_TIMEOUT_SECS);
        let labels = c.labels();
        assert_eq!(labels.labels().len(), 3);
        assert_eq!(labels.labels()[2], "Instanz-ID:");
    }

    #[test]
    fn extra_categories_are_appended() {
        let f = write_config(
            r#"{ "categories": [{ "name": "Printers", "classes": ["Printer"] }] }"#,
        );
        let c = InventoryConfig::load(f.path()).unwrap();
        let all = c.categories();
        assert_eq!(all.len(), 8);
        assert_eq!(all[7].name, "Printers");
    }

    #[test]
    fn malformed_file_is_config_error() {
        let f = write_config("{ workers: ");
        let err = InventoryConfig::load(f.path()).unwrap_err();
        assert!(matches!(err, InventoryError::Config { .. }));
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = InventoryConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, InventoryError::Config { .. }));
    }

    #[test]
    fn non_positive_timeout_rejected() {
        let f = write_config(r#"{ "command_timeout_secs": 0 }"#);
        assert!(InventoryConfig::load(f.path()).is_err());
    }
}
