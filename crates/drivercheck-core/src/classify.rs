//! Numeric device problem codes mapped to readable descriptions.

use std::collections::HashMap;

/// Configuration Manager problem codes with a fixed description.
const STANDARD_CODES: &[(u32, &str)] = &[
    (0, "normal"),
    (1, "device is not configured correctly"),
    (3, "driver may be corrupted"),
    (10, "device cannot start"),
    (12, "not enough free resources for this device"),
    (18, "reinstall the drivers for this device"),
    (22, "device is disabled"),
    (28, "drivers for this device are not installed"),
    (31, "device is not working properly"),
    (37, "Windows cannot load the driver for this device"),
    (39, "driver is corrupted or missing"),
    (43, "device stopped because a previous instance failed"),
    (45, "device is not currently connected to the computer"),
];

/// Immutable code → description table.
///
/// Built once and handed to whoever needs it; there is no global instance.
#[derive(Debug, Clone)]
pub struct ProblemClassifier {
    table: HashMap<u32, &'static str>,
}

impl ProblemClassifier {
    /// The standard Configuration Manager table.
    pub fn standard() -> Self {
        Self {
            table: STANDARD_CODES.iter().copied().collect(),
        }
    }

    /// Description for `code`, or `"unknown error (<code>)"`.
    pub fn describe(&self, code: u32) -> String {
        match self.table.get(&code) {
            Some(desc) => (*desc).to_string(),
            None => format!("unknown error ({code})"),
        }
    }

    /// Whether `code` has a fixed description.
    pub fn is_known(&self, code: u32) -> bool {
        self.table.contains_key(&code)
    }

    /// Number of codes in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for ProblemClassifier {
    fn default() -> Self {
        Self::standard()
    }
}
