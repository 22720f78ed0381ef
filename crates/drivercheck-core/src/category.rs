//! Named groups of device setup classes.

use serde::{Deserialize, Serialize};

/// Built-in presets: `(name, classes)`.
const BUILTIN: &[(&str, &[&str])] = &[
    ("Audio", &["Media", "AudioEndpoint"]),
    ("Display", &["Display"]),
    ("Network", &["Net"]),
    ("Bluetooth", &["Bluetooth"]),
    ("USB", &["USB"]),
    ("Keyboard & Mouse", &["Keyboard", "Mouse"]),
    ("Camera", &["Camera"]),
];

/// A user-facing device category and the setup classes it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCategory {
    pub name: String,
    pub classes: Vec<String>,
}

impl DeviceCategory {
    pub fn new(name: impl Into<String>, classes: &[&str]) -> Self {
        Self {
            name: name.into(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// The built-in presets.
    pub fn builtin() -> Vec<Self> {
        BUILTIN
            .iter()
            .map(|(name, classes)| Self::new(*name, classes))
            .collect()
    }

    /// Find a category by case-insensitive name.
    pub fn find<'a>(categories: &'a [Self], name: &str) -> Option<&'a Self> {
        let name = name.trim();
        categories.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_presets() {
        let all = DeviceCategory::builtin();
        assert_eq!(all.len(), 7);
        assert_eq!(all[0].name, "Audio");
        assert_eq!(all[0].classes, vec!["Media", "AudioEndpoint"]);
    }

    #[test]
    fn find_is_case_insensitive() {
        let all = DeviceCategory::builtin();
        let kbd = DeviceCategory::find(&all, " keyboard & mouse").unwrap();
        assert_eq!(kbd.classes, vec!["Keyboard", "Mouse"]);
        assert!(DeviceCategory::find(&all, "Printer").is_none());
    }
}
