//! Canonical device records and the raw metadata they are assembled from.

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder for any field the upstream source did not provide.
pub const UNKNOWN: &str = "unknown";

/// The only upstream status string considered healthy.
pub const STATUS_OK: &str = "OK";

/// Prefix of `driver_version` when the driver lookup itself failed.
pub const DRIVER_ERROR_PREFIX: &str = "retrieval error: ";

/// `problem_code` assigned when the driver lookup failed.
pub const DRIVER_INFO_ERROR: &str = "driver info retrieval error";

/// `problem_code` of a device without a problem.
pub const NORMAL: &str = "normal";

/// One physical or logical device together with its driver state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub name: String,
    pub description: String,
    pub manufacturer: String,
    /// Identity key: dedup key and driver join key.
    pub device_id: String,
    pub device_class: String,
    /// Driver service name; fallback key for the driver lookup.
    pub service_name: String,
    pub status: String,
    pub hardware_id: String,
    pub driver_version: String,
    pub driver_date: String,
    pub has_problem: bool,
    pub problem_code: String,
}

impl DeviceRecord {
    /// Build a record with every field at its sentinel default.
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            name: UNKNOWN.to_string(),
            description: UNKNOWN.to_string(),
            manufacturer: UNKNOWN.to_string(),
            device_id: device_id.into(),
            device_class: UNKNOWN.to_string(),
            service_name: UNKNOWN.to_string(),
            status: UNKNOWN.to_string(),
            hardware_id: UNKNOWN.to_string(),
            driver_version: UNKNOWN.to_string(),
            driver_date: UNKNOWN.to_string(),
            has_problem: false,
            problem_code: NORMAL.to_string(),
        }
    }

    /// Assemble the base record (no driver data yet) from a metadata row.
    ///
    /// `device_id` is the identifier that was joined on; the row's own id is
    /// only used to confirm the match.
    pub fn from_metadata(device_id: &str, meta: &DeviceMetadata) -> Self {
        fn or_unknown(v: &Option<String>) -> String {
            match v.as_deref().map(str::trim) {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => UNKNOWN.to_string(),
            }
        }

        Self {
            name: or_unknown(&meta.name),
            description: or_unknown(&meta.description),
            manufacturer: or_unknown(&meta.manufacturer),
            device_id: device_id.to_string(),
            device_class: or_unknown(&meta.class),
            service_name: or_unknown(&meta.service_name),
            status: or_unknown(&meta.status),
            hardware_id: or_unknown(&meta.hardware_id),
            ..Self::new(device_id)
        }
    }

    /// Whether `driver_version` carries the lookup-failure sentinel.
    pub fn driver_lookup_failed(&self) -> bool {
        self.driver_version.starts_with(DRIVER_ERROR_PREFIX)
    }

    /// Whether the device needs the user's attention.
    ///
    /// Broader than `has_problem`: a non-`OK` status or a failed driver
    /// lookup also counts.
    pub fn is_actionable(&self) -> bool {
        self.has_problem || self.status != STATUS_OK || self.driver_lookup_failed()
    }

    /// Service name usable as a driver join key, if any.
    pub fn service_key(&self) -> Option<&str> {
        let s = self.service_name.trim();
        (!s.is_empty() && s != UNKNOWN).then_some(s)
    }

    /// One-line health summary.
    pub fn status_display(&self) -> String {
        if self.has_problem {
            format!("problem: {}", self.problem_code)
        } else {
            NORMAL.to_string()
        }
    }

    /// Why the device needs attention; empty exactly when it is not actionable.
    pub fn attention_reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        if self.has_problem && !self.driver_lookup_failed() {
            reasons.push(format!("problem: {}", self.problem_code));
        }
        if self.status != STATUS_OK {
            reasons.push(format!("status: {}", self.status));
        }
        if self.driver_lookup_failed() {
            reasons.push("driver info unavailable".to_string());
        }
        reasons
    }
}

/// Device metadata row as returned by the device-metadata query.
///
/// Field names follow the `Win32_PnPEntity` property names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    #[serde(rename = "DeviceID", default)]
    pub device_id: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Manufacturer", default)]
    pub manufacturer: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "PNPClass", default)]
    pub class: Option<String>,
    #[serde(rename = "Service", default)]
    pub service_name: Option<String>,
    #[serde(rename = "HardwareID", default, deserialize_with = "string_or_first")]
    pub hardware_id: Option<String>,
    /// `ConfigManagerErrorCode`; `None` when the source does not report one.
    #[serde(rename = "ConfigManagerErrorCode", default)]
    pub problem_code: Option<u32>,
}

/// Driver version and date from either driver-metadata source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverMetadata {
    #[serde(rename = "Version", alias = "DriverVersion", default)]
    pub version: Option<String>,
    #[serde(rename = "Date", alias = "DriverDate", alias = "InstallDate", default)]
    pub date: Option<String>,
}

impl DriverMetadata {
    /// The version string, unless missing, blank or the sentinel.
    pub fn known_version(&self) -> Option<&str> {
        match self.version.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() && v != UNKNOWN => Some(v),
            _ => None,
        }
    }
}

/// `HardwareID` is a string array on CIM; keep the most specific (first) id.
fn string_or_first<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) => Some(s),
        Some(OneOrMany::Many(v)) => v.into_iter().next(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy(id: &str) -> DeviceRecord {
        DeviceRecord {
            status: STATUS_OK.to_string(),
            driver_version: "10.0.1".to_string(),
            ..DeviceRecord::new(id)
        }
    }

    #[test]
    fn new_record_uses_sentinels() {
        let r = DeviceRecord::new("PCI\\VEN_1");
        assert_eq!(r.name, UNKNOWN);
        assert_eq!(r.driver_version, UNKNOWN);
        assert_eq!(r.driver_date, UNKNOWN);
        assert_eq!(r.problem_code, NORMAL);
        assert!(!r.has_problem);
    }

    #[test]
    fn from_metadata_fills_blanks_with_sentinel() {
        let meta = DeviceMetadata {
            name: Some("Speakers".to_string()),
            manufacturer: Some("  ".to_string()),
            status: Some("OK".to_string()),
            class: Some("Media".to_string()),
            ..Default::default()
        };
        let r = DeviceRecord::from_metadata("HDAUDIO\\1", &meta);
        assert_eq!(r.name, "Speakers");
        assert_eq!(r.manufacturer, UNKNOWN);
        assert_eq!(r.description, UNKNOWN);
        assert_eq!(r.device_class, "Media");
        assert_eq!(r.device_id, "HDAUDIO\\1");
    }

    #[test]
    fn healthy_record_is_not_actionable() {
        assert!(!healthy("A").is_actionable());
    }

    #[test]
    fn each_condition_makes_record_actionable() {
        let mut r = healthy("A");
        r.has_problem = true;
        assert!(r.is_actionable());

        let mut r = healthy("A");
        r.status = "Error".to_string();
        assert!(r.is_actionable());

        let mut r = healthy("A");
        r.driver_version = format!("{DRIVER_ERROR_PREFIX}access denied");
        assert!(r.is_actionable());
        assert!(!r.has_problem);
    }

    #[test]
    fn attention_reasons_name_each_condition() {
        assert!(healthy("A").attention_reasons().is_empty());

        let mut r = healthy("A");
        r.status = "Degraded".to_string();
        assert_eq!(r.status_display(), "normal");
        assert_eq!(r.attention_reasons(), vec!["status: Degraded"]);

        let mut r = healthy("A");
        r.has_problem = true;
        r.problem_code = "device cannot start".to_string();
        r.status = "Error".to_string();
        assert_eq!(
            r.attention_reasons(),
            vec!["problem: device cannot start", "status: Error"]
        );

        let mut r = healthy("A");
        r.has_problem = true;
        r.problem_code = DRIVER_INFO_ERROR.to_string();
        r.driver_version = format!("{DRIVER_ERROR_PREFIX}timed out");
        assert_eq!(r.attention_reasons(), vec!["driver info unavailable"]);
    }

    #[test]
    fn attention_reasons_agree_with_actionable() {
        let mut r = healthy("A");
        for step in 0..3 {
            match step {
                0 => r.status = "Unknown".to_string(),
                1 => r.has_problem = true,
                _ => r.driver_version = format!("{DRIVER_ERROR_PREFIX}x"),
            }
            assert_eq!(r.is_actionable(), !r.attention_reasons().is_empty());
        }
    }

    #[test]
    fn service_key_skips_sentinel_and_blank() {
        let mut r = DeviceRecord::new("A");
        assert_eq!(r.service_key(), None);
        r.service_name = " ".to_string();
        assert_eq!(r.service_key(), None);
        r.service_name = "HdAudAddService".to_string();
        assert_eq!(r.service_key(), Some("HdAudAddService"));
    }

    #[test]
    fn status_display() {
        let mut r = healthy("A");
        assert_eq!(r.status_display(), "normal");
        r.has_problem = true;
        r.problem_code = "device is disabled".to_string();
        assert_eq!(r.status_display(), "problem: device is disabled");
    }

    #[test]
    fn metadata_parses_cim_json() {
        let raw = r#"{"Name":"USB Hub","DeviceID":"USB\\ROOT_HUB30\\4&1","Description":null,
            "Manufacturer":"(Standard USB HUBs)","Status":"OK","PNPClass":"USB","Service":"USBHUB3",
            "HardwareID":["USB\\ROOT_HUB30&VID8086","USB\\ROOT_HUB30"],"ConfigManagerErrorCode":0}"#;
        let meta: DeviceMetadata = serde_json::from_str(raw).unwrap();
        assert_eq!(meta.device_id.as_deref(), Some("USB\\ROOT_HUB30\\4&1"));
        assert_eq!(meta.description, None);
        assert_eq!(meta.hardware_id.as_deref(), Some("USB\\ROOT_HUB30&VID8086"));
        assert_eq!(meta.problem_code, Some(0));
    }

    #[test]
    fn metadata_accepts_single_hardware_id_and_missing_code() {
        let raw = r#"{"DeviceID":"X","HardwareID":"ACPI\\PNP0303"}"#;
        let meta: DeviceMetadata = serde_json::from_str(raw).unwrap();
        assert_eq!(meta.hardware_id.as_deref(), Some("ACPI\\PNP0303"));
        assert_eq!(meta.problem_code, None);
    }

    #[test]
    fn driver_metadata_aliases() {
        let signed: DriverMetadata =
            serde_json::from_str(r#"{"DriverVersion":"6.0.1","DriverDate":"2023/05/01"}"#).unwrap();
        assert_eq!(signed.known_version(), Some("6.0.1"));

        let system: DriverMetadata =
            serde_json::from_str(r#"{"Version":null,"InstallDate":null}"#).unwrap();
        assert_eq!(system.known_version(), None);

        let sentinel = DriverMetadata {
            version: Some(UNKNOWN.to_string()),
            date: None,
        };
        assert_eq!(sentinel.known_version(), None);
    }
}
