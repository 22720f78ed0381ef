//! Turn problem devices and pending updates into next steps for the user.

use serde::{Deserialize, Serialize};

use crate::record::DeviceRecord;

/// Manual steps for fixing a device driver through Device Manager.
pub const DEVICE_MANAGER_STEPS: &[&str] = &[
    "Open Device Manager",
    "Right-click the device with a problem",
    "Choose \"Update driver\"",
    "If \"Search automatically for drivers\" finds nothing, choose \"Browse my computer for drivers\"",
    "Enter C:\\Windows as the search location and click \"Next\"",
];

/// Where to look for drivers in general.
pub const GENERAL_GUIDANCE: &[&str] = &[
    "Device Manager: Windows key + X, then Device Manager",
    "Windows Update: Settings, Windows Update, Check for updates",
    "Manufacturer: the official support page of each device vendor",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    /// Nothing needs fixing.
    NoActionNeeded,
    /// Devices with problems; fix through Device Manager.
    FixProblemDevices { count: usize, steps: Vec<String> },
    /// Driver updates are waiting in Windows Update.
    InstallAvailableUpdates { titles: Vec<String> },
    GeneralGuidance { tips: Vec<String> },
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

/// Recommendations for the given actionable devices and pending update titles.
pub fn recommend(problem_devices: &[DeviceRecord], updates: &[String]) -> Vec<Recommendation> {
    if problem_devices.is_empty() && updates.is_empty() {
        return vec![Recommendation::NoActionNeeded];
    }

    let mut out = Vec::new();
    if !problem_devices.is_empty() {
        out.push(Recommendation::FixProblemDevices {
            count: problem_devices.len(),
            steps: owned(DEVICE_MANAGER_STEPS),
        });
    }
    if !updates.is_empty() {
        out.push(Recommendation::InstallAvailableUpdates {
            titles: updates.to_vec(),
        });
    }
    out.push(Recommendation::GeneralGuidance {
        tips: owned(GENERAL_GUIDANCE),
    });
    out
}

/// Whether the caller should offer the driver update workflow.
pub fn needs_attention(recommendations: &[Recommendation]) -> bool {
    recommendations.iter().any(|r| {
        matches!(
            r,
            Recommendation::FixProblemDevices { .. } | Recommendation::InstallAvailableUpdates { .. }
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_to_do() {
        let recs = recommend(&[], &[]);
        assert_eq!(recs, vec![Recommendation::NoActionNeeded]);
        assert!(!needs_attention(&recs));
    }

    #[test]
    fn problems_and_updates() {
        let problems = vec![DeviceRecord::new("A"), DeviceRecord::new("B")];
        let updates = vec!["Realtek - Audio - 6.0".to_string()];
        let recs = recommend(&problems, &updates);
        assert_eq!(recs.len(), 3);
        assert!(matches!(recs[0], Recommendation::FixProblemDevices { count: 2, .. }));
        assert_eq!(
            recs[1],
            Recommendation::InstallAvailableUpdates {
                titles: updates.clone()
            }
        );
        assert!(matches!(recs[2], Recommendation::GeneralGuidance { .. }));
        assert!(needs_attention(&recs));
    }

    #[test]
    fn updates_only() {
        let recs = recommend(&[], &["x".to_string()]);
        assert_eq!(recs.len(), 2);
        assert!(needs_attention(&recs));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_string(&Recommendation::NoActionNeeded).unwrap();
        assert_eq!(json, r#"{"kind":"no_action_needed"}"#);
    }
}
