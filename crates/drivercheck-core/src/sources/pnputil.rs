//! PnpUtilSource: enumerates device instance ids with `pnputil /enum-devices`.
//!
//! pnputil prints one block per device. The line we care about is
//! `Instance ID:  <id>`, whose label is localized, so the accepted labels are
//! an allow-list that callers can extend.

use std::time::Duration;

use log::debug;

use crate::error::LookupError;
use crate::source::{BackendInfo, IdentifierSource, Platform};

use super::helpers::{is_plain_arg, program_available, run_command, utf8_console_command};

/// Absolute path of pnputil; avoids PATH lookups when run elevated.
pub const PNPUTIL_EXE: &str = r"C:\Windows\System32\pnputil.exe";

/// Built-in spellings of the "Instance ID:" label.
pub const DEFAULT_INSTANCE_ID_LABELS: &[&str] = &["Instance ID:", "インスタンス ID:"];

/// Accepted spellings of the instance-id label in pnputil output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdLabels {
    labels: Vec<String>,
}

impl InstanceIdLabels {
    /// Labels from an explicit list. Blank and duplicate entries are dropped.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self { labels: Vec::new() };
        out.extend(labels);
        out
    }

    /// Add more spellings, keeping the existing ones first.
    pub fn extend<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for label in labels {
            let label = label.into().trim().to_string();
            if !label.is_empty() && !self.labels.contains(&label) {
                self.labels.push(label);
            }
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The identifier on `line`, if the line carries one of the labels.
    pub fn match_line<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.labels.iter().find_map(|label| {
            let idx = line.find(label.as_str())?;
            let id = line[idx + label.len()..].trim();
            (!id.is_empty()).then_some(id)
        })
    }
}

impl Default for InstanceIdLabels {
    fn default() -> Self {
        Self::new(DEFAULT_INSTANCE_ID_LABELS.iter().copied())
    }
}

/// Extract every instance id from pnputil text output, in order.
pub fn parse_instance_ids(output: &str, labels: &InstanceIdLabels) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| labels.match_line(line))
        .map(str::to_string)
        .collect()
}

pub struct PnpUtilSource {
    info: BackendInfo,
    program: String,
    labels: InstanceIdLabels,
    timeout: Duration,
}

impl PnpUtilSource {
    pub fn new(labels: InstanceIdLabels, timeout: Duration) -> Self {
        Self {
            info: BackendInfo {
                name: "pnputil",
                description: "Device instance ids per setup class via pnputil /enum-devices",
                platform: Platform::Windows,
            },
            program: PNPUTIL_EXE.to_string(),
            labels,
            timeout,
        }
    }

    /// Use a different pnputil binary (e.g. one found on `PATH`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// The `cmd` line that runs pnputil for `class` with UTF-8 output.
    pub fn command_line(&self, class: &str) -> Result<(String, Vec<String>), LookupError> {
        if !is_plain_arg(class) {
            return Err(LookupError::Unavailable(format!(
                "device class {class:?} cannot be passed to pnputil"
            )));
        }
        Ok(utf8_console_command(
            &self.program,
            &["/enum-devices", "/class", class],
        ))
    }
}

impl IdentifierSource for PnpUtilSource {
    fn info(&self) -> &BackendInfo {
        &self.info
    }

    fn is_available(&self) -> bool {
        cfg!(windows) && program_available(&self.program)
    }

    fn enumerate(&self, class: &str) -> Result<Vec<String>, LookupError> {
        let (program, args) = self.command_line(class)?;
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = run_command(&program, &args, self.timeout)?;
        let ids = parse_instance_ids(&stdout, &self.labels);
        debug!("pnputil: class {class} -> {} instance id(s)", ids.len());
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGLISH: &str = "Microsoft PnP Utility\r\n\r\n\
        Instance ID:                HDAUDIO\\FUNC_01&VEN_10EC&DEV_0256\\4&2A3B&0&0001\r\n\
        Device Description:         Realtek High Definition Audio\r\n\
        Class Name:                 MEDIA\r\n\
        Status:                     Started\r\n\
        \r\n\
        Instance ID:                USB\\VID_046D&PID_0A87&MI_00\\7&1D5&0&0000\r\n\
        Device Description:         USB Audio Device\r\n";

    const JAPANESE: &str = "Microsoft PnP ユーティリティ\n\n\
        インスタンス ID:            SWD\\MMDEVAPI\\{0.0.0.00000000}.{AB12}\n\
        デバイスの説明:             スピーカー\n";

    #[test]
    fn parses_english_output() {
        let ids = parse_instance_ids(ENGLISH, &InstanceIdLabels::default());
        assert_eq!(
            ids,
            vec![
                "HDAUDIO\\FUNC_01&VEN_10EC&DEV_0256\\4&2A3B&0&0001",
                "USB\\VID_046D&PID_0A87&MI_00\\7&1D5&0&0000",
            ]
        );
    }

    #[test]
    fn parses_japanese_output() {
        let ids = parse_instance_ids(JAPANESE, &InstanceIdLabels::default());
        assert_eq!(ids, vec!["SWD\\MMDEVAPI\\{0.0.0.00000000}.{AB12}"]);
    }

    #[test]
    fn unknown_locale_yields_nothing_until_label_added() {
        let german = "Instanz-ID:    PCI\\VEN_8086&DEV_A0C8\\3&11583659&0&FB\n";
        let mut labels = InstanceIdLabels::default();
        assert!(parse_instance_ids(german, &labels).is_empty());

        labels.extend(["Instanz-ID:"]);
        assert_eq!(
            parse_instance_ids(german, &labels),
            vec!["PCI\\VEN_8086&DEV_A0C8\\3&11583659&0&FB"]
        );
    }

    #[test]
    fn label_without_value_is_skipped() {
        let ids = parse_instance_ids("Instance ID:   \n", &InstanceIdLabels::default());
        assert!(ids.is_empty());
    }

    #[test]
    fn labels_drop_blank_and_duplicates() {
        let labels = InstanceIdLabels::new(["Instance ID:", " ", "Instance ID:", "ID:"]);
        assert_eq!(labels.labels(), &["Instance ID:".to_string(), "ID:".to_string()]);
    }

    #[test]
    fn enumeration_asks_for_utf8_output() {
        let src = PnpUtilSource::new(InstanceIdLabels::default(), Duration::from_secs(1));
        let (program, args) = src.command_line("AudioEndpoint").unwrap();
        assert_eq!(program, "cmd");
        assert_eq!(&args[..4], ["/D", "/C", "chcp", "65001"]);
        assert_eq!(&args[6..], [PNPUTIL_EXE, "/enum-devices", "/class", "AudioEndpoint"]);
    }

    #[test]
    fn class_with_shell_metacharacters_is_refused() {
        let src = PnpUtilSource::new(InstanceIdLabels::default(), Duration::from_secs(1));
        assert!(src.command_line("Media&calc").is_err());
        assert!(src.enumerate("Media&calc").is_err());
    }

    #[test]
    fn missing_binary_is_not_available() {
        let src = PnpUtilSource::new(InstanceIdLabels::default(), Duration::from_secs(1))
            .with_program("/nonexistent/pnputil.exe");
        assert!(!src.is_available());
        assert!(src.enumerate("Media").is_err());
    }
}
