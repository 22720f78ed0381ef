//! WindowsUpdateCatalog: pending driver updates from the Windows Update agent.

use std::time::Duration;

use log::debug;

use crate::error::LookupError;
use crate::source::{BackendInfo, Platform, UpdateCatalog};

use super::cim::POWERSHELL_EXE;
use super::helpers::{run_command, utf8_powershell};

/// Searches for not-yet-installed driver updates and prints one title per line.
const SEARCH_SCRIPT: &str = "$s = New-Object -ComObject Microsoft.Update.Session; \
    $r = $s.CreateUpdateSearcher().Search(\"IsInstalled=0 and Type='Driver'\"); \
    foreach ($u in $r.Updates) { Write-Output $u.Title }";

/// Update searches are slow; never give them less than this.
const MIN_SEARCH_TIMEOUT: Duration = Duration::from_secs(120);

pub struct WindowsUpdateCatalog {
    info: BackendInfo,
    program: String,
    timeout: Duration,
}

impl WindowsUpdateCatalog {
    pub fn new(timeout: Duration) -> Self {
        Self {
            info: BackendInfo {
                name: "windows_update",
                description: "Pending driver updates via the Microsoft.Update.Session COM API",
                platform: Platform::Windows,
            },
            program: POWERSHELL_EXE.to_string(),
            timeout: timeout.max(MIN_SEARCH_TIMEOUT),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

/// One title per non-blank line.
pub fn parse_update_titles(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

impl UpdateCatalog for WindowsUpdateCatalog {
    fn info(&self) -> &BackendInfo {
        &self.info
    }

    fn pending_driver_updates(&self) -> Result<Vec<String>, LookupError> {
        let script = utf8_powershell(SEARCH_SCRIPT);
        let stdout = run_command(
            &self.program,
            &["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-Command", &script],
            self.timeout,
        )?;
        let titles = parse_update_titles(&stdout);
        debug!("windows_update: {} pending driver update(s)", titles.len());
        Ok(titles)
    }
}
