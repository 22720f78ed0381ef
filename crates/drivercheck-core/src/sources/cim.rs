//! CimQuery: device and driver metadata through PowerShell CIM cmdlets.
//!
//! Each lookup runs one `Get-CimInstance` with an exact-match filter, keeps
//! the first row, projects the properties we need and emits compressed JSON.
//! An empty stdout means "no row".

use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;

use crate::error::LookupError;
use crate::record::{DeviceMetadata, DriverMetadata};
use crate::source::{BackendInfo, DeviceMetadataQuery, DriverMetadataQuery, Platform};

use super::helpers::{
    cim_filter, normalize_driver_date, program_available, run_command, utf8_powershell,
};

/// Absolute path of Windows PowerShell.
pub const POWERSHELL_EXE: &str = r"C:\Windows\System32\WindowsPowerShell\v1.0\powershell.exe";

pub struct CimQuery {
    info: BackendInfo,
    program: String,
    timeout: Duration,
}

impl CimQuery {
    pub fn new(timeout: Duration) -> Self {
        Self {
            info: BackendInfo {
                name: "cim",
                description: "Win32_PnPEntity / Win32_PnPSignedDriver / Win32_SystemDriver via Get-CimInstance",
                platform: Platform::Windows,
            },
            program: POWERSHELL_EXE.to_string(),
            timeout,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn is_available(&self) -> bool {
        cfg!(windows) && program_available(&self.program)
    }

    fn query<T: DeserializeOwned>(&self, script: &str) -> Result<Option<T>, LookupError> {
        let script = utf8_powershell(script);
        let stdout = run_command(
            &self.program,
            &["-NoProfile", "-NonInteractive", "-Command", &script],
            self.timeout,
        )?;
        parse_row(&stdout)
    }
}

/// Parse a single JSON row; blank output means no row.
pub fn parse_row<T: DeserializeOwned>(stdout: &str) -> Result<Option<T>, LookupError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}

pub fn device_script(device_id: &str) -> String {
    format!(
        "Get-CimInstance -ClassName Win32_PnPEntity -Filter {} | Select-Object -First 1 \
         Name,DeviceID,Description,Manufacturer,Status,PNPClass,Service,HardwareID,ConfigManagerErrorCode \
         | ConvertTo-Json -Compress",
        cim_filter("DeviceID", device_id)
    )
}

pub fn signed_driver_script(device_id: &str) -> String {
    format!(
        "Get-CimInstance -ClassName Win32_PnPSignedDriver -Filter {} | Select-Object -First 1 \
         DriverVersion,@{{n='DriverDate';e={{if ($_.DriverDate) {{ $_.DriverDate.ToString('yyyy/MM/dd') }}}}}} \
         | ConvertTo-Json -Compress",
        cim_filter("DeviceID", device_id)
    )
}

pub fn system_driver_script(service: &str) -> String {
    format!(
        "$d = Get-CimInstance -ClassName Win32_SystemDriver -Filter {} | Select-Object -First 1; \
         if ($d) {{ $p = $d.PathName -replace '^\\\\\\?\\?\\\\',''; \
         $v = if ($p) {{ (Get-Item -LiteralPath $p -ErrorAction SilentlyContinue).VersionInfo.FileVersion }}; \
         $t = if ($p) {{ (Get-Item -LiteralPath $p -ErrorAction SilentlyContinue).LastWriteTime }}; \
         [pscustomobject]@{{ Version = $v; InstallDate = if ($t) {{ $t.ToString('yyyy/MM/dd') }} }} | ConvertTo-Json -Compress }}",
        cim_filter("Name", service)
    )
}

fn tidy(mut driver: DriverMetadata) -> DriverMetadata {
    driver.date = driver.date.as_deref().map(normalize_driver_date);
    driver
}

impl DeviceMetadataQuery for CimQuery {
    fn info(&self) -> &BackendInfo {
        &self.info
    }

    fn device(&self, device_id: &str) -> Result<Option<DeviceMetadata>, LookupError> {
        let row = self.query::<DeviceMetadata>(&device_script(device_id))?;
        debug!("cim: Win32_PnPEntity {device_id} -> found={}", row.is_some());
        Ok(row)
    }
}

impl DriverMetadataQuery for CimQuery {
    fn info(&self) -> &BackendInfo {
        &self.info
    }

    fn driver_for_device(&self, device_id: &str) -> Result<Option<DriverMetadata>, LookupError> {
        Ok(self
            .query::<DriverMetadata>(&signed_driver_script(device_id))?
            .map(tidy))
    }

    fn driver_for_service(&self, service: &str) -> Result<Option<DriverMetadata>, LookupError> {
        Ok(self
            .query::<DriverMetadata>(&system_driver_script(service))?
            .map(tidy))
    }
}
