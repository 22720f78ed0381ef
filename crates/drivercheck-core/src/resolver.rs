//! Resolves one raw identifier into a full [`DeviceRecord`].
//!
//! Steps, each returning an explicit `Result`:
//! 1. Exact-match device metadata lookup. No row, a failed query, or a row for
//!    a different id all mean "no record".
//! 2. Numeric problem code classification.
//! 3. Driver lookup by device id, falling back to the service name. A failed
//!    driver lookup is not dropped: it is written onto the record as a problem.

use std::sync::Arc;

use log::{debug, warn};

use crate::classify::ProblemClassifier;
use crate::error::LookupError;
use crate::record::{DRIVER_ERROR_PREFIX, DRIVER_INFO_ERROR, DeviceRecord, DriverMetadata, UNKNOWN};
use crate::source::{DeviceMetadataQuery, DriverMetadataQuery};

pub struct DeviceRecordResolver {
    devices: Arc<dyn DeviceMetadataQuery>,
    drivers: Arc<dyn DriverMetadataQuery>,
    classifier: Arc<ProblemClassifier>,
}

impl DeviceRecordResolver {
    pub fn new(
        devices: Arc<dyn DeviceMetadataQuery>,
        drivers: Arc<dyn DriverMetadataQuery>,
        classifier: Arc<ProblemClassifier>,
    ) -> Self {
        Self {
            devices,
            drivers,
            classifier,
        }
    }

    /// Resolve `device_id`, or `None` if there is no matching device.
    pub fn resolve(&self, device_id: &str) -> Option<DeviceRecord> {
        let meta = match self.devices.device(device_id) {
            Ok(Some(meta)) => meta,
            Ok(None) => {
                debug!("no metadata for {device_id}");
                return None;
            }
            Err(e) => {
                warn!("metadata lookup for {device_id} failed: {e}");
                return None;
            }
        };

        // Instance ids are case-insensitive; keep the row's own spelling.
        let canonical = match meta.device_id.as_deref().map(str::trim) {
            Some(found) if found.eq_ignore_ascii_case(device_id) => found,
            Some(found) if !found.is_empty() => {
                debug!("metadata row {found} does not match {device_id}; skipping");
                return None;
            }
            _ => device_id,
        };

        let mut record = DeviceRecord::from_metadata(canonical, &meta);
        self.apply_problem_code(&mut record, meta.problem_code);

        if let Err(e) = self.apply_driver(&mut record) {
            warn!("driver lookup for {device_id} failed: {e}");
            record.driver_version = format!("{DRIVER_ERROR_PREFIX}{e}");
            record.has_problem = true;
            record.problem_code = DRIVER_INFO_ERROR.to_string();
        }

        Some(record)
    }

    fn apply_problem_code(&self, record: &mut DeviceRecord, code: Option<u32>) {
        let Some(code) = code else {
            return;
        };
        record.has_problem = code != 0;
        record.problem_code = self.classifier.describe(code);
    }

    fn apply_driver(&self, record: &mut DeviceRecord) -> Result<(), LookupError> {
        if let Some(driver) = self.drivers.driver_for_device(&record.device_id)? {
            fill_driver(record, &driver);
        }

        if record.driver_version != UNKNOWN {
            return Ok(());
        }
        if let Some(service) = record.service_key().map(str::to_string) {
            debug!("{}: falling back to system driver {service}", record.device_id);
            if let Some(driver) = self.drivers.driver_for_service(&service)? {
                fill_driver(record, &driver);
            }
        }

        Ok(())
    }
}

fn fill_driver(record: &mut DeviceRecord, driver: &DriverMetadata) {
    record.driver_version = driver.known_version().unwrap_or(UNKNOWN).to_string();
    if let Some(date) = driver.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        record.driver_date = date.to_string();
    }
}
