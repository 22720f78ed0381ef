//! Windows backends for the inventory traits.

pub mod helpers;

pub mod cim;
pub mod pnputil;
pub mod windows_update;

use std::sync::Arc;
use std::time::Duration;

use crate::source::{DeviceMetadataQuery, DriverMetadataQuery, IdentifierSource, UpdateCatalog};

pub use cim::CimQuery;
pub use pnputil::{InstanceIdLabels, PnpUtilSource};
pub use windows_update::WindowsUpdateCatalog;

/// The full set of backends the inventory service needs.
#[derive(Clone)]
pub struct Backends {
    pub identifiers: Arc<dyn IdentifierSource>,
    pub devices: Arc<dyn DeviceMetadataQuery>,
    pub drivers: Arc<dyn DriverMetadataQuery>,
    pub updates: Arc<dyn UpdateCatalog>,
}

impl Backends {
    /// pnputil for enumeration, CIM for metadata, Windows Update for updates.
    pub fn windows(labels: InstanceIdLabels, timeout: Duration) -> Self {
        let cim = Arc::new(CimQuery::new(timeout));
        if !cim.is_available() {
            log::debug!("PowerShell not found; metadata lookups will fail");
        }
        Self {
            identifiers: Arc::new(PnpUtilSource::new(labels, timeout)),
            devices: cim.clone(),
            drivers: cim,
            updates: Arc::new(WindowsUpdateCatalog::new(timeout)),
        }
    }
}
