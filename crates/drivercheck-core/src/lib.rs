//! # drivercheck-core
//!
//! Device and driver inventory for Windows machines.
//!
//! `drivercheck-core` enumerates devices by setup class, joins each one with
//! its descriptive metadata and driver version, classifies Configuration
//! Manager problem codes, and derives problem lists, statistics and update
//! recommendations from the result.
//!
//! ## Quick Start
//!
//! ```no_run
//! use drivercheck_core::{DeviceInventoryService, InventoryConfig};
//!
//! let service = DeviceInventoryService::from_config(&InventoryConfig::default());
//! let devices = service.get_devices(&["Media", "AudioEndpoint"]).unwrap();
//!
//! for device in service.get_problem_devices(&devices) {
//!     println!("{}: {}", device.name, device.problem_code);
//! }
//! ```
//!
//! ## Architecture
//!
//! Class filters → Enumerate ids → Resolve (parallel) → Dedup → Views
//!
//! Every external service sits behind a trait in [`source`]: identifier
//! enumeration, device metadata, driver metadata and the update catalog.
//! [`sources`] has the Windows implementations (pnputil, PowerShell CIM
//! queries, the Windows Update agent). A failed lookup for one device never
//! aborts the scan; it either drops that device or marks it as a problem.

pub mod category;
pub mod classify;
pub mod config;
pub mod dedup;
pub mod error;
pub mod inventory;
pub mod recommend;
pub mod record;
pub mod report;
pub mod resolver;
pub mod source;
pub mod sources;
pub mod stats;

pub use category::DeviceCategory;
pub use classify::ProblemClassifier;
pub use config::{DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_WORKERS, InventoryConfig};
pub use dedup::dedup_by_device_id;
pub use error::{InventoryError, LookupError};
pub use inventory::{CancelToken, DeviceInventoryService, ScanOutcome};
pub use recommend::{Recommendation, needs_attention, recommend};
pub use record::{DeviceMetadata, DeviceRecord, DriverMetadata};
pub use report::InventoryReport;
pub use resolver::DeviceRecordResolver;
pub use source::{
    BackendInfo, DeviceMetadataQuery, DriverMetadataQuery, IdentifierSource, Platform,
    UpdateCatalog,
};
pub use sources::Backends;
pub use stats::DeviceStatistics;

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
