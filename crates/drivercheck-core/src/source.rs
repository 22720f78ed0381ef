//! Traits for the external services the inventory pipeline talks to.
//!
//! Every backend declares a [`BackendInfo`] and an availability probe, then
//! implements one lookup. The pipeline only ever sees these traits, so tests
//! and non-Windows builds can swap in their own implementations.

use crate::error::LookupError;
use crate::record::{DeviceMetadata, DriverMetadata};

/// Target platform of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Works anywhere (in-memory or test backends).
    Any,
    /// Requires Windows tooling (pnputil, PowerShell CIM cmdlets).
    Windows,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Metadata about a backend.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    /// Short identifier (e.g. `"pnputil"`).
    pub name: &'static str,
    /// One-line description of what the backend queries.
    pub description: &'static str,
    pub platform: Platform,
}

/// Enumerates raw device instance identifiers for one device class.
pub trait IdentifierSource: Send + Sync {
    fn info(&self) -> &BackendInfo;

    /// Whether the enumeration mechanism can run on this machine at all.
    fn is_available(&self) -> bool;

    /// Instance identifiers of every device in `class`, in reported order.
    fn enumerate(&self, class: &str) -> Result<Vec<String>, LookupError>;
}

/// Looks up descriptive metadata for one exact device identifier.
pub trait DeviceMetadataQuery: Send + Sync {
    fn info(&self) -> &BackendInfo;

    /// Zero or one metadata row whose `DeviceID` is `device_id`.
    fn device(&self, device_id: &str) -> Result<Option<DeviceMetadata>, LookupError>;
}

/// Looks up driver version and date.
///
/// Two keys are supported: the device identifier (signed PnP driver) and the
/// driver service name (system driver registry).
pub trait DriverMetadataQuery: Send + Sync {
    fn info(&self) -> &BackendInfo;

    fn driver_for_device(&self, device_id: &str) -> Result<Option<DriverMetadata>, LookupError>;

    fn driver_for_service(&self, service: &str) -> Result<Option<DriverMetadata>, LookupError>;
}

/// Lists pending driver updates offered by the OS update service.
pub trait UpdateCatalog: Send + Sync {
    fn info(&self) -> &BackendInfo;

    /// Human-readable titles of pending driver updates.
    fn pending_driver_updates(&self) -> Result<Vec<String>, LookupError>;
}
