//! Device inventory: enumerate → resolve → dedup, plus the derived views.
//!
//! Architecture:
//! 1. Validate the class filters and check the enumerator is usable
//! 2. Enumerate raw ids per class; a failing class contributes nothing
//! 3. Resolve ids on a bounded worker pool, each id independently
//! 4. Merge results in identifier order on a single collector
//! 5. Drop repeated device ids
//!
//! Cancellation is cooperative: the token is checked before each class and
//! before each identifier. Work already started is allowed to finish and the
//! partial result is returned with `cancelled` set.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Instant;

use log::{debug, info, warn};

use crate::classify::ProblemClassifier;
use crate::config::{DEFAULT_WORKERS, InventoryConfig};
use crate::dedup::dedup_by_device_id;
use crate::error::InventoryError;
use crate::record::DeviceRecord;
use crate::resolver::DeviceRecordResolver;
use crate::source::{IdentifierSource, UpdateCatalog};
use crate::sources::Backends;
use crate::sources::helpers::is_plain_arg;
use crate::stats::DeviceStatistics;

/// Shared flag for stopping a scan early.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Resolved, deduplicated devices in enumeration order.
    pub devices: Vec<DeviceRecord>,
    /// Raw identifiers returned by the enumerator (duplicates included).
    pub identifiers: usize,
    /// True if the scan stopped early; `devices` is then partial.
    pub cancelled: bool,
}

pub struct DeviceInventoryService {
    identifiers: Arc<dyn IdentifierSource>,
    updates: Arc<dyn UpdateCatalog>,
    resolver: DeviceRecordResolver,
    workers: usize,
}

impl DeviceInventoryService {
    pub fn new(backends: Backends, classifier: Arc<ProblemClassifier>) -> Self {
        Self {
            identifiers: backends.identifiers,
            updates: backends.updates,
            resolver: DeviceRecordResolver::new(backends.devices, backends.drivers, classifier),
            workers: DEFAULT_WORKERS,
        }
    }

    /// Windows backends configured from `config`.
    pub fn from_config(config: &InventoryConfig) -> Self {
        let backends = Backends::windows(config.labels(), config.command_timeout());
        Self::new(backends, Arc::new(ProblemClassifier::standard())).with_workers(config.workers())
    }

    /// Number of resolution workers (at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// All devices in the given classes, one record per device id.
    pub fn get_devices<S: AsRef<str>>(
        &self,
        class_filters: &[S],
    ) -> Result<Vec<DeviceRecord>, InventoryError> {
        Ok(self.scan(class_filters, &CancelToken::new())?.devices)
    }

    /// Like [`get_devices`](Self::get_devices), but can be cancelled.
    pub fn scan<S: AsRef<str>>(
        &self,
        class_filters: &[S],
        cancel: &CancelToken,
    ) -> Result<ScanOutcome, InventoryError> {
        let filters = validate_filters(class_filters)?;
        if !self.identifiers.is_available() {
            return Err(InventoryError::SourceUnavailable(
                self.identifiers.info().name.to_string(),
            ));
        }

        let t0 = Instant::now();
        let (ids, enumerated_all) = self.enumerate(&filters, cancel);
        let (records, resolved_all) = self.resolve_all(&ids, cancel);
        let devices = dedup_by_device_id(records);
        let cancelled = !(enumerated_all && resolved_all);

        info!(
            "scan of {} class(es): {} id(s), {} device(s) in {:.2}s{}",
            filters.len(),
            ids.len(),
            devices.len(),
            t0.elapsed().as_secs_f64(),
            if cancelled { " (cancelled)" } else { "" }
        );

        Ok(ScanOutcome {
            devices,
            identifiers: ids.len(),
            cancelled,
        })
    }

    /// Devices that need attention (see [`DeviceRecord::is_actionable`]).
    pub fn get_problem_devices(&self, records: &[DeviceRecord]) -> Vec<DeviceRecord> {
        records.iter().filter(|r| r.is_actionable()).cloned().collect()
    }

    pub fn get_statistics(&self, records: &[DeviceRecord]) -> DeviceStatistics {
        DeviceStatistics::from_records(records)
    }

    /// Pending driver update titles; empty if the catalog cannot be queried.
    pub fn pending_updates(&self) -> Vec<String> {
        match self.updates.pending_driver_updates() {
            Ok(titles) => titles,
            Err(e) => {
                warn!("{}: update search failed: {e}", self.updates.info().name);
                Vec::new()
            }
        }
    }

    /// Raw ids of every class, and whether all classes were visited.
    fn enumerate(&self, filters: &[&str], cancel: &CancelToken) -> (Vec<String>, bool) {
        let mut ids = Vec::new();
        for class in filters {
            if cancel.is_cancelled() {
                return (ids, false);
            }
            match self.identifiers.enumerate(class) {
                Ok(found) => {
                    debug!("class {class}: {} id(s)", found.len());
                    ids.extend(found);
                }
                Err(e) => warn!("enumerating class {class} failed: {e}"),
            }
        }
        (ids, true)
    }

    /// Resolve every id in parallel; results come back in `ids` order.
    ///
    /// The flag is false when cancellation left some ids unresolved.
    fn resolve_all(&self, ids: &[String], cancel: &CancelToken) -> (Vec<DeviceRecord>, bool) {
        if ids.is_empty() {
            return (Vec::new(), true);
        }

        let workers = self.workers.min(ids.len());
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, Option<DeviceRecord>)>();

        std::thread::scope(|s| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                s.spawn(move || {
                    while !cancel.is_cancelled() {
                        let i = next.fetch_add(1, Ordering::SeqCst);
                        let Some(id) = ids.get(i) else {
                            break;
                        };
                        let record = self.resolve_one(id);
                        if tx.send((i, record)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(tx);

        let mut slots: Vec<(usize, Option<DeviceRecord>)> = rx.into_iter().collect();
        let resolved_all = slots.len() == ids.len();
        slots.sort_by_key(|(i, _)| *i);
        (slots.into_iter().filter_map(|(_, r)| r).collect(), resolved_all)
    }

    fn resolve_one(&self, id: &str) -> Option<DeviceRecord> {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.resolver.resolve(id))) {
            Ok(record) => record,
            Err(_) => {
                warn!("resolving {id} panicked; skipping");
                None
            }
        }
    }
}

/// Trimmed filters; rejects an empty list and blank or malformed entries.
///
/// A class name is letters, digits, `_`, `-` or `.`; anything else could be
/// read as a shell operator when handed to pnputil.
fn validate_filters<S: AsRef<str>>(class_filters: &[S]) -> Result<Vec<&str>, InventoryError> {
    if class_filters.is_empty() {
        return Err(InventoryError::NoClassFilters);
    }
    class_filters
        .iter()
        .map(|f| {
            let raw = f.as_ref();
            let class = raw.trim();
            if !is_plain_arg(class) {
                Err(InventoryError::InvalidClassFilter(raw.to_string()))
            } else {
                Ok(class)
            }
        })
        .collect()
}
