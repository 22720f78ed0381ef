//! Error types for lookups and inventory operations.
//!
//! [`LookupError`] covers a single external call (one enumeration, one
//! metadata query). These are absorbed by the pipeline and turned into
//! degraded data. [`InventoryError`] is what an operation as a whole returns
//! when it cannot run at all.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Failure of one external enumeration or metadata query.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with status {}", code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    Exit { program: String, code: Option<i32> },

    #[error("`{program}` timed out after {:.1}s", after.as_secs_f64())]
    Timeout { program: String, after: Duration },

    #[error("malformed query output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Unavailable(String),
}

/// Operation-level failure of the inventory service.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("no device class filters given")]
    NoClassFilters,

    #[error("invalid device class filter {0:?}")]
    InvalidClassFilter(String),

    #[error("device enumeration is unavailable: {0}")]
    SourceUnavailable(String),

    #[error("config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_error_without_code() {
        let err = LookupError::Exit {
            program: "pnputil".to_string(),
            code: None,
        };
        assert_eq!(err.to_string(), "`pnputil` exited with status unknown");
    }

    #[test]
    fn timeout_error_mentions_duration() {
        let err = LookupError::Timeout {
            program: "powershell".to_string(),
            after: Duration::from_millis(2500),
        };
        assert_eq!(err.to_string(), "`powershell` timed out after 2.5s");
    }

    #[test]
    fn invalid_filter_is_quoted() {
        let err = InventoryError::InvalidClassFilter("Net Adapter".to_string());
        assert_eq!(err.to_string(), "invalid device class filter \"Net Adapter\"");
    }
}
