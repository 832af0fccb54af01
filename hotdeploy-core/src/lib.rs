//! Hotdeploy Core - source-to-deployment resource sync
//!
//! Keeps a deployed web application in step with its source tree during
//! development: stale or missing static resources are copied on request and
//! `${name}` placeholders in HTML pages are filled from configured values.

pub mod config;
pub mod lock;
pub mod path;
pub mod placeholder;
pub mod sync;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::{FilterConfig, InitParams};
pub use lock::PathLocks;
pub use path::{RequestContext, SyncPaths};
pub use sync::{ResourceSync, SkipReason, SyncError, SyncOutcome};

/// Errors that can bubble up from any Hotdeploy component.
#[derive(Debug, thiserror::Error)]
pub enum HotdeployError {
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HotdeployError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            HotdeployError::Sync(SyncError::Io { path, .. }) => {
                format!("Could not update deployed file {path}")
            }
            HotdeployError::Configuration { reason } => format!("Invalid configuration: {reason}"),
            HotdeployError::Io(_) => "File system error occurred".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HotdeployError>;
