//! Hotdeploy Web - resource sync middleware and development server

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! Provides the tower layer that keeps deployed static resources in step
//! with their sources, and an axum server that serves a deployment
//! directory through it.

pub mod layer;
pub mod server;

// Re-export main types
pub use layer::{IncludeTarget, ResourceSyncLayer, ResourceSyncService};
pub use server::{ServerConfig, router, run_server};
