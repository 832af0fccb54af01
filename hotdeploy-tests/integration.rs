//! Integration tests for Hotdeploy
//!
//! Drive the resource sync layer through tower with real source and
//! deployment trees on disk.

#[path = "integration/common.rs"]
mod common;

#[path = "integration/filter_pipeline.rs"]
mod filter_pipeline;

#[path = "integration/dev_server.rs"]
mod dev_server;

#[path = "integration/concurrent_requests.rs"]
mod concurrent_requests;
