//! Snapshot engine library
//!
//! Captures the configuration and placement of one tracked dashboard widget
//! type into snapshots and merges them back with either a non-destructive
//! smart replace or a destructive clean restore.

pub mod app;
pub mod config;
pub mod database;
pub mod document;
pub mod engine;
pub mod error;
pub mod services;
pub mod snapshot;
pub mod store;
