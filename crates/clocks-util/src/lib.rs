//! Shared utilities for the clocks workspace.
//!
//! This crate provides:
//! - Logging setup with tracing
//! - Data directory resolution for persisted snapshots

pub mod log;
pub mod path;

pub use log::{LogConfig, LogLevel};
