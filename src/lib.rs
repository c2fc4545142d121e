//! sysrecord - Host resource sampling with on-demand recording to SQLite
//!
//! This library provides the recording session controller and the
//! collaborators it drives: a sysinfo-backed sampler, a SQLite record store
//! and a console display.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod core;
pub mod formatting;
pub mod internal_metrics;
pub mod outputs;
pub mod sampler;
pub mod session;
pub mod storage;
pub mod task_manager;

// Re-export core types for convenience
pub use crate::core::*;
