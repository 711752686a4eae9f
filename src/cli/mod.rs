//! Command-line interface module.
//!
//! This module provides the CLI functionality for:
//! - Backend reachability probing with startup retries
//! - Cache directory monitoring
//! - Configuration inspection

pub mod commands;
pub mod handlers;

pub use handlers::{handle_config, handle_monitor, handle_probe};
