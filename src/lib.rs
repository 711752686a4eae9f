//! Client resilience core for the vagas job board.
//!
//! Three independent observers over runtime-owned resources:
//! - [`initializer`]: startup procedure with bounded, linearly backed-off retries
//! - [`cache`]: periodic cache store polling with hit/miss accounting
//! - [`update`]: background-worker update detection and activation

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod initializer;
mod liveness;
pub mod probe;
pub mod update;

// Re-export commonly used types
pub use cache::{CacheMonitor, CacheMonitorHandle, CacheStats, CacheStore, HitCounters};
pub use error::{Error, Result};
pub use initializer::{InitializationState, Initialize, Initializer, InitializerConfig, InitializerHandle};
pub use update::{UpdateCoordinator, UpdateCoordinatorHandle, UpdatePrompt, UpdateState};
