//! Shared utilities for the rent reclaim service.

pub mod logging;

pub use logging::{init_logging, LogFormat};
