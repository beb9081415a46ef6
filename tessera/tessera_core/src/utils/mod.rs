//! Utility types shared by every Tessera crate.
//!
//! This module provides the app/stage context that naming depends on and
//! the logging setup used by tests and embedding programs.

pub mod config;
pub mod logging;

pub use config::AppContext;
pub use logging::{init_tracing, LogLevel};
