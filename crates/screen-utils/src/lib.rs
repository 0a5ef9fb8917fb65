//! Shared utilities for stock-screen
//!
//! Holds the tracing setup shared by the workspace binaries.

pub mod logging;

pub use logging::{LogFormat, init_tracing};
