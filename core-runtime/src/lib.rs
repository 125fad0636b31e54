//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the bridge crates:
//! - Configuration (`BridgeConfig`: command name, reserved scheme, redirect policy)
//! - Logging and tracing setup
//! - The runtime error type
//!
//! ## Overview
//!
//! `core-intercept`, `core-xhr` and `core-service` depend on this crate for
//! configuration and logging conventions instead of each carrying their own.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{BridgeConfig, BridgeConfigBuilder, RedirectCommand};
pub use error::{Error, Result};
