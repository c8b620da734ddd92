//! # Core Runtime Module
//!
//! Process-wide infrastructure shared by every crate in the workspace:
//! - Logging and tracing setup
//! - Server configuration from the environment
//! - The configuration/startup error type
//!
//! Nothing in here talks to the network; the crate sits at the bottom of the
//! dependency graph next to `bridge-traits`.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AccountConfig, AppConfig, StreamDefaults};
pub use error::{Error, Result};
