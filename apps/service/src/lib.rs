//! Website uptime monitor.
//!
//! Polls a fixed set of websites, records every outcome, and emails
//! operators once a site has been down for a configured number of
//! consecutive checks.

pub mod config;
pub mod error;
pub mod health;
pub mod mail;
pub mod monitoring;
pub mod pool;
pub mod storage;

pub use config::{Config, ConfigError, EngineConfig, MonitorSettings};
pub use error::AppError;
pub use monitoring::Engine;
