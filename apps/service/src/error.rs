use std::io::Error as IoError;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Storage error: {0:#}")]
    Storage(#[source] anyhow::Error),
    #[error("Notifier error: {0:#}")]
    Notifier(#[source] anyhow::Error),
    #[error("Monitor error: {0:#}")]
    Engine(#[source] anyhow::Error),
}
