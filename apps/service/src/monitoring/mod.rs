/// Monitoring engine module - polls websites and raises down alerts
///
/// This module is responsible for:
/// - Checking HTTP/HTTPS targets
/// - Keeping a rolling window of recent outcomes per target
/// - Deciding when a target is persistently down
/// - Running the polling and alert sweep tasks
pub mod alert;
pub mod checker;
pub mod engine;
pub mod history;
pub mod types;


pub use alert::AlertBatch;
pub use checker::{CheckMethod, Checker, HttpChecker};
pub use engine::Engine;
pub use types::{EngineState, Notifier, Observation, StatusSink, UNREACHABLE};
