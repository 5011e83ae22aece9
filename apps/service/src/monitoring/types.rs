use anyhow::Result;
use std::time::Duration;

/// Outcome code recorded when a check never produced a response
pub const UNREACHABLE: u16 = 0;

/// Result of a single check against a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// HTTP status code, or [`UNREACHABLE`] on transport failure
    pub status_code: u16,

    /// Wall time from request start to response headers (or failure)
    pub latency: Duration,
}

impl Observation {
    pub fn new(status_code: u16, latency: Duration) -> Self {
        Self { status_code, latency }
    }

    pub fn unreachable(latency: Duration) -> Self {
        Self { status_code: UNREACHABLE, latency }
    }

    pub fn is_bad(&self) -> bool {
        is_bad(self.status_code)
    }
}

/// A code counts against a target when it is unreachable or a server error.
///
/// Everything in 1..=499 is treated as up, including 4xx.
pub fn is_bad(status_code: u16) -> bool {
    status_code == UNREACHABLE || status_code >= 500
}

/// Lifecycle of the monitoring engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotStarted,
    Running,
    Stopped,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::NotStarted => write!(f, "not started"),
            EngineState::Running => write!(f, "running"),
            EngineState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Destination for every completed check
#[async_trait::async_trait]
pub trait StatusSink: Send + Sync {
    async fn record(&self, target: &str, status_code: u16, latency: Duration) -> Result<()>;
}

/// Delivers down alerts to operators
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_codes() {
        assert!(is_bad(0));
        assert!(is_bad(500));
        assert!(is_bad(503));
        assert!(is_bad(599));

        assert!(!is_bad(200));
        assert!(!is_bad(301));
        assert!(!is_bad(404));
        assert!(!is_bad(499));
        assert!(!is_bad(100));
    }

    #[test]
    fn test_unreachable_observation() {
        let observation = Observation::unreachable(Duration::from_millis(5));
        assert_eq!(observation.status_code, UNREACHABLE);
        assert!(observation.is_bad());
    }
}
