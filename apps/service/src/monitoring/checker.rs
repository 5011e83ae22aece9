use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::types::Observation;

/// Default request timeout for a single check
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP method used to check a target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMethod {
    /// Broadly compatible, the default
    #[default]
    Get,
    /// Cheaper, but the target must support it
    Head,
}

/// Performs one reachability check against a target
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Never fails: transport errors come back as an unreachable observation
    async fn check(&self, target: &str) -> Observation;
}

/// HTTP/HTTPS checker
pub struct HttpChecker {
    client: reqwest::Client,
    method: CheckMethod,
}

impl HttpChecker {
    pub fn new(timeout: Duration, method: CheckMethod) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, method })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, target: &str) -> Observation {
        let request = match self.method {
            CheckMethod::Get => self.client.get(target),
            CheckMethod::Head => self.client.head(target),
        };

        let start = Instant::now();
        // `send` resolves once the response headers are in; the body is never read.
        let response = request.send().await;
        let latency = start.elapsed();

        match response {
            Ok(response) => {
                let status_code = response.status().as_u16();
                debug!(website = %target, status_code, latency_ms = latency.as_millis() as u64, "Checked target");
                Observation::new(status_code, latency)
            }
            Err(e) => {
                warn!(website = %target, latency_ms = latency.as_millis() as u64, "Check failed: {}", e);
                Observation::unreachable(latency)
            }
        }
    }
}
