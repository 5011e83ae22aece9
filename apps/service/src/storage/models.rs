use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitoring::types::is_bad;

/// One stored check outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteStatus {
    pub id: Option<i64>,
    pub website: String,
    /// 0 when the website could not be reached
    pub status: u16,
    pub latency_ms: u64,
    pub checked_at: DateTime<Utc>,
}

impl WebsiteStatus {
    pub fn is_down(&self) -> bool {
        is_bad(self.status)
    }

    /// Convert a stored unix timestamp, clamping garbage to the epoch
    pub fn timestamp_from_i64(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap_or_default()
    }
}
