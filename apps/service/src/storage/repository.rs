use anyhow::Result;
use async_trait::async_trait;
use libsql::params;
use std::time::Duration;

use super::models::WebsiteStatus;
use crate::monitoring::types::StatusSink;
use crate::pool::{LibsqlManager, LibsqlPool};

/// Status sink writing one `website_status` row per check
pub struct LibsqlStatusSink {
    pool: LibsqlPool,
}

impl LibsqlStatusSink {
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>> {
        Ok(self.pool.get().await?)
    }

    /// Most recent statuses for a website, newest first
    pub async fn recent_statuses(&self, website: &str, limit: usize) -> Result<Vec<WebsiteStatus>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(
                "SELECT id, website, status, latency_ms, checked_at FROM website_status
                 WHERE website = ? ORDER BY checked_at DESC, id DESC LIMIT ?",
            )
            .await?;

        let mut rows = stmt.query(params![website, limit as i64]).await?;
        let mut statuses = Vec::new();

        while let Some(row) = rows.next().await? {
            statuses.push(WebsiteStatus {
                id: Some(row.get(0)?),
                website: row.get(1)?,
                status: u16::try_from(row.get::<i64>(2)?).unwrap_or_default(),
                latency_ms: u64::try_from(row.get::<i64>(3)?).unwrap_or_default(),
                checked_at: WebsiteStatus::timestamp_from_i64(row.get(4)?),
            });
        }

        Ok(statuses)
    }
}

#[async_trait]
impl StatusSink for LibsqlStatusSink {
    async fn record(&self, target: &str, status_code: u16, latency: Duration) -> Result<()> {
        let conn = self.get_conn().await?;
        let latency_ms = i64::try_from(latency.as_millis()).unwrap_or(i64::MAX);

        conn.execute(
            "INSERT INTO website_status (website, status, latency_ms, checked_at) VALUES (?, ?, ?, ?)",
            params![target, status_code as i64, latency_ms, chrono::Utc::now().timestamp()],
        )
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{migrations, open_pool};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_record_and_read_back() -> Result<()> {
        let dir = tempdir()?;
        let db_path = dir.path().join("status.db");
        let pool = open_pool(&db_path.to_string_lossy()).await?;
        let sink = LibsqlStatusSink::new_from_pool(pool);

        sink.record("https://example.com", 200, Duration::from_millis(120)).await?;
        sink.record("https://example.com", 0, Duration::from_millis(3000)).await?;
        sink.record("https://other.example", 503, Duration::from_millis(40)).await?;

        let statuses = sink.recent_statuses("https://example.com", 10).await?;
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].status, 0);
        assert_eq!(statuses[0].latency_ms, 3000);
        assert!(statuses[0].is_down());
        assert_eq!(statuses[1].status, 200);
        assert!(!statuses[1].is_down());

        let limited = sink.recent_statuses("https://example.com", 1).await?;
        assert_eq!(limited.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let db_path = dir.path().join("status.db");
        let pool = open_pool(&db_path.to_string_lossy()).await?;

        let conn = pool.get().await?;
        migrations::run_migrations(&conn).await?;
        assert_eq!(migrations::get_current_version(&conn).await?, 1);

        Ok(())
    }
}
