//! In-memory catalog backend.
//!
//! Serves a canned row set and records every executed statement. This is
//! the default backend for tests and dry runs; with no rows configured it
//! behaves as a no-op catalog.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CatalogBackend, RowStream};
use crate::error::BackendError;

pub struct MemoryBackend {
    rows: Vec<String>,
    fail: bool,
    executed: Mutex<Vec<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    pub fn with_rows(rows: Vec<String>) -> Self {
        Self {
            rows,
            fail: false,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// A backend whose every statement is rejected.
    pub fn failing() -> Self {
        Self {
            rows: Vec::new(),
            fail: true,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Statements executed so far, in order.
    pub async fn executed(&self) -> Vec<String> {
        self.executed.lock().await.clone()
    }

    pub async fn execution_count(&self) -> usize {
        self.executed.lock().await.len()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogBackend for MemoryBackend {
    async fn execute(&self, sql: &str) -> Result<RowStream, BackendError> {
        self.executed.lock().await.push(sql.to_string());
        if self.fail {
            return Err(BackendError::Rejected("memory backend set to fail".into()));
        }
        Ok(RowStream::from_rows(self.rows.clone()))
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_statements() {
        let backend = MemoryBackend::with_rows(vec!["a".into()]);
        let mut stream = backend.execute("SELECT name FROM cmip5;").await.unwrap();
        assert_eq!(stream.next().await.as_deref(), Some("a"));
        assert_eq!(backend.executed().await, vec!["SELECT name FROM cmip5;"]);
    }

    #[tokio::test]
    async fn test_failing_backend_rejects() {
        let backend = MemoryBackend::failing();
        assert!(matches!(
            backend.execute("SELECT 1;").await,
            Err(BackendError::Rejected(_))
        ));
        assert_eq!(backend.execution_count().await, 1);
    }
}
