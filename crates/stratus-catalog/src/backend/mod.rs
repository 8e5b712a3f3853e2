//! Catalog backends.
//!
//! Every source of catalog rows implements [`CatalogBackend`]: hand it a
//! SQL statement, get back a [`RowStream`] of dataset names. The stream is
//! a bounded channel fed by a producer task, so database I/O never runs on
//! the dispatch loop. A statement the backend rejects is an error from
//! `execute` itself, so it can never be mistaken for an empty result set.

pub mod memory;
pub mod mysql;

pub use memory::MemoryBackend;
pub use mysql::MySqlBackend;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::BackendError;

/// Depth of the channel between a row producer and the segmenter.
const ROW_CHANNEL_DEPTH: usize = 256;

/// A lazy, finite sequence of catalog row names.
pub struct RowStream {
    rows: mpsc::Receiver<String>,
}

impl RowStream {
    pub fn new(rows: mpsc::Receiver<String>) -> Self {
        Self { rows }
    }

    /// A sender/stream pair for producer tasks.
    pub fn channel() -> (mpsc::Sender<String>, RowStream) {
        let (tx, rx) = mpsc::channel(ROW_CHANNEL_DEPTH);
        (tx, RowStream::new(rx))
    }

    /// A stream already holding every row. Used by in-memory backends.
    pub fn from_rows(rows: Vec<String>) -> Self {
        let (tx, rx) = mpsc::channel(rows.len().max(1));
        for row in rows {
            // Capacity covers every row, so this cannot fail.
            let _ = tx.try_send(row);
        }
        RowStream::new(rx)
    }

    /// The next row name, or None once the sequence is exhausted.
    pub async fn next(&mut self) -> Option<String> {
        self.rows.recv().await
    }
}

#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Execute `sql` against the catalog table and stream the `name`
    /// column of each row.
    async fn execute(&self, sql: &str) -> Result<RowStream, BackendError>;

    /// Release backend resources. Called once at shutdown.
    async fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_rows_preserves_order_and_ends() {
        let mut stream = RowStream::from_rows(vec!["a".into(), "bb".into()]);
        assert_eq!(stream.next().await.as_deref(), Some("a"));
        assert_eq!(stream.next().await.as_deref(), Some("bb"));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_empty_stream_ends_immediately() {
        let mut stream = RowStream::from_rows(Vec::new());
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_channel_stream_ends_when_producer_drops() {
        let (tx, mut stream) = RowStream::channel();
        tx.send("row".into()).await.unwrap();
        drop(tx);
        assert_eq!(stream.next().await.as_deref(), Some("row"));
        assert_eq!(stream.next().await, None);
    }
}
