//! MySQL catalog backend.
//!
//! Wraps a `mysql_async` connection pool. `execute` acquires a
//! connection, starts the statement, and hands the row stream to a
//! producer task; it only returns Ok once the server has accepted the
//! statement, so a rejected query surfaces as a [`BackendError`] before
//! any segment is produced.

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Opts, OptsBuilder, Pool};
use tokio::sync::oneshot;

use super::{CatalogBackend, RowStream};
use crate::config::DatabaseConfig;
use crate::error::BackendError;

pub struct MySqlBackend {
    pool: Pool,
}

impl MySqlBackend {
    /// Build a lazily connecting pool from the configured connection
    /// details. No I/O happens until the first statement.
    pub fn connect(config: &DatabaseConfig) -> Self {
        let opts = OptsBuilder::default()
            .ip_or_hostname(config.db_server.clone())
            .tcp_port(config.db_port)
            .db_name(Some(config.db_name.clone()))
            .user(Some(config.db_user.clone()))
            .pass(Some(config.db_passwd.clone()));
        Self {
            pool: Pool::new(Opts::from(opts)),
        }
    }
}

#[async_trait]
impl CatalogBackend for MySqlBackend {
    async fn execute(&self, sql: &str) -> Result<RowStream, BackendError> {
        let mut conn = self.pool.get_conn().await?;
        let statement = sql.to_owned();
        let (rows_tx, stream) = RowStream::channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut result = match conn.query_iter(statement).await {
                Ok(result) => {
                    let _ = ready_tx.send(Ok(()));
                    result
                }
                Err(error) => {
                    let _ = ready_tx.send(Err(error));
                    return;
                }
            };
            loop {
                match result.next().await {
                    Ok(Some(row)) => match row.get_opt::<String, _>(0) {
                        Some(Ok(name)) => {
                            if rows_tx.send(name).await.is_err() {
                                // Consumer is gone; stop streaming.
                                break;
                            }
                        }
                        Some(Err(error)) => {
                            tracing::warn!("non-text name column skipped: {error}");
                        }
                        None => {}
                    },
                    Ok(None) => break,
                    Err(error) => {
                        tracing::warn!("row fetch failed mid-stream: {error}");
                        break;
                    }
                }
            }
        });

        match ready_rx.await {
            Ok(Ok(())) => Ok(stream),
            Ok(Err(error)) => Err(BackendError::Database(error)),
            Err(_) => Err(BackendError::Closed),
        }
    }

    async fn close(&self) {
        if let Err(error) = self.pool.clone().disconnect().await {
            tracing::warn!("error disconnecting catalog pool: {error}");
        }
    }
}
