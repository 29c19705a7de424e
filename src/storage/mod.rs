//! Storage implementations.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{StorageConfig, StorageType};
use crate::interfaces::{SequenceStore, StorageError};

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod sql;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockSequenceStore;

#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use sql::{order_by_position, ColumnKind, SqlSequenceStore};

#[cfg(feature = "sqlite")]
pub use sql::sqlite::SqliteSequenceStore;

#[cfg(feature = "postgres")]
pub use sql::postgres::PostgresSequenceStore;

/// Initialize storage based on configuration.
///
/// Returns the `SequenceStore` implementation for the configured storage
/// type. Backends whose cargo feature is disabled fail with
/// [`StorageError::UnsupportedBackend`].
pub async fn init_storage(
    config: &StorageConfig,
) -> Result<Arc<dyn SequenceStore>, Box<dyn std::error::Error>> {
    info!(storage = %config.storage_type, "Initializing storage");

    match config.storage_type {
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            if let Some(parent) = std::path::Path::new(&config.sqlite.path).parent() {
                std::fs::create_dir_all(parent)?;
            }

            let pool =
                sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", config.sqlite.path))
                    .await?;

            info!(path = %config.sqlite.path, "SQLite storage ready");
            Ok(Arc::new(SqliteSequenceStore::new(pool)))
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            use crate::utils::bootstrap::{connect_with_retry, RetryPolicy};

            let uri = config.postgres.uri.as_str();
            let max_connections = config.postgres.max_connections;
            let pool = connect_with_retry("postgres", uri, RetryPolicy::default(), || {
                sqlx::postgres::PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect(uri)
            })
            .await?;

            Ok(Arc::new(PostgresSequenceStore::new(pool)))
        }
        #[cfg(any(test, feature = "test-utils"))]
        StorageType::Memory => Ok(Arc::new(MockSequenceStore::new())),
        #[allow(unreachable_patterns)]
        ref other => {
            error!(storage = %other, "Storage backend not compiled in");
            Err(StorageError::UnsupportedBackend(other.to_string()).into())
        }
    }
}
