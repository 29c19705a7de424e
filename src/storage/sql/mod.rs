//! Unified SQL storage implementations.
//!
//! This module provides shared implementations for SQL-based storage backends
//! (PostgreSQL, SQLite). The implementations are parameterized by database type
//! using the `SqlDatabase` trait.

mod query;
mod sequence_store;
mod statements;

pub use query::SqlDatabase;
pub use sequence_store::SqlSequenceStore;
pub use statements::{order_by_position, scope_condition, ColumnKind};

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use sea_query::PostgresQueryBuilder;
    use sqlx::PgPool;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_update(stmt: sea_query::UpdateStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_delete(stmt: sea_query::DeleteStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_table_create(stmt: sea_query::TableCreateStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_index_create(stmt: sea_query::IndexCreateStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }
    }

    /// PostgreSQL sequence store.
    pub type PostgresSequenceStore = super::SqlSequenceStore<Postgres>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use sea_query::SqliteQueryBuilder;
    use sqlx::SqlitePool;

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_update(stmt: sea_query::UpdateStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_delete(stmt: sea_query::DeleteStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_table_create(stmt: sea_query::TableCreateStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_index_create(stmt: sea_query::IndexCreateStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }
    }

    /// SQLite sequence store.
    pub type SqliteSequenceStore = super::SqlSequenceStore<Sqlite>;
}
