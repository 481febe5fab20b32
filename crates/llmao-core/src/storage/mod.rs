use crate::errors::ExecutionError;
use crate::model::QueryRows;

pub mod ratings;
pub mod sqlite;

pub use sqlite::SqliteStore;

/// A SQL-capable data store. Implementations acquire whatever connection
/// they need per call and release it before returning.
pub trait SqlStore: Send + Sync {
    fn execute(&self, sql: &str) -> Result<QueryRows, ExecutionError>;

    /// Every (table, column) pair of user tables and views.
    fn list_tables_and_columns(&self) -> Result<Vec<(String, String)>, ExecutionError>;
}
