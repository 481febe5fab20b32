use super::SqlStore;
use crate::errors::{ExecutionError, ExecutionErrorKind};
use crate::model::QueryRows;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_ROWS: usize = 200;

const CATALOG_QUERY: &str = "
    SELECT m.name AS table_name, p.name AS column_name
    FROM sqlite_master m
    LEFT JOIN pragma_table_info(m.name) p
    WHERE m.type IN ('table', 'view') AND m.name NOT LIKE 'sqlite_%'
    ORDER BY table_name, p.cid
";

/// Read-only SQLite store. Each call opens its own connection, which is
/// closed when the call returns on every path.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    max_rows: usize,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, ExecutionError> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ExecutionError::new(ExecutionErrorKind::Driver, e.to_string()))
    }
}

impl SqlStore for SqliteStore {
    fn execute(&self, sql: &str) -> Result<QueryRows, ExecutionError> {
        let conn = self.connect()?;
        let started = std::time::Instant::now();
        let result = run_query(&conn, sql, self.max_rows);
        drop(conn);

        match &result {
            Ok(rows) => tracing::debug!(
                event = "llmao.sql.executed",
                rows = rows.len(),
                truncated = rows.truncated,
                duration_ms = started.elapsed().as_millis() as u64,
            ),
            Err(e) => tracing::debug!(
                event = "llmao.sql.failed",
                kind = %e.kind,
                error = %e.message,
            ),
        }
        result
    }

    fn list_tables_and_columns(&self) -> Result<Vec<(String, String)>, ExecutionError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(CATALOG_QUERY).map_err(classify)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })
            .map_err(classify)?;

        let mut out = Vec::new();
        for r in rows {
            if let (table, Some(column)) = r.map_err(classify)? {
                out.push((table, column));
            }
        }
        Ok(out)
    }
}

fn run_query(conn: &Connection, sql: &str, max_rows: usize) -> Result<QueryRows, ExecutionError> {
    if sql.trim().is_empty() {
        return Err(ExecutionError::malformed("empty statement"));
    }
    let mut stmt = conn.prepare(sql).map_err(classify)?;
    if !stmt.readonly() {
        return Err(ExecutionError::malformed(
            "only read-only statements may be executed",
        ));
    }

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();
    let mut out = QueryRows {
        columns,
        rows: Vec::new(),
        truncated: false,
    };

    let mut rows = stmt.query([]).map_err(classify)?;
    while let Some(row) = rows.next().map_err(classify)? {
        if out.rows.len() >= max_rows {
            out.truncated = true;
            break;
        }
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(to_json(row.get_ref(i).map_err(classify)?));
        }
        out.rows.push(values);
    }
    Ok(out)
}

fn to_json(v: ValueRef<'_>) -> serde_json::Value {
    match v {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::json!(i),
        ValueRef::Real(f) => serde_json::json!(f),
        ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => serde_json::Value::String(format!("<blob {} bytes>", b.len())),
    }
}

/// Sorts driver errors into the repair taxonomy.
pub fn classify(err: rusqlite::Error) -> ExecutionError {
    let kind = match &err {
        rusqlite::Error::MultipleStatement
        | rusqlite::Error::InvalidParameterCount(..)
        | rusqlite::Error::ExecuteReturnedResults
        | rusqlite::Error::InvalidQuery
        | rusqlite::Error::Utf8Error(_)
        | rusqlite::Error::NulError(_)
        | rusqlite::Error::InvalidColumnIndex(_)
        | rusqlite::Error::InvalidColumnName(_) => ExecutionErrorKind::Programming,
        _ => match err.sqlite_error_code() {
            // plain SQLITE_ERROR: syntax, no such table/column
            Some(ErrorCode::Unknown | ErrorCode::ReadOnly | ErrorCode::TypeMismatch) => {
                ExecutionErrorKind::Malformed
            }
            Some(ErrorCode::ApiMisuse | ErrorCode::ParameterOutOfRange) => {
                ExecutionErrorKind::Programming
            }
            _ => ExecutionErrorKind::Driver,
        },
    };
    ExecutionError::new(kind, err.to_string())
}
