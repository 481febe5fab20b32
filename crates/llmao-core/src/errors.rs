use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

/// How a failed statement should be treated by the repair loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    /// Syntax error, unknown table or column: the store rejected the text.
    Malformed,
    /// The statement shape is invalid for the driver (several statements,
    /// bound parameters, non-UTF-8 text).
    Programming,
    /// The store itself failed (cannot open, busy, corrupt, IO).
    Driver,
}

impl ExecutionErrorKind {
    pub fn is_repairable(&self) -> bool {
        matches!(
            self,
            ExecutionErrorKind::Malformed | ExecutionErrorKind::Programming
        )
    }
}

impl fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionErrorKind::Malformed => write!(f, "malformed"),
            ExecutionErrorKind::Programming => write!(f, "programming"),
            ExecutionErrorKind::Driver => write!(f, "driver"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} query error: {message}")]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    pub message: String,
}

impl ExecutionError {
    pub fn new(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ExecutionErrorKind::Malformed, message)
    }
}

/// One failed step of the SQL path. Cloneable so the retry helper can hand
/// the previous failure to the repair attempt.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("query `{query}` failed: {error}")]
    Execution { query: String, error: ExecutionError },
    #[error("query generation failed: {0}")]
    Generation(String),
}

impl QueryError {
    pub fn failed_query(&self) -> Option<&str> {
        match self {
            QueryError::Execution { query, .. } => Some(query),
            QueryError::Generation(_) => None,
        }
    }
}

/// The router picked names that are not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("router selected no tables")]
    Empty,
    #[error("unknown table '{table}'{}", suggestion_suffix(.suggestion))]
    UnknownTable {
        table: String,
        suggestion: Option<String>,
    },
    #[error("unknown column '{table}.{column}'{}", suggestion_suffix(.suggestion))]
    UnknownColumn {
        table: String,
        column: String,
        suggestion: Option<String>,
    },
    #[error("router output could not be read: {0}")]
    Judge(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JudgeError {
    /// Output did not match the expected structured schema. Recoverable.
    #[error("judge output did not match schema: {0}")]
    Parse(String),
    /// The language service call itself failed.
    #[error("judge call failed: {0}")]
    Transport(String),
    /// The expected output schema does not compile.
    #[error("invalid output schema: {0}")]
    Schema(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid metric '{name}' (known: {}){}", .known.join(", "), suggestion_suffix(.suggestion))]
pub struct MetricConfigError {
    pub name: String,
    pub known: Vec<String>,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("faithfulness undefined: judge reported zero claims")]
    ZeroClaims,
    #[error("answer_relevancy undefined: judge produced no synthetic questions")]
    NoSyntheticQuestions,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalInputError {
    #[error("no metrics requested")]
    NoMetrics,
    #[error(transparent)]
    UnknownMetric(#[from] MetricConfigError),
    #[error("no records to evaluate")]
    NoRecords,
    #[error("non-batch evaluation expects exactly one record, got {0}")]
    ExpectedSingleRecord(usize),
    #[error("metric '{metric}' requires a ground-truth answer (record {index} has none)")]
    MissingTruth { metric: String, index: usize },
    #[error("no evaluation has been run yet")]
    NothingEvaluated,
    #[error("metric '{metric}' produced no numeric score: {reason}")]
    MissingScore { metric: String, reason: String },
}

fn suggestion_suffix(s: &Option<String>) -> String {
    match s {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

/// Closest candidate by Jaro-Winkler, if any is reasonably close.
pub fn closest_match<'a>(needle: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    candidates
        .into_iter()
        .map(|c| (c, strsim::jaro_winkler(&needle.to_lowercase(), &c.to_lowercase())))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairable_kinds() {
        assert!(ExecutionErrorKind::Malformed.is_repairable());
        assert!(ExecutionErrorKind::Programming.is_repairable());
        assert!(!ExecutionErrorKind::Driver.is_repairable());
    }

    #[test]
    fn metric_error_suggests_close_name() {
        let known = ["faithfulness", "correctness"];
        let err = MetricConfigError {
            name: "faithfullness".into(),
            known: known.iter().map(|s| s.to_string()).collect(),
            suggestion: closest_match("faithfullness", known),
        };
        let msg = err.to_string();
        assert!(msg.contains("did you mean 'faithfulness'"), "{msg}");
    }

    #[test]
    fn no_suggestion_for_unrelated_name() {
        assert_eq!(closest_match("zzz", ["chemical_info", "gene_info"]), None);
    }
}
