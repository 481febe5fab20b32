//! Table/column metadata of the data store.
//!
//! The catalog is read once from the store at startup and never changes;
//! callers share it behind an `Arc`. A `RelevantSchema` is the per-question
//! subset chosen by the router; the pipeline only builds one through
//! [`SchemaCatalog::resolve`], so its names always exist in the catalog.

use crate::errors::{closest_match, RoutingError};
use crate::storage::SqlStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SchemaCatalog {
    tables: BTreeMap<String, Vec<String>>,
}

impl SchemaCatalog {
    pub fn load(store: &dyn SqlStore) -> anyhow::Result<Self> {
        let pairs = store
            .list_tables_and_columns()
            .map_err(|e| anyhow::anyhow!("failed to read schema catalog: {}", e))?;
        let catalog = Self::from_pairs(pairs);
        if catalog.tables.is_empty() {
            anyhow::bail!("schema catalog is empty: the store has no tables");
        }
        tracing::info!(
            event = "llmao.catalog.loaded",
            tables = catalog.tables.len(),
            columns = catalog.tables.values().map(Vec::len).sum::<usize>(),
        );
        Ok(catalog)
    }

    /// Builds the mapping, keeping first-seen column order and dropping
    /// duplicate columns.
    pub fn from_pairs<I, T, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, C)>,
        T: Into<String>,
        C: Into<String>,
    {
        let mut tables: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (t, c) in pairs {
            let cols = tables.entry(t.into()).or_default();
            let c = c.into();
            if !cols.contains(&c) {
                cols.push(c);
            }
        }
        Self { tables }
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(&self.tables).unwrap_or_default()
    }

    fn find_table(&self, name: &str) -> Option<(&String, &Vec<String>)> {
        self.tables
            .get_key_value(name)
            .or_else(|| self.tables.iter().find(|(t, _)| t.eq_ignore_ascii_case(name)))
    }

    /// Checks a router proposal against the catalog. Names are matched
    /// case-insensitively (SQLite identifiers are) and rewritten to the
    /// catalog spelling; `*` expands to every column of the table.
    pub fn resolve(
        &self,
        proposal: BTreeMap<String, Vec<String>>,
    ) -> Result<RelevantSchema, RoutingError> {
        if proposal.is_empty() {
            return Err(RoutingError::Empty);
        }
        let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (table, columns) in proposal {
            let Some((canonical, known)) = self.find_table(&table) else {
                return Err(RoutingError::UnknownTable {
                    suggestion: closest_match(&table, self.tables()),
                    table,
                });
            };

            // Two spellings of one table share an entry.
            let picked: &mut Vec<String> = out.entry(canonical.clone()).or_default();
            for col in columns {
                if col.trim() == "*" {
                    for k in known {
                        if !picked.contains(k) {
                            picked.push(k.clone());
                        }
                    }
                    continue;
                }
                let Some(k) = known.iter().find(|k| k.eq_ignore_ascii_case(&col)) else {
                    return Err(RoutingError::UnknownColumn {
                        table: canonical.clone(),
                        suggestion: closest_match(&col, known.iter().map(String::as_str)),
                        column: col,
                    });
                };
                if !picked.contains(k) {
                    picked.push(k.clone());
                }
            }
        }
        Ok(RelevantSchema { tables: out })
    }
}

/// Per-question subset of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelevantSchema {
    tables: BTreeMap<String, Vec<String>>,
}

impl RelevantSchema {
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.tables
    }

    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(&self.tables).unwrap_or_default()
    }
}
