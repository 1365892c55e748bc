//! SQL dialect and schema handling for the editor.
//!
//! - [`complete`]: keyword and schema-aware completion

pub mod complete;

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::error;

pub use complete::Completer;

/// SQL dialect the editor highlights and completes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Standard,
    PostgreSql,
    MySql,
}

impl Dialect {
    /// Read the `dialect` attribute. Unknown or absent values fall back to
    /// standard SQL.
    pub fn from_attribute(raw: Option<&str>) -> Self {
        match raw.map(str::to_lowercase).as_deref() {
            Some("mysql") => Dialect::MySql,
            Some("postgres") | Some("postgresql") => Dialect::PostgreSql,
            _ => Dialect::Standard,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Standard => "SQL",
            Dialect::PostgreSql => "PostgreSQL",
            Dialect::MySql => "MySQL",
        }
    }
}

/// Tables and their columns, as published by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Schema(BTreeMap<String, Vec<String>>);

impl Schema {
    /// Parse a schema script: a JSON object mapping table names to columns.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Parse a schema script, logging and substituting an empty schema when it
    /// is missing or malformed.
    pub fn parse_or_empty(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return Self::default();
        };
        match Self::parse(text) {
            Ok(schema) => schema,
            Err(e) => {
                error!(error = %e, "failed to parse SQL schema");
                Self::default()
            }
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn columns(&self, table: &str) -> &[String] {
        self.0.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
