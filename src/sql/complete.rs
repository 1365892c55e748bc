//! Keyword and schema completion for the SQL editor.

use super::{Dialect, Schema};

const COMMON_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "OR", "NOT", "IN", "IS", "NULL", "AS", "ON", "JOIN",
    "LEFT", "RIGHT", "INNER", "OUTER", "GROUP", "BY", "ORDER", "HAVING", "LIMIT", "OFFSET",
    "DISTINCT", "COUNT", "SUM", "AVG", "MIN", "MAX", "CASE", "WHEN", "THEN", "ELSE", "END",
    "BETWEEN", "LIKE", "UNION", "WITH", "ASC", "DESC", "EXISTS", "CAST", "COALESCE",
];

const POSTGRES_KEYWORDS: &[&str] = &["ILIKE", "RETURNING", "INTERVAL", "NOW", "DATE_TRUNC", "FILTER"];

const MYSQL_KEYWORDS: &[&str] = &["REGEXP", "DATE_SUB", "CURDATE", "IFNULL", "STRAIGHT_JOIN"];

/// Produces completion candidates for the word under the cursor.
#[derive(Debug, Clone)]
pub struct Completer {
    dialect: Dialect,
    schema: Schema,
}

impl Completer {
    pub fn new(dialect: Dialect, schema: Schema) -> Self {
        Self { dialect, schema }
    }

    fn keywords(&self) -> impl Iterator<Item = &'static str> {
        let extra = match self.dialect {
            Dialect::Standard => &[][..],
            Dialect::PostgreSql => POSTGRES_KEYWORDS,
            Dialect::MySql => MYSQL_KEYWORDS,
        };
        COMMON_KEYWORDS.iter().chain(extra).copied()
    }

    /// Whether `word` is a keyword of the dialect, ignoring case.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords().any(|kw| kw.eq_ignore_ascii_case(word))
    }

    /// Candidates for `word`, matched case-insensitively by prefix.
    ///
    /// `table.prefix` completes columns of that table; anything else completes
    /// keywords followed by table names. A word that is already complete is
    /// never offered.
    pub fn complete(&self, word: &str) -> Vec<String> {
        if word.is_empty() {
            return Vec::new();
        }

        if let Some((table, prefix)) = word.split_once('.') {
            let prefix = prefix.to_lowercase();
            return self
                .schema
                .columns(table)
                .iter()
                .filter(|column| extends(column, &prefix))
                .map(|column| format!("{}.{}", table, column))
                .collect();
        }

        let prefix = word.to_lowercase();
        let keywords = self
            .keywords()
            .filter(|kw| extends(kw, &prefix))
            .map(str::to_string);
        let tables = self
            .schema
            .tables()
            .filter(|table| extends(table, &prefix))
            .map(str::to_string);
        keywords.chain(tables).collect()
    }
}

/// `candidate` starts with the lowercase `prefix` and is longer than it.
fn extends(candidate: &str, prefix: &str) -> bool {
    let candidate = candidate.to_lowercase();
    candidate.len() > prefix.len() && candidate.starts_with(prefix)
}

/// Byte offset where the identifier ending at `cursor` starts.
pub fn word_start(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_' || *c == '.')
        .last()
        .map(|(i, _)| i)
        .unwrap_or(cursor)
}
