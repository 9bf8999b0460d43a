//! Spreadsheet-shaped report payloads and the header-indexed table that
//! isolates all by-name cell access.

use crate::error::{CampaignError, CampaignResult};
use serde::Deserialize;
use std::collections::HashMap;

/// Body returned by a report endpoint: `{success, data: {values}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportPayload {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<SheetValues>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetValues {
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

impl ReportPayload {
    /// Convert into a table. A `success: false` payload is an upstream error;
    /// a successful payload without data is an empty table.
    pub fn into_table(self) -> CampaignResult<SheetTable> {
        if !self.success {
            return Err(CampaignError::Upstream(
                self.error
                    .unwrap_or_else(|| "report endpoint returned success=false".to_string()),
            ));
        }
        Ok(self
            .data
            .map(|data| SheetTable::from_values(data.values))
            .unwrap_or_default())
    }
}

/// Header row plus data rows, with a `name -> index` map built once.
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Build from raw `values`; the first row is the header row. Fully blank
    /// rows are dropped.
    pub fn from_values(values: Vec<Vec<String>>) -> Self {
        let mut iter = values.into_iter();
        let Some(headers) = iter.next() else {
            return Self::default();
        };

        let mut index = HashMap::with_capacity(headers.len());
        for (position, header) in headers.iter().enumerate() {
            let key = normalize_header(header);
            if !key.is_empty() {
                // First occurrence wins on duplicated headers.
                index.entry(key).or_insert(position);
            }
        }

        let rows = iter
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        Self {
            headers,
            index,
            rows,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(&normalize_header(name)).copied()
    }

    /// Position of the first alias present in the header row.
    pub fn resolve<S: AsRef<str>>(&self, aliases: &[S]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|alias| self.column_index(alias.as_ref()))
    }

    /// Cell value by column name; `""` when the column or cell is missing.
    pub fn get_cell<'a>(&self, row: &'a [String], column: &str) -> &'a str {
        Self::cell_at(row, self.column_index(column))
    }

    /// Cell value of the first alias present in the header row.
    pub fn get_cell_any<'a, S: AsRef<str>>(&self, row: &'a [String], aliases: &[S]) -> &'a str {
        Self::cell_at(row, self.resolve(aliases))
    }

    /// Cell value at an already-resolved position.
    pub fn cell_at(row: &[String], index: Option<usize>) -> &str {
        index
            .and_then(|i| row.get(i))
            .map(|cell| cell.trim())
            .unwrap_or("")
    }
}

fn normalize_header(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
