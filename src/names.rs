//! Static station code → display name table.
//!
//! The table is read once at startup from a CSV file with (at least) a
//! `siteCode` and a `stationName` column, matched case-insensitively. It is
//! immutable afterwards and shared read-only between fetch cycles.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::error::NameTableError;

const CODE_COLUMN: &str = "sitecode";
const NAME_COLUMN: &str = "stationname";

/// Lookup key form of a station code: trimmed and lower-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct NameTable {
    entries: HashMap<String, String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the table from a CSV file at `path`.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, NameTableError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Loads the table from any CSV source.
    ///
    /// Rows with an empty code or name, or that fail to parse, are logged and
    /// skipped. Only a missing header column is an error.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, NameTableError> {
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |wanted: &'static str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
                .ok_or(NameTableError::MissingColumn(wanted))
        };
        let code_idx = column(CODE_COLUMN)?;
        let name_idx = column(NAME_COLUMN)?;

        let mut table = Self::new();
        let mut skipped = 0usize;

        for (row, result) in rdr.records().enumerate() {
            // header is line 1
            let line = row + 2;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!(line, error = %e, "Skipping unreadable name table row");
                    skipped += 1;
                    continue;
                }
            };

            let code = record.get(code_idx).unwrap_or("");
            let name = record.get(name_idx).unwrap_or("");
            if code.is_empty() || name.is_empty() {
                warn!(line, "Skipping name table row without code or name");
                skipped += 1;
                continue;
            }

            table.insert(code, name);
        }

        debug!(entries = table.len(), skipped, "Name table loaded");
        Ok(table)
    }

    /// Adds or replaces an entry. Only used while building the table.
    pub fn insert(&mut self, code: &str, name: &str) {
        self.entries.insert(normalize_code(code), name.to_string());
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(&normalize_code(code)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for NameTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (code, name) in iter {
            table.insert(code.as_ref(), name.as_ref());
        }
        table
    }
}

/// Picks the display name for a station.
///
/// Table hit wins; otherwise `fallback` is returned as-is. When the fallback
/// is blank too, the trimmed code stands in so the marker is never unlabeled.
pub fn resolve_name(code: &str, fallback: &str, table: &NameTable) -> String {
    if let Some(name) = table.get(code) {
        return name.to_string();
    }
    if fallback.trim().is_empty() {
        return code.trim().to_string();
    }
    fallback.to_string()
}
