//! Delimited-text preference parsers.
//!
//! Rating files are line-oriented, one `(user, item, preference[, timestamp])`
//! record per line. The column positions and the delimiter are configurable;
//! two presets cover the common layouts:
//!
//! | Preset | Delimiter | Columns |
//! |--------|-----------|---------|
//! | [`DelimitedParser::movielens`] | `::` or tab | user, item, rating, timestamp |
//! | [`DelimitedParser::simple`] | tab | user, item, preference, optional timestamp |
//!
//! `simple` is also the format written by [`write_store`](super::write_store),
//! so split and prediction files round-trip through it.
//!
//! Blank lines and lines starting with `#` are skipped. Any other malformed
//! line aborts parsing with [`DatasetError::Parse`] carrying the 1-based line
//! and column of the offending field.

use super::store::PreferenceStore;
use crate::error::DatasetError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Reads a file into a [`PreferenceStore`].
pub trait Parser {
    /// Parses already-loaded text.
    fn parse_reader<R: BufRead>(&self, reader: R) -> Result<PreferenceStore, DatasetError>;

    /// Opens and parses `path`.
    fn parse_data(&self, path: &Path) -> Result<PreferenceStore, DatasetError> {
        let file = File::open(path).map_err(|e| DatasetError::io(path, e))?;
        let store = self
            .parse_reader(BufReader::new(file))
            .map_err(|e| match e {
                DatasetError::Io { source, .. } => DatasetError::io(path, source),
                other => other,
            })?;
        info!(
            "Parsed {}: {} users, {} preferences",
            path.display(),
            store.num_users(),
            store.num_preferences()
        );
        Ok(store)
    }

    fn parse_str(&self, text: &str) -> Result<PreferenceStore, DatasetError> {
        self.parse_reader(text.as_bytes())
    }
}

/// How fields on a line are separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delimiter {
    /// A single character, e.g. `'\t'` or `','`
    Char(char),
    /// A multi-character separator, e.g. `"::"`
    Str(String),
    /// `::` when the line contains it, otherwise tab (MovieLens 1M vs 100K)
    MovieLens,
}

impl Delimiter {
    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Char(c) => line.split(*c).collect(),
            Delimiter::Str(s) => line.split(s.as_str()).collect(),
            Delimiter::MovieLens => {
                if line.contains("::") {
                    line.split("::").collect()
                } else {
                    line.split('\t').collect()
                }
            }
        }
    }
}

/// Configurable column-based parser.
#[derive(Debug, Clone)]
pub struct DelimitedParser {
    pub delimiter: Delimiter,
    pub user_column: usize,
    pub item_column: usize,
    pub preference_column: usize,
    /// Column holding the timestamp; `None` ignores timestamps
    pub timestamp_column: Option<usize>,
    /// When false, a missing timestamp column is a parse error
    pub timestamp_optional: bool,
}

impl DelimitedParser {
    /// MovieLens `ratings.dat` / `u.data` layout.
    pub fn movielens() -> Self {
        Self {
            delimiter: Delimiter::MovieLens,
            user_column: 0,
            item_column: 1,
            preference_column: 2,
            timestamp_column: Some(3),
            timestamp_optional: false,
        }
    }

    /// Tab-separated `user item preference [timestamp]`.
    pub fn simple() -> Self {
        Self {
            delimiter: Delimiter::Char('\t'),
            user_column: 0,
            item_column: 1,
            preference_column: 2,
            timestamp_column: Some(3),
            timestamp_optional: true,
        }
    }

    fn parse_line(
        &self,
        line: &str,
        line_no: usize,
        store: &mut PreferenceStore,
    ) -> Result<(), DatasetError> {
        let fields = self.delimiter.split(line);

        let user = parse_field::<u64>(&fields, self.user_column, line_no, "user id")?;
        let item = parse_field::<u64>(&fields, self.item_column, line_no, "item id")?;
        let preference =
            parse_field::<f64>(&fields, self.preference_column, line_no, "preference")?;
        store.add_preference(user, item, preference);

        if let Some(column) = self.timestamp_column {
            if column < fields.len() {
                let time = parse_field::<i64>(&fields, column, line_no, "timestamp")?;
                store.add_timestamp(user, item, time);
            } else if !self.timestamp_optional {
                return Err(DatasetError::Parse {
                    line: line_no,
                    column: column + 1,
                    message: format!("missing timestamp (found {} fields)", fields.len()),
                });
            }
        }
        Ok(())
    }
}

impl Parser for DelimitedParser {
    fn parse_reader<R: BufRead>(&self, reader: R) -> Result<PreferenceStore, DatasetError> {
        let mut store = PreferenceStore::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| DatasetError::io("<input>", e))?;
            let trimmed = line.trim_end_matches('\r');
            if trimmed.trim().is_empty() || trimmed.starts_with('#') {
                continue;
            }
            self.parse_line(trimmed, idx + 1, &mut store)?;
        }
        Ok(store)
    }
}

fn parse_field<T: std::str::FromStr>(
    fields: &[&str],
    column: usize,
    line: usize,
    what: &str,
) -> Result<T, DatasetError> {
    let raw = fields.get(column).ok_or_else(|| DatasetError::Parse {
        line,
        column: column + 1,
        message: format!("missing {} (found {} fields)", what, fields.len()),
    })?;
    raw.trim().parse::<T>().map_err(|_| DatasetError::Parse {
        line,
        column: column + 1,
        message: format!("invalid {} '{}'", what, raw.trim()),
    })
}
