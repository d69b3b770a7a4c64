//! CSV sources for per-trace values
//!
//! Tables load lazily on first use and stay cached for the plan's
//! lifetime. Parsing is quote-aware but deliberately small: a header
//! row naming columns, comma-separated cells, `""` escaping inside
//! quoted cells. Cells bind to traces either by row index or through a
//! key column.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// One parsed CSV file.
#[derive(Debug)]
pub struct CsvTable {
    file: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn load(path: &Path) -> Result<Self> {
        let file = path.display().to_string();
        let content = fs::read_to_string(path)?;
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());

        let header_line = lines.next().ok_or_else(|| Error::Plan {
            path: file.clone(),
            reason: "CSV file is empty".to_string(),
        })?;
        let header_line = header_line.strip_prefix('\u{FEFF}').unwrap_or(header_line);
        let headers: Vec<String> = split_line(header_line)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        let rows: Vec<Vec<String>> = lines.map(split_line).collect();
        debug!(file = %file, rows = rows.len(), columns = headers.len(), "loaded CSV");
        Ok(Self { file, headers, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::CsvColumnMissing {
                file: self.file.clone(),
                column: name.to_string(),
            })
    }

    fn cell(&self, row: usize, col: usize) -> &str {
        self.rows[row].get(col).map(String::as_str).unwrap_or("")
    }

    /// Parse a cell as the destination integer, with an f64 fallback
    /// for coordinate destinations.
    fn number(&self, row: usize, col: usize, column: &str, allow_float: bool) -> Result<i64> {
        let raw = self.cell(row, col).trim();
        if let Ok(v) = raw.parse::<i64>() {
            return Ok(v);
        }
        if allow_float {
            if let Ok(f) = raw.parse::<f64>() {
                if f.is_finite() {
                    return Ok(f.round() as i64);
                }
            }
        }
        Err(Error::CsvTypeError {
            file: self.file.clone(),
            row,
            column: column.to_string(),
            value: raw.to_string(),
        })
    }
}

/// Split one CSV line into cells, honouring double-quote quoting.
fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;

    while let Some(ch) = chars.next() {
        if quoted {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        cell.push('"');
                        chars.next();
                    } else {
                        quoted = false;
                    }
                }
                other => cell.push(other),
            }
        } else {
            match ch {
                '"' => quoted = true,
                ',' => cells.push(std::mem::take(&mut cell)),
                other => cell.push(other),
            }
        }
    }
    cells.push(cell);
    cells
}

/// Per-plan cache of loaded tables and keyed indexes.
#[derive(Debug, Default)]
pub struct CsvCache {
    tables: HashMap<PathBuf, CsvTable>,
    /// (file, key column) -> key value -> row index
    keyed: HashMap<(PathBuf, String), HashMap<i64, usize>>,
    /// Files used in row-index binding mode, for the overflow warning.
    row_bound: Vec<PathBuf>,
}

impl CsvCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&mut self, path: &Path) -> Result<&CsvTable> {
        if !self.tables.contains_key(path) {
            let table = CsvTable::load(path)?;
            self.tables.insert(path.to_path_buf(), table);
        }
        Ok(&self.tables[path])
    }

    /// Row-index binding: row N serves trace N.
    pub fn value_by_row(
        &mut self,
        path: &Path,
        column: &str,
        trace: u64,
        allow_float: bool,
    ) -> Result<i64> {
        if !self.row_bound.contains(&path.to_path_buf()) {
            self.row_bound.push(path.to_path_buf());
        }
        let table = self.table(path)?;
        let col = table.column_index(column)?;
        let row = trace as usize;
        if row >= table.row_count() {
            return Err(Error::CsvUnderflow {
                file: table.file.clone(),
                trace,
            });
        }
        table.number(row, col, column, allow_float)
    }

    /// Keyed binding: the row whose key-column cell equals `key`.
    pub fn value_by_key(
        &mut self,
        path: &Path,
        column: &str,
        key_column: &str,
        key: i64,
        allow_float: bool,
    ) -> Result<i64> {
        let cache_key = (path.to_path_buf(), key_column.to_string());
        if !self.keyed.contains_key(&cache_key) {
            let index = {
                let table = self.table(path)?;
                let key_col = table.column_index(key_column)?;
                let mut index = HashMap::with_capacity(table.row_count());
                for row in 0..table.row_count() {
                    let value = table.number(row, key_col, key_column, false)?;
                    index.entry(value).or_insert(row);
                }
                index
            };
            self.keyed.insert(cache_key.clone(), index);
        }

        let row = match self.keyed[&cache_key].get(&key) {
            Some(&row) => row,
            None => {
                return Err(Error::CsvKeyMissing {
                    file: path.display().to_string(),
                    key,
                })
            }
        };
        let table = self.table(path)?;
        let col = table.column_index(column)?;
        table.number(row, col, column, allow_float)
    }

    /// Row-bound tables with more rows than the file has traces, as
    /// (file, row count) pairs. Used for the end-of-run warning.
    pub fn row_overflow(&self, trace_count: u64) -> Vec<(PathBuf, usize)> {
        self.row_bound
            .iter()
            .filter_map(|path| {
                let rows = self.tables.get(path)?.row_count();
                (rows as u64 > trace_count).then(|| (path.clone(), rows))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn split_line_handles_quotes() {
        assert_eq!(split_line("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_line(r#""a,b",c"#), vec!["a,b", "c"]);
        assert_eq!(split_line(r#""say ""hi""",2"#), vec![r#"say "hi""#, "2"]);
        assert_eq!(split_line("a,,c"), vec!["a", "", "c"]);
    }

    #[test]
    fn row_binding() {
        let f = csv_file("shot,x\n1,100\n2,200\n3,300\n");
        let mut cache = CsvCache::new();
        assert_eq!(cache.value_by_row(f.path(), "x", 0, false).unwrap(), 100);
        assert_eq!(cache.value_by_row(f.path(), "x", 2, false).unwrap(), 300);
        let err = cache.value_by_row(f.path(), "x", 3, false).unwrap_err();
        assert!(matches!(err, Error::CsvUnderflow { trace: 3, .. }));
    }

    #[test]
    fn keyed_binding() {
        let f = csv_file("shot,x\n10,100\n30,300\n20,200\n");
        let mut cache = CsvCache::new();
        assert_eq!(
            cache.value_by_key(f.path(), "x", "shot", 20, false).unwrap(),
            200
        );
        let err = cache.value_by_key(f.path(), "x", "shot", 99, false).unwrap_err();
        assert!(matches!(err, Error::CsvKeyMissing { key: 99, .. }));
    }

    #[test]
    fn missing_column() {
        let f = csv_file("a,b\n1,2\n");
        let mut cache = CsvCache::new();
        let err = cache.value_by_row(f.path(), "c", 0, false).unwrap_err();
        assert!(matches!(err, Error::CsvColumnMissing { .. }));
    }

    #[test]
    fn type_error_and_float_fallback() {
        let f = csv_file("x\n12.75\n");
        let mut cache = CsvCache::new();
        let err = cache.value_by_row(f.path(), "x", 0, false).unwrap_err();
        assert!(matches!(err, Error::CsvTypeError { .. }));
        // coordinate destinations may take the rounded double
        assert_eq!(cache.value_by_row(f.path(), "x", 0, true).unwrap(), 13);
    }

    #[test]
    fn overflow_reporting() {
        let f = csv_file("x\n1\n2\n3\n4\n");
        let mut cache = CsvCache::new();
        cache.value_by_row(f.path(), "x", 0, false).unwrap();
        assert_eq!(cache.row_overflow(2).len(), 1);
        assert!(cache.row_overflow(4).is_empty());
    }
}
