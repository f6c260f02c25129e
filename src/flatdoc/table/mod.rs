//! # Tabular Store
//!
//! Rectangular CSV tables addressed by row key and column name, both
//! normalized with [`normalize_key`] so `get("Yes", "NO")` finds row `yes`,
//! column `no`. The first column holds the row keys.
//!
//! Cells are typed on read: a column named `year` holds integers, every
//! other column holds floats where the text is numeric and the raw string
//! otherwise.
//!
//! A [`Table`] read from disk remembers its path and can be written back
//! with [`Table::save`]; tables built from text are read-only.

mod normalize;

use crate::error::TableError;
use crate::resolver::write_atomic;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub use normalize::normalize_key;

/// Extension a table's backing file must carry to be writable.
pub const EXTENSION: &str = "csv";

static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid regex")
});

type TableResult<T> = std::result::Result<T, TableError>;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Str(String),
    Empty,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Types raw text the way it would be read from `column` (normalized).
    pub fn coerce(column: &str, raw: &str) -> Cell {
        let text = raw.trim();
        if text.is_empty() {
            return Cell::Empty;
        }
        if column == "year" {
            if let Ok(i) = text.parse::<i64>() {
                return Cell::Int(i);
            }
        }
        if NUMERIC.is_match(text) {
            if let Ok(f) = text.parse::<f64>() {
                return Cell::Float(f);
            }
        }
        Cell::Str(raw.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Str(s) => f.write_str(s),
            Cell::Empty => Ok(()),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Str(v.to_string())
    }
}

/// A column addressed by (normalized) name or by position.
///
/// Positional access is never checked against the header: an index past
/// the last column reads as [`Cell::Empty`].
#[derive(Debug, Clone, Copy)]
pub enum ColumnRef<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for ColumnRef<'a> {
    fn from(name: &'a str) -> Self {
        ColumnRef::Name(name)
    }
}

impl<'a> From<&'a String> for ColumnRef<'a> {
    fn from(name: &'a String) -> Self {
        ColumnRef::Name(name)
    }
}

impl From<usize> for ColumnRef<'_> {
    fn from(index: usize) -> Self {
        ColumnRef::Index(index)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// Replace a symbolic link at the target path with a regular file
    /// instead of writing through the link.
    pub replace_symlink: bool,
}

#[derive(Debug, Clone)]
struct Row {
    cells: Vec<Cell>,
}

#[derive(Debug, Clone)]
pub struct Table {
    path: Option<PathBuf>,
    raw_headers: Vec<String>,
    headers: Vec<String>,
    rows: Vec<Row>,
    row_index: HashMap<String, usize>,
}

impl Table {
    /// Reads a table from disk. The table remembers the path for saving.
    pub fn read(path: impl AsRef<Path>) -> TableResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut table = Self::parse(&text, Some(path.to_path_buf()))?;
        table.path = Some(path.to_path_buf());
        Ok(table)
    }

    /// Parses a table from text. The result has no backing file.
    pub fn from_text(text: &str) -> TableResult<Self> {
        Self::parse(text, None)
    }

    /// An empty table with the given header, to be filled and saved.
    pub fn new(path: impl Into<PathBuf>, headers: &[&str]) -> TableResult<Self> {
        let path = path.into();
        let raw_headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        check_headers(&raw_headers, Some(&path))?;
        Ok(Self {
            headers: raw_headers.iter().map(|h| normalize_key(h)).collect(),
            raw_headers,
            rows: Vec::new(),
            row_index: HashMap::new(),
            path: Some(path),
        })
    }

    fn parse(text: &str, path: Option<PathBuf>) -> TableResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut records = reader.records();
        let raw_headers: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(str::to_string).collect(),
            None => Vec::new(),
        };
        check_headers(&raw_headers, path.as_ref())?;
        let headers: Vec<String> = raw_headers.iter().map(|h| normalize_key(h)).collect();

        let mut table = Self {
            path,
            raw_headers,
            headers,
            rows: Vec::new(),
            row_index: HashMap::new(),
        };

        for record in records {
            let record = record?;
            let cells: Vec<Cell> = record
                .iter()
                .enumerate()
                .map(|(i, raw)| {
                    let column = table.headers.get(i).map(String::as_str).unwrap_or("");
                    Cell::coerce(column, raw)
                })
                .collect();
            if cells.iter().all(Cell::is_empty) {
                continue;
            }
            let key = normalize_key(record.get(0).unwrap_or(""));
            table.push_row(key, cells);
        }

        Ok(table)
    }

    fn push_row(&mut self, key: String, cells: Vec<Cell>) -> usize {
        let idx = self.rows.len();
        self.rows.push(Row { cells });
        self.row_index.entry(key).or_insert(idx);
        idx
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Normalized column names, including the key column.
    pub fn column_keys(&self) -> &[String] {
        &self.headers
    }

    /// Normalized row keys, in file order.
    pub fn row_keys(&self) -> Vec<String> {
        let mut keys: Vec<(&String, &usize)> = self.row_index.iter().collect();
        keys.sort_by_key(|(_, idx)| **idx);
        keys.into_iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn contains_row(&self, row: &str) -> bool {
        self.row_index.contains_key(&normalize_key(row))
    }

    /// Reads a cell. An unknown row is reported before an unknown column,
    /// so a lookup fails with exactly one of the two.
    pub fn get<'a>(&self, row: &str, column: impl Into<ColumnRef<'a>>) -> TableResult<Cell> {
        let row_idx = self.find_row(row)?;
        let col_idx = match column.into() {
            ColumnRef::Index(i) => i,
            ColumnRef::Name(name) => self.find_column(name)?,
        };
        Ok(self.rows[row_idx]
            .cells
            .get(col_idx)
            .cloned()
            .unwrap_or(Cell::Empty))
    }

    /// Writes a cell, creating the row when it does not exist yet. The
    /// column must exist.
    pub fn set<'a>(
        &mut self,
        row: &str,
        column: impl Into<ColumnRef<'a>>,
        value: impl Into<Cell>,
    ) -> TableResult<()> {
        let col_idx = match column.into() {
            ColumnRef::Index(i) if i < self.headers.len() => i,
            ColumnRef::Index(i) => {
                return Err(TableError::UnknownCell {
                    column: i.to_string(),
                    path: self.path.clone(),
                })
            }
            ColumnRef::Name(name) => self.find_column(name)?,
        };

        let key = normalize_key(row);
        let row_idx = match self.row_index.get(&key) {
            Some(idx) => *idx,
            None => {
                let mut cells = vec![Cell::Empty; self.headers.len()];
                if let Some(first) = cells.first_mut() {
                    *first = Cell::Str(row.to_string());
                }
                self.push_row(key, cells)
            }
        };

        let cells = &mut self.rows[row_idx].cells;
        if cells.len() <= col_idx {
            cells.resize(col_idx + 1, Cell::Empty);
        }
        cells[col_idx] = value.into();
        Ok(())
    }

    fn find_row(&self, row: &str) -> TableResult<usize> {
        self.row_index
            .get(&normalize_key(row))
            .copied()
            .ok_or_else(|| TableError::UnknownRow {
                row: row.to_string(),
                path: self.path.clone(),
            })
    }

    fn find_column(&self, name: &str) -> TableResult<usize> {
        let key = normalize_key(name);
        self.headers
            .iter()
            .position(|h| *h == key)
            .ok_or_else(|| TableError::UnknownCell {
                column: name.to_string(),
                path: self.path.clone(),
            })
    }

    /// Writes the header and every row as CSV.
    pub fn write_to<W: Write>(&self, writer: W) -> TableResult<()> {
        let mut out = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        out.write_record(&self.raw_headers)?;
        for row in &self.rows {
            out.write_record(row.cells.iter().map(|c| c.to_string()))?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn save(&self) -> TableResult<()> {
        self.save_with(SaveOptions::default())
    }

    /// Writes the table back to its file. Only tables backed by a `.csv`
    /// path can be saved.
    pub fn save_with(&self, options: SaveOptions) -> TableResult<()> {
        let path = match &self.path {
            Some(p) if p.extension().is_some_and(|e| e == EXTENSION) => p,
            _ => {
                return Err(TableError::ReadOnly {
                    path: self.path.clone(),
                })
            }
        };

        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;

        // Renaming over a symlink replaces the link itself.
        let target = if path.is_symlink() && !options.replace_symlink {
            fs::canonicalize(path)?
        } else {
            path.clone()
        };
        write_atomic(&target, &buffer)?;
        tracing::debug!(path = %path.display(), rows = self.rows.len(), "saved table");
        Ok(())
    }
}

fn check_headers(headers: &[String], path: Option<&PathBuf>) -> TableResult<()> {
    if headers.iter().any(|h| h.trim().is_empty()) {
        return Err(TableError::BlankHeader {
            path: path.cloned(),
        });
    }
    Ok(())
}

/// A two-column table read as `row key → value`; the value always comes
/// from the second column, whatever its header says.
#[derive(Debug, Clone)]
pub struct OneDimensionalTable {
    table: Table,
}

impl OneDimensionalTable {
    pub fn read(path: impl AsRef<Path>) -> TableResult<Self> {
        Ok(Self {
            table: Table::read(path)?,
        })
    }

    pub fn from_text(text: &str) -> TableResult<Self> {
        Ok(Self {
            table: Table::from_text(text)?,
        })
    }

    pub fn get(&self, row: &str) -> TableResult<Cell> {
        self.table.get(row, 1usize)
    }

    pub fn set(&mut self, row: &str, value: impl Into<Cell>) -> TableResult<()> {
        self.table.set(row, 1usize, value)
    }

    pub fn save(&self) -> TableResult<()> {
        self.table.save()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}
