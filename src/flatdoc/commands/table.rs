use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::table::{normalize_key, Cell, OneDimensionalTable, Table};
use std::path::Path;

/// Reads one cell. Without a column, the table is one-dimensional and the
/// value comes from its second column.
pub fn get(path: &Path, row: &str, column: Option<&str>) -> Result<CmdResult> {
    let (label, cell) = match column {
        Some(column) => {
            let table = Table::read(path)?;
            (normalize_key(column), table.get(row, column)?)
        }
        None => {
            let table = OneDimensionalTable::read(path)?;
            let label = table
                .table()
                .column_keys()
                .get(1)
                .cloned()
                .unwrap_or_else(|| normalize_key(row));
            (label, table.get(row)?)
        }
    };

    let mut result = CmdResult::default();
    result.cells.push((label, cell));
    Ok(result)
}

/// Writes one cell, typing `value` as the column would on read, and saves.
pub fn set(path: &Path, row: &str, column: &str, value: &str) -> Result<CmdResult> {
    let mut table = Table::read(path)?;
    let cell = Cell::coerce(&normalize_key(column), value);
    table.set(row, column, cell.clone())?;
    table.save()?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "{} [{}, {}] = {}",
        path.display(),
        row,
        column,
        cell
    )));
    result.cells.push((normalize_key(column), cell));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FlatdocError, TableError};
    use std::fs;
    use tempfile::TempDir;

    fn csv(text: &str) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shares.csv");
        fs::write(&path, text).unwrap();
        (dir, path)
    }

    #[test]
    fn get_named_and_one_dimensional() {
        let (_dir, path) = csv("key,share,year\ncoal,0.4,2019\ngas,0.6,2020\n");
        let named = get(&path, "Gas", Some("YEAR")).unwrap();
        assert_eq!(named.cells, vec![("year".to_string(), Cell::Int(2020))]);

        let single = get(&path, "coal", None).unwrap();
        assert_eq!(single.cells, vec![("share".to_string(), Cell::Float(0.4))]);
    }

    #[test]
    fn set_creates_rows_and_saves() {
        let (_dir, path) = csv("key,share\ncoal,0.4\n");
        set(&path, "oil", "share", "0.1").unwrap();
        let table = Table::read(&path).unwrap();
        assert_eq!(table.get("oil", "share").unwrap(), Cell::Float(0.1));
        assert_eq!(table.get("coal", "share").unwrap(), Cell::Float(0.4));
    }

    #[test]
    fn unknown_row_is_reported() {
        let (_dir, path) = csv("key,share\ncoal,0.4\n");
        assert!(matches!(
            get(&path, "wind", Some("share")),
            Err(FlatdocError::Table(TableError::UnknownRow { .. }))
        ));
    }
}
