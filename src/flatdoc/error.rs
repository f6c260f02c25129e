//! Error types.
//!
//! Errors come in three families. [`ParseError`] is raised by the text codec
//! and knows nothing about files; the document manager wraps it in
//! [`FlatdocError::Parse`] together with the offending path. [`TableError`]
//! belongs to the CSV layer. Everything else is a [`FlatdocError`].

use crate::model::Key;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("cannot identify line {line_no}: {line:?}")]
    CannotIdentify { line_no: usize, line: String },

    #[error("cannot parse value on line {line_no}: {line:?} ({reason})")]
    CannotParse {
        line_no: usize,
        line: String,
        reason: String,
    },

    #[error("invalid multi-line block header on line {line_no}: {line:?}")]
    InvalidMultilineBlock { line_no: usize, line: String },

    #[error("cannot serialize attribute {attribute:?}: {reason}")]
    Unserializable { attribute: String, reason: String },
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("CSV header contains a blank cell{}", fmt_path(.path))]
    BlankHeader { path: Option<PathBuf> },

    #[error("no row {row:?} in CSV{}", fmt_path(.path))]
    UnknownRow { row: String, path: Option<PathBuf> },

    #[error("no column {column:?} in CSV{}", fmt_path(.path))]
    UnknownCell {
        column: String,
        path: Option<PathBuf>,
    },

    #[error("CSV is read-only{}", fmt_path(.path))]
    ReadOnly { path: Option<PathBuf> },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" ({})", p.display()),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum FlatdocError {
    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("could not serialize {key:?}: {source}")]
    Serialize {
        key: Key,
        #[source]
        source: ParseError,
    },

    #[error("no {type_name} document with key {key:?}")]
    DocumentNotFound { type_name: &'static str, key: Key },

    #[error("no {type_name} documents with keys {}", fmt_keys(.keys))]
    DocumentsNotFound {
        type_name: &'static str,
        keys: Vec<Key>,
    },

    #[error("another {type_name} document already uses key {key:?} ({})", .path.display())]
    DuplicateKey {
        type_name: &'static str,
        key: Key,
        path: PathBuf,
    },

    #[error("{} is outside of {}", .path.display(), .base.display())]
    IllegalDirectory { path: PathBuf, base: PathBuf },

    #[error("no document variant {suffix:?} for {}", .path.display())]
    NoSuchDocumentClass { suffix: String, path: PathBuf },

    #[error("invalid document key {0:?}")]
    InvalidKey(String),

    #[error("{key:?}: attribute {attribute:?} must be {expected}")]
    InvalidAttribute {
        key: Key,
        attribute: String,
        expected: &'static str,
    },

    #[error("{key:?}: unknown attribute {attribute:?}")]
    UnknownAttribute { key: Key, attribute: String },

    #[error("unknown document type {0:?}")]
    UnknownDocumentType(String),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] confique::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<walkdir::Error> for FlatdocError {
    fn from(err: walkdir::Error) -> Self {
        FlatdocError::Io(err.into())
    }
}

fn fmt_keys(keys: &[Key]) -> String {
    keys.iter()
        .map(|k| format!("{:?}", k.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, FlatdocError>;
