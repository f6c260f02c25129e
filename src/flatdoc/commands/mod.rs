//! # Commands
//!
//! One module per CLI operation. Commands take a [`Store`](crate::store::Store)
//! and plain arguments and return a [`CmdResult`]; they never print. The
//! binary decides how results and messages are rendered.

use crate::catalog;
use crate::error::{FlatdocError, Result};
use crate::model::DocumentRef;
use crate::schema::DocumentType;
use crate::table::Cell;
use serde::Serialize;
use std::path::PathBuf;

pub mod check;
pub mod delete;
pub mod format;
pub mod list;
pub mod rename;
pub mod show;
pub mod table;

/// Resolves a type given on the command line by name or directory.
pub fn document_type(name: &str) -> Result<&'static DocumentType> {
    catalog::find(name).ok_or_else(|| FlatdocError::UnknownDocumentType(name.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// One line of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub key: String,
    pub variant: Option<&'static str>,
    pub path: Option<PathBuf>,
}

impl DocumentSummary {
    pub fn of(doc: &DocumentRef) -> Self {
        let doc = doc.borrow();
        Self {
            key: doc.key().to_string(),
            variant: doc.variant().map(|v| v.suffix),
            path: doc.path().map(|p| p.to_path_buf()),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub listed: Vec<DocumentSummary>,
    pub documents: Vec<DocumentRef>,
    pub cells: Vec<(String, Cell)>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_listed(mut self, listed: Vec<DocumentSummary>) -> Self {
        self.listed = listed;
        self
    }

    pub fn with_documents(mut self, documents: Vec<DocumentRef>) -> Self {
        self.documents = documents;
        self
    }

    /// True if any message is an error. The binary exits non-zero then.
    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}
