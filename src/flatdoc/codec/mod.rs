//! # Text Codec
//!
//! Documents are plain text, one attribute per line:
//!
//! ```text
//! # Coal fired power plant.
//! # Numbers from the 2019 survey.
//!
//! - sector = energy
//! - groups = [ power, coal ]
//! - output.electricity = 0.38
//!
//! ~ demand =
//!   SUM(
//!     V(a, demand),
//!     V(b, demand)
//!   )
//! ```
//!
//! - `# ` lines are comments; consecutive lines form one block.
//! - `- key = value` lines are static attributes. Dotted keys nest.
//! - `~ key =` opens a multi-line block whose indented body is a query
//!   (formula source), stored separately from the static attributes.
//!
//! [`parse`] and [`serialize`] are inverses for every document `parse`
//! accepts. Neither knows about files: errors carry line numbers only, and
//! the document manager adds the path.

mod parse;
mod serialize;

use crate::model::{AttributeMap, QueryMap};
use serde::Serialize;

pub use parse::{parse, parse_scalar};
pub use serialize::{format_scalar, serialize};

/// The result of parsing a document: comments, static attributes (possibly
/// nested) and queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedDocument {
    pub comments: Option<String>,
    pub attributes: AttributeMap,
    pub queries: QueryMap,
}
