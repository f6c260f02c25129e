//! # Flatdoc Architecture
//!
//! Flatdoc stores typed records (nodes, edges, carriers, datasets, queries of
//! an energy model) as small, hand-editable text files instead of a
//! database. It is a library first; the `flatdoc` binary is a thin client.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (cli/, wired by main.rs)                               │
//! │  - Parses arguments, prints results, owns exit codes        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs)                                   │
//! │  - One operation each, returns a CmdResult, never prints    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Store (store/)                                             │
//! │  - One Manager per type: lookup index, instance cache,      │
//! │    rename-safe and duplicate-safe writes                    │
//! │  - Registry of managers, scoped root overrides              │
//! └─────────────────────────────────────────────────────────────┘
//!              │                               │
//!              ▼                               ▼
//! ┌──────────────────────────┐   ┌──────────────────────────────┐
//! │  Codec (codec/)          │   │  PathResolver (resolver.rs)  │
//! │  text ⇄ ParsedDocument   │   │  single dir or overlay       │
//! └──────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! The CSV layer ([`table`]) stands apart: it shares nothing with the codec
//! and is used directly for lookup tables.
//!
//! ## A document
//!
//! ```text
//! # Coal fired power plant.
//!
//! - sector = energy
//! - groups = [ power, coal ]
//! - output.electricity = 0.38
//!
//! ~ demand =
//!   V(coal_mine, demand) * 0.9
//! ```
//!
//! saved as `nodes/<any subdirs>/coal_plant.converter.ad`: key `coal_plant`,
//! variant `converter`. Attributes are checked and coerced against the
//! static schema of the type ([`catalog`]).
//!
//! ## Module Overview
//!
//! - [`store`]: [`Store`], managers and the registry
//! - [`codec`]: The line-oriented text format
//! - [`model`]: `Key`, `Value` and `Document`
//! - [`schema`] and [`catalog`]: Record types, fields and variants
//! - [`resolver`]: Single and overlay directory resolution
//! - [`table`]: CSV tables with normalized keys
//! - [`commands`]: Operations behind the CLI
//! - [`config`]: Layered configuration
//! - [`error`]: Error types
//! - `cli`: Argument parsing and printing for the binary (not part of the lib API)

pub mod catalog;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod table;

pub use error::{FlatdocError, Result};
pub use model::{Document, DocumentRef, Key, Value};
pub use resolver::PathResolver;
pub use store::{Manager, Store};
