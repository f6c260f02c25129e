//! # Configuration
//!
//! Configuration is loaded with [`confique`], layered in priority order:
//!
//! 1. **Environment variables**: `FLATDOC_ROOT`, `FLATDOC_FALLBACK`, `FLATDOC_LOG_LEVEL`.
//! 2. **Working directory**: `./flatdoc.toml`.
//! 3. **User config**: `flatdoc.toml` in the OS config directory (via `directories`).
//! 4. **Compiled defaults**.
//!
//! An explicit file (`--config`) replaces layers 2 and 3 and must exist.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `root` | `data` | Directory holding one subdirectory per document type |
//! | `fallback` | unset | Base record set; when set, `root` overlays it |
//! | `log_level` | `warn` | Default tracing filter when `RUST_LOG` is unset |

use crate::error::Result;
use crate::resolver::PathResolver;
use confique::Config;
use directories::ProjectDirs;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "flatdoc.toml";

#[derive(Config, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the record set. With a fallback, the preferred side.
    #[config(env = "FLATDOC_ROOT", default = "data")]
    pub root: PathBuf,

    /// Base record set that `root` overrides file by file.
    #[config(env = "FLATDOC_FALLBACK")]
    pub fallback: Option<PathBuf>,

    #[config(env = "FLATDOC_LOG_LEVEL", default = "warn")]
    pub log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            fallback: None,
            log_level: "warn".to_string(),
        }
    }
}

impl StoreConfig {
    /// Loads the layered configuration. `explicit` replaces the file layers.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("config file not found: {}", path.display()),
                    )
                    .into());
                }
                builder = builder.file(path);
            }
            None => {
                builder = builder.file(CONFIG_FILENAME);
                if let Some(user) = user_config_path() {
                    builder = builder.file(user);
                }
            }
        }
        Ok(builder.load()?)
    }

    /// The root resolver: an overlay when a fallback is configured.
    pub fn resolver(&self) -> PathResolver {
        match &self.fallback {
            Some(fallback) => PathResolver::overlay(&self.root, fallback),
            None => PathResolver::single(&self.root),
        }
    }
}

/// `flatdoc.toml` in the OS-appropriate config directory.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "flatdoc").map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}
