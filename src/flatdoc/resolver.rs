//! # Path Resolution
//!
//! A [`PathResolver`] answers "where does this name live?" for either a
//! single directory or an overlay of two directories:
//!
//! ```text
//! derived/          (preferred)        base/            (fallback)
//! └── nodes/                           └── nodes/
//!     └── coal.ad   ◄── wins               ├── coal.ad
//!                                          └── gas.ad   ◄── visible
//! ```
//!
//! In overlay mode every lookup prefers the preferred directory and falls
//! back to the fallback one, which lets a derived record set override
//! individual files of a base set without copying the rest. Directories
//! present on both sides are themselves overlays, so the precedence applies
//! at every depth.
//!
//! The fallback side defines identity: `basename` and `extension` are taken
//! from it even when only the preferred copy exists on disk.

use crate::error::Result;
use globset::GlobBuilder;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathResolver {
    Single(PathBuf),
    Overlay { preferred: PathBuf, fallback: PathBuf },
}

impl PathResolver {
    pub fn single(path: impl Into<PathBuf>) -> Self {
        PathResolver::Single(path.into())
    }

    pub fn overlay(preferred: impl Into<PathBuf>, fallback: impl Into<PathBuf>) -> Self {
        PathResolver::Overlay {
            preferred: preferred.into(),
            fallback: fallback.into(),
        }
    }

    /// The canonical path: the wrapped path, or the fallback side.
    pub fn path(&self) -> &Path {
        match self {
            PathResolver::Single(path) => path,
            PathResolver::Overlay { fallback, .. } => fallback,
        }
    }

    /// Where new files are created: the wrapped path, or the preferred side.
    pub fn write_base(&self) -> &Path {
        match self {
            PathResolver::Single(path) => path,
            PathResolver::Overlay { preferred, .. } => preferred,
        }
    }

    fn sides(&self) -> Vec<&Path> {
        match self {
            PathResolver::Single(path) => vec![path],
            PathResolver::Overlay {
                preferred,
                fallback,
            } => vec![preferred, fallback],
        }
    }

    pub fn exists(&self) -> bool {
        self.sides().iter().any(|p| p.exists())
    }

    pub fn is_file(&self) -> bool {
        self.sides().iter().any(|p| p.is_file())
    }

    pub fn is_dir(&self) -> bool {
        self.sides().iter().any(|p| p.is_dir())
    }

    pub fn basename(&self) -> Option<String> {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    pub fn extension(&self) -> Option<String> {
        self.path()
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
    }

    /// Resolves a relative name to a concrete path. In overlay mode this is
    /// the preferred path when it exists, and the fallback path otherwise
    /// (whether or not that exists).
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        match self {
            PathResolver::Single(path) => path.join(name),
            PathResolver::Overlay {
                preferred,
                fallback,
            } => {
                let candidate = preferred.join(name);
                if candidate.exists() {
                    candidate
                } else {
                    fallback.join(name)
                }
            }
        }
    }

    /// Like [`resolve`](Self::resolve), but a directory present on both
    /// sides yields a nested overlay.
    pub fn join(&self, name: impl AsRef<Path>) -> PathResolver {
        let name = name.as_ref();
        match self {
            PathResolver::Single(path) => PathResolver::Single(path.join(name)),
            PathResolver::Overlay {
                preferred,
                fallback,
            } => {
                let p = preferred.join(name);
                let f = fallback.join(name);
                if p.is_dir() && f.is_dir() {
                    PathResolver::overlay(p, f)
                } else {
                    PathResolver::Single(self.resolve(name))
                }
            }
        }
    }

    /// Immediate children, sorted by basename. Overlays merge both sides:
    /// a name appears once, the preferred copy wins, and a directory on
    /// both sides becomes a nested overlay.
    pub fn children(&self) -> Result<Vec<PathResolver>> {
        match self {
            PathResolver::Single(path) => Ok(list_dir(path)?
                .into_values()
                .map(PathResolver::Single)
                .collect()),
            PathResolver::Overlay {
                preferred,
                fallback,
            } => {
                let mut merged: BTreeMap<OsString, (Option<PathBuf>, Option<PathBuf>)> =
                    BTreeMap::new();
                for (name, path) in list_dir(preferred)? {
                    merged.entry(name).or_default().0 = Some(path);
                }
                for (name, path) in list_dir(fallback)? {
                    merged.entry(name).or_default().1 = Some(path);
                }

                Ok(merged
                    .into_values()
                    .filter_map(|pair| match pair {
                        (Some(p), Some(f)) if p.is_dir() && f.is_dir() => {
                            Some(PathResolver::overlay(p, f))
                        }
                        (Some(p), _) => Some(PathResolver::Single(p)),
                        (None, Some(f)) => Some(PathResolver::Single(f)),
                        (None, None) => None,
                    })
                    .collect())
            }
        }
    }

    /// Files matching `pattern` (e.g. `**/*.ad`) anywhere below the root,
    /// sorted by their root-relative path. In overlay mode a relative path
    /// found on both sides is reported once, from the preferred side.
    pub fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()?
            .compile_matcher();

        let mut found: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
        // Fallback first, so preferred entries overwrite it.
        for root in self.sides().into_iter().rev() {
            if !root.is_dir() {
                continue;
            }
            for entry in WalkDir::new(root).follow_links(true) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(root) else {
                    continue;
                };
                if matcher.is_match(relative) {
                    found.insert(relative.to_path_buf(), entry.path().to_path_buf());
                }
            }
        }

        Ok(found.into_values().collect())
    }

    /// The path of `path` relative to whichever side contains it.
    pub fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        self.sides()
            .into_iter()
            .find_map(|root| path.strip_prefix(root).ok())
    }

    /// True if `path` lies below one of the sides.
    pub fn contains(&self, path: &Path) -> bool {
        self.relative(path).is_some()
    }
}

/// Writes through a temporary sibling file and renames it into place, so a
/// failed write never truncates `target`.
pub(crate) fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let tmp = dir.join(format!(".flatdoc-{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, contents)?;
    if let Err(err) = fs::rename(&tmp, target) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}

fn list_dir(path: &Path) -> Result<BTreeMap<OsString, PathBuf>> {
    let mut entries = BTreeMap::new();
    if !path.is_dir() {
        return Ok(entries);
    }
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        entries.insert(entry.file_name(), entry.path());
    }
    Ok(entries)
}
