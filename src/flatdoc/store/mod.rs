//! # Storage Layer
//!
//! A [`Store`] owns the root directory configuration and hands out one
//! [`Manager`] per document type. Files on disk are the truth; managers
//! only cache what they have read.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//! ├── nodes/
//! │   ├── coal_plant.converter.ad   # key `coal_plant`, variant `converter`
//! │   └── households/
//! │       └── heating.demand.ad     # subdirectories are free-form
//! ├── edges/
//! │   └── a-b@gas.share.ad
//! └── gqueries/
//!     └── total_demand.gql
//! ```
//!
//! ## Caching
//!
//! Each manager builds a lookup index (key → file) on first use, loads
//! documents lazily and keeps every loaded document as a shared
//! `Rc<RefCell<Document>>`, so two lookups of one key yield the same
//! instance. Nothing watches the disk: external edits become visible after
//! [`Store::clear`] (or [`Manager::clear`]).
//!
//! ## Root changes
//!
//! Changing the root invalidates every manager through the [`Registry`].
//! [`Store::use_root`] swaps the root for the lifetime of a guard, which
//! also covers early returns and panics:
//!
//! ```no_run
//! # use flatdoc::{catalog, resolver::PathResolver, store::Store};
//! # fn main() -> flatdoc::Result<()> {
//! let store = Store::new(PathResolver::single("data"));
//! let count = store.with_root(PathResolver::overlay("derived", "data"), |store| {
//!     Ok(store.manager(&catalog::NODE).keys()?.len())
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! All of this is single-threaded: `Rc` and `RefCell` keep a store and its
//! documents on the thread that created them.

use crate::config::StoreConfig;
use crate::error::Result;
use crate::resolver::PathResolver;
use crate::schema::DocumentType;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

pub mod manager;
pub mod registry;

pub use manager::Manager;
pub use registry::Registry;

/// State shared by a store and all of its managers.
pub struct StoreContext {
    root: RefCell<PathResolver>,
    registry: Registry,
}

impl StoreContext {
    pub fn new(root: PathResolver) -> Self {
        Self {
            root: RefCell::new(root),
            registry: Registry::new(),
        }
    }

    pub fn root(&self) -> PathResolver {
        self.root.borrow().clone()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Replaces the root and clears every registered manager.
    fn replace_root(&self, root: PathResolver) -> PathResolver {
        let previous = self.root.replace(root);
        self.registry.clear_all();
        previous
    }
}

pub struct Store {
    context: Rc<StoreContext>,
    managers: RefCell<HashMap<&'static str, Rc<Manager>>>,
}

impl Store {
    pub fn new(root: PathResolver) -> Self {
        Self {
            context: Rc::new(StoreContext::new(root)),
            managers: RefCell::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.resolver())
    }

    /// The manager for `doc_type`, created on first request.
    pub fn manager(&self, doc_type: &'static DocumentType) -> Rc<Manager> {
        self.managers
            .borrow_mut()
            .entry(doc_type.name)
            .or_insert_with(|| Manager::new(doc_type, self.context.clone()))
            .clone()
    }

    pub fn root(&self) -> PathResolver {
        self.context.root()
    }

    pub fn set_root(&self, root: PathResolver) {
        debug!(root = ?root, "root changed");
        self.context.replace_root(root);
    }

    pub fn registry(&self) -> &Registry {
        self.context.registry()
    }

    /// Clears every manager's caches.
    pub fn clear(&self) {
        self.context.registry().clear_all();
    }

    /// Switches to `root` until the returned guard is dropped.
    #[must_use = "the previous root is restored when the guard is dropped"]
    pub fn use_root(&self, root: PathResolver) -> RootGuard<'_> {
        debug!(root = ?root, "entering alternate root");
        let previous = self.context.replace_root(root);
        RootGuard {
            store: self,
            previous: Some(previous),
        }
    }

    /// Runs `f` with `root` in place, restoring the previous root afterwards
    /// whether `f` succeeds, fails or panics.
    pub fn with_root<T>(
        &self,
        root: PathResolver,
        f: impl FnOnce(&Store) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.use_root(root);
        f(self)
    }
}

/// Restores the previous root, and clears caches again, on drop.
pub struct RootGuard<'a> {
    store: &'a Store,
    previous: Option<PathResolver>,
}

impl Drop for RootGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            debug!(root = ?previous, "restoring root");
            self.store.context.replace_root(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CARRIER, NODE};
    use crate::error::FlatdocError;
    use std::fs;
    use tempfile::TempDir;

    fn two_roots() -> (TempDir, PathResolver, PathResolver) {
        let dir = TempDir::new().unwrap();
        for (root, key) in [("one", "coal"), ("two", "gas")] {
            let nodes = dir.path().join(root).join("nodes");
            fs::create_dir_all(&nodes).unwrap();
            fs::write(nodes.join(format!("{key}.ad")), "").unwrap();
        }
        let one = PathResolver::single(dir.path().join("one"));
        let two = PathResolver::single(dir.path().join("two"));
        (dir, one, two)
    }

    #[test]
    fn one_manager_per_type() {
        let store = Store::new(PathResolver::single("/nonexistent"));
        let a = store.manager(&NODE);
        let b = store.manager(&NODE);
        assert!(Rc::ptr_eq(&a, &b));
        store.manager(&CARRIER);
        assert_eq!(store.registry().len(), 2);
    }

    #[test]
    fn with_root_restores_after_a_panic() {
        let (_dir, one, two) = two_roots();
        let store = Store::new(one.clone());
        let nodes = store.manager(&NODE);
        assert!(nodes.contains_key("coal").unwrap());

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = store.with_root(two, |store| -> Result<()> {
                assert!(store.manager(&NODE).contains_key("gas")?);
                panic!("aborted inside the alternate root");
            });
        }));

        assert!(outcome.is_err());
        assert_eq!(store.root(), one);
        assert!(nodes.contains_key("coal").unwrap());
        assert!(!nodes.contains_key("gas").unwrap());
    }

    #[test]
    fn set_root_clears_managers() {
        let (_dir, one, two) = two_roots();
        let store = Store::new(one);
        let nodes = store.manager(&NODE);
        assert!(nodes.contains_key("coal").unwrap());

        store.set_root(two);
        assert!(!nodes.contains_key("coal").unwrap());
        assert!(nodes.contains_key("gas").unwrap());
    }

    #[test]
    fn with_root_restores_after_an_error() {
        let (_dir, one, two) = two_roots();
        let store = Store::new(one.clone());
        let nodes = store.manager(&NODE);

        let result: Result<()> = store.with_root(two, |store| {
            assert!(store.manager(&NODE).contains_key("gas")?);
            Err(FlatdocError::InvalidKey("boom".into()))
        });
        assert!(result.is_err());
        assert_eq!(store.root(), one);
        assert!(nodes.contains_key("coal").unwrap());
        assert!(!nodes.contains_key("gas").unwrap());
    }

    #[test]
    fn guard_restores_on_drop() {
        let (_dir, one, two) = two_roots();
        let store = Store::new(one.clone());
        {
            let _guard = store.use_root(two.clone());
            assert_eq!(store.root(), two);
        }
        assert_eq!(store.root(), one);
    }
}
