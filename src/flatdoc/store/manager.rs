use super::StoreContext;
use crate::codec;
use crate::error::{FlatdocError, Result};
use crate::model::{is_contained, Document, DocumentRef, Key};
use crate::resolver::{write_atomic, PathResolver};
use crate::schema::{DocumentType, Variant};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};

/// Everything a manager remembers between calls. Reset wholesale by
/// [`Manager::clear`].
#[derive(Default)]
struct Cache {
    /// Key → backing file. `None` until first needed.
    index: Option<BTreeMap<Key, PathBuf>>,
    instances: HashMap<Key, DocumentRef>,
    /// Materialized by [`Manager::all`], kept sorted by key.
    all: Option<Vec<DocumentRef>>,
}

/// Loads, caches and persists the documents of one [`DocumentType`].
///
/// The manager never holds two instances for the same key: every `get`
/// between two [`clear`](Self::clear) calls hands out the same `Rc`.
pub struct Manager {
    doc_type: &'static DocumentType,
    context: Rc<StoreContext>,
    cache: RefCell<Cache>,
}

impl Manager {
    /// Creates a manager and registers it with the context's registry.
    pub fn new(doc_type: &'static DocumentType, context: Rc<StoreContext>) -> Rc<Self> {
        let manager = Rc::new(Self {
            doc_type,
            context: context.clone(),
            cache: RefCell::new(Cache::default()),
        });
        context.registry().register(&manager);
        manager
    }

    pub fn doc_type(&self) -> &'static DocumentType {
        self.doc_type
    }

    /// The type's directory under the current root.
    pub fn resolver(&self) -> PathResolver {
        self.context.root().join(self.doc_type.directory)
    }

    /// Where documents without a backing file are created.
    pub fn write_base(&self) -> PathBuf {
        self.context.root().write_base().join(self.doc_type.directory)
    }

    // --- Reading ---

    /// The document with `key`, or `None` if no file carries it.
    pub fn get(&self, key: &str) -> Result<Option<DocumentRef>> {
        let key = Key::new(key)?;
        self.get_key(&key)
    }

    /// Like [`get`](Self::get), but a missing document is an error.
    pub fn fetch(&self, key: &str) -> Result<DocumentRef> {
        let key = Key::new(key)?;
        self.get_key(&key)?
            .ok_or(FlatdocError::DocumentNotFound {
                type_name: self.doc_type.name,
                key,
            })
    }

    /// Fetches several documents at once. Either all are found, or the
    /// error lists every missing key.
    pub fn fetch_all<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<DocumentRef>> {
        let mut found = Vec::with_capacity(keys.len());
        let mut missing = Vec::new();
        for raw in keys {
            let key = Key::new(raw.as_ref())?;
            match self.get_key(&key)? {
                Some(doc) => found.push(doc),
                None => missing.push(key),
            }
        }
        if !missing.is_empty() {
            return Err(FlatdocError::DocumentsNotFound {
                type_name: self.doc_type.name,
                keys: missing,
            });
        }
        Ok(found)
    }

    /// Every document of this type, in key order.
    pub fn all(&self) -> Result<Vec<DocumentRef>> {
        if let Some(all) = &self.cache.borrow().all {
            return Ok(all.clone());
        }

        let keys = self.keys()?;
        let mut docs = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(doc) = self.get_key(key)? {
                docs.push(doc);
            }
        }

        self.cache.borrow_mut().all = Some(docs.clone());
        debug!(doc_type = self.doc_type.name, count = docs.len(), "materialized all");
        Ok(docs)
    }

    /// Whether a file carries `key`. Consults the index only.
    pub fn contains_key(&self, key: &str) -> Result<bool> {
        let Ok(key) = Key::new(key) else {
            return Ok(false);
        };
        self.ensure_index()?;
        Ok(self.index_lookup(&key).is_some())
    }

    /// Indexed keys, sorted.
    pub fn keys(&self) -> Result<Vec<Key>> {
        self.ensure_index()?;
        Ok(self
            .cache
            .borrow()
            .index
            .as_ref()
            .map(|index| index.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// A new, unsaved document. Nothing is cached until it is written.
    pub fn new_document(&self, key: &str, variant: Option<&str>) -> Result<DocumentRef> {
        let doc = Document::new(self.doc_type, Key::new(key)?);
        let doc = match variant {
            Some(suffix) => doc.with_variant(suffix)?,
            None => doc,
        };
        Ok(Rc::new(RefCell::new(doc)))
    }

    fn get_key(&self, key: &Key) -> Result<Option<DocumentRef>> {
        if let Some(doc) = self.cache.borrow().instances.get(key) {
            return Ok(Some(doc.clone()));
        }

        self.ensure_index()?;
        let Some(path) = self.index_lookup(key) else {
            return Ok(None);
        };

        let doc = Rc::new(RefCell::new(self.load(key.clone(), path)?));
        self.cache
            .borrow_mut()
            .instances
            .insert(key.clone(), doc.clone());
        Ok(Some(doc))
    }

    fn load(&self, key: Key, path: PathBuf) -> Result<Document> {
        let text = fs::read_to_string(&path)?;
        let parsed = codec::parse(&text).map_err(|source| FlatdocError::Parse {
            path: path.clone(),
            source,
        })?;
        let variant = self.variant_for(&path)?;
        debug!(doc_type = self.doc_type.name, key = %key, path = %path.display(), "loaded");
        Document::from_parsed(self.doc_type, variant, key, path, parsed)
    }

    /// `key.suffix.ext` selects the variant `suffix`; `key.ext` the base.
    fn variant_for(&self, path: &Path) -> Result<Option<&'static Variant>> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let segments: Vec<&str> = name.split('.').collect();
        if segments.len() < 3 {
            return Ok(None);
        }
        let suffix = segments[1];
        self.doc_type
            .variant(suffix)
            .map(Some)
            .ok_or_else(|| FlatdocError::NoSuchDocumentClass {
                suffix: suffix.to_string(),
                path: path.to_path_buf(),
            })
    }

    // --- Index ---

    fn index_lookup(&self, key: &Key) -> Option<PathBuf> {
        self.cache
            .borrow()
            .index
            .as_ref()
            .and_then(|index| index.get(key).cloned())
    }

    fn ensure_index(&self) -> Result<()> {
        if self.cache.borrow().index.is_some() {
            return Ok(());
        }

        let pattern = format!("**/*.{}", self.doc_type.extension);
        let mut index: BTreeMap<Key, PathBuf> = BTreeMap::new();
        for path in self.resolver().glob(&pattern)? {
            let key = match Key::from_path(&path) {
                Ok(key) => key,
                Err(err) => {
                    warn!(path = %path.display(), "skipping file: {err}");
                    continue;
                }
            };
            if let Some(first) = index.get(&key) {
                debug!(first = %first.display(), second = %path.display(), "duplicate key");
                return Err(FlatdocError::DuplicateKey {
                    type_name: self.doc_type.name,
                    key,
                    path,
                });
            }
            index.insert(key, path);
        }

        debug!(doc_type = self.doc_type.name, count = index.len(), "built index");
        self.cache.borrow_mut().index = Some(index);
        Ok(())
    }

    // --- Writing ---

    /// Writes `doc` to disk and caches it.
    ///
    /// A document whose key is unchanged is rewritten in place. A renamed
    /// document moves: its old file is removed before the new one is
    /// written, so both never exist together. A new document goes below
    /// [`write_base`](Self::write_base).
    ///
    /// The key must not belong to another file or to another cached
    /// instance, otherwise the write fails with
    /// [`FlatdocError::DuplicateKey`]. On any error neither disk nor caches
    /// change.
    pub fn write(&self, doc: &DocumentRef) -> Result<()> {
        if doc.borrow().is_renamed() {
            return self.rename(doc);
        }
        self.persist(doc)
    }

    /// Saves `doc` under its current key, renaming its file if the key
    /// changed since it was loaded. See [`write`](Self::write).
    pub fn save(&self, doc: &DocumentRef) -> Result<()> {
        self.write(doc)
    }

    fn rename(&self, doc: &DocumentRef) -> Result<()> {
        self.ensure_index()?;
        let (old_path, new_key) = {
            let d = doc.borrow();
            self.check_type(&d)?;
            self.ensure_unclaimed(doc, &d)?;
            // Surface serialization errors before anything is deleted.
            d.to_text()?;
            (d.path().map(Path::to_path_buf), d.key().clone())
        };

        if let Some(old_path) = &old_path {
            debug!(doc_type = self.doc_type.name, to = %new_key, from = %old_path.display(), "renaming");
            self.delete_path(old_path)?;
        }
        self.persist(doc)
    }

    fn persist(&self, doc: &DocumentRef) -> Result<()> {
        self.ensure_index()?;

        let (key, target, text) = {
            let d = doc.borrow();
            self.check_type(&d)?;
            self.ensure_unclaimed(doc, &d)?;
            let target = self.target_path(&d)?;
            (d.key().clone(), target, d.to_text()?)
        };

        let created = !target.exists();
        write_atomic(&target, text.as_bytes())?;
        doc.borrow_mut().mark_saved(target.clone());
        debug!(doc_type = self.doc_type.name, key = %key, path = %target.display(), created, "wrote");

        let mut guard = self.cache.borrow_mut();
        let cache = &mut *guard;
        if let Some(index) = cache.index.as_mut() {
            index.insert(key.clone(), target);
        }
        cache.instances.insert(key.clone(), doc.clone());
        if let Some(all) = cache.all.as_mut() {
            if !all.iter().any(|d| Rc::ptr_eq(d, doc)) {
                let at = all.partition_point(|d| d.borrow().key() < &key);
                all.insert(at, doc.clone());
            }
        }
        Ok(())
    }

    /// The key of `d` is claimed when another instance is cached under it,
    /// or when no instance is cached and another file carries it.
    fn ensure_unclaimed(&self, doc: &DocumentRef, d: &Document) -> Result<()> {
        let cache = self.cache.borrow();
        let indexed = cache.index.as_ref().and_then(|index| index.get(d.key()));
        let claimed = match cache.instances.get(d.key()) {
            Some(cached) => !Rc::ptr_eq(cached, doc),
            None => indexed.is_some_and(|path| d.path() != Some(path.as_path())),
        };
        if !claimed {
            return Ok(());
        }
        let path = indexed
            .cloned()
            .or_else(|| d.path().map(Path::to_path_buf))
            .unwrap_or_default();
        Err(FlatdocError::DuplicateKey {
            type_name: self.doc_type.name,
            key: d.key().clone(),
            path,
        })
    }

    /// Deletes the document's file and forgets it. The document becomes new
    /// again and can be re-written.
    pub fn delete(&self, doc: &DocumentRef) -> Result<()> {
        let path = doc.borrow().path().map(Path::to_path_buf);
        if let Some(path) = path {
            self.delete_path(&path)?;
        }
        doc.borrow_mut().mark_deleted();
        Ok(())
    }

    /// Deletes the file at `path` and drops its key from every cache. In
    /// overlay mode a fallback copy shadowed by the deleted file becomes
    /// visible again.
    ///
    /// `path` must be a file of this type below the type's directory;
    /// anything else is a [`FlatdocError::IllegalDirectory`] and nothing is
    /// removed.
    pub fn delete_path(&self, path: &Path) -> Result<()> {
        let resolver = self.resolver();
        let owned = resolver.relative(path).is_some_and(is_contained)
            && path
                .extension()
                .is_some_and(|ext| ext == self.doc_type.extension);
        if !owned {
            return Err(FlatdocError::IllegalDirectory {
                path: path.to_path_buf(),
                base: resolver.write_base().to_path_buf(),
            });
        }
        let key = Key::from_path(path)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        debug!(doc_type = self.doc_type.name, key = %key, path = %path.display(), "deleted");

        let shadowed = self.shadowed_copy(path);
        let mut guard = self.cache.borrow_mut();
        let cache = &mut *guard;
        let Some(index) = cache.index.as_mut() else {
            return Ok(());
        };
        if index.get(&key).map(PathBuf::as_path) != Some(path) {
            return Ok(());
        }
        index.remove(&key);

        if let Some(shadowed) = shadowed {
            debug!(key = %key, path = %shadowed.display(), "fallback copy visible");
            index.insert(key.clone(), shadowed);
            // Rebuilt lazily so it picks up the fallback instance.
            cache.all = None;
        }
        if let Some(removed) = cache.instances.remove(&key) {
            if let Some(all) = cache.all.as_mut() {
                all.retain(|d| !Rc::ptr_eq(d, &removed));
            }
        }
        Ok(())
    }

    /// Drops the index, every cached instance and the `all` list.
    pub fn clear(&self) {
        *self.cache.borrow_mut() = Cache::default();
        debug!(doc_type = self.doc_type.name, "cleared");
    }

    fn check_type(&self, doc: &Document) -> Result<()> {
        if std::ptr::eq(doc.doc_type(), self.doc_type) {
            Ok(())
        } else {
            Err(FlatdocError::UnknownDocumentType(format!(
                "{} (expected {})",
                doc.doc_type().name,
                self.doc_type.name
            )))
        }
    }

    fn target_path(&self, doc: &Document) -> Result<PathBuf> {
        let file_name = doc.file_name();
        match doc.path() {
            Some(path) if !doc.is_renamed() && path.file_name() == Some(file_name.as_ref()) => {
                Ok(path.to_path_buf())
            }
            Some(path) => Ok(path.with_file_name(file_name)),
            None => {
                let base = self.write_base();
                match doc.subdirectory() {
                    Some(sub) if !is_contained(sub) => Err(FlatdocError::IllegalDirectory {
                        path: base.join(sub),
                        base,
                    }),
                    Some(sub) => Ok(base.join(sub).join(file_name)),
                    None => Ok(base.join(file_name)),
                }
            }
        }
    }

    fn shadowed_copy(&self, path: &Path) -> Option<PathBuf> {
        let resolver = self.resolver();
        let PathResolver::Overlay { fallback, .. } = &resolver else {
            return None;
        };
        let relative = resolver.relative(path)?;
        let candidate = fallback.join(relative);
        (candidate != path && candidate.is_file()).then_some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EDGE, NODE};
    use crate::model::Value;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Rc<StoreContext>) {
        let dir = TempDir::new().unwrap();
        let context = Rc::new(StoreContext::new(PathResolver::single(dir.path())));
        (dir, context)
    }

    fn put(dir: &Path, relative: &str, text: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn get_returns_the_same_instance() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/coal.ad", "- sector = energy\n");
        let nodes = Manager::new(&NODE, context);

        let a = nodes.get("coal").unwrap().unwrap();
        let b = nodes.get("coal").unwrap().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.borrow().get("sector"), Some(&Value::from("energy")));
        assert!(nodes.get("gas").unwrap().is_none());
    }

    #[test]
    fn variant_comes_from_the_filename() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/sub/coal.converter.ad", "- full_load_hours = 8000\n");
        put(dir.path(), "nodes/odd.mystery.ad", "");
        let nodes = Manager::new(&NODE, context);

        let coal = nodes.fetch("coal").unwrap();
        assert_eq!(coal.borrow().variant().unwrap().suffix, "converter");
        assert_eq!(coal.borrow().get("full_load_hours"), Some(&Value::Float(8000.0)));

        assert!(matches!(
            nodes.get("odd"),
            Err(FlatdocError::NoSuchDocumentClass { suffix, .. }) if suffix == "mystery"
        ));
    }

    #[test]
    fn parse_errors_carry_the_path_and_cache_nothing() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/bad.ad", "what is this\n");
        let nodes = Manager::new(&NODE, context);

        let err = nodes.get("bad").unwrap_err();
        match &err {
            FlatdocError::Parse { path, .. } => assert!(path.ends_with("nodes/bad.ad")),
            other => panic!("unexpected error: {other:?}"),
        }

        put(dir.path(), "nodes/bad.ad", "- sector = fixed\n");
        assert!(nodes.get("bad").unwrap().is_some());
    }

    #[test]
    fn fetch_reports_missing_keys() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/a.ad", "");
        let nodes = Manager::new(&NODE, context);

        assert!(matches!(
            nodes.fetch("zzz"),
            Err(FlatdocError::DocumentNotFound { .. })
        ));
        match nodes.fetch_all(&["a", "b", "c"]) {
            Err(FlatdocError::DocumentsNotFound { keys, .. }) => {
                let keys: Vec<_> = keys.iter().map(Key::as_str).collect();
                assert_eq!(keys, vec!["b", "c"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(nodes.fetch_all(&["a"]).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_files_fail_the_index() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/x/coal.ad", "");
        put(dir.path(), "nodes/y/coal.converter.ad", "");
        let nodes = Manager::new(&NODE, context);
        assert!(matches!(
            nodes.contains_key("coal"),
            Err(FlatdocError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn write_creates_under_the_type_directory() {
        let (dir, context) = setup();
        let edges = Manager::new(&EDGE, context);

        let doc = edges.new_document("a-b@gas", Some("share")).unwrap();
        doc.borrow_mut().set("carrier", "gas").unwrap();
        edges.write(&doc).unwrap();

        let path = dir.path().join("edges/a-b@gas.share.ad");
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("- carrier = gas"));
        assert!(text.contains("- reversed = false"));
        assert!(text.ends_with('\n'));
        assert_eq!(doc.borrow().path(), Some(path.as_path()));
        assert!(Rc::ptr_eq(&edges.fetch("a-b@gas").unwrap(), &doc));
    }

    #[test]
    fn write_rejects_a_taken_key() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/coal.ad", "- sector = energy\n");
        let nodes = Manager::new(&NODE, context);

        let doc = nodes.new_document("coal", None).unwrap();
        assert!(matches!(
            nodes.write(&doc),
            Err(FlatdocError::DuplicateKey { .. })
        ));
        assert_eq!(
            fs::read_to_string(dir.path().join("nodes/coal.ad")).unwrap(),
            "- sector = energy\n"
        );
    }

    #[test]
    fn subdirectories_must_stay_below_the_base() {
        let (dir, context) = setup();
        let nodes = Manager::new(&NODE, context);

        let doc = nodes.new_document("deep", None).unwrap();
        doc.borrow_mut().set_subdirectory("energy/power");
        nodes.write(&doc).unwrap();
        assert!(dir.path().join("nodes/energy/power/deep.ad").is_file());

        let escapee = nodes.new_document("escapee", None).unwrap();
        escapee.borrow_mut().set_subdirectory("../../elsewhere");
        assert!(matches!(
            nodes.write(&escapee),
            Err(FlatdocError::IllegalDirectory { .. })
        ));
    }

    #[test]
    fn save_renames_in_place() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/sub/old.demand.ad", "- demand_expected = true\n");
        let nodes = Manager::new(&NODE, context);

        let doc = nodes.fetch("old").unwrap();
        doc.borrow_mut().set_key(Key::new("new").unwrap());
        nodes.save(&doc).unwrap();

        assert!(!dir.path().join("nodes/sub/old.demand.ad").exists());
        assert!(dir.path().join("nodes/sub/new.demand.ad").is_file());
        assert!(!nodes.contains_key("old").unwrap());
        assert!(Rc::ptr_eq(&nodes.fetch("new").unwrap(), &doc));
        assert!(!doc.borrow().is_renamed());
    }

    #[test]
    fn failed_rename_touches_nothing() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/a.ad", "- sector = a\n");
        put(dir.path(), "nodes/b.ad", "- sector = b\n");
        let nodes = Manager::new(&NODE, context);

        let a = nodes.fetch("a").unwrap();
        a.borrow_mut().set_key(Key::new("b").unwrap());
        assert!(matches!(
            nodes.save(&a),
            Err(FlatdocError::DuplicateKey { .. })
        ));
        assert!(dir.path().join("nodes/a.ad").is_file());
        assert_eq!(
            fs::read_to_string(dir.path().join("nodes/b.ad")).unwrap(),
            "- sector = b\n"
        );
    }

    #[test]
    fn write_moves_a_renamed_document() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/foo.ad", "- sector = energy\n");
        let nodes = Manager::new(&NODE, context);

        let doc = nodes.fetch("foo").unwrap();
        doc.borrow_mut().set_key(Key::new("foo2").unwrap());
        nodes.write(&doc).unwrap();

        assert!(!dir.path().join("nodes/foo.ad").exists());
        assert!(dir.path().join("nodes/foo2.ad").is_file());
        assert!(nodes.get("foo").unwrap().is_none());
        assert_eq!(nodes.keys().unwrap(), vec![Key::new("foo2").unwrap()]);
        assert!(Rc::ptr_eq(&nodes.fetch("foo2").unwrap(), &doc));
    }

    #[test]
    fn write_rejects_a_second_instance_of_a_cached_key() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/coal.ad", "- sector = energy\n");
        let nodes = Manager::new(&NODE, context);

        let cached = nodes.fetch("coal").unwrap();
        let copy = Rc::new(RefCell::new(cached.borrow().clone()));
        copy.borrow_mut().set("sector", "other").unwrap();
        assert!(matches!(
            nodes.write(&copy),
            Err(FlatdocError::DuplicateKey { .. })
        ));
        assert!(Rc::ptr_eq(&nodes.fetch("coal").unwrap(), &cached));
        assert_eq!(
            fs::read_to_string(dir.path().join("nodes/coal.ad")).unwrap(),
            "- sector = energy\n"
        );
    }

    #[test]
    fn write_rejects_an_instance_from_before_clear() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/coal.ad", "- sector = one\n");
        let nodes = Manager::new(&NODE, context);

        let stale = nodes.fetch("coal").unwrap();
        nodes.clear();
        put(dir.path(), "nodes/coal.ad", "- sector = two\n");
        let fresh = nodes.fetch("coal").unwrap();

        assert!(matches!(
            nodes.write(&stale),
            Err(FlatdocError::DuplicateKey { .. })
        ));
        assert_eq!(
            fs::read_to_string(dir.path().join("nodes/coal.ad")).unwrap(),
            "- sector = two\n"
        );
        nodes.write(&fresh).unwrap();
    }

    #[test]
    fn delete_path_forgets_the_key() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/sub/coal.ad", "");
        put(dir.path(), "nodes/gas.ad", "");
        let nodes = Manager::new(&NODE, context);
        let coal = nodes.fetch("coal").unwrap();
        assert_eq!(nodes.all().unwrap().len(), 2);

        nodes
            .delete_path(&dir.path().join("nodes/sub/coal.ad"))
            .unwrap();
        assert!(!dir.path().join("nodes/sub/coal.ad").exists());
        assert!(!nodes.contains_key("coal").unwrap());
        assert!(nodes.get("coal").unwrap().is_none());
        assert_eq!(nodes.all().unwrap().len(), 1);
        assert!(!Rc::ptr_eq(&nodes.all().unwrap()[0], &coal));
    }

    #[test]
    fn delete_path_refuses_files_outside_the_type_directory() {
        let (dir, context) = setup();
        let outside = TempDir::new().unwrap();
        put(outside.path(), "precious.ad", "- sector = keep\n");
        put(dir.path(), "edges/a.ad", "");
        put(dir.path(), "nodes/notes.txt", "");
        let nodes = Manager::new(&NODE, context);

        for path in [
            outside.path().join("precious.ad"),
            dir.path().join("edges/a.ad"),
            dir.path().join("nodes/../edges/a.ad"),
            dir.path().join("nodes/notes.txt"),
        ] {
            assert!(
                matches!(
                    nodes.delete_path(&path),
                    Err(FlatdocError::IllegalDirectory { .. })
                ),
                "{} was accepted",
                path.display()
            );
        }
        assert!(outside.path().join("precious.ad").is_file());
        assert!(dir.path().join("edges/a.ad").is_file());
        assert!(dir.path().join("nodes/notes.txt").is_file());
    }

    #[test]
    fn all_is_maintained_incrementally() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/b.ad", "");
        put(dir.path(), "nodes/d.ad", "");
        let nodes = Manager::new(&NODE, context);

        // Loaded and written before `all` is materialized.
        let c = nodes.new_document("c", None).unwrap();
        nodes.write(&c).unwrap();
        let keys = |docs: Vec<DocumentRef>| -> Vec<String> {
            docs.iter().map(|d| d.borrow().key().to_string()).collect()
        };
        assert_eq!(keys(nodes.all().unwrap()), vec!["b", "c", "d"]);

        let a = nodes.new_document("a", None).unwrap();
        nodes.write(&a).unwrap();
        nodes.write(&a).unwrap();
        assert_eq!(keys(nodes.all().unwrap()), vec!["a", "b", "c", "d"]);

        let b = nodes.fetch("b").unwrap();
        nodes.delete(&b).unwrap();
        assert_eq!(keys(nodes.all().unwrap()), vec!["a", "c", "d"]);
        assert!(b.borrow().is_new());
    }

    #[test]
    fn clear_forgets_instances() {
        let (dir, context) = setup();
        put(dir.path(), "nodes/coal.ad", "- sector = one\n");
        let nodes = Manager::new(&NODE, context);

        let before = nodes.fetch("coal").unwrap();
        put(dir.path(), "nodes/coal.ad", "- sector = two\n");
        assert_eq!(before.borrow().get("sector"), Some(&Value::from("one")));

        nodes.clear();
        let after = nodes.fetch("coal").unwrap();
        assert!(!Rc::ptr_eq(&before, &after));
        assert_eq!(after.borrow().get("sector"), Some(&Value::from("two")));
    }

    #[test]
    fn write_rejects_documents_of_another_type() {
        let (_dir, context) = setup();
        let nodes = Manager::new(&NODE, context.clone());
        let edges = Manager::new(&EDGE, context);
        let edge = edges.new_document("e", None).unwrap();
        assert!(matches!(
            nodes.write(&edge),
            Err(FlatdocError::UnknownDocumentType(_))
        ));
    }
}
