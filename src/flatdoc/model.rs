use crate::codec::{self, ParsedDocument};
use crate::error::{FlatdocError, Result};
use crate::schema::{DocumentType, Schema, Variant};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::borrow::Borrow;
use std::cell::RefCell;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

/// Ordered attribute map, as read from (and written to) a document.
pub type AttributeMap = IndexMap<String, Value>;

/// Ordered map of formula sources, keyed by attribute name.
pub type QueryMap = IndexMap<String, String>;

/// Shared handle to a cached document. The manager hands out clones of the
/// same `Rc`, so `Rc::ptr_eq` is the identity check.
pub type DocumentRef = Rc<RefCell<Document>>;

/// The unique identifier of a document within its type, derived from the
/// first dot-separated segment of the filename.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Arc<str>);

impl Key {
    /// Validates and wraps a key. Keys become filenames, so they may not be
    /// empty or contain separators, dots or whitespace.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        let valid = !raw.is_empty()
            && !raw
                .chars()
                .any(|c| c == '/' || c == '\\' || c == '.' || c.is_whitespace());
        if !valid {
            return Err(FlatdocError::InvalidKey(raw.to_string()));
        }
        Ok(Key(Arc::from(raw)))
    }

    /// Derives the key from a document filename: `key.suffix.ext` → `key`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FlatdocError::InvalidKey(path.display().to_string()))?;
        Key::new(name.split('.').next().unwrap_or(""))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<Value>),
    Map(AttributeMap),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&AttributeMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// True for values that carry nothing and are left out of serialized
    /// documents: empty strings, lists and maps.
    pub fn is_unset(&self) -> bool {
        match self {
            Value::Str(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// A persisted (or about to be persisted) record.
///
/// Documents are created either in memory with [`Document::new`] (no backing
/// file yet) or by a manager loading a file. The manager tracks the key a
/// document was loaded under, so changing the key with [`Document::set_key`]
/// is a rename on the next save.
#[derive(Debug, Clone)]
pub struct Document {
    key: Key,
    doc_type: &'static DocumentType,
    variant: Option<&'static Variant>,
    attributes: AttributeMap,
    comments: Option<String>,
    queries: QueryMap,
    path: Option<PathBuf>,
    saved_key: Option<Key>,
    subdirectory: Option<PathBuf>,
}

impl Document {
    /// A new, unsaved document holding the schema defaults.
    pub fn new(doc_type: &'static DocumentType, key: Key) -> Self {
        Self {
            key,
            doc_type,
            variant: None,
            attributes: doc_type.schema.defaults(),
            comments: None,
            queries: QueryMap::new(),
            path: None,
            saved_key: None,
            subdirectory: None,
        }
    }

    /// Selects a variant by suffix, resetting attributes to that variant's
    /// defaults. Only meaningful before any attribute has been set.
    pub fn with_variant(mut self, suffix: &str) -> Result<Self> {
        let variant =
            self.doc_type
                .variant(suffix)
                .ok_or_else(|| FlatdocError::NoSuchDocumentClass {
                    suffix: suffix.to_string(),
                    path: PathBuf::from(self.doc_type.file_name(self.key.as_str(), None)),
                })?;
        self.variant = Some(variant);
        self.attributes = variant.schema.defaults();
        Ok(self)
    }

    /// Builds a document from parsed text, coercing every attribute to the
    /// schema's declared kind.
    pub(crate) fn from_parsed(
        doc_type: &'static DocumentType,
        variant: Option<&'static Variant>,
        key: Key,
        path: PathBuf,
        parsed: ParsedDocument,
    ) -> Result<Self> {
        let schema = doc_type.schema_for(variant);
        let mut attributes = schema.defaults();
        for (name, value) in parsed.attributes {
            let value = coerce_attribute(schema, &key, &name, value)?;
            attributes.insert(name, value);
        }

        Ok(Self {
            saved_key: Some(key.clone()),
            key,
            doc_type,
            variant,
            attributes: order_by_schema(schema, attributes),
            comments: parsed.comments,
            queries: parsed.queries,
            path: Some(path),
            subdirectory: None,
        })
    }

    /// The codec view of this document. Unset values are dropped here so the
    /// serializer never sees them.
    pub fn to_parsed(&self) -> ParsedDocument {
        ParsedDocument {
            comments: self.comments.clone().filter(|c| !c.is_empty()),
            attributes: self
                .attributes
                .iter()
                .filter(|(_, v)| !v.is_unset())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            queries: self.queries.clone(),
        }
    }

    /// Canonical file contents, newline-terminated.
    pub fn to_text(&self) -> Result<String> {
        let mut text =
            codec::serialize(&self.to_parsed()).map_err(|source| FlatdocError::Serialize {
                key: self.key.clone(),
                source,
            })?;
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Changes the key. The file is renamed when the document is next saved.
    pub fn set_key(&mut self, key: Key) {
        self.key = key;
    }

    /// The key the document was loaded or last written under, if any.
    pub fn saved_key(&self) -> Option<&Key> {
        self.saved_key.as_ref()
    }

    pub fn is_renamed(&self) -> bool {
        matches!(&self.saved_key, Some(saved) if *saved != self.key)
    }

    pub fn doc_type(&self) -> &'static DocumentType {
        self.doc_type
    }

    pub fn variant(&self) -> Option<&'static Variant> {
        self.variant
    }

    pub fn schema(&self) -> &'static Schema {
        self.doc_type.schema_for(self.variant)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_new(&self) -> bool {
        self.path.is_none()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Sets an attribute, coercing it to the schema's declared kind.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = coerce_attribute(self.schema(), &self.key, name, value.into())?;
        self.attributes.insert(name.to_string(), value);
        self.attributes = order_by_schema(self.schema(), std::mem::take(&mut self.attributes));
        Ok(())
    }

    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.attributes.shift_remove(name)
    }

    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    pub fn set_comments(&mut self, comments: Option<String>) {
        self.comments = comments;
    }

    pub fn queries(&self) -> &QueryMap {
        &self.queries
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(String::as_str)
    }

    pub fn set_query(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.queries.insert(name.into(), source.into());
    }

    pub fn remove_query(&mut self, name: &str) -> Option<String> {
        self.queries.shift_remove(name)
    }

    /// Places a new document in a subdirectory of its type's directory.
    /// Must be relative and stay below the base; checked when written.
    pub fn set_subdirectory(&mut self, dir: impl Into<PathBuf>) {
        self.subdirectory = Some(dir.into());
    }

    pub(crate) fn subdirectory(&self) -> Option<&Path> {
        self.subdirectory.as_deref()
    }

    /// Records that the document now lives at `path` under its current key.
    pub(crate) fn mark_saved(&mut self, path: PathBuf) {
        self.path = Some(path);
        self.saved_key = Some(self.key.clone());
        self.subdirectory = None;
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.path = None;
        self.saved_key = None;
    }

    /// Filename for the current key and variant.
    pub fn file_name(&self) -> String {
        self.doc_type.file_name(self.key.as_str(), self.variant)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("key", &self.key)?;
        map.serialize_entry("type", self.doc_type.name)?;
        if let Some(variant) = self.variant {
            map.serialize_entry("variant", variant.suffix)?;
        }
        if let Some(comments) = &self.comments {
            map.serialize_entry("comments", comments)?;
        }
        map.serialize_entry("attributes", &self.attributes)?;
        map.serialize_entry("queries", &self.queries)?;
        map.end()
    }
}

fn coerce_attribute(schema: &Schema, key: &Key, name: &str, value: Value) -> Result<Value> {
    let field = schema
        .field(name)
        .ok_or_else(|| FlatdocError::UnknownAttribute {
            key: key.clone(),
            attribute: name.to_string(),
        })?;
    field
        .kind
        .coerce(value)
        .ok_or_else(|| FlatdocError::InvalidAttribute {
            key: key.clone(),
            attribute: name.to_string(),
            expected: field.kind.describe(),
        })
}

fn order_by_schema(schema: &Schema, mut attributes: AttributeMap) -> AttributeMap {
    let mut ordered = AttributeMap::with_capacity(attributes.len());
    for field in schema.all_fields() {
        if let Some(value) = attributes.shift_remove(field.name) {
            ordered.insert(field.name.to_string(), value);
        }
    }
    ordered
}

/// Checks that `dir` is a relative path that stays below its base.
pub(crate) fn is_contained(dir: &Path) -> bool {
    let mut depth: usize = 0;
    for component in dir.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}
