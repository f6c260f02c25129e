//! # Schemas
//!
//! Every record type is described once, statically, by a [`DocumentType`]:
//! where its files live, which extension they carry, which attributes they
//! may hold and which filename suffixes select a variant schema.
//!
//! ```text
//! nodes/
//! ├── coal_plant.converter.ad   # key `coal_plant`, variant `converter`
//! └── households.ad             # key `households`, base schema
//! ```
//!
//! Variant schemas extend their base through [`Schema::parent`], so a field
//! lookup walks up the chain. Values read from disk are coerced to the
//! declared [`FieldKind`]; see [`FieldKind::coerce`].

use crate::model::{AttributeMap, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Float,
    Bool,
    Str,
    List,
    Map,
}

impl FieldKind {
    pub fn describe(&self) -> &'static str {
        match self {
            FieldKind::Int => "an integer",
            FieldKind::Float => "a number",
            FieldKind::Bool => "true or false",
            FieldKind::Str => "a string",
            FieldKind::List => "a list",
            FieldKind::Map => "a set of nested attributes",
        }
    }

    /// Converts a parsed value into this kind, or returns `None` when the
    /// value has no sensible representation.
    ///
    /// - integers widen to floats, integral floats narrow to integers
    /// - the strings `true` and `false` become booleans
    /// - numbers become strings
    /// - a lone scalar becomes a one-element list
    pub fn coerce(&self, value: Value) -> Option<Value> {
        match (self, value) {
            (FieldKind::Int, Value::Int(i)) => Some(Value::Int(i)),
            (FieldKind::Int, Value::Float(f)) if f.fract() == 0.0 && f.is_finite() => {
                Some(Value::Int(f as i64))
            }
            (FieldKind::Float, Value::Float(f)) => Some(Value::Float(f)),
            (FieldKind::Float, Value::Int(i)) => Some(Value::Float(i as f64)),
            (FieldKind::Bool, Value::Bool(b)) => Some(Value::Bool(b)),
            (FieldKind::Bool, Value::Str(s)) => match s.as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (FieldKind::Str, Value::Str(s)) => Some(Value::Str(s)),
            (FieldKind::Str, Value::Int(i)) => Some(Value::Str(i.to_string())),
            (FieldKind::Str, Value::Float(f)) => Some(Value::Str(f.to_string())),
            (FieldKind::List, Value::List(items)) => Some(Value::List(items)),
            (FieldKind::List, Value::Map(_)) => None,
            (FieldKind::List, scalar) => Some(Value::List(vec![scalar])),
            (FieldKind::Map, Value::Map(map)) => Some(Value::Map(map)),
            _ => None,
        }
    }
}

/// Default value of a field, const-constructible so schemas can be statics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Unset,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'static str),
}

impl FieldDefault {
    pub fn to_value(&self) -> Option<Value> {
        match self {
            FieldDefault::Unset => None,
            FieldDefault::Bool(b) => Some(Value::Bool(*b)),
            FieldDefault::Int(i) => Some(Value::Int(*i)),
            FieldDefault::Float(f) => Some(Value::Float(*f)),
            FieldDefault::Str(s) => Some(Value::Str((*s).to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        // Booleans are never "unset": they serialize as `false`.
        let default = match kind {
            FieldKind::Bool => FieldDefault::Bool(false),
            _ => FieldDefault::Unset,
        };
        Self {
            name,
            kind,
            default,
        }
    }

    pub const fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }
}

#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
    pub parent: Option<&'static Schema>,
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.parent.and_then(|p| p.field(name)))
    }

    /// All fields, base schema first, in declaration order.
    pub fn all_fields(&self) -> Vec<&'static FieldSpec> {
        let mut fields = match self.parent {
            Some(parent) => parent.all_fields(),
            None => Vec::new(),
        };
        fields.extend(self.fields.iter());
        fields
    }

    /// Attribute map holding every field that has a default.
    pub fn defaults(&self) -> AttributeMap {
        self.all_fields()
            .into_iter()
            .filter_map(|f| f.default.to_value().map(|v| (f.name.to_string(), v)))
            .collect()
    }
}

#[derive(Debug)]
pub struct Variant {
    pub suffix: &'static str,
    pub schema: &'static Schema,
}

#[derive(Debug)]
pub struct DocumentType {
    pub name: &'static str,
    /// Directory below the data root holding this type's files.
    pub directory: &'static str,
    /// Extension without the leading dot.
    pub extension: &'static str,
    pub schema: &'static Schema,
    pub variants: &'static [Variant],
}

impl DocumentType {
    pub fn variant(&self, suffix: &str) -> Option<&'static Variant> {
        self.variants.iter().find(|v| v.suffix == suffix)
    }

    pub fn schema_for(&self, variant: Option<&Variant>) -> &'static Schema {
        match variant {
            Some(v) => v.schema,
            None => self.schema,
        }
    }

    /// Builds the filename for a key: `<key>[.<suffix>].<ext>`.
    pub fn file_name(&self, key: &str, variant: Option<&Variant>) -> String {
        match variant {
            Some(v) => format!("{}.{}.{}", key, v.suffix, self.extension),
            None => format!("{}.{}", key, self.extension),
        }
    }
}

impl PartialEq for DocumentType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
