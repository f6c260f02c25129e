use super::parse::dedent;
use super::ParsedDocument;
use crate::error::ParseError;
use crate::model::{AttributeMap, Value};
use once_cell::sync::Lazy;
use regex::Regex;

static KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]*(?:\.[a-z0-9_]+)*$").expect("valid regex")
});

/// Writes a document back to text.
///
/// Layout is comments, a blank line, the static attributes (nested maps
/// flattened to dotted keys), then one block per query. Empty strings and
/// empty maps are skipped; an empty list is written as `[]` so that it
/// survives a round trip.
pub fn serialize(doc: &ParsedDocument) -> Result<String, ParseError> {
    let mut sections = Vec::new();

    if let Some(comments) = doc.comments.as_deref() {
        let block = comments
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    "#".to_string()
                } else {
                    format!("# {}", line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(block);
    }

    let mut statics = Vec::new();
    flatten(&doc.attributes, "", &mut statics)?;
    if !statics.is_empty() {
        sections.push(statics.join("\n"));
    }

    for (key, source) in &doc.queries {
        sections.push(query_block(key, source)?);
    }

    if sections.is_empty() {
        return Ok(String::new());
    }
    let mut out = sections.join("\n\n");
    out.push('\n');
    Ok(out)
}

fn flatten(map: &AttributeMap, prefix: &str, out: &mut Vec<String>) -> Result<(), ParseError> {
    for (name, value) in map {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        match value {
            Value::Map(inner) => flatten(inner, &key, out)?,
            Value::Str(s) if s.is_empty() => {}
            _ => {
                check_key(&key)?;
                out.push(format!("- {} = {}", key, format_scalar(&key, value)?));
            }
        }
    }
    Ok(())
}

fn query_block(key: &str, source: &str) -> Result<String, ParseError> {
    check_key(key)?;
    let lines: Vec<String> = source.lines().map(str::to_string).collect();
    if lines.iter().any(|l| l.trim().is_empty()) {
        return Err(unserializable(key, "query contains a blank line"));
    }

    let body = dedent(&lines);
    let mut block = format!("~ {} =", key);
    for line in body.lines() {
        block.push_str("\n  ");
        block.push_str(line);
    }
    Ok(block)
}

/// Renders a scalar (or list of scalars) so that it parses back to the same
/// value.
pub fn format_scalar(key: &str, value: &Value) -> Result<String, ParseError> {
    match value {
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) if f.is_finite() => Ok(format!("{:?}", f)),
        Value::Float(_) => Err(unserializable(key, "not a finite number")),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Str(s) => {
            check_string(key, s)?;
            Ok(s.clone())
        }
        Value::List(items) if items.is_empty() => Ok("[]".to_string()),
        Value::List(items) => {
            let rendered = items
                .iter()
                .map(|item| match item {
                    Value::List(_) | Value::Map(_) => {
                        Err(unserializable(key, "lists may only hold scalars"))
                    }
                    Value::Str(s) if s.contains([',', '[', ']']) => {
                        Err(unserializable(key, "list items may not contain , [ or ]"))
                    }
                    other => format_scalar(key, other),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("[ {} ]", rendered.join(", ")))
        }
        Value::Map(_) => Err(unserializable(key, "nested attributes are not a scalar")),
    }
}

fn check_string(key: &str, s: &str) -> Result<(), ParseError> {
    if s.is_empty() {
        Err(unserializable(key, "empty string"))
    } else if s.contains('\n') {
        Err(unserializable(key, "contains a line break"))
    } else if s.trim() != s {
        Err(unserializable(key, "has leading or trailing whitespace"))
    } else if s.starts_with('[') {
        Err(unserializable(key, "starts with ["))
    } else {
        Ok(())
    }
}

fn check_key(key: &str) -> Result<(), ParseError> {
    if KEY.is_match(key) {
        Ok(())
    } else {
        Err(unserializable(key, "not a valid attribute name"))
    }
}

fn unserializable(key: &str, reason: &str) -> ParseError {
    ParseError::Unserializable {
        attribute: key.to_string(),
        reason: reason.to_string(),
    }
}
