use super::ParsedDocument;
use crate::error::ParseError;
use crate::model::{AttributeMap, QueryMap, Value};
use once_cell::sync::Lazy;
use regex::Regex;

static STATIC_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-\s+([a-z_][a-z0-9_]*(?:\.[a-z0-9_]+)*)\s*=(.*)$").expect("valid regex")
});

static MULTILINE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^~\s+([a-z_][a-z0-9_]*(?:\.[a-z0-9_]+)*)\s*=\s*$").expect("valid regex")
});

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid regex"));

static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid regex")
});

/// Blocks under construction while scanning lines.
enum Block {
    Comment(Vec<String>),
    Multiline { key: String, lines: Vec<String> },
}

#[derive(Default)]
struct Builder {
    comment_runs: Vec<String>,
    attributes: AttributeMap,
    queries: QueryMap,
}

impl Builder {
    fn flush(&mut self, block: Option<Block>) {
        match block {
            Some(Block::Comment(lines)) => self.comment_runs.push(lines.join("\n")),
            Some(Block::Multiline { key, lines }) => {
                self.queries.insert(key, dedent(&lines));
            }
            None => {}
        }
    }

    fn finish(self) -> ParsedDocument {
        let comments = if self.comment_runs.is_empty() {
            None
        } else {
            Some(self.comment_runs.join("\n\n"))
        };
        ParsedDocument {
            comments,
            attributes: self.attributes,
            queries: self.queries,
        }
    }
}

/// Parses document text into comments, attributes and queries.
pub fn parse(text: &str) -> Result<ParsedDocument, ParseError> {
    let mut builder = Builder::default();
    let mut current: Option<Block> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if line.trim().is_empty() {
            builder.flush(current.take());
            continue;
        }

        if let Some(Block::Multiline { lines, .. }) = current.as_mut() {
            if let Some(body) = strip_indent(line) {
                lines.push(body.to_string());
                continue;
            }
        }

        if line.starts_with('#') {
            let content = comment_content(line).ok_or_else(|| ParseError::CannotIdentify {
                line_no,
                line: line.to_string(),
            })?;
            match current.as_mut() {
                Some(Block::Comment(lines)) => lines.push(content.to_string()),
                _ => {
                    builder.flush(current.take());
                    current = Some(Block::Comment(vec![content.to_string()]));
                }
            }
            continue;
        }

        builder.flush(current.take());

        if line.starts_with('~') {
            let caps = MULTILINE_HEADER.captures(line).ok_or_else(|| {
                ParseError::InvalidMultilineBlock {
                    line_no,
                    line: line.to_string(),
                }
            })?;
            current = Some(Block::Multiline {
                key: caps[1].to_string(),
                lines: Vec::new(),
            });
        } else if let Some(caps) = STATIC_LINE.captures(line) {
            let value = parse_scalar(&caps[2]).map_err(|reason| ParseError::CannotParse {
                line_no,
                line: line.to_string(),
                reason,
            })?;
            let path: Vec<&str> = caps[1].split('.').collect();
            insert_nested(&mut builder.attributes, &path, value);
        } else {
            return Err(ParseError::CannotIdentify {
                line_no,
                line: line.to_string(),
            });
        }
    }

    builder.flush(current.take());
    Ok(builder.finish())
}

/// Parses the right-hand side of a static attribute line.
///
/// `[a, b]` is a list of scalars; otherwise the text is tried as an integer,
/// then as a float, and kept as a string if neither fits.
pub fn parse_scalar(raw: &str) -> Result<Value, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("missing value".to_string());
    }

    if let Some(rest) = raw.strip_prefix('[') {
        let inner = rest
            .strip_suffix(']')
            .ok_or_else(|| "unterminated list".to_string())?;
        if inner.trim().is_empty() {
            return Ok(Value::List(Vec::new()));
        }
        return inner
            .split(',')
            .map(|item| {
                let item = item.trim();
                if item.is_empty() {
                    Err("empty list item".to_string())
                } else {
                    Ok(parse_atom(item))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List);
    }

    Ok(parse_atom(raw))
}

fn parse_atom(text: &str) -> Value {
    if INTEGER.is_match(text) {
        if let Ok(i) = text.parse::<i64>() {
            return Value::Int(i);
        }
    }
    if FLOAT.is_match(text) {
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::Str(text.to_string())
}

fn comment_content(line: &str) -> Option<&str> {
    if line == "#" {
        Some("")
    } else {
        line.strip_prefix("# ")
    }
}

fn strip_indent(line: &str) -> Option<&str> {
    line.strip_prefix("  ").or_else(|| line.strip_prefix('\t'))
}

fn insert_nested(map: &mut AttributeMap, path: &[&str], value: Value) {
    match path {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [first, rest @ ..] => {
            let entry = map
                .entry((*first).to_string())
                .or_insert_with(|| Value::Map(AttributeMap::new()));
            if !matches!(entry, Value::Map(_)) {
                *entry = Value::Map(AttributeMap::new());
            }
            if let Value::Map(inner) = entry {
                insert_nested(inner, rest, value);
            }
        }
    }
}

/// Removes the whitespace common to every non-blank line and trims the end.
pub(super) fn dedent(lines: &[String]) -> String {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| l.get(indent..).unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}
