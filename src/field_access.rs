//! Safe nested-field access for provider responses.
//!
//! Provider payloads are loosely shaped: arrays may be empty, objects may be null,
//! numbers sometimes arrive as strings. A [`FieldPath`] is parsed once from an
//! expression such as `property[0].address.line1` (or `property.0.address.line1`)
//! and resolved against any `serde_json::Value` without panicking.

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    /// An index too large for `usize`; never resolves.
    Unreachable(String),
}

impl Segment {
    fn index(digits: &str) -> Self {
        digits
            .parse()
            .map(Segment::Index)
            .unwrap_or_else(|_| Segment::Unreachable(digits.to_string()))
    }
}

/// A parsed dotted/bracketed path into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

fn segment_regex() -> &'static Regex {
    static SEGMENT: OnceLock<Regex> = OnceLock::new();
    SEGMENT.get_or_init(|| {
        Regex::new(r"\[(\d+)\]|([^.\[\]]+)").expect("segment pattern is a valid regex")
    })
}

impl FieldPath {
    /// Parses a path expression. Empty segments (`a..b`) are ignored.
    pub fn parse(expr: &str) -> Self {
        let segments = segment_regex()
            .captures_iter(expr)
            .filter_map(|caps| {
                if let Some(index) = caps.get(1) {
                    return Some(Segment::index(index.as_str()));
                }
                let key = caps.get(2)?.as_str();
                // `property.0.address` is the same path as `property[0].address`
                if key.bytes().all(|b| b.is_ascii_digit()) {
                    Some(Segment::index(key))
                } else {
                    Some(Segment::Key(key.to_string()))
                }
            })
            .collect();

        Self { segments }
    }

    /// Walks the path. Returns `None` if any step is missing, out of bounds,
    /// applied to a scalar, or if the final value is null.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => map.get(key)?,
                (Segment::Index(i), Value::Array(items)) => items.get(*i)?,
                _ => return None,
            };
        }

        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{}", key)?,
                Segment::Key(key) => write!(f, ".{}", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
                Segment::Unreachable(digits) => write!(f, "[{}]", digits)?,
            }
        }
        Ok(())
    }
}

/// Returns the value at `expr`, or `default` when the path cannot be resolved.
pub fn lookup_or<'a>(root: &'a Value, expr: &str, default: &'a Value) -> &'a Value {
    FieldPath::parse(expr).resolve(root).unwrap_or(default)
}

/// String value at `expr`. Numbers are rendered as strings; blank strings are absent.
pub fn text(root: &Value, expr: &str) -> Option<String> {
    as_text(FieldPath::parse(expr).resolve(root)?)
}

pub(crate) fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let cleaned = clean_numeric(s);
            cleaned.parse::<i64>().ok().or_else(|| {
                cleaned
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

pub(crate) fn as_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => clean_numeric(s).parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

pub(crate) fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn clean_numeric(s: &str) -> String {
    s.trim().chars().filter(|c| *c != '$' && *c != ',').collect()
}
