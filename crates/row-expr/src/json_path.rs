//! JSON path expressions: `$`, `.key`, `."quoted key"`, `[n]`.

use crate::error::BindError;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Leg {
    Key(String),
    Index(usize),
}

/// A compiled JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    text: String,
    legs: Vec<Leg>,
}

impl JsonPath {
    pub fn parse(text: &str) -> Result<Self, BindError> {
        let invalid = |reason| BindError::InvalidJsonPath {
            path: text.to_string(),
            reason,
        };
        let trimmed = text.trim();
        let mut rest = trimmed
            .strip_prefix('$')
            .ok_or_else(|| invalid("path must start with '$'"))?;

        let mut legs = Vec::new();
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            if let Some(after) = rest.strip_prefix('.') {
                let after = after.trim_start();
                if let Some(quoted) = after.strip_prefix('"') {
                    let (key, tail) = read_quoted_key(quoted).ok_or_else(|| invalid("unterminated quoted key"))?;
                    legs.push(Leg::Key(key));
                    rest = tail;
                } else {
                    let end = after
                        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
                        .unwrap_or(after.len());
                    if end == 0 {
                        return Err(if after.starts_with('*') {
                            invalid("wildcards are not supported")
                        } else {
                            invalid("empty member name")
                        });
                    }
                    legs.push(Leg::Key(after[..end].to_string()));
                    rest = &after[end..];
                }
            } else if let Some(after) = rest.strip_prefix('[') {
                let close = after.find(']').ok_or_else(|| invalid("unterminated array index"))?;
                let index = after[..close].trim();
                if index == "*" {
                    return Err(invalid("wildcards are not supported"));
                }
                let index = index
                    .parse()
                    .map_err(|_| invalid("array index must be a non-negative integer"))?;
                legs.push(Leg::Index(index));
                rest = &after[close + 1..];
            } else if rest.starts_with("**") {
                return Err(invalid("wildcards are not supported"));
            } else {
                return Err(invalid("expected '.' or '['"));
            }
        }

        Ok(Self {
            text: trimmed.to_string(),
            legs,
        })
    }

    /// Follow the path. A non-array value acts as a one-element array.
    pub fn extract<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.legs.iter().try_fold(doc, |value, leg| match (leg, value) {
            (Leg::Key(key), Value::Object(map)) => map.get(key),
            (Leg::Index(i), Value::Array(items)) => items.get(*i),
            (Leg::Index(0), other) => Some(other),
            _ => None,
        })
    }
}

fn read_quoted_key(s: &str) -> Option<(String, &str)> {
    let mut key = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((key, &s[i + 1..])),
            '\\' => key.push(chars.next()?.1),
            _ => key.push(c),
        }
    }
    None
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
