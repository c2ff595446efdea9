//! Field paths into a manifest tree.
//!
//! Syntax: dot-separated mapping keys (`spec.replicas`), bracketed keys for
//! names containing dots (`metadata.labels["helm.sh/chart"]`), numeric
//! indices for sequences (`spec.containers[0]`), and `*` / `[*]` to match
//! every child of a mapping or sequence. A leading `.` is accepted.

use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field path '{path}': {reason}")]
pub struct PathError {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let raw = input.trim();
        let body = raw.strip_prefix('.').unwrap_or(raw);
        let segments = parse_segments(body).map_err(|reason| PathError {
            path: raw.to_owned(),
            reason,
        })?;
        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Remove every value matching this path. Returns whether anything was removed.
    pub fn remove_from(&self, value: &mut Value) -> bool {
        remove_at(value, &self.segments)
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_segments(path: &str) -> Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut key = String::new();
    let mut after_bracket = false;
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if key.is_empty() && !after_bracket {
                    return Err("empty segment".to_owned());
                }
                if !key.is_empty() {
                    segments.push(key_segment(std::mem::take(&mut key)));
                }
                if chars.peek().is_none() {
                    return Err("trailing '.'".to_owned());
                }
                after_bracket = false;
            }
            '[' => {
                if !key.is_empty() {
                    segments.push(key_segment(std::mem::take(&mut key)));
                }
                let mut inner = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }
                if !closed {
                    return Err("unclosed '['".to_owned());
                }
                segments.push(bracket_segment(&inner)?);
                after_bracket = true;
            }
            _ => {
                if after_bracket {
                    return Err(format!("unexpected '{c}' after ']'"));
                }
                key.push(c);
            }
        }
    }

    if !key.is_empty() {
        segments.push(key_segment(key));
    }
    if segments.is_empty() {
        return Err("empty path".to_owned());
    }
    Ok(segments)
}

fn key_segment(key: String) -> Segment {
    if key == "*" {
        Segment::Any
    } else {
        Segment::Key(key)
    }
}

fn bracket_segment(inner: &str) -> Result<Segment, String> {
    let inner = inner.trim();
    if inner.is_empty() {
        return Err("empty brackets".to_owned());
    }
    if inner == "*" {
        return Ok(Segment::Any);
    }
    for quote in ['"', '\''] {
        if inner.len() >= 2 && inner.starts_with(quote) && inner.ends_with(quote) {
            return Ok(Segment::Key(inner[1..inner.len() - 1].to_owned()));
        }
    }
    if inner.bytes().all(|b| b.is_ascii_digit()) {
        return inner
            .parse()
            .map(Segment::Index)
            .map_err(|e| format!("bad index '{inner}': {e}"));
    }
    Ok(Segment::Key(inner.to_owned()))
}

fn remove_at(value: &mut Value, segments: &[Segment]) -> bool {
    let Some((head, rest)) = segments.split_first() else {
        return false;
    };
    if rest.is_empty() {
        return remove_child(value, head);
    }
    match head {
        Segment::Key(k) => value
            .get_mut(k.as_str())
            .is_some_and(|child| remove_at(child, rest)),
        Segment::Index(i) => value
            .as_sequence_mut()
            .and_then(|seq| seq.get_mut(*i))
            .is_some_and(|child| remove_at(child, rest)),
        Segment::Any => match value {
            Value::Mapping(map) => map
                .values_mut()
                .fold(false, |removed, child| remove_at(child, rest) || removed),
            Value::Sequence(seq) => seq
                .iter_mut()
                .fold(false, |removed, child| remove_at(child, rest) || removed),
            _ => false,
        },
    }
}

fn remove_child(value: &mut Value, segment: &Segment) -> bool {
    match (value, segment) {
        (Value::Mapping(map), Segment::Key(k)) => map.shift_remove(k.as_str()).is_some(),
        (Value::Sequence(seq), Segment::Index(i)) if *i < seq.len() => {
            seq.remove(*i);
            true
        }
        (Value::Mapping(map), Segment::Any) => {
            let removed = !map.is_empty();
            map.clear();
            removed
        }
        (Value::Sequence(seq), Segment::Any) => {
            let removed = !seq.is_empty();
            seq.clear();
            removed
        }
        _ => false,
    }
}
