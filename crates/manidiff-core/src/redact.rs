//! Secret handling.
//!
//! With redaction on, every value under `data` and `stringData` of a
//! Secret is replaced by a marker that reveals only its decoded length and
//! whether it changed. With redaction off, `data` is decoded so the plain
//! values take part in the diff.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

pub const SECRET_KIND: &str = "Secret";

const DATA: &str = "data";
const STRING_DATA: &str = "stringData";

const UNCHANGED_MARK: &str = "REDACTED";
const BEFORE_MARK: &str = "--------";
const AFTER_MARK: &str = "++++++++";

pub fn is_secret(kind: &str) -> bool {
    kind == SECRET_KIND
}

/// Replace Secret values on both sides with length markers.
///
/// A value identical on both sides becomes `REDACTED # (N bytes)`. Any other
/// value becomes `-------- # (N bytes)` before and `++++++++ # (N bytes)`
/// after. `stringData` is folded into `data`.
pub fn redact_secrets(before: Option<&mut Value>, after: Option<&mut Value>) {
    let before_values = before.as_deref().map(secret_values).unwrap_or_default();
    let after_values = after.as_deref().map(secret_values).unwrap_or_default();

    if let Some(body) = before {
        let marked = markers(&before_values, &after_values, BEFORE_MARK);
        write_markers(body, marked);
    }
    if let Some(body) = after {
        let marked = markers(&after_values, &before_values, AFTER_MARK);
        write_markers(body, marked);
    }
}

/// Decode base64 `data` into `stringData`. Values that are not valid UTF-8
/// once decoded stay encoded under `data`.
pub fn decode_secrets(body: &mut Value) {
    let Some(map) = body.as_mapping_mut() else {
        return;
    };
    let Some(data) = map.get(DATA).and_then(Value::as_mapping) else {
        return;
    };
    if data.is_empty() {
        return;
    }

    let mut plain = Mapping::new();
    let mut encoded = Mapping::new();
    for (key, value) in data {
        let decoded = STANDARD
            .decode(scalar_text(value).trim())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok());
        match decoded {
            Some(text) => {
                plain.insert(key.clone(), Value::from(text));
            }
            None => {
                encoded.insert(key.clone(), value.clone());
            }
        }
    }
    if let Some(existing) = map.get(STRING_DATA).and_then(Value::as_mapping) {
        for (key, value) in existing {
            encoded.shift_remove(key);
            plain.insert(key.clone(), value.clone());
        }
    }

    replace_sections(
        map,
        (!encoded.is_empty()).then_some(encoded),
        (!plain.is_empty()).then_some(plain),
    );
}

/// Decoded bytes per key, `data` first and `stringData` overriding.
fn secret_values(body: &Value) -> IndexMap<String, Vec<u8>> {
    let mut values = IndexMap::new();
    if let Some(data) = body.get(DATA).and_then(Value::as_mapping) {
        for (key, value) in data {
            let text = scalar_text(value);
            let bytes = STANDARD
                .decode(text.trim())
                .unwrap_or_else(|_| text.into_bytes());
            values.insert(key_text(key), bytes);
        }
    }
    if let Some(string_data) = body.get(STRING_DATA).and_then(Value::as_mapping) {
        for (key, value) in string_data {
            values.insert(key_text(key), scalar_text(value).into_bytes());
        }
    }
    values
}

fn markers(
    own: &IndexMap<String, Vec<u8>>,
    other: &IndexMap<String, Vec<u8>>,
    changed_mark: &str,
) -> Mapping {
    own.iter()
        .map(|(key, bytes)| {
            let mark = if other.get(key) == Some(bytes) {
                UNCHANGED_MARK
            } else {
                changed_mark
            };
            (
                Value::from(key.as_str()),
                Value::from(format!("{mark} # ({} bytes)", bytes.len())),
            )
        })
        .collect()
}

fn write_markers(body: &mut Value, markers: Mapping) {
    let Some(map) = body.as_mapping_mut() else {
        return;
    };
    if !map.contains_key(DATA) && !map.contains_key(STRING_DATA) {
        return;
    }
    replace_sections(map, Some(markers), None);
}

/// Swap the `data`/`stringData` entries for new ones at the position of
/// whichever came first, keeping every other key in place.
fn replace_sections(map: &mut Mapping, data: Option<Mapping>, string_data: Option<Mapping>) {
    let mut replacement = Some((data, string_data));
    let old = std::mem::take(map);
    for (key, value) in old {
        let is_section = matches!(key.as_str(), Some(DATA | STRING_DATA));
        if !is_section {
            map.insert(key, value);
            continue;
        }
        if let Some((data, string_data)) = replacement.take() {
            if let Some(data) = data {
                map.insert(Value::from(DATA), Value::Mapping(data));
            }
            if let Some(string_data) = string_data {
                map.insert(Value::from(STRING_DATA), Value::Mapping(string_data));
            }
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    }
}

fn key_text(key: &Value) -> String {
    key.as_str().map_or_else(|| scalar_text(key), str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(data: &str) -> Value {
        serde_yaml::from_str(&format!(
            "apiVersion: v1\nkind: Secret\nmetadata:\n  name: creds\n{data}type: Opaque\n"
        ))
        .unwrap()
    }

    fn data_entry<'a>(body: &'a Value, key: &str) -> &'a str {
        body.get(DATA).and_then(|d| d.get(key)).and_then(Value::as_str).unwrap()
    }

    #[test]
    fn identical_values_are_marked_redacted() {
        let mut before = secret("data:\n  password: c3VwZXJzZWNyZXQ=\n");
        let mut after = before.clone();
        redact_secrets(Some(&mut before), Some(&mut after));
        assert_eq!(data_entry(&before, "password"), "REDACTED # (11 bytes)");
        assert_eq!(before, after);
    }

    #[test]
    fn changed_values_get_side_markers() {
        let mut before = secret("data:\n  password: aGVsbG8=\n");
        let mut after = secret("data:\n  password: c3VwZXJzZWNyZXQ=\n");
        redact_secrets(Some(&mut before), Some(&mut after));
        assert_eq!(data_entry(&before, "password"), "-------- # (5 bytes)");
        assert_eq!(data_entry(&after, "password"), "++++++++ # (11 bytes)");
    }

    #[test]
    fn one_sided_secret_is_marked_changed() {
        let mut after = secret("data:\n  token: aGVsbG8=\n");
        redact_secrets(None, Some(&mut after));
        assert_eq!(data_entry(&after, "token"), "++++++++ # (5 bytes)");
    }

    #[test]
    fn string_data_is_folded_into_data() {
        let mut before = secret("data:\n  a: aGVsbG8=\nstringData:\n  b: plain\n");
        redact_secrets(Some(&mut before), None);
        assert!(before.get(STRING_DATA).is_none());
        assert_eq!(data_entry(&before, "a"), "-------- # (5 bytes)");
        assert_eq!(data_entry(&before, "b"), "-------- # (5 bytes)");
    }

    #[test]
    fn redaction_keeps_key_order() {
        let mut body = secret("data:\n  a: aGVsbG8=\n");
        redact_secrets(Some(&mut body), None);
        let keys: Vec<_> = body
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(keys, vec!["apiVersion", "kind", "metadata", "data", "type"]);
    }

    #[test]
    fn redacted_output_never_contains_plain_value() {
        let mut before = secret("stringData:\n  password: supersecret\n");
        let mut after = secret("stringData:\n  password: supersecret2\n");
        redact_secrets(Some(&mut before), Some(&mut after));
        let text = serde_yaml::to_string(&before).unwrap() + &serde_yaml::to_string(&after).unwrap();
        assert!(!text.contains("supersecret"));
    }

    #[test]
    fn decode_moves_data_to_string_data() {
        let mut body = secret("data:\n  password: c3VwZXJzZWNyZXQ=\n");
        decode_secrets(&mut body);
        assert!(body.get(DATA).is_none());
        assert_eq!(
            body.get(STRING_DATA).and_then(|d| d.get("password")),
            Some(&Value::from("supersecret"))
        );
    }

    #[test]
    fn decode_keeps_binary_values_encoded() {
        let mut body = secret("data:\n  key: //4=\n  text: aGVsbG8=\n");
        decode_secrets(&mut body);
        assert_eq!(data_entry(&body, "key"), "//4=");
        assert_eq!(
            body.get(STRING_DATA).and_then(|d| d.get("text")),
            Some(&Value::from("hello"))
        );
    }

    #[test]
    fn decode_lets_string_data_win() {
        let mut body = secret("data:\n  a: aGVsbG8=\nstringData:\n  a: override\n");
        decode_secrets(&mut body);
        assert_eq!(
            body.get(STRING_DATA).and_then(|d| d.get("a")),
            Some(&Value::from("override"))
        );
    }

    #[test]
    fn non_secret_shaped_bodies_are_untouched() {
        let original = secret("");
        let mut body = original.clone();
        redact_secrets(Some(&mut body), None);
        decode_secrets(&mut body);
        assert_eq!(body, original);
    }
}
