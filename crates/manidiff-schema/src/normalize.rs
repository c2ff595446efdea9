use crate::path::FieldPath;
use serde_yaml::{Mapping, Value};

/// Canonicalize a manifest tree so that style and server-filled noise does
/// not show up as a difference.
///
/// Removes every field in `strip`, drops null values and containers left
/// empty, and sorts mapping keys. The top-level value is never dropped.
pub fn normalize_body(body: &mut Value, strip: &[FieldPath]) {
    for path in strip {
        path.remove_from(body);
    }
    prune(body);
    sort_keys(body);
}

fn prune(value: &mut Value) {
    match value {
        Value::Mapping(map) => {
            let entries = std::mem::take(map);
            *map = entries
                .into_iter()
                .filter_map(|(k, mut v)| {
                    prune(&mut v);
                    (!is_vacant(&v)).then_some((k, v))
                })
                .collect();
        }
        Value::Sequence(seq) => {
            for item in seq.iter_mut() {
                prune(item);
            }
        }
        Value::Tagged(tagged) => prune(&mut tagged.value),
        _ => {}
    }
}

// Sequence items are kept even when empty; position is meaningful there.
fn is_vacant(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Mapping(map) => map.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        _ => false,
    }
}

fn sort_keys(value: &mut Value) {
    match value {
        Value::Mapping(map) => {
            let mut entries: Vec<(Value, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| sort_label(a).cmp(&sort_label(b)));
            for (_, v) in &mut entries {
                sort_keys(v);
            }
            *map = entries.into_iter().collect::<Mapping>();
        }
        Value::Sequence(seq) => {
            for item in seq.iter_mut() {
                sort_keys(item);
            }
        }
        Value::Tagged(tagged) => sort_keys(&mut tagged.value),
        _ => {}
    }
}

fn sort_label(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    }
}
