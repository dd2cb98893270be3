use crate::FieldValue;

/// Partial structural match of document values.
///
/// Objects match when every key of `needle` is present and matches recursively, lists match
/// when every element of `needle` is matched by some element of `haystack`, scalars must be equal.
pub fn contains_structure(haystack: &FieldValue, needle: &FieldValue) -> bool {
    match (haystack, needle) {
        (FieldValue::Object(hay), FieldValue::Object(needle)) => needle
            .iter()
            .all(|(k, v)| hay.get(k).map(|h| contains_structure(h, v)).unwrap_or(false)),
        (FieldValue::List(hay), FieldValue::List(needle)) => {
            needle.iter().all(|n| hay.iter().any(|h| contains_structure(h, n)))
        }
        (FieldValue::List(hay), scalar) => hay.iter().any(|h| h == scalar),
        (a, b) => a == b,
    }
}

/// Deep merge of `incoming` into `existing`. Objects merge key by key, anything else (lists
/// included) is overridden by the incoming value.
pub fn deep_merge(existing: FieldValue, incoming: FieldValue) -> FieldValue {
    match (existing, incoming) {
        (FieldValue::Object(mut existing), FieldValue::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => {
                        let old = std::mem::replace(slot, FieldValue::Null);
                        *slot = deep_merge(old, value);
                    }
                    None => {
                        existing.insert(key, value);
                    }
                }
            }

            FieldValue::Object(existing)
        }
        (_, incoming) => incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn contains_matches_partial_objects() {
        let doc = FieldValue::from(json!({ "friend": { "id": 1, "name": "ann" }, "tags": ["a", "b"] }));

        assert!(contains_structure(&doc, &FieldValue::from(json!({ "friend": { "id": 1 } }))));
        assert!(contains_structure(&doc, &FieldValue::from(json!({ "tags": ["b"] }))));
        assert!(!contains_structure(&doc, &FieldValue::from(json!({ "friend": { "id": 2 } }))));
        assert!(!contains_structure(&doc, &FieldValue::from(json!({ "missing": 1 }))));
    }

    #[test]
    fn merge_overrides_lists_and_merges_maps() {
        let existing = FieldValue::from(json!({ "a": { "x": 1, "y": 2 }, "l": [1, 2], "k": "old" }));
        let incoming = FieldValue::from(json!({ "a": { "y": 3 }, "l": [9] }));

        let merged = deep_merge(existing, incoming);

        assert_eq!(
            serde_json::Value::from(merged),
            json!({ "a": { "x": 1, "y": 3 }, "l": [9], "k": "old" })
        );
    }
}
