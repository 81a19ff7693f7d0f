//! Deep merge of a base document with its translation
//!
//! Records are merged key by key. Under an `"options"` key the base subtree
//! is kept as-is (raw option values drive logic) and the translated options
//! are exposed next to it as `"strings"` (labels for display).

use serde_json::{Map, Value};

/// Key whose base value is preserved verbatim
pub const OPTIONS_KEY: &str = "options";

/// Key that receives the translated options
pub const STRINGS_KEY: &str = "strings";

/// Merge `translation` into `base`
///
/// - no translation: `base` unchanged
/// - both records: recursive merge, translation-only keys added as-is
/// - a record on only one side: `base` (a malformed translation degrades
///   to base text)
/// - two leaves (strings, lists, numbers): the translated value
pub fn translate(base: &Value, translation: Option<&Value>) -> Value {
    let Some(translation) = translation else {
        return base.clone();
    };

    match (base, translation) {
        (Value::Object(base), Value::Object(translation)) => {
            Value::Object(merge_records(base, translation))
        }
        (Value::Object(_), _) | (_, Value::Object(_)) => base.clone(),
        _ => translation.clone(),
    }
}

fn merge_records(base: &Map<String, Value>, translation: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = Map::with_capacity(base.len());

    for (key, value) in base {
        if key == OPTIONS_KEY {
            merged.insert(key.clone(), value.clone());
            if let Some(strings) = translation.get(OPTIONS_KEY) {
                merged.insert(STRINGS_KEY.to_string(), strings.clone());
            }
        } else {
            merged.insert(key.clone(), translate(value, translation.get(key)));
        }
    }

    for (key, value) in translation {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_records_union() {
        let merged = translate(&json!({"a": {"x": 1}}), Some(&json!({"a": {"y": 2}})));
        assert_eq!(merged, json!({"a": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_options_keep_base_and_add_strings() {
        let merged = translate(
            &json!({"a": {"options": {"yes": "Yes"}}}),
            Some(&json!({"a": {"options": {"yes": "Oui"}}})),
        );
        assert_eq!(merged, json!({"a": {"options": {"yes": "Yes"}, "strings": {"yes": "Oui"}}}));
    }

    #[test]
    fn test_options_without_translation_have_no_strings() {
        let merged = translate(&json!({"a": {"options": ["yes", "no"]}}), Some(&json!({"a": {}})));
        assert_eq!(merged, json!({"a": {"options": ["yes", "no"]}}));
    }

    #[test]
    fn test_missing_translation_passes_through() {
        let base = json!({"amenity/cafe": {"tags": {"amenity": "cafe"}}});
        assert_eq!(translate(&base, None), base);
    }

    #[test]
    fn test_translated_string_replaces_base_string() {
        let merged = translate(&json!({"name": "Cafe", "icon": "cafe"}), Some(&json!({"name": "Café"})));
        assert_eq!(merged, json!({"name": "Café", "icon": "cafe"}));
    }

    #[test]
    fn test_malformed_translation_degrades_to_base() {
        let base = json!({"a": {"x": 1}, "b": ["k"]});
        let merged = translate(&base, Some(&json!({"a": "oops", "b": {"k": "v"}})));
        assert_eq!(merged, base);

        assert_eq!(translate(&base, Some(&json!(["not", "a", "record"]))), base);
    }

    #[test]
    fn test_translated_leaf_replaces_base_list() {
        let merged = translate(
            &json!({"terms": ["coffee", "tea"]}),
            Some(&json!({"terms": "café,thé"})),
        );
        assert_eq!(merged, json!({"terms": "café,thé"}));
    }

    #[test]
    fn test_translation_only_keys_added() {
        let merged = translate(
            &json!({"amenity/cafe": {"tags": {"amenity": "cafe"}}}),
            Some(&json!({"amenity/cafe": {"name": "Café", "terms": "coffee"}})),
        );
        assert_eq!(merged["amenity/cafe"]["name"], "Café");
        assert_eq!(merged["amenity/cafe"]["terms"], "coffee");
        assert_eq!(merged["amenity/cafe"]["tags"]["amenity"], "cafe");
    }
}
