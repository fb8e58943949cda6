//! Widget options - Shallow merge and `data-*` attribute reading.

use serde_json::{Map, Value};

use crate::dom::Document;
use crate::types::NodeId;
use crate::util::{coerce_value, kebab_to_camel};

/// Merged widget configuration.
pub type Options = Map<String, Value>;

/// Shallow merge: every key in `overrides` replaces the key in `defaults`.
///
/// Nested objects are replaced wholesale, not merged.
pub fn merge_options(defaults: &Options, overrides: &Options) -> Options {
    let mut merged = defaults.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Collect `data-<prefix>-*` attributes into options.
///
/// `data-toast-auto-hide="false"` with prefix `toast` becomes
/// `{"autoHide": false}`. Values go through [`coerce_value`].
pub fn options_from_dataset(document: &Document, element: NodeId, prefix: &str) -> Options {
    let head = format!("data-{prefix}-");
    document
        .attributes(element)
        .into_iter()
        .filter_map(|(name, value)| {
            let suffix = name.strip_prefix(&head)?;
            if suffix.is_empty() {
                return None;
            }
            Some((kebab_to_camel(suffix), coerce_value(&value)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Options {
        match value {
            Value::Object(map) => map,
            _ => Options::new(),
        }
    }

    #[test]
    fn test_merge_right_wins() {
        let defaults = map(json!({ "placement": "top", "delay": 300, "nested": { "a": 1 } }));
        let overrides = map(json!({ "delay": 0, "nested": { "b": 2 }, "extra": true }));

        let merged = merge_options(&defaults, &overrides);
        assert_eq!(
            Value::Object(merged),
            json!({ "placement": "top", "delay": 0, "nested": { "b": 2 }, "extra": true })
        );
    }

    #[test]
    fn test_merge_with_empty() {
        let defaults = map(json!({ "a": 1 }));
        assert_eq!(merge_options(&defaults, &Options::new()), defaults);
        assert_eq!(merge_options(&Options::new(), &defaults), defaults);
    }

    #[test]
    fn test_options_from_dataset() {
        let doc = Document::new();
        let el = doc.create_element("div");
        doc.set_attribute(el, "data-toast-auto-hide", "false");
        doc.set_attribute(el, "data-toast-delay", "5000");
        doc.set_attribute(el, "data-toast-placement", "bottom-right");
        doc.set_attribute(el, "data-toast-", "ignored");
        doc.set_attribute(el, "data-modal-backdrop", "static");
        doc.set_attribute(el, "id", "t1");

        let options = options_from_dataset(&doc, el, "toast");
        assert_eq!(
            Value::Object(options),
            json!({ "autoHide": false, "delay": 5000, "placement": "bottom-right" })
        );
    }
}
