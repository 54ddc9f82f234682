//! Extension restoration into native documents

use serde_json::Value;

use chrysalis_core::model::ExtensionProperty;

use crate::paths::{get_path, set_path};

/// Look up an extension value by namespace and property
///
/// First match wins. The stored value is JSON-parsed; if parsing fails the
/// raw string is returned so adapters never lose data to a malformed
/// extension. Falls back to `default` when no extension matches.
pub fn restore_extension(
    extensions: &[ExtensionProperty],
    namespace: &str,
    property: &str,
    default: Option<Value>,
) -> Option<Value> {
    extensions
        .iter()
        .find(|e| e.namespace == namespace && e.property == property)
        .map(|e| {
            e.json_value()
                .unwrap_or_else(|_| Value::String(e.value.clone()))
        })
        .or(default)
}

/// Restore a batch of extensions into dotted-path targets
///
/// Each spec is `(dotted-path, namespace, property)`. Missing extensions
/// are skipped; intermediate containers are created; re-running the batch
/// leaves the document unchanged (idempotent).
pub fn restore_extensions_batch(
    target: &mut Value,
    extensions: &[ExtensionProperty],
    specs: &[(&str, &str, &str)],
) {
    for (path, namespace, property) in specs {
        if let Some(value) = restore_extension(extensions, namespace, property, None) {
            set_path(target, path, value);
        }
    }
}

/// Restore every extension of one namespace to its recorded source path
pub fn restore_all_by_source_path(
    target: &mut Value,
    extensions: &[ExtensionProperty],
    namespace: &str,
) {
    for extension in extensions.iter().filter(|e| e.namespace == namespace) {
        // Do not clobber a value the adapter already produced at this path
        if get_path(target, &extension.source_path).is_none() {
            let value = extension
                .json_value()
                .unwrap_or_else(|_| Value::String(extension.value.clone()));
            set_path(target, &extension.source_path, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NS: &str = "https://chrysalis.dev/ext/usa#";

    fn ext(property: &str, value: &Value, path: &str) -> ExtensionProperty {
        ExtensionProperty::new(NS, property, value, path).unwrap()
    }

    #[test]
    fn first_match_wins_and_parses_json() {
        let extensions = vec![
            ext("hints", &json!({"retries": 3}), "runtime_hints"),
            ext("hints", &json!("shadowed"), "runtime_hints"),
        ];
        let value = restore_extension(&extensions, NS, "hints", None).unwrap();
        assert_eq!(value, json!({"retries": 3}));
    }

    #[test]
    fn missing_extension_falls_back_to_default() {
        assert_eq!(
            restore_extension(&[], NS, "absent", Some(json!(42))),
            Some(json!(42))
        );
        assert_eq!(restore_extension(&[], NS, "absent", None), None);
    }

    #[test]
    fn malformed_value_returns_raw_string() {
        let mut broken = ext("raw", &json!(null), "raw");
        broken.value = "not { json".to_string();
        let value = restore_extension(&[broken], NS, "raw", None).unwrap();
        assert_eq!(value, json!("not { json"));
    }

    #[test]
    fn batch_restore_is_idempotent_and_creates_intermediates() {
        let extensions = vec![
            ext("hints", &json!({"retries": 3}), "runtime_hints"),
            ext("icon", &json!("robot.png"), "metadata.icon"),
        ];
        let specs = [
            ("runtime_hints", NS, "hints"),
            ("metadata.icon", NS, "icon"),
        ];

        let mut doc = json!({"metadata": {"name": "atlas"}});
        restore_extensions_batch(&mut doc, &extensions, &specs);
        let once = doc.clone();
        restore_extensions_batch(&mut doc, &extensions, &specs);

        assert_eq!(doc, once);
        assert_eq!(doc["runtime_hints"], json!({"retries": 3}));
        assert_eq!(doc["metadata"]["icon"], json!("robot.png"));
        assert_eq!(doc["metadata"]["name"], json!("atlas"));
    }

    #[test]
    fn source_path_restore_skips_existing_values() {
        let extensions = vec![ext("name", &json!("stale"), "metadata.name")];
        let mut doc = json!({"metadata": {"name": "fresh"}});
        restore_all_by_source_path(&mut doc, &extensions, NS);
        assert_eq!(doc["metadata"]["name"], json!("fresh"));
    }
}
