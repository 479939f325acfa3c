//! Additive metadata population for JSON package manifests.

use serde_json::{Map, Value, json};

use crate::constants::manifest;

/// Add `license`, `badges` and `scripts` where absent (or null). Existing
/// values are never touched and key order is preserved. Returns the names
/// of the fields that were added.
pub fn populate_metadata(pkg: &mut Map<String, Value>) -> Vec<&'static str> {
    let mut added = Vec::new();

    let mut add = |key: &'static str, value: Value| {
        if pkg.get(key).is_none_or(Value::is_null) {
            pkg.insert(key.to_string(), value);
            added.push(key);
        }
    };

    add("license", json!(manifest::LICENSE));
    add(
        "badges",
        json!({
            "build": manifest::BADGE_BUILD,
            "version": manifest::BADGE_VERSION,
            "license": manifest::LICENSE,
        }),
    );
    add("scripts", json!({ "start": manifest::START_SCRIPT }));

    added
}

/// Rewrite a manifest's text. `Ok(None)` when nothing was added.
pub fn populate_manifest(raw: &str) -> serde_json::Result<Option<String>> {
    let mut value: Value = serde_json::from_str(raw)?;
    let Some(pkg) = value.as_object_mut() else {
        return Ok(None);
    };

    if populate_metadata(pkg).is_empty() {
        return Ok(None);
    }

    let mut out = serde_json::to_string_pretty(&value)?;
    if raw.ends_with('\n') {
        out.push('\n');
    }
    Ok(Some(out))
}
