// ── Tags and custom fields ──
//
// Parsing of the configured label strings and the pure comparisons that
// decide whether a device's tags or custom fields need rewriting.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CoreError;
use crate::model::{ObjectId, Tag};

/// Split a comma-separated tag list into a sorted, deduplicated set.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Parse `key=value` pairs separated by commas. The value keeps any
/// further `=` characters.
pub fn parse_custom_fields(raw: &str) -> Result<BTreeMap<String, String>, CoreError> {
    let mut fields = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(CoreError::Config {
                message: format!("custom field {entry:?} is not in key=value form"),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(CoreError::Config {
                message: format!("custom field {entry:?} has an empty key"),
            });
        }
        fields.insert(key.to_owned(), value.trim().to_owned());
    }
    Ok(fields)
}

/// Tag ids to write, or `None` when the device already carries the
/// resulting set.
///
/// In preserve mode the configured tags are added to the current ones;
/// otherwise they replace them.
pub fn tag_update(current: &[Tag], configured: &[Tag], preserve: bool) -> Option<Vec<ObjectId>> {
    let current_names: BTreeSet<&str> = current.iter().map(|t| t.name.as_str()).collect();

    let mut wanted: BTreeMap<&str, ObjectId> =
        configured.iter().map(|t| (t.name.as_str(), t.id)).collect();
    if preserve {
        for tag in current {
            wanted.entry(tag.name.as_str()).or_insert(tag.id);
        }
    }

    let wanted_names: BTreeSet<&str> = wanted.keys().copied().collect();
    if wanted_names == current_names {
        return None;
    }

    let mut ids: Vec<ObjectId> = wanted.into_values().collect();
    ids.sort_unstable();
    Some(ids)
}

/// Custom-field assignment replacing the current mapping with the
/// configured one, or `None` when they already match. Keys set remotely
/// but absent from the configuration are sent as `None` (cleared).
pub fn custom_field_update(
    current: &BTreeMap<String, String>,
    configured: &BTreeMap<String, String>,
) -> Option<BTreeMap<String, Option<String>>> {
    if current == configured {
        return None;
    }

    let mut update: BTreeMap<String, Option<String>> = configured
        .iter()
        .map(|(k, v)| (k.clone(), Some(v.clone())))
        .collect();
    for key in current.keys() {
        update.entry(key.clone()).or_insert(None);
    }
    Some(update)
}
