//! Read-modify-write merges on raw JSON.
//!
//! Both documents are edited by hand and by other clients, so merges work on
//! `serde_json::Value` and leave anything they do not understand untouched.

use crate::error::{Result, SyncError};
use metahint_protocol::{round_coordinate, Coordinates, HintRecord, LocationId};
use serde::Serialize;
use serde_json::{Map, Value};

/// The location a hint is linked to, with whatever context is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationLink {
    pub id: LocationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
}

impl LocationLink {
    pub fn new(id: impl Into<LocationId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Parses a fetched document. Unparseable text is an error so that a write
/// never replaces content it could not read.
pub fn parse_document(path: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|err| SyncError::decode(path, err))
}

pub fn render_document(document: &Value) -> Result<String> {
    let mut text = serde_json::to_string_pretty(document)?;
    text.push('\n');
    Ok(text)
}

/// Appends `record` to the hint array.
pub fn append_hint(path: &str, document: &mut Value, record: &HintRecord) -> Result<()> {
    let Some(records) = document.as_array_mut() else {
        return Err(SyncError::decode(path, "expected a JSON array of hints"));
    };
    let duplicate = records
        .iter()
        .any(|row| row.get("id").and_then(Value::as_str) == Some(record.id.as_str()));
    if duplicate {
        return Err(SyncError::DuplicateHint(record.id.clone()));
    }
    records.push(serde_json::to_value(record)?);
    Ok(())
}

/// Links `hint_ids` to the location, writing the canonical entry shape.
///
/// Ids already linked are skipped and geographic fields are only filled when
/// absent. Returns whether the document changed.
pub fn link_hints(
    path: &str,
    document: &mut Value,
    location: &LocationLink,
    hint_ids: &[String],
) -> Result<bool> {
    let Some(map) = document.as_object_mut() else {
        return Err(SyncError::decode(path, "expected a JSON object of locations"));
    };

    let key = location.id.as_str();
    let mut changed = false;
    let slot = map.entry(key.to_string()).or_insert_with(|| {
        changed = true;
        Value::Object(Map::new())
    });
    if let Value::Array(legacy) = slot {
        log::debug!("Normalizing legacy entry {key}");
        let metas = std::mem::take(legacy);
        *slot = serde_json::json!({ "metas": metas });
        changed = true;
    }
    let Some(entry) = slot.as_object_mut() else {
        return Err(SyncError::decode(
            path,
            format!("entry {key} is neither an object nor an id list"),
        ));
    };

    let metas = entry
        .entry("metas")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !metas.is_array() {
        log::warn!("Replacing non-list metas of {key}");
        *metas = Value::Array(Vec::new());
        changed = true;
    }
    if let Value::Array(linked) = metas {
        for id in hint_ids {
            let already = linked.iter().any(|v| v.as_str() == Some(id.as_str()));
            if !already {
                linked.push(Value::String(id.clone()));
                changed = true;
            }
        }
    }

    if let Some(coords) = location.coordinates {
        changed |= fill_absent(entry, "lat", Value::from(round_coordinate(coords.lat)));
        changed |= fill_absent(entry, "lng", Value::from(round_coordinate(coords.lng)));
    }
    for (field, value) in [
        ("country", &location.country),
        ("region", &location.region),
        ("road", &location.road),
    ] {
        if let Some(text) = value.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            changed |= fill_absent(entry, field, Value::String(text.to_string()));
        }
    }

    Ok(changed)
}

fn fill_absent(entry: &mut Map<String, Value>, field: &str, value: Value) -> bool {
    match entry.get(field) {
        Some(existing) if !existing.is_null() => false,
        _ => {
            entry.insert(field.to_string(), value);
            true
        }
    }
}
