use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::{Map, Value};

use crate::types::{Cell, Notebook, Sharing};

/// Top-level keys a client may change. Anything else in a request body is dropped.
pub const UPDATABLE_FIELDS: [&str; 5] = ["title", "description", "cells", "metadata", "sharing"];

const CELL_ID_SUFFIX_LEN: usize = 9;

/// Applies a client patch to `notebook`.
///
/// `title` and `description` are replaced, `cells` is replaced wholesale when it
/// is an array, and `metadata`/`sharing` are shallow-merged when they are
/// objects. The version is bumped and `lastSaved` stamped even if nothing
/// changed. On error the notebook may be partially modified and must not be
/// persisted.
pub fn apply_update(
    notebook: &mut Notebook,
    changes: &Map<String, Value>,
    now: DateTime<Utc>,
) -> Result<(), String> {
    for ignored in changes
        .keys()
        .filter(|key| !UPDATABLE_FIELDS.contains(&key.as_str()))
    {
        tracing::debug!("Ignoring non-updatable notebook field '{ignored}'");
    }

    if let Some(value) = changes.get("title") {
        notebook.title = expect_string("title", value)?;
    }
    if let Some(value) = changes.get("description") {
        notebook.description = expect_string("description", value)?;
    }
    if let Some(Value::Array(items)) = changes.get("cells") {
        notebook.cells = items
            .iter()
            .map(cell_from_value)
            .collect::<Result<Vec<_>, _>>()?;
    }
    if let Some(Value::Object(incoming)) = changes.get("metadata") {
        shallow_merge(&mut notebook.metadata, incoming);
    }
    if let Some(Value::Object(incoming)) = changes.get("sharing") {
        notebook.sharing = merge_sharing(&notebook.sharing, incoming)?;
    }

    notebook.last_saved = Some(now);
    notebook.version += 1;
    Ok(())
}

/// Total number of whitespace-separated words across all textual cell content.
#[must_use]
pub fn word_count(cells: &[Cell]) -> usize {
    cells
        .iter()
        .filter_map(Cell::content)
        .map(|content| content.split_whitespace().count())
        .sum()
}

/// Generates a cell id of the form `cell_<unix millis>_<random suffix>`.
#[must_use]
pub fn generate_cell_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CELL_ID_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("cell_{}_{}", Utc::now().timestamp_millis(), suffix)
}

fn expect_string(field: &str, value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("{field} must be a string"))
}

fn cell_from_value(value: &Value) -> Result<Cell, String> {
    let Value::Object(map) = value else {
        return Err("each cell must be an object".to_string());
    };

    let mut fields = map.clone();
    let id = match fields.remove("id") {
        Some(Value::String(id)) if !id.is_empty() => id,
        Some(Value::Number(n)) => n.to_string(),
        _ => generate_cell_id(),
    };

    Ok(Cell { id, fields })
}

fn shallow_merge(target: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        target.insert(key.clone(), value.clone());
    }
}

fn merge_sharing(current: &Sharing, incoming: &Map<String, Value>) -> Result<Sharing, String> {
    let mut merged = match serde_json::to_value(current) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => return Err(format!("invalid sharing settings: {e}")),
    };
    shallow_merge(&mut merged, incoming);
    serde_json::from_value(Value::Object(merged))
        .map_err(|e| format!("invalid sharing settings: {e}"))
}
