//! Conversion between raw metadata strings and [`LayerGroupMetadata`].

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ParseError;
use crate::model::LayerGroupMetadata;

const SECTION_KEY: &str = "LayerGroupMetadata";
const PERFORATOR_KEY: &str = "PerforatorData";

/// Decode a raw metadata blob.
///
/// Fails with [`ParseError::MalformedJson`] if `raw` is not a JSON object and
/// with [`ParseError::MissingSection`] if `LayerGroupMetadata.PerforatorData`
/// is absent. Absent `Openings` / `Perforators` lists read as empty.
pub fn parse(raw: &str) -> Result<LayerGroupMetadata, ParseError> {
    let root: Value =
        serde_json::from_str(raw).map_err(|e| ParseError::MalformedJson(e.to_string()))?;

    {
        let Value::Object(top) = &root else {
            return Err(ParseError::MalformedJson(format!(
                "expected a JSON object at the top level, found {}",
                json_kind(&root)
            )));
        };
        let section = require_object(top, SECTION_KEY, SECTION_KEY)?;
        require_object(section, PERFORATOR_KEY, &perforator_path())?;
    }

    let metadata: LayerGroupMetadata =
        serde_json::from_value(root).map_err(|e| ParseError::InvalidSection {
            path: perforator_path(),
            reason: e.to_string(),
        })?;

    let data = metadata.perforator_data();
    debug!(
        openings = data.openings.len(),
        perforators = data.perforators.len(),
        "parsed layer group metadata"
    );
    Ok(metadata)
}

/// Encode metadata back to its JSON string form.
///
/// `parse(&serialize(m)?)` yields a value equal to `m`.
pub fn serialize(metadata: &LayerGroupMetadata) -> serde_json::Result<String> {
    serde_json::to_string(metadata)
}

impl std::str::FromStr for LayerGroupMetadata {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

fn perforator_path() -> String {
    format!("{SECTION_KEY}.{PERFORATOR_KEY}")
}

fn require_object<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ParseError> {
    match parent.get(key) {
        None | Some(Value::Null) => Err(ParseError::MissingSection {
            path: path.to_string(),
        }),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(ParseError::InvalidSection {
            path: path.to_string(),
            reason: format!("expected an object, found {}", json_kind(other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
