//! Typed view of a layer group metadata document.
//!
//! The document looks like:
//!
//! ```json
//! {
//!   "SelfGuid": "…", "SelfTypeId": 123, "TimeStamp": 1700000000.0,
//!   "LayerGroupMetadata": {
//!     "IsPanelizable": true,
//!     "PerforatorData": { "Openings": ["…"], "Perforators": [456] }
//!   }
//! }
//! ```
//!
//! Fields this crate does not interpret land in the `extra` maps and are
//! written back unchanged.

use lgc_types::{EntityId, EntityRef, RefKind};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Parsed metadata blob of a layer group element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerGroupMetadata {
    #[serde(rename = "LayerGroupMetadata")]
    pub section: LayerGroupSection,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `LayerGroupMetadata` object inside the blob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerGroupSection {
    #[serde(rename = "PerforatorData")]
    pub perforator_data: PerforatorData,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// References to the elements that cut through the layer group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerforatorData {
    #[serde(rename = "Openings", default, deserialize_with = "null_as_empty")]
    pub openings: Vec<EntityId>,
    #[serde(rename = "Perforators", default, deserialize_with = "null_as_empty")]
    pub perforators: Vec<EntityId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<EntityId>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<EntityId>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl LayerGroupMetadata {
    /// Metadata with the given references and no other content.
    pub fn new(openings: Vec<EntityId>, perforators: Vec<EntityId>) -> Self {
        Self {
            section: LayerGroupSection {
                perforator_data: PerforatorData {
                    openings,
                    perforators,
                    extra: Map::new(),
                },
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    pub fn perforator_data(&self) -> &PerforatorData {
        &self.section.perforator_data
    }

    /// References of one kind, in document order (duplicates kept).
    pub fn references(&self, kind: RefKind) -> Vec<EntityRef> {
        let data = self.perforator_data();
        let ids = match kind {
            RefKind::Opening => &data.openings,
            RefKind::Perforator => &data.perforators,
        };
        ids.iter()
            .cloned()
            .map(|id| EntityRef::new(id, kind))
            .collect()
    }

    /// All references: openings first, then perforators.
    pub fn all_references(&self) -> Vec<EntityRef> {
        RefKind::ALL
            .iter()
            .flat_map(|kind| self.references(*kind))
            .collect()
    }

    /// Returns `true` if neither collection names anything.
    pub fn has_no_references(&self) -> bool {
        let data = self.perforator_data();
        data.openings.is_empty() && data.perforators.is_empty()
    }

    /// Unique id the element recorded for itself.
    pub fn self_guid(&self) -> Option<&str> {
        self.extra.get("SelfGuid").and_then(Value::as_str)
    }

    /// Type id the element recorded for itself.
    pub fn self_type_id(&self) -> Option<i64> {
        self.extra.get("SelfTypeId").and_then(Value::as_i64)
    }

    /// Seconds since the epoch of the last metadata update.
    pub fn timestamp(&self) -> Option<f64> {
        self.extra.get("TimeStamp").and_then(Value::as_f64)
    }

    pub fn component_hash(&self) -> Option<&str> {
        self.extra.get("ComponentHash").and_then(Value::as_str)
    }

    pub fn parent_component_guid(&self) -> Option<&str> {
        self.extra.get("ParentComponentGuid").and_then(Value::as_str)
    }
}

impl LayerGroupSection {
    /// Defaults to `false` when absent.
    pub fn is_panelizable(&self) -> bool {
        self.flag("IsPanelizable")
    }

    /// Defaults to `false` when absent.
    pub fn is_frameable(&self) -> bool {
        self.flag("IsFrameable")
    }

    pub fn geometry_data(&self) -> Option<&Value> {
        self.extra.get("GeometryData")
    }

    pub fn mep_box_data(&self) -> Option<&Value> {
        self.extra.get("MEPBoxData")
    }

    fn flag(&self, name: &str) -> bool {
        self.extra.get(name).and_then(Value::as_bool).unwrap_or(false)
    }
}
