//! A host document read from a JSON export.
//!
//! The export lists elements with both of their identifiers, a category,
//! free-form parameters, and any extensible-storage entries:
//!
//! ```json
//! {
//!   "elements": [
//!     {
//!       "uniqueId": "5f2b…-0004d2a1",
//!       "elementId": 315041,
//!       "category": "Walls",
//!       "name": "LG-Exterior-01",
//!       "parameters": {"Height": 3.2},
//!       "storage": {
//!         "d2076246-c30b-414b-b7be-071151d82a39": {"JSONData": "{…}"}
//!       }
//!     }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use lgc_graph::{ConversionError, Converter, HostLookup, LookupError};
use lgc_metadata::{MetadataStore, MetadataStoreError, StorageSchema};
use lgc_types::{EntityId, ObjectNode, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One host element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub unique_id: String,
    pub element_id: i64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    /// Schema GUID → field → stored string.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub storage: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("cannot read document {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate element identifier {0}")]
    DuplicateId(EntityId),
}

#[derive(Deserialize)]
struct DocumentFile {
    elements: Vec<Element>,
}

/// Read-only, indexed view over an exported host document.
#[derive(Clone, Debug, Default)]
pub struct JsonDocument {
    elements: Vec<Element>,
    by_unique_id: HashMap<String, usize>,
    by_element_id: HashMap<i64, usize>,
}

impl JsonDocument {
    pub fn from_elements(elements: Vec<Element>) -> Result<Self, DocumentError> {
        let mut by_unique_id = HashMap::with_capacity(elements.len());
        let mut by_element_id = HashMap::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            if by_unique_id.insert(element.unique_id.clone(), index).is_some() {
                return Err(DocumentError::DuplicateId(EntityId::UniqueId(
                    element.unique_id.clone(),
                )));
            }
            if by_element_id.insert(element.element_id, index).is_some() {
                return Err(DocumentError::DuplicateId(EntityId::ElementId(
                    element.element_id,
                )));
            }
        }
        Ok(Self {
            elements,
            by_unique_id,
            by_element_id,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DocumentError> {
        let file: DocumentFile = serde_json::from_str(raw)?;
        Self::from_elements(file.elements)
    }

    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let raw = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Look an element up by either identifier.
    pub fn get(&self, id: &EntityId) -> Option<&Element> {
        let index = match id {
            EntityId::UniqueId(s) => self.by_unique_id.get(s),
            EntityId::ElementId(n) => self.by_element_id.get(n),
        }?;
        self.elements.get(*index)
    }
}

#[async_trait]
impl HostLookup for JsonDocument {
    type Entity = Element;

    async fn find(&self, id: &EntityId) -> Result<Option<Element>, LookupError> {
        Ok(self.get(id).cloned())
    }
}

impl MetadataStore<Element> for JsonDocument {
    fn read_metadata(
        &self,
        entity: &Element,
        schema: &StorageSchema,
    ) -> Result<Option<String>, MetadataStoreError> {
        Ok(entity
            .storage
            .get(&schema.guid.to_string())
            .and_then(|fields| fields.get(schema.field))
            .cloned())
    }
}

impl Converter<Element> for JsonDocument {
    /// Elements become nodes of their category, carrying both identifiers,
    /// the name, and the parameters as a nested node.
    fn to_object_node(&self, element: &Element) -> Result<ObjectNode, ConversionError> {
        if element.category.trim().is_empty() {
            return Err(ConversionError::Unsupported(format!(
                "element {} has no category",
                element.unique_id
            )));
        }
        let mut node = ObjectNode::new(element.category.clone())
            .with_property("uniqueId", element.unique_id.as_str())
            .with_property("elementId", element.element_id);
        if let Some(name) = &element.name {
            node.set_property("name", name.as_str());
        }
        if !element.parameters.is_empty() {
            node.set_property(
                "parameters",
                Value::from_json(serde_json::Value::Object(element.parameters.clone())),
            );
        }
        Ok(node)
    }
}
