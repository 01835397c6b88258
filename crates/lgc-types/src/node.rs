//! The generic object graph published to the store.
//!
//! An [`ObjectNode`] carries a kind tag, a property map and a relationship
//! map. Relationship keys that start with `@` are *detachable*: the store
//! addresses each child on its own and the parent keeps only a reference, so
//! two graphs that share a child store it once.
//!
//! Children are held behind [`NodeRef`] (`Arc<ObjectNode>`) so a node
//! referenced from several places is one instance, not several copies.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::object::ObjectId;

/// Shared handle to an immutable node.
pub type NodeRef = Arc<ObjectNode>;

/// Prefix marking a relationship key as detachable.
pub const DETACHED_PREFIX: char = '@';

/// Returns `true` if children under `key` are stored independently.
pub fn is_detachable_key(key: &str) -> bool {
    key.starts_with(DETACHED_PREFIX)
}

/// A property value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// A nested node embedded inline in its parent.
    Node(NodeRef),
    List(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Convert an arbitrary JSON value. JSON objects become inline nodes of
    /// kind [`ObjectNode::BASE_KIND`].
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut node = ObjectNode::new(ObjectNode::BASE_KIND);
                for (key, value) in map {
                    node.set_property(key, Self::from_json(value));
                }
                Self::Node(Arc::new(node))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<NodeRef> for Value {
    fn from(node: NodeRef) -> Self {
        Self::Node(node)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

/// A relationship from a node to one child or an ordered sequence of them.
#[derive(Clone, Debug, PartialEq)]
pub enum Relationship {
    One(NodeRef),
    Many(Vec<NodeRef>),
}

impl Relationship {
    /// The children as a slice, regardless of arity.
    pub fn nodes(&self) -> &[NodeRef] {
        match self {
            Self::One(node) => std::slice::from_ref(node),
            Self::Many(nodes) => nodes,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }
}

/// Generic object representation.
///
/// `id` is absent on freshly converted or assembled nodes; it is only set on
/// nodes read back from a store, where it equals the content hash. Equality
/// compares content (kind, properties, relationships) and ignores `id`.
#[derive(Clone, Debug, Default)]
pub struct ObjectNode {
    kind: String,
    id: Option<ObjectId>,
    properties: BTreeMap<String, Value>,
    relationships: BTreeMap<String, Relationship>,
}

impl ObjectNode {
    /// Kind used for untyped nodes.
    pub const BASE_KIND: &'static str = "Base";

    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Content hash, if this node was read back from a store.
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    /// Attach the content hash of a node read back from a store.
    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(name, value);
        self
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    pub fn relationship(&self, key: &str) -> Option<&Relationship> {
        self.relationships.get(key)
    }

    /// Children under `key`. An absent key reads as no children.
    pub fn children(&self, key: &str) -> &[NodeRef] {
        self.relationships
            .get(key)
            .map(Relationship::nodes)
            .unwrap_or(&[])
    }

    pub fn set_relationship(&mut self, key: impl Into<String>, relationship: Relationship) {
        self.relationships.insert(key.into(), relationship);
    }

    pub fn relationships(&self) -> &BTreeMap<String, Relationship> {
        &self.relationships
    }

    /// Relationships whose children are stored independently.
    pub fn detachable(&self) -> impl Iterator<Item = (&str, &Relationship)> {
        self.relationships
            .iter()
            .filter(|(key, _)| is_detachable_key(key))
            .map(|(key, rel)| (key.as_str(), rel))
    }

    /// Freeze the node behind a shared handle.
    pub fn into_shared(self) -> NodeRef {
        Arc::new(self)
    }
}

impl PartialEq for ObjectNode {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.properties == other.properties
            && self.relationships == other.relationships
    }
}
