//! Decomposition of an object graph into content-addressed objects.
//!
//! Each stored object is the JSON encoding of one node:
//!
//! ```json
//! {
//!   "kind": "Wall",
//!   "properties": {"metadata": "…", "height": 3.2, "frame": {"$node": {…}}},
//!   "relationships": {
//!     "@openings": {"many": [{"$ref": "9f2c…"}, {"$ref": "9f2c…"}]},
//!     "host": {"one": {"$inline": {"kind": "Level"}}}
//!   },
//!   "closure": ["9f2c…"]
//! }
//! ```
//!
//! Children under `@` keys are stored as separate objects and referenced by
//! hash; all other children and nested property nodes are embedded. The
//! `closure` lists every object reachable through references, so a reader
//! can tell what a root depends on without walking it.
//!
//! Map keys are ordered, so identical graphs encode to identical bytes.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use lgc_types::{is_detachable_key, NodeRef, ObjectId, ObjectNode, Relationship, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, WireValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    relationships: BTreeMap<String, WireRelationship>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    closure: BTreeSet<ObjectId>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<WireValue>),
    Node {
        #[serde(rename = "$node")]
        node: Box<NodeRecord>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireRelationship {
    One(WireChild),
    Many(Vec<WireChild>),
}

#[derive(Debug, Serialize, Deserialize)]
enum WireChild {
    #[serde(rename = "$ref")]
    Ref(ObjectId),
    #[serde(rename = "$inline")]
    Inline(Box<NodeRecord>),
}

/// A graph flattened into storable objects.
#[derive(Clone, Debug)]
pub struct EncodedGraph {
    /// ID of the root object.
    pub root: ObjectId,
    /// Distinct objects, each child before any parent that references it.
    /// The root is last.
    pub objects: Vec<(ObjectId, StoredObject)>,
}

impl EncodedGraph {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Flatten `root` into content-addressed objects.
///
/// A child reached several times through the same `Arc` is encoded once;
/// children with equal content but separate allocations still collapse to
/// one object because they hash alike.
pub fn encode_graph(root: &ObjectNode) -> StoreResult<EncodedGraph> {
    let mut encoder = Encoder::default();
    let root_id = encoder.store_node(root)?;
    debug!(
        root = %root_id.short_hex(),
        objects = encoder.objects.len(),
        "encoded object graph"
    );
    Ok(EncodedGraph {
        root: root_id,
        objects: encoder.objects,
    })
}

/// Rebuild the graph rooted at `root` from `store`.
///
/// Every node that was stored as its own object comes back with its `id`
/// set. A child referenced several times is returned as one shared node.
pub fn decode_graph<S>(root: &ObjectId, store: &S) -> StoreResult<ObjectNode>
where
    S: ObjectStore + ?Sized,
{
    let mut decoder = Decoder {
        store,
        cache: HashMap::new(),
    };
    let node = decoder.load(root)?;
    debug!(
        root = %root.short_hex(),
        objects = decoder.cache.len() + 1,
        "decoded object graph"
    );
    Ok(node)
}

#[derive(Default)]
struct Encoder {
    by_ptr: HashMap<*const ObjectNode, ObjectId>,
    closures: HashMap<ObjectId, BTreeSet<ObjectId>>,
    seen: HashSet<ObjectId>,
    objects: Vec<(ObjectId, StoredObject)>,
}

impl Encoder {
    fn store_node(&mut self, node: &ObjectNode) -> StoreResult<ObjectId> {
        let mut closure = BTreeSet::new();
        let mut record = self.record(node, &mut closure)?;
        record.closure = closure;

        let data =
            serde_json::to_vec(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let object = StoredObject::new(data);
        let id = object.compute_id();
        if self.seen.insert(id) {
            self.closures.insert(id, record.closure);
            self.objects.push((id, object));
        }
        Ok(id)
    }

    fn detach(&mut self, child: &NodeRef) -> StoreResult<ObjectId> {
        let ptr = Arc::as_ptr(child);
        if let Some(id) = self.by_ptr.get(&ptr) {
            return Ok(*id);
        }
        let id = self.store_node(child)?;
        self.by_ptr.insert(ptr, id);
        Ok(id)
    }

    fn record(
        &mut self,
        node: &ObjectNode,
        closure: &mut BTreeSet<ObjectId>,
    ) -> StoreResult<NodeRecord> {
        let mut properties = BTreeMap::new();
        for (name, value) in node.properties() {
            properties.insert(name.clone(), self.value(value, closure)?);
        }

        let mut relationships = BTreeMap::new();
        for (key, relationship) in node.relationships() {
            let detached = is_detachable_key(key);
            let wire = match relationship {
                Relationship::One(child) => {
                    WireRelationship::One(self.child(child, detached, closure)?)
                }
                Relationship::Many(children) => WireRelationship::Many(
                    children
                        .iter()
                        .map(|child| self.child(child, detached, closure))
                        .collect::<StoreResult<_>>()?,
                ),
            };
            relationships.insert(key.clone(), wire);
        }

        Ok(NodeRecord {
            kind: node.kind().to_string(),
            properties,
            relationships,
            closure: BTreeSet::new(),
        })
    }

    fn child(
        &mut self,
        child: &NodeRef,
        detached: bool,
        closure: &mut BTreeSet<ObjectId>,
    ) -> StoreResult<WireChild> {
        if !detached {
            return Ok(WireChild::Inline(Box::new(self.record(child, closure)?)));
        }
        let id = self.detach(child)?;
        closure.insert(id);
        if let Some(nested) = self.closures.get(&id) {
            closure.extend(nested.iter().copied());
        }
        Ok(WireChild::Ref(id))
    }

    fn value(&mut self, value: &Value, closure: &mut BTreeSet<ObjectId>) -> StoreResult<WireValue> {
        Ok(match value {
            Value::Null => WireValue::Null,
            Value::Bool(b) => WireValue::Bool(*b),
            Value::Int(n) => WireValue::Int(*n),
            Value::Float(n) if n.is_finite() => WireValue::Float(*n),
            Value::Float(n) => {
                return Err(StoreError::Serialization(format!(
                    "non-finite number {n} cannot be stored"
                )))
            }
            Value::String(s) => WireValue::String(s.clone()),
            Value::List(items) => WireValue::List(
                items
                    .iter()
                    .map(|item| self.value(item, closure))
                    .collect::<StoreResult<_>>()?,
            ),
            Value::Node(node) => WireValue::Node {
                node: Box::new(self.record(node, closure)?),
            },
        })
    }
}

struct Decoder<'a, S: ?Sized> {
    store: &'a S,
    cache: HashMap<ObjectId, NodeRef>,
}

impl<S: ObjectStore + ?Sized> Decoder<'_, S> {
    fn load(&mut self, id: &ObjectId) -> StoreResult<ObjectNode> {
        let object = self.store.read_required(id)?;
        object.verify(id)?;
        let record: NodeRecord =
            serde_json::from_slice(&object.data).map_err(|e| StoreError::CorruptObject {
                id: *id,
                reason: e.to_string(),
            })?;
        Ok(self.build(record)?.with_id(*id))
    }

    fn shared(&mut self, id: &ObjectId) -> StoreResult<NodeRef> {
        if let Some(node) = self.cache.get(id) {
            return Ok(Arc::clone(node));
        }
        let node = Arc::new(self.load(id)?);
        self.cache.insert(*id, Arc::clone(&node));
        Ok(node)
    }

    fn build(&mut self, record: NodeRecord) -> StoreResult<ObjectNode> {
        let mut node = ObjectNode::new(record.kind);
        for (name, value) in record.properties {
            let value = self.value(value)?;
            node.set_property(name, value);
        }
        for (key, wire) in record.relationships {
            let relationship = match wire {
                WireRelationship::One(child) => Relationship::One(self.child(child)?),
                WireRelationship::Many(children) => Relationship::Many(
                    children
                        .into_iter()
                        .map(|child| self.child(child))
                        .collect::<StoreResult<_>>()?,
                ),
            };
            node.set_relationship(key, relationship);
        }
        Ok(node)
    }

    fn child(&mut self, child: WireChild) -> StoreResult<NodeRef> {
        match child {
            WireChild::Ref(id) => self.shared(&id),
            WireChild::Inline(record) => Ok(Arc::new(self.build(*record)?)),
        }
    }

    fn value(&mut self, value: WireValue) -> StoreResult<Value> {
        Ok(match value {
            WireValue::Null => Value::Null,
            WireValue::Bool(b) => Value::Bool(b),
            WireValue::Int(n) => Value::Int(n),
            WireValue::Float(n) => Value::Float(n),
            WireValue::String(s) => Value::String(s),
            WireValue::List(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| self.value(item))
                    .collect::<StoreResult<_>>()?,
            ),
            WireValue::Node { node } => Value::Node(Arc::new(self.build(*node)?)),
        })
    }
}
