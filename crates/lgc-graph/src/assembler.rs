//! Attaching resolved references to the converted layer group.

use lgc_metadata::{LayerGroupMetadata, ParseError};
use lgc_types::{NodeRef, ObjectNode, RefKind, Relationship};
use tracing::debug;

use crate::error::AssemblyError;
use crate::host::Converter;

/// Property under which the root node carries its serialized metadata.
pub const METADATA_PROPERTY: &str = "metadata";

/// Build the root object node for a layer group.
///
/// The root is the converter's output for `root`, extended with the
/// serialized metadata and two detachable relationships: `@openings` and
/// `@perforators`. Both are always present, empty when the metadata named
/// nothing, and keep the order (and duplicates) of the input vectors.
pub fn assemble<E, C>(
    root: &E,
    metadata: &LayerGroupMetadata,
    openings: Vec<NodeRef>,
    perforators: Vec<NodeRef>,
    convert: &C,
) -> Result<ObjectNode, AssemblyError>
where
    C: Converter<E> + ?Sized,
{
    let mut node = convert.to_object_node(root)?;

    let raw = lgc_metadata::serialize(metadata)
        .map_err(|e| AssemblyError::Metadata(e.to_string()))?;
    node.set_property(METADATA_PROPERTY, raw);

    debug!(
        kind = node.kind(),
        openings = openings.len(),
        perforators = perforators.len(),
        "assembled layer group root"
    );

    node.set_relationship(
        RefKind::Opening.relationship_key(),
        Relationship::Many(openings),
    );
    node.set_relationship(
        RefKind::Perforator.relationship_key(),
        Relationship::Many(perforators),
    );
    Ok(node)
}

/// Recover the metadata carried by an assembled (or downloaded) root.
pub fn read_metadata(node: &ObjectNode) -> Result<LayerGroupMetadata, ParseError> {
    let raw = node
        .property(METADATA_PROPERTY)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ParseError::MissingSection {
            path: METADATA_PROPERTY.to_string(),
        })?;
    lgc_metadata::parse(raw)
}
