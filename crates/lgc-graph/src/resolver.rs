//! Deduplicating, order-preserving reference resolution.
//!
//! A resolution pass:
//!
//! 1. collapses the input references to their distinct identifiers,
//!    keeping first-occurrence order;
//! 2. looks up and converts each distinct identifier exactly once, with at
//!    most `max_concurrency` in flight;
//! 3. fans the results back out so each input position receives the shared
//!    node of its identifier.
//!
//! The pass is all-or-nothing: the first failure aborts it and no partial
//! result is returned.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use lgc_types::{EntityId, EntityRef, NodeRef, RefKind};
use tracing::{debug, trace};

use crate::error::ResolutionError;
use crate::host::{Converter, HostLookup};

/// Default bound on concurrent lookups within one pass.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// A reference together with the node it resolved to.
#[derive(Clone, Debug)]
pub struct ResolvedRef {
    pub reference: EntityRef,
    pub node: NodeRef,
}

/// Output of a resolution pass, in input order.
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    resolved: Vec<ResolvedRef>,
    distinct: usize,
}

impl Resolution {
    pub fn resolved(&self) -> &[ResolvedRef] {
        &self.resolved
    }

    /// Nodes for references of `kind`, in input order.
    pub fn nodes(&self, kind: RefKind) -> Vec<NodeRef> {
        self.resolved
            .iter()
            .filter(|r| r.reference.kind == kind)
            .map(|r| Arc::clone(&r.node))
            .collect()
    }

    /// Number of distinct identifiers that were looked up.
    pub fn distinct_count(&self) -> usize {
        self.distinct
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// Resolves entity references into shared object nodes.
#[derive(Clone, Debug)]
pub struct ReferenceResolver {
    max_concurrency: usize,
}

impl Default for ReferenceResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

impl ReferenceResolver {
    /// Create a resolver. A limit of zero is treated as one.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Resolve `refs` through `lookup` and `convert`.
    ///
    /// Performs at most one lookup and one conversion per distinct
    /// identifier, however many times it appears in `refs`. When the same
    /// identifier appears under several kinds, the first occurrence decides
    /// the kind reported in an [`ResolutionError::UnresolvedReference`].
    pub async fn resolve<L, C>(
        &self,
        refs: &[EntityRef],
        lookup: &L,
        convert: &C,
    ) -> Result<Resolution, ResolutionError>
    where
        L: HostLookup + ?Sized,
        C: Converter<L::Entity> + ?Sized,
    {
        let mut slots: HashMap<&EntityId, usize> = HashMap::with_capacity(refs.len());
        let mut distinct: Vec<&EntityRef> = Vec::new();
        let mut positions = Vec::with_capacity(refs.len());
        for reference in refs {
            let slot = *slots.entry(&reference.id).or_insert_with(|| {
                distinct.push(reference);
                distinct.len() - 1
            });
            positions.push(slot);
        }

        let nodes: Vec<NodeRef> = stream::iter(distinct.iter().copied())
            .map(|reference| materialize(reference, lookup, convert))
            .buffered(self.max_concurrency)
            .try_collect()
            .await?;

        let resolved = refs
            .iter()
            .zip(positions)
            .map(|(reference, slot)| ResolvedRef {
                reference: reference.clone(),
                node: Arc::clone(&nodes[slot]),
            })
            .collect();

        debug!(
            references = refs.len(),
            distinct = nodes.len(),
            max_concurrency = self.max_concurrency,
            "resolution pass complete"
        );

        Ok(Resolution {
            resolved,
            distinct: nodes.len(),
        })
    }
}

async fn materialize<L, C>(
    reference: &EntityRef,
    lookup: &L,
    convert: &C,
) -> Result<NodeRef, ResolutionError>
where
    L: HostLookup + ?Sized,
    C: Converter<L::Entity> + ?Sized,
{
    let entity = lookup
        .find(&reference.id)
        .await
        .map_err(|source| ResolutionError::LookupFailed {
            id: reference.id.clone(),
            source,
        })?
        .ok_or_else(|| ResolutionError::UnresolvedReference {
            id: reference.id.clone(),
            kind: reference.kind,
        })?;

    let node = convert
        .to_object_node(&entity)
        .map_err(|source| ResolutionError::ConversionFailed {
            id: reference.id.clone(),
            source,
        })?;

    trace!(id = %reference.id, kind = node.kind(), "materialized reference");
    Ok(Arc::new(node))
}
