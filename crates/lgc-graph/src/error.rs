use lgc_types::{EntityId, RefKind};
use thiserror::Error;

/// Failure of the host lookup itself (as opposed to "not found").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("host document unavailable: {0}")]
    Unavailable(String),
}

/// Failure to map a host entity to an object node.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("unsupported entity category: {0}")]
    Unsupported(String),

    #[error("conversion failed: {0}")]
    Failed(String),
}

/// Errors from a resolution pass. Any error aborts the whole pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// A referenced entity does not exist in the host document.
    #[error("unresolved {kind} reference: {id}")]
    UnresolvedReference { id: EntityId, kind: RefKind },

    #[error("lookup of {id} failed: {source}")]
    LookupFailed {
        id: EntityId,
        #[source]
        source: LookupError,
    },

    #[error("conversion of {id} failed: {source}")]
    ConversionFailed {
        id: EntityId,
        #[source]
        source: ConversionError,
    },
}

impl ResolutionError {
    /// The identifier the failure is about.
    pub fn entity_id(&self) -> &EntityId {
        match self {
            Self::UnresolvedReference { id, .. }
            | Self::LookupFailed { id, .. }
            | Self::ConversionFailed { id, .. } => id,
        }
    }
}

/// Errors from assembling the root node.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("root conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("metadata serialization failed: {0}")]
    Metadata(String),
}
