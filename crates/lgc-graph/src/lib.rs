//! Turning layer group metadata into an object graph.
//!
//! The [`ReferenceResolver`] walks the references named in the metadata,
//! looks each distinct entity up once through a [`HostLookup`], converts it
//! once through a [`Converter`], and hands the same shared node to every
//! position that named it. [`assemble`] then hangs those nodes off the
//! converted layer group under the `@openings` and `@perforators` keys.
//!
//! Host access is expressed as traits only; the host document, its geometry
//! and its conversion kit live outside this crate.

pub mod assembler;
pub mod error;
pub mod host;
pub mod resolver;

pub use assembler::{assemble, read_metadata, METADATA_PROPERTY};
pub use error::{AssemblyError, ConversionError, LookupError, ResolutionError};
pub use host::{Converter, HostLookup};
pub use resolver::{ReferenceResolver, Resolution, ResolvedRef, DEFAULT_MAX_CONCURRENCY};
