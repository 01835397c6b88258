//! Layer group metadata.
//!
//! Host elements carry a JSON blob in an extensible-storage slot. This crate
//! turns that blob into a typed [`LayerGroupMetadata`] and back, and defines
//! the [`MetadataStore`] interface the host implements to hand the blob over.
//!
//! Only the `LayerGroupMetadata.PerforatorData` section is required. Every
//! other field is carried through untouched so that serializing a parsed
//! record reproduces an equivalent document.
//!
//! # Modules
//!
//! - [`error`]: [`ParseError`] and [`MetadataStoreError`]
//! - [`model`]: The typed record and its sections
//! - [`parser`]: [`parse`] and [`serialize`]
//! - [`schema`]: Storage schema constants and the [`MetadataStore`] trait

pub mod error;
pub mod model;
pub mod parser;
pub mod schema;

pub use error::{MetadataStoreError, ParseError};
pub use model::{LayerGroupMetadata, LayerGroupSection, PerforatorData};
pub use parser::{parse, serialize};
pub use schema::{MetadataStore, StorageSchema, LAYER_GROUP_SCHEMA};
