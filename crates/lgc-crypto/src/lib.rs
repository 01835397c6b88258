//! Content hashing for layer group commits.
//!
//! Every stored object is identified by a domain-separated BLAKE3 hash of its
//! canonical bytes. The hashing wraps `blake3` directly; there is no custom
//! cryptography here.

pub mod hasher;

pub use hasher::ContentHasher;
