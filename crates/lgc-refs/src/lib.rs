//! Commit history for layer group publishes.
//!
//! A store is partitioned into **streams**; each stream holds named
//! **branches**; each branch is an append-only list of **commits**, the
//! newest of which is the branch head. A commit records the content hash of
//! a published object graph together with a message and the tag of the
//! application that produced it.
//!
//! # Modules
//!
//! - [`error`]: [`RefError`]
//! - [`types`]: [`Commit`], [`CommitCreateInput`], [`BranchInfo`]
//! - [`traits`]: the async [`CommitService`] interface
//! - [`names`]: branch name validation
//! - [`memory`]: [`InMemoryCommitService`] for tests and embedding
//! - [`file`]: [`FileCommitService`], a JSON file on local disk

pub mod error;
pub mod file;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

mod state;

pub use error::{RefError, Result};
pub use file::FileCommitService;
pub use memory::InMemoryCommitService;
pub use names::{validate_branch_name, DEFAULT_BRANCH};
pub use traits::CommitService;
pub use types::{BranchInfo, Commit, CommitCreateInput};
