use std::fmt;
use std::path::PathBuf;

use lgc_graph::{AssemblyError, ResolutionError};
use lgc_metadata::{MetadataStoreError, ParseError};
use lgc_refs::RefError;
use lgc_store::TransportError;
use lgc_types::ObjectId;
use thiserror::Error;

/// Failure of a publish after the graph was built.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Uploading the graph failed; no commit was attempted.
    #[error("upload failed: {0}")]
    TransportFailure(#[source] TransportError),

    /// The graph was uploaded but commit-create failed; the branch did not
    /// move.
    #[error("commit-create for {object} failed: {source}")]
    CommitFailure {
        object: ObjectId,
        #[source]
        source: RefError,
    },
}

/// Step of a publish pipeline, used to say where an error happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Building the runtime for a blocking publish.
    Setup,
    ReadMetadata,
    Parse,
    Resolve,
    Assemble,
    Send,
    Commit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "setup",
            Self::ReadMetadata => "read-metadata",
            Self::Parse => "parse",
            Self::Resolve => "resolve",
            Self::Assemble => "assemble",
            Self::Send => "send",
            Self::Commit => "commit",
        })
    }
}

/// The single terminal error of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("element carries no layer group metadata")]
    MetadataAbsent,

    #[error("reading metadata failed: {0}")]
    Metadata(#[from] MetadataStoreError),

    #[error("invalid metadata: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Conversion(#[from] AssemblyError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Cancellation observed before upload started.
    #[error("cancelled during {stage}")]
    Cancelled { stage: Stage },

    #[error("cannot start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::MetadataAbsent | Self::Metadata(_) => Stage::ReadMetadata,
            Self::Parse(_) => Stage::Parse,
            Self::Resolution(_) => Stage::Resolve,
            Self::Conversion(_) => Stage::Assemble,
            Self::Publish(PublishError::TransportFailure(_)) => Stage::Send,
            Self::Publish(PublishError::CommitFailure { .. }) => Stage::Commit,
            Self::Cancelled { stage } => *stage,
            Self::Runtime(_) => Stage::Setup,
        }
    }
}

/// Errors loading or validating a [`PublishConfig`](crate::PublishConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(String),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors from the receive path.
#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error(transparent)]
    Ref(#[from] RefError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
