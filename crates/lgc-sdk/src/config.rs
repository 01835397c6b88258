use std::path::Path;

use lgc_graph::DEFAULT_MAX_CONCURRENCY;
use lgc_refs::{validate_branch_name, DEFAULT_BRANCH};
use lgc_types::{CommitId, StreamId};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MESSAGE: &str = "Commit created with lgc";
pub const DEFAULT_SOURCE_TAG: &str = "lgc";

/// Where and how a layer group is published.
///
/// ```toml
/// stream_id = "a1b2c3d4e5"
/// branch_name = "design/level-2"
/// message = "Level 2 perforations"
/// max_concurrency = 4
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    pub stream_id: StreamId,
    #[serde(default = "default_branch")]
    pub branch_name: String,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default = "default_source_tag")]
    pub source_tag: String,
    /// Upper bound on concurrent host lookups while resolving references.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Only commit if the branch head is still this commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_head: Option<CommitId>,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

fn default_source_tag() -> String {
    DEFAULT_SOURCE_TAG.to_string()
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl PublishConfig {
    /// Defaults for everything but the stream.
    pub fn new(stream_id: StreamId) -> Self {
        Self {
            stream_id,
            branch_name: default_branch(),
            message: default_message(),
            source_tag: default_source_tag(),
            max_concurrency: default_max_concurrency(),
            expected_head: None,
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch_name = branch.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source_tag(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = tag.into();
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    pub fn with_expected_head(mut self, head: CommitId) -> Self {
        self.expected_head = Some(head);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        StreamId::new(self.stream_id.as_str()).map_err(|e| ConfigError::Invalid {
            field: "stream_id",
            reason: e.to_string(),
        })?;
        validate_branch_name(&self.branch_name).map_err(|e| ConfigError::Invalid {
            field: "branch_name",
            reason: e.to_string(),
        })?;
        if self.source_tag.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "source_tag",
                reason: "must not be empty".into(),
            });
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrency",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = PublishConfig::from_toml_str(r#"stream_id = "a1b2c3""#).unwrap();
        assert_eq!(config, PublishConfig::new(StreamId::new("a1b2c3").unwrap()));
        assert_eq!(config.branch_name, "main");
        assert_eq!(config.message, "Commit created with lgc");
        assert_eq!(config.source_tag, "lgc");
        assert_eq!(config.max_concurrency, 8);
        assert!(config.expected_head.is_none());
    }

    #[test]
    fn full_toml() {
        let head = CommitId::new();
        let raw = format!(
            r#"
            stream_id = "site"
            branch_name = "design/level-2"
            message = "perforations"
            source_tag = "ci"
            max_concurrency = 2
            expected_head = "{head}"
            "#
        );
        let config = PublishConfig::from_toml_str(&raw).unwrap();
        assert_eq!(config.branch_name, "design/level-2");
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.expected_head, Some(head));
    }

    #[test]
    fn rejects_bad_values() {
        for (raw, field) in [
            ("stream_id = \"\"", "stream_id"),
            ("stream_id = \"s\"\nbranch_name = \"a..b\"", "branch_name"),
            ("stream_id = \"s\"\nsource_tag = \" \"", "source_tag"),
            ("stream_id = \"s\"\nmax_concurrency = 0", "max_concurrency"),
        ] {
            match PublishConfig::from_toml_str(raw) {
                Err(ConfigError::Invalid { field: got, .. }) => assert_eq!(got, field),
                other => panic!("{raw:?}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn syntax_errors_and_missing_stream() {
        assert!(matches!(
            PublishConfig::from_toml_str("stream_id = "),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            PublishConfig::from_toml_str("branch_name = \"main\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reports_the_path() {
        let err = PublishConfig::load(Path::new("/nonexistent/lgc.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/lgc.toml"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lgc.toml");
        std::fs::write(&path, "stream_id = \"from-file\"\nmessage = \"hi\"\n").unwrap();
        let config = PublishConfig::load(&path).unwrap();
        assert_eq!(config.stream_id.as_str(), "from-file");
        assert_eq!(config.message, "hi");
    }
}
