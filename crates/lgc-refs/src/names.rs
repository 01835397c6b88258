//! Branch name rules.
//!
//! Names follow git conventions so they stay safe to use as path fragments
//! and unambiguous on the command line. Nested names (`design/level-2`) are
//! allowed.

use crate::error::{RefError, Result};

/// Branch every new stream starts with.
pub const DEFAULT_BRANCH: &str = "main";

const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

/// Validate a branch name.
///
/// ```
/// use lgc_refs::validate_branch_name;
///
/// assert!(validate_branch_name("main").is_ok());
/// assert!(validate_branch_name("design/level-2").is_ok());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> Result<()> {
    let reject = |reason: String| {
        Err(RefError::InvalidBranchName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return reject("must not be empty".into());
    }
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return reject(format!("contains forbidden character {ch:?}"));
    }
    for pattern in ["..", "@{", "//"] {
        if name.contains(pattern) {
            return reject(format!("must not contain {pattern:?}"));
        }
    }
    if name.ends_with('/') || name.ends_with('.') {
        return reject("must not end with '/' or '.'".into());
    }
    if name.ends_with(".lock") {
        return reject("must not end with '.lock'".into());
    }
    if let Some(component) = name
        .split('/')
        .find(|c| c.is_empty() || c.starts_with('.'))
    {
        return reject(format!("invalid path component {component:?}"));
    }
    Ok(())
}
