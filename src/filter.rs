// src/filter.rs

use std::path::Path;

/// Restricts traversal and diffing to paths ending with a suffix, e.g. `.java`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixFilter {
    suffix: String,
}

impl SuffixFilter {
    pub fn new(suffix: impl Into<String>) -> Self {
        SuffixFilter { suffix: suffix.into() }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn matches(&self, path: &str) -> bool {
        path.ends_with(&self.suffix)
    }

    /// Same test for paths handed out by git2 diffs. Non UTF-8 paths never match.
    pub fn matches_path(&self, path: Option<&Path>) -> bool {
        path.and_then(Path::to_str).map_or(false, |p| self.matches(p))
    }
}
