// src/config.rs

use crate::filter::SuffixFilter;

pub const DEFAULT_SUFFIX: &str = ".java";
pub const DEFAULT_REFERENCE: &str = "HEAD";

/// Settings shared by every history query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Only paths ending with this are walked, diffed and parsed
    pub suffix: String,
    /// Where `list_commits` starts
    pub reference: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            suffix: DEFAULT_SUFFIX.to_string(),
            reference: DEFAULT_REFERENCE.to_string(),
        }
    }
}

impl HistoryConfig {
    pub fn filter(&self) -> SuffixFilter {
        SuffixFilter::new(self.suffix.clone())
    }
}
