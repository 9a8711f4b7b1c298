// src/lib.rs

//! Rebuilds the package/type structure of a Java codebase as it was at any
//! commit of its git history, and tracks which commits touched which source
//! files between two points in that history.
//!
//! ```ignore
//! let repo = git2::Repository::open("repo.git")?;
//! let config = HistoryConfig::default();
//! let commits = analyzer::list_commits(&repo, &config)?;
//! let model = analyzer::get_model(&repo, &config, &commits[0].id)?;
//! let index = analyzer::file_history(&repo, &config, &commits[1].id, &commits[0].id)?;
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod history;
pub mod logging;
pub mod model;
pub mod package;
pub mod registry;
pub mod renderer;
pub mod tree;

#[cfg(test)]
pub(crate) mod testutil;

pub use analyzer::HistoryAnalyzer;
pub use config::HistoryConfig;
pub use error::{HistoryError, Result};
pub use model::{CommitRecord, FileHistoryIndex, StructuralModel, TypeElement, TypeKind};
pub use package::PackageTree;
