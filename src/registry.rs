// src/registry.rs

use crate::error::{HistoryError, Result};
use git2::Repository;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Named repositories found under one directory, opened once and handed
/// out by reference.
pub struct RepositoryRegistry {
    root: PathBuf,
    repositories: BTreeMap<String, Repository>,
}

impl RepositoryRegistry {
    /// Opens every git repository (bare or not) directly below `root`.
    /// Entries that are not repositories are skipped.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut repositories = BTreeMap::new();

        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!(path = %entry.path().display(), "skipping non UTF-8 directory name");
                continue;
            };
            match Repository::open(entry.path()) {
                Ok(repo) => {
                    debug!(%name, "registered repository");
                    repositories.insert(name, repo);
                }
                Err(err) => warn!(%name, error = %err, "not a repository, skipping"),
            }
        }

        info!(root = %root.display(), count = repositories.len(), "opened repository registry");
        Ok(RepositoryRegistry { root, repositories })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, name: &str) -> Result<&Repository> {
        self.repositories
            .get(name)
            .ok_or_else(|| HistoryError::NotFound(format!("repository {name}")))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.repositories.keys().map(String::as_str)
    }

    /// `remote.origin.url` of the repository, when configured
    pub fn origin_url(&self, name: &str) -> Result<Option<String>> {
        let config = self.get(name)?.config()?;
        match config.get_string("remote.origin.url") {
            Ok(url) => Ok(Some(url)),
            Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn close(self) {
        info!(root = %self.root.display(), count = self.repositories.len(), "closing repository registry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_repositories_and_skips_other_dirs() {
        let root = tempfile::tempdir().unwrap();
        Repository::init(root.path().join("alpha")).unwrap();
        Repository::init_bare(root.path().join("beta")).unwrap();
        fs::create_dir(root.path().join("plain")).unwrap();
        fs::write(root.path().join("file.txt"), "x").unwrap();

        let registry = RepositoryRegistry::open(root.path()).unwrap();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert!(registry.get("beta").unwrap().is_bare());
        registry.close();
    }

    #[test]
    fn unknown_name_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let registry = RepositoryRegistry::open(root.path()).unwrap();
        assert!(registry.get("missing").err().unwrap().is_not_found());
    }

    #[test]
    fn reports_origin_url() {
        let root = tempfile::tempdir().unwrap();
        let repo = Repository::init(root.path().join("proj")).unwrap();
        repo.remote("origin", "https://example.com/proj.git").unwrap();
        Repository::init(root.path().join("local")).unwrap();

        let registry = RepositoryRegistry::open(root.path()).unwrap();
        assert_eq!(registry.origin_url("local").unwrap(), None);
        assert_eq!(
            registry.origin_url("proj").unwrap().as_deref(),
            Some("https://example.com/proj.git")
        );
    }
}
