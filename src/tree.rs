// src/tree.rs

use crate::error::{HistoryError, Result};
use crate::filter::SuffixFilter;
use git2::{Commit, ObjectType, Oid, Repository, TreeWalkMode, TreeWalkResult};
use tracing::debug;

/// A matching file of one commit's snapshot. Content stays in the object
/// store until `load` is called.
#[derive(Clone)]
pub struct FileEntry<'r> {
    repo: &'r Repository,
    pub path: String,
    pub id: Oid,
}

impl<'r> FileEntry<'r> {
    pub fn load(&self) -> Result<Vec<u8>> {
        let blob = self.repo.find_blob(self.id).map_err(|err| match HistoryError::from(err) {
            HistoryError::NotFound(msg) => HistoryError::Corrupt(format!("blob of {}: {msg}", self.path)),
            other => other,
        })?;
        Ok(blob.content().to_vec())
    }
}

impl std::fmt::Debug for FileEntry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileEntry")
            .field("path", &self.path)
            .field("id", &self.id)
            .finish()
    }
}

/// Lists every file of a commit's tree whose path matches the filter.
#[derive(Debug, Clone)]
pub struct RevisionTreeWalker {
    filter: SuffixFilter,
}

impl RevisionTreeWalker {
    pub fn new(filter: SuffixFilter) -> Self {
        RevisionTreeWalker { filter }
    }

    pub fn files<'r>(&self, repo: &'r Repository, commit: &Commit<'_>) -> Result<Vec<FileEntry<'r>>> {
        let tree = commit.tree()?;
        let mut files = Vec::new();

        tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            // submodule links and subtrees are not files
            if entry.kind() != Some(ObjectType::Blob) {
                return TreeWalkResult::Ok;
            }
            if let Some(name) = entry.name() {
                let path = format!("{dir}{name}");
                if self.filter.matches(&path) {
                    files.push(FileEntry { repo, path, id: entry.id() });
                }
            }
            TreeWalkResult::Ok
        })
        .map_err(|err| match HistoryError::from(err) {
            HistoryError::NotFound(msg) => HistoryError::Corrupt(format!("tree of {}: {msg}", commit.id())),
            other => other,
        })?;

        debug!(commit = %commit.id(), files = files.len(), "enumerated matching files");
        Ok(files)
    }
}
