// src/testutil.rs

use git2::{Oid, Repository, Signature, Time};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Throwaway repository whose commits are built from full file snapshots.
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        TestRepo { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Commits exactly `files` as the tree content, with the given parents
    /// and commit time in seconds. `refs/heads/main` is moved to the result.
    pub fn commit(&self, parents: &[Oid], files: &[(&str, &str)], message: &str, time: i64) -> Oid {
        let mut index = self.repo.index().unwrap();
        index.clear().unwrap();
        for (path, content) in files {
            let full = self.dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(&full, content).unwrap();
            index.add_path(Path::new(path)).unwrap();
        }
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let sig = Signature::new("Tester", "tester@example.com", &Time::new(time, 0)).unwrap();
        let parents: Vec<_> = parents.iter().map(|id| self.repo.find_commit(*id).unwrap()).collect();
        let parent_refs: Vec<_> = parents.iter().collect();
        let oid = self
            .repo
            .commit(None, &sig, &sig, message, &tree, &parent_refs)
            .unwrap();

        self.repo.reference("refs/heads/main", oid, true, "test").unwrap();
        self.repo.set_head("refs/heads/main").unwrap();
        oid
    }
}
