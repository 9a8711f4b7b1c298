// src/history.rs

use crate::error::{HistoryError, Result};
use crate::filter::SuffixFilter;
use git2::{Commit, DiffOptions, ErrorCode, Oid, Repository, Revwalk, Sort, Tree};
use tracing::{debug, trace};

/// Resolves a reference name, revision expression or hex identity to a commit.
pub fn resolve_commit<'r>(repo: &'r Repository, spec: &str) -> Result<Commit<'r>> {
    let object = repo.revparse_single(spec).map_err(|err| match HistoryError::from(err) {
        HistoryError::NotFound(msg) => HistoryError::NotFound(format!("{spec}: {msg}")),
        other => other,
    })?;
    object.peel_to_commit().map_err(|err| peel_error(spec, err))
}

/// Only an object of the wrong type means "no such commit"; store failures
/// keep their own class.
fn peel_error(spec: &str, err: git2::Error) -> HistoryError {
    match err.code() {
        ErrorCode::Peel | ErrorCode::InvalidSpec => {
            HistoryError::NotFound(format!("{spec} does not name a commit"))
        }
        _ => HistoryError::from(err),
    }
}

/// Matching paths that differ between `old` and `new`. A missing `old` tree
/// stands for the empty tree, so every matching path of `new` is reported.
pub fn changed_paths(
    repo: &Repository,
    old: Option<&Tree<'_>>,
    new: &Tree<'_>,
    filter: &SuffixFilter,
) -> Result<Vec<String>> {
    if old.map_or(false, |old| old.id() == new.id()) {
        return Ok(Vec::new());
    }

    let mut diff_opts = DiffOptions::new();
    diff_opts.include_untracked(false);
    diff_opts.skip_binary_check(true);

    let diff = repo.diff_tree_to_tree(old, Some(new), Some(&mut diff_opts))?;

    let mut paths = Vec::new();
    for delta in diff.deltas() {
        let old_path = delta.old_file().path();
        let new_path = delta.new_file().path();
        if !filter.matches_path(old_path) && !filter.matches_path(new_path) {
            continue;
        }
        if let Some(path) = new_path.or(old_path).and_then(|p| p.to_str()) {
            paths.push(path.to_string());
        }
    }
    Ok(paths)
}

/// A commit yielded by the walk, with the matching paths it changed
/// relative to its first parent (every matching path for a root commit).
pub struct Revision<'r> {
    pub commit: Commit<'r>,
    pub touched: Vec<String>,
}

/// Newest-first walk over the commits that changed at least one matching
/// path relative to every one of their parents.
///
/// With a boundary set, the walk ends right after the boundary commit is
/// yielded. A boundary that is never yielded means the whole history is
/// scanned.
pub struct CommitHistoryWalker<'r> {
    repo: &'r Repository,
    revwalk: Revwalk<'r>,
    filter: SuffixFilter,
    boundary: Option<Oid>,
    finished: bool,
}

impl<'r> CommitHistoryWalker<'r> {
    pub fn from_reference(repo: &'r Repository, reference: &str, filter: SuffixFilter) -> Result<Self> {
        let start = resolve_commit(repo, reference)?;
        Self::start_at(repo, start.id(), filter)
    }

    pub fn start_at(repo: &'r Repository, start: Oid, filter: SuffixFilter) -> Result<Self> {
        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push(start)?;
        debug!(start = %start, suffix = filter.suffix(), "starting commit walk");

        Ok(CommitHistoryWalker {
            repo,
            revwalk,
            filter,
            boundary: None,
            finished: false,
        })
    }

    pub fn stop_after(mut self, boundary: Oid) -> Self {
        self.boundary = Some(boundary);
        self
    }

    fn visit(&self, oid: Oid) -> Result<Option<Revision<'r>>> {
        let commit = self.repo.find_commit(oid)?;
        let tree = commit.tree()?;

        if commit.parent_count() == 0 {
            let touched = changed_paths(self.repo, None, &tree, &self.filter)?;
            return Ok((!touched.is_empty()).then_some(Revision { commit, touched }));
        }

        let first_parent = commit.parent(0)?.tree()?;
        let touched = changed_paths(self.repo, Some(&first_parent), &tree, &self.filter)?;
        if touched.is_empty() {
            return Ok(None);
        }

        // a merge that matches any one parent brings nothing new
        for i in 1..commit.parent_count() {
            let parent_tree = commit.parent(i)?.tree()?;
            if changed_paths(self.repo, Some(&parent_tree), &tree, &self.filter)?.is_empty() {
                return Ok(None);
            }
        }

        Ok(Some(Revision { commit, touched }))
    }
}

impl<'r> Iterator for CommitHistoryWalker<'r> {
    type Item = Result<Revision<'r>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let oid = match self.revwalk.next() {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(err.into()));
                }
                Some(Ok(oid)) => oid,
            };

            match self.visit(oid) {
                Ok(Some(revision)) => {
                    if self.boundary == Some(oid) {
                        debug!(commit = %oid, "reached boundary commit");
                        self.finished = true;
                    }
                    return Some(Ok(revision));
                }
                Ok(None) => trace!(commit = %oid, "no matching changes, skipped"),
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestRepo;

    fn java() -> SuffixFilter {
        SuffixFilter::new(".java")
    }

    fn ids(walker: CommitHistoryWalker<'_>) -> Vec<Oid> {
        walker.map(|rev| rev.unwrap().commit.id()).collect()
    }

    #[test]
    fn skips_commits_without_matching_changes() {
        let t = TestRepo::new();
        let c1 = t.commit(&[], &[("README.md", "hi")], "docs", 100);
        let c2 = t.commit(&[c1], &[("README.md", "hi"), ("src/A.java", "class A {}")], "add A", 200);
        let c3 = t.commit(
            &[c2],
            &[("README.md", "hello"), ("src/A.java", "class A { int x; }"), ("src/B.java", "class B {}")],
            "change A, add B",
            300,
        );

        let walker = CommitHistoryWalker::from_reference(&t.repo, "HEAD", java()).unwrap();
        assert_eq!(ids(walker), vec![c3, c2]);
    }

    #[test]
    fn unrelated_commit_in_the_middle_is_skipped() {
        let t = TestRepo::new();
        let c1 = t.commit(&[], &[("A.java", "class A {}")], "one", 100);
        let c2 = t.commit(&[c1], &[("A.java", "class A {}"), ("notes.txt", "x")], "notes", 200);
        let c3 = t.commit(&[c2], &[("A.java", "class A { void f() {} }"), ("notes.txt", "x")], "three", 300);

        let walker = CommitHistoryWalker::start_at(&t.repo, c3, java()).unwrap();
        assert_eq!(ids(walker), vec![c3, c1]);
    }

    #[test]
    fn yields_newest_first() {
        let t = TestRepo::new();
        let mut parent = t.commit(&[], &[("A.java", "class A {}")], "c0", 1_000);
        for i in 1..6 {
            let body = format!("class A {{ int f{i}; }}");
            parent = t.commit(&[parent], &[("A.java", body.as_str())], "edit", 1_000 + i * 60);
        }

        let walker = CommitHistoryWalker::from_reference(&t.repo, "HEAD", java()).unwrap();
        let times: Vec<i64> = walker.map(|rev| rev.unwrap().commit.time().seconds()).collect();
        assert_eq!(times.len(), 6);
        assert!(times.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn stops_right_after_boundary() {
        let t = TestRepo::new();
        let c1 = t.commit(&[], &[("A.java", "class A {}")], "one", 100);
        let c2 = t.commit(&[c1], &[("A.java", "class A { int a; }")], "two", 200);
        let c3 = t.commit(&[c2], &[("A.java", "class A { int b; }")], "three", 300);

        let walker = CommitHistoryWalker::start_at(&t.repo, c3, java()).unwrap().stop_after(c2);
        assert_eq!(ids(walker), vec![c3, c2]);
    }

    #[test]
    fn unreached_boundary_exhausts_history() {
        let t = TestRepo::new();
        let c1 = t.commit(&[], &[("A.java", "class A {}")], "one", 100);
        let c2 = t.commit(&[c1], &[("A.java", "class A { int a; }")], "two", 200);
        let elsewhere = t.commit(&[], &[("Z.java", "class Z {}")], "orphan", 50);
        t.repo.reference("refs/heads/main", c2, true, "reset").unwrap();

        let walker = CommitHistoryWalker::start_at(&t.repo, c2, java()).unwrap().stop_after(elsewhere);
        assert_eq!(ids(walker), vec![c2, c1]);
    }

    #[test]
    fn merge_identical_to_a_parent_is_skipped() {
        let t = TestRepo::new();
        let base = t.commit(&[], &[("A.java", "class A {}"), ("README", "a")], "base", 100);
        let feature = t.commit(&[base], &[("A.java", "class A { int x; }"), ("README", "a")], "feature", 200);
        let docs = t.commit(&[base], &[("A.java", "class A {}"), ("README", "b")], "docs", 300);
        let merge = t.commit(
            &[feature, docs],
            &[("A.java", "class A { int x; }"), ("README", "b")],
            "merge",
            400,
        );

        let walker = CommitHistoryWalker::start_at(&t.repo, merge, java()).unwrap();
        assert_eq!(ids(walker), vec![feature, base]);
    }

    #[test]
    fn merge_differing_from_both_parents_reports_first_parent_changes() {
        let t = TestRepo::new();
        let base = t.commit(&[], &[("A.java", "class A {}"), ("B.java", "class B {}")], "base", 100);
        let left = t.commit(&[base], &[("A.java", "class A { int l; }"), ("B.java", "class B {}")], "left", 200);
        let right = t.commit(&[base], &[("A.java", "class A {}"), ("B.java", "class B { int r; }")], "right", 300);
        let merge = t.commit(
            &[left, right],
            &[("A.java", "class A { int l; }"), ("B.java", "class B { int r; }")],
            "merge",
            400,
        );

        let walked: Vec<(Oid, Vec<String>)> = CommitHistoryWalker::start_at(&t.repo, merge, java())
            .unwrap()
            .map(|rev| {
                let rev = rev.unwrap();
                (rev.commit.id(), rev.touched)
            })
            .collect();

        assert_eq!(
            walked,
            vec![
                (merge, vec!["B.java".to_string()]),
                (right, vec!["B.java".to_string()]),
                (left, vec!["A.java".to_string()]),
                (base, vec!["A.java".to_string(), "B.java".to_string()]),
            ]
        );
    }

    #[test]
    fn non_commit_object_is_not_found() {
        let t = TestRepo::new();
        t.commit(&[], &[("A.java", "class A {}")], "one", 100);

        let err = resolve_commit(&t.repo, "HEAD:A.java").err().unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn peel_failures_keep_their_class() {
        let wrong_type = git2::Error::new(ErrorCode::Peel, git2::ErrorClass::Object, "not a commit");
        assert!(peel_error("x", wrong_type).is_not_found());

        let damaged = git2::Error::new(ErrorCode::GenericError, git2::ErrorClass::Zlib, "bad inflate");
        assert!(matches!(peel_error("x", damaged), HistoryError::Corrupt(_)));

        let unreadable = git2::Error::new(ErrorCode::GenericError, git2::ErrorClass::Os, "EIO");
        assert!(matches!(peel_error("x", unreadable), HistoryError::Io(_)));
    }

    #[test]
    fn touched_paths_include_deletions() {
        let t = TestRepo::new();
        let c1 = t.commit(&[], &[("A.java", "class A {}"), ("B.java", "class B {}")], "one", 100);
        let c2 = t.commit(&[c1], &[("A.java", "class A {}")], "drop B", 200);

        let mut walker = CommitHistoryWalker::start_at(&t.repo, c2, java()).unwrap();
        let newest = walker.next().unwrap().unwrap();
        assert_eq!(newest.commit.id(), c2);
        assert_eq!(newest.touched, vec!["B.java".to_string()]);

        let root = walker.next().unwrap().unwrap();
        assert_eq!(root.touched, vec!["A.java".to_string(), "B.java".to_string()]);
        assert!(walker.next().is_none());
    }

    #[test]
    fn unknown_reference_is_not_found() {
        let t = TestRepo::new();
        t.commit(&[], &[("A.java", "class A {}")], "one", 100);

        let err = CommitHistoryWalker::from_reference(&t.repo, "refs/heads/nope", java())
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }
}
