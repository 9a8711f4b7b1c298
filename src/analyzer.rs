// src/analyzer.rs

use crate::config::HistoryConfig;
use crate::error::{HistoryError, Result};
use crate::extractor::SourceModelExtractor;
use crate::history::{resolve_commit, CommitHistoryWalker};
use crate::model::*;
use crate::package::PackageTree;
use crate::tree::RevisionTreeWalker;
use git2::Repository;
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Answers history questions against one open repository.
///
/// Every call builds its results from scratch; nothing is cached between
/// calls.
pub struct HistoryAnalyzer<'r> {
    repo: &'r Repository,
    config: HistoryConfig,
    progress: ProgressBar,
}

impl<'r> HistoryAnalyzer<'r> {
    pub fn new(repo: &'r Repository, config: &HistoryConfig) -> Self {
        HistoryAnalyzer {
            repo,
            config: config.clone(),
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Commits that changed matching files, newest first, starting at the
    /// configured reference.
    pub fn list_commits(&self) -> Result<Vec<CommitRecord>> {
        let walker = CommitHistoryWalker::from_reference(self.repo, &self.config.reference, self.config.filter())?;
        self.progress.set_message("Scanning commits");

        let mut commits = Vec::new();
        for revision in walker {
            commits.push(CommitRecord::from_commit(&revision?.commit));
            self.progress.inc(1);
        }
        self.progress.finish_with_message("Scan complete");

        info!(reference = %self.config.reference, commits = commits.len(), "listed commits");
        Ok(commits)
    }

    /// Rebuilds the type structure of `commit`. Files that fail to parse are
    /// reported in `failures` and left out of the model.
    pub fn build_model_at(&self, commit: &str) -> Result<StructuralModel> {
        let commit = resolve_commit(self.repo, commit)?;
        let record = CommitRecord::from_commit(&commit);
        let files = RevisionTreeWalker::new(self.config.filter()).files(self.repo, &commit)?;

        self.progress.set_length(files.len() as u64);
        self.progress.set_message("Parsing sources");

        let mut extractor = SourceModelExtractor::new()?;
        let mut packages = PackageTree::new();
        let mut failures = Vec::new();

        for file in &files {
            let source = file.load()?;
            match extractor.extract(&file.path, &source) {
                Ok(types) => merge_types(&mut packages, types),
                Err(HistoryError::Parse { path, reason }) => {
                    warn!(%path, %reason, "skipping unparsable file");
                    failures.push(ParseFailure { path, reason });
                }
                Err(err) => return Err(err),
            }
            self.progress.inc(1);
        }
        self.progress.finish_with_message("Model complete");

        info!(
            commit = %record.id,
            files = files.len(),
            types = packages.len(),
            failures = failures.len(),
            "built model"
        );
        Ok(StructuralModel {
            commit: record,
            packages,
            failures,
        })
    }

    /// For every commit walked back from `commit_to` down to and including
    /// `commit_from`, records which matching paths it touched.
    ///
    /// `commit_to` must resolve. A `commit_from` that does not resolve or is
    /// not in the ancestry of `commit_to` makes the walk run to the root.
    pub fn file_history(&self, commit_from: &str, commit_to: &str) -> Result<FileHistoryIndex> {
        let to = resolve_commit(self.repo, commit_to)?;
        let boundary = match resolve_commit(self.repo, commit_from) {
            Ok(commit) => Some(commit.id()),
            Err(err) if err.is_not_found() => {
                warn!(commit_from, "boundary commit does not resolve, scanning full history");
                None
            }
            Err(err) => return Err(err),
        };

        let mut walker = CommitHistoryWalker::start_at(self.repo, to.id(), self.config.filter())?;
        if let Some(boundary) = boundary {
            walker = walker.stop_after(boundary);
        }
        self.progress.set_message("Collecting file history");

        let mut index = FileHistoryIndex::new();
        let mut reached = false;
        for revision in walker {
            let revision = revision?;
            let id = revision.commit.id();
            for path in &revision.touched {
                index.record(path, &id.to_string());
            }
            reached = boundary == Some(id);
            self.progress.inc(1);
        }
        self.progress.finish_with_message("History complete");

        if boundary.is_some() && !reached {
            debug!(commit_from, "boundary commit never yielded, walk exhausted history");
        }
        info!(commit_from, commit_to, paths = index.len(), "collected file history");
        Ok(index)
    }
}

/// Places freshly extracted types into the tree, replacing same-identity types.
fn merge_types(packages: &mut PackageTree, types: Vec<TypeElement>) {
    for element in types {
        let name = element.qualified_name();
        if packages.insert(element).is_some() {
            debug!(%name, "type declared twice, keeping the later one");
        }
    }
}

pub fn list_commits(repo: &Repository, config: &HistoryConfig) -> Result<Vec<CommitRecord>> {
    HistoryAnalyzer::new(repo, config).list_commits()
}

pub fn get_model(repo: &Repository, config: &HistoryConfig, commit: &str) -> Result<StructuralModel> {
    HistoryAnalyzer::new(repo, config).build_model_at(commit)
}

pub fn file_history(
    repo: &Repository,
    config: &HistoryConfig,
    commit_from: &str,
    commit_to: &str,
) -> Result<FileHistoryIndex> {
    HistoryAnalyzer::new(repo, config).file_history(commit_from, commit_to)
}

/// Builds one model per commit concurrently. Each worker opens its own
/// handle on the repository at `repo_path`; results follow input order.
pub fn build_models_parallel(
    repo_path: &Path,
    config: &HistoryConfig,
    commits: &[String],
    progress: ProgressBar,
) -> Vec<Result<StructuralModel>> {
    progress.set_length(commits.len() as u64);
    progress.set_message("Building models");

    let models = commits
        .par_iter()
        .progress_with(progress.clone())
        .map(|commit| {
            let repo = Repository::open(repo_path)?;
            get_model(&repo, config, commit)
        })
        .collect();

    progress.finish_with_message("Models complete");
    models
}
