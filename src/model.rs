// src/model.rs

use crate::package::PackageTree;
use chrono::{DateTime, TimeZone, Utc};
use git2::Commit;
use serde::Serialize;
use std::collections::BTreeMap;

/// Hex identity of a commit
pub type CommitId = String;

/// Metadata of one commit, read once from the object store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub id: CommitId,
    pub author_name: String,
    pub author_email: String,
    pub authored_at: DateTime<Utc>,
    pub message: String,
}

impl CommitRecord {
    pub fn from_commit(commit: &Commit<'_>) -> Self {
        let author = commit.author();
        let seconds = author.when().seconds();
        CommitRecord {
            id: commit.id().to_string(),
            author_name: author.name().unwrap_or("Unknown").to_string(),
            author_email: author.email().unwrap_or_default().to_string(),
            authored_at: Utc
                .timestamp_opt(seconds, 0)
                .single()
                .unwrap_or_default(),
            message: commit.summary().unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeElement {
    pub name: String,
    /// Declared type exactly as written in source
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationElement {
    pub name: String,
}

/// A type declaration found in one source file.
///
/// Identity is `(package, name)`. Enums never carry members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeElement {
    pub kind: TypeKind,
    pub name: String,
    pub package: String,
    pub attributes: Vec<AttributeElement>,
    pub operations: Vec<OperationElement>,
}

impl TypeElement {
    pub fn new(kind: TypeKind, name: impl Into<String>, package: impl Into<String>) -> Self {
        TypeElement {
            kind,
            name: name.into(),
            package: package.into(),
            attributes: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }
}

/// A file that was left out of a model because it could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    pub path: String,
    pub reason: String,
}

/// The type structure of one commit's source snapshot
#[derive(Debug, Clone)]
pub struct StructuralModel {
    pub commit: CommitRecord,
    pub packages: PackageTree,
    pub failures: Vec<ParseFailure>,
}

impl StructuralModel {
    /// Flat view of every type, in package-tree order.
    pub fn types(&self) -> Vec<&TypeElement> {
        self.packages.types()
    }

    pub fn into_flat(self) -> Vec<TypeElement> {
        self.packages.into_types()
    }
}

/// Maps a file path to the commits that touched it, in walk order (newest first)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileHistoryIndex {
    entries: BTreeMap<String, Vec<CommitId>>,
}

impl FileHistoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: &str, commit: &str) {
        let history = self.entries.entry(path.to_string()).or_default();
        if history.last().map(String::as_str) != Some(commit) {
            history.push(commit.to_string());
        }
    }

    pub fn get(&self, path: &str) -> Option<&[CommitId]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CommitId])> {
        self.entries
            .iter()
            .map(|(path, commits)| (path.as_str(), commits.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_index_keeps_walk_order() {
        let mut index = FileHistoryIndex::new();
        index.record("src/A.java", "c3");
        index.record("src/B.java", "c3");
        index.record("src/A.java", "c2");

        assert_eq!(index.get("src/A.java"), Some(&["c3".to_string(), "c2".to_string()][..]));
        assert_eq!(index.get("src/B.java"), Some(&["c3".to_string()][..]));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn history_index_ignores_repeated_commit() {
        let mut index = FileHistoryIndex::new();
        index.record("A.java", "c1");
        index.record("A.java", "c1");
        assert_eq!(index.get("A.java").map(<[_]>::len), Some(1));
    }

    #[test]
    fn qualified_name_skips_empty_package() {
        let element = TypeElement::new(TypeKind::Class, "Foo", "");
        assert_eq!(element.qualified_name(), "Foo");
        let element = TypeElement::new(TypeKind::Enum, "Color", "com.x");
        assert_eq!(element.qualified_name(), "com.x.Color");
    }
}
