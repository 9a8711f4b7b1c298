// src/renderer.rs

use crate::cli::Format;
use crate::model::*;
use crate::package::PackageSnapshot;
use serde::Serialize;
use std::io::{self, Write};

fn json<T: Serialize>(out: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

fn kind_label(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Class => "class",
        TypeKind::Interface => "interface",
        TypeKind::Enum => "enum",
    }
}

fn commit_line(commit: &CommitRecord) -> String {
    format!(
        "{} {} {} <{}> {}",
        &commit.id[..commit.id.len().min(10)],
        commit.authored_at.format("%Y-%m-%d %H:%M"),
        commit.author_name,
        commit.author_email,
        commit.message
    )
}

pub fn render_commits(out: &mut impl Write, commits: &[CommitRecord], format: Format) -> io::Result<()> {
    match format {
        Format::Json => json(out, &commits),
        Format::Text => {
            for commit in commits {
                writeln!(out, "{}", commit_line(commit))?;
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct ModelView<'a> {
    commit: &'a CommitRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    packages: Option<PackageSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    types: Option<Vec<&'a TypeElement>>,
    failures: &'a [ParseFailure],
}

fn write_type(out: &mut impl Write, element: &TypeElement, label: &str, indent: usize) -> io::Result<()> {
    let pad = "  ".repeat(indent);
    writeln!(out, "{pad}{} {label}", kind_label(element.kind))?;
    for attribute in &element.attributes {
        writeln!(out, "{pad}  - {}: {}", attribute.name, attribute.type_name)?;
    }
    for operation in &element.operations {
        writeln!(out, "{pad}  + {}()", operation.name)?;
    }
    Ok(())
}

fn write_package(out: &mut impl Write, package: &PackageSnapshot, indent: usize) -> io::Result<()> {
    for element in &package.types {
        write_type(out, element, &element.name, indent)?;
    }
    for child in &package.packages {
        writeln!(out, "{}{}", "  ".repeat(indent), child.name)?;
        write_package(out, child, indent + 1)?;
    }
    Ok(())
}

pub fn render_model(out: &mut impl Write, model: &StructuralModel, flat: bool, format: Format) -> io::Result<()> {
    match format {
        Format::Json => {
            let view = ModelView {
                commit: &model.commit,
                packages: (!flat).then(|| model.packages.snapshot()),
                types: flat.then(|| model.types()),
                failures: &model.failures,
            };
            json(out, &view)
        }
        Format::Text => {
            writeln!(out, "{}", commit_line(&model.commit))?;
            if flat {
                for element in model.types() {
                    write_type(out, element, &element.qualified_name(), 0)?;
                }
            } else {
                write_package(out, &model.packages.snapshot(), 0)?;
            }
            for failure in &model.failures {
                writeln!(out, "! {}: {}", failure.path, failure.reason)?;
            }
            Ok(())
        }
    }
}

pub fn render_history(out: &mut impl Write, index: &FileHistoryIndex, format: Format) -> io::Result<()> {
    match format {
        Format::Json => json(out, index),
        Format::Text => {
            for (path, commits) in index.iter() {
                let short: Vec<_> = commits.iter().map(|c| &c[..c.len().min(10)]).collect();
                writeln!(out, "{path}: {}", short.join(" "))?;
            }
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub url: Option<String>,
}

pub fn render_repositories(out: &mut impl Write, repos: &[RepositoryInfo], format: Format) -> io::Result<()> {
    match format {
        Format::Json => json(out, &repos),
        Format::Text => {
            for repo in repos {
                writeln!(out, "{}\t{}", repo.name, repo.url.as_deref().unwrap_or("-"))?;
            }
            Ok(())
        }
    }
}
