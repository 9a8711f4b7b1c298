// src/main.rs

use anyhow::{bail, Context};
use clap::Parser;
use git2::Repository;
use history_model::cli::{Args, Command};
use history_model::registry::RepositoryRegistry;
use history_model::renderer::{self, RepositoryInfo};
use history_model::{analyzer, logging, HistoryAnalyzer};
use indicatif::ProgressBar;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

fn progress(args: &Args) -> ProgressBar {
    if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    }
}

fn repositories(registry: &RepositoryRegistry) -> anyhow::Result<Vec<RepositoryInfo>> {
    registry
        .names()
        .map(|name| {
            Ok(RepositoryInfo {
                name: name.to_string(),
                url: registry.origin_url(name)?,
            })
        })
        .collect()
}

fn query(repo: &Repository, args: &Args, out: &mut impl Write) -> anyhow::Result<()> {
    let config = args.config();
    let analysis = || HistoryAnalyzer::new(repo, &config).with_progress(progress(args));
    match &args.command {
        Command::Commits => {
            let commits = analysis().list_commits()?;
            renderer::render_commits(out, &commits, args.format)?;
        }
        Command::Model { commit, flat } => {
            let model = analysis()
                .build_model_at(commit)
                .with_context(|| format!("building model at {commit}"))?;
            renderer::render_model(out, &model, *flat, args.format)?;
        }
        Command::Models { commits, flat } => {
            let path: PathBuf = repo.path().to_path_buf();
            for (commit, model) in commits
                .iter()
                .zip(analyzer::build_models_parallel(&path, &config, commits, progress(args)))
            {
                let model = model.with_context(|| format!("building model at {commit}"))?;
                renderer::render_model(out, &model, *flat, args.format)?;
            }
        }
        Command::History { from, to } => {
            let index = analysis()
                .file_history(from, to)
                .with_context(|| format!("collecting file history {from}..{to}"))?;
            renderer::render_history(out, &index, args.format)?;
        }
        // listed before any repository is opened
        Command::Repos => {}
    }
    Ok(())
}

fn run(args: &Args) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let registry = match &args.registry {
        Some(root) => Some(
            RepositoryRegistry::open(root)
                .with_context(|| format!("opening repository registry {}", root.display()))?,
        ),
        None => None,
    };

    if args.command == Command::Repos {
        let Some(registry) = registry else {
            bail!("`repos` needs --registry");
        };
        renderer::render_repositories(&mut out, &repositories(&registry)?, args.format)?;
        registry.close();
        return Ok(());
    }

    let opened;
    let repo: &Repository = match (&registry, &args.repo, &args.name) {
        (Some(registry), _, Some(name)) => registry.get(name)?,
        (Some(_), _, None) => bail!("--registry needs --name"),
        (None, Some(path), _) => {
            opened = Repository::open(path).with_context(|| format!("opening repository {}", path.display()))?;
            &opened
        }
        (None, None, _) => bail!("either --repo or --registry with --name is required"),
    };

    query(repo, args, &mut out)?;
    out.flush()?;

    if let Some(registry) = registry {
        registry.close();
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, args.log_format).context("installing log subscriber")?;

    let start_time = Instant::now();
    let result = run(&args);
    info!("Total time: {:.2?}", start_time.elapsed());
    result
}
