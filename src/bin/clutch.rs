//! clutch CLI — operator interface to the description engine.

use chrono::Utc;
use clap::{Parser, Subcommand};
use clutch::adapter::ClaudeCli;
use clutch::config::{Config, MAX_WORKERS, MIN_WORKERS};
use clutch::engine::{Pool, PoolConfig, progress};
use clutch::error::Error;
use clutch::project::{self, Project, ProjectMetadata};
use clutch::telemetry::init_logging;
use std::path::Path;
use std::process::Stdio;
use tracing::warn;

#[derive(Parser)]
#[command(name = "clutch", version, about = "AI-powered file description generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a new repository for processing
    Init {
        /// Git URL of the repository to clone
        repo_url: String,
    },
    /// Process files with AI workers
    Run {
        /// Project name (optional when only one project exists)
        project: Option<String>,
        /// Concurrent workers
        #[arg(long, short, default_value_t = 20,
              value_parser = clap::value_parser!(u64).range(MIN_WORKERS as u64..=MAX_WORKERS as u64))]
        workers: u64,
    },
    /// Show all projects and their progress
    #[command(alias = "list")]
    Status,
    /// Remove clutch data (and the installed binary) from this machine
    Uninstall {
        /// Actually delete; without this flag only prints what would go
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging()?;
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Init { repo_url } => cmd_init(&config, &repo_url).await,
        Command::Run { project, workers } => cmd_run(&config, project, workers as usize).await,
        Command::Status => cmd_status(&config).await,
        Command::Uninstall { yes } => cmd_uninstall(&config, yes).await,
    }
}

async fn cmd_init(config: &Config, repo_url: &str) -> anyhow::Result<()> {
    let repo_name = project::repo_name_from_url(repo_url);
    let repo_dir = config.repos_dir().join(&repo_name);
    let proj = Project::new(&config.projects_dir(), &repo_name);

    println!("Initializing {repo_name} from {repo_url}");

    tokio::fs::create_dir_all(config.repos_dir()).await?;
    tokio::fs::create_dir_all(proj.dir()).await?;

    if repo_dir.is_dir() {
        println!("Using existing clone at {}", repo_dir.display());
    } else {
        let status = tokio::process::Command::new("git")
            .arg("clone")
            .arg(repo_url)
            .arg(&repo_dir)
            .status()
            .await?;
        if !status.success() {
            anyhow::bail!("git clone failed with status {}", status.code().unwrap_or(-1));
        }
        println!("Repository cloned");
    }

    let items = project::discover_files(&repo_dir)?;
    proj.write_items(&items).await?;
    println!("Found {} files", items.len());

    let (total_loc, stats) = project::count_lines(&items).await;
    tokio::fs::write(proj.stats_path(), stats.join("\n")).await?;
    println!("Total lines: {total_loc}");

    if let Err(e) = generate_context(config, &repo_dir, &proj.context_path()).await {
        warn!("context generation skipped: {e}");
    } else {
        println!("Project context generated");
    }

    // The ledger and sink exist from day one, empty.
    tokio::fs::write(proj.ledger_path(), "").await?;
    tokio::fs::write(proj.sink_path(), "").await?;

    proj.write_metadata(&ProjectMetadata {
        repo_name: repo_name.clone(),
        repo_url: repo_url.to_string(),
        total_files: items.len(),
        total_loc,
        init_date: Utc::now(),
    })
    .await?;

    println!();
    println!("Initialization complete");
    println!("Next: clutch run {repo_name}");
    Ok(())
}

/// Best-effort: ask the AI CLI for a repository overview document.
async fn generate_context(config: &Config, repo_dir: &Path, out: &Path) -> anyhow::Result<()> {
    let prompt = format!(
        "Analyze the repository at {} and write {} containing: project \
         purpose, architecture, technologies, repository structure, and \
         main features. Then exit.",
        repo_dir.display(),
        out.display()
    );
    let status = tokio::process::Command::new(&config.claude_bin)
        .arg("--dangerously-skip-permissions")
        .arg("-p")
        .arg(&prompt)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;
    if !status.success() {
        anyhow::bail!("exited with status {}", status.code().unwrap_or(-1));
    }
    Ok(())
}

async fn cmd_run(config: &Config, name: Option<String>, workers: usize) -> anyhow::Result<()> {
    let proj = resolve_project(config, name).await?;
    let metadata = proj.load_metadata().await?;
    let items = proj.load_items().await?;

    let snap = progress::observe(&proj.ledger_path(), items.len()).await?;
    println!(
        "Progress: {}% ({}/{} files, {} remaining)",
        snap.percentage, snap.completed, snap.total, snap.remaining
    );

    if snap.is_done() {
        println!("All files processed");
        return Ok(());
    }

    println!("Starting {workers} workers on {}", metadata.repo_name);

    let processor = ClaudeCli::new(&config.claude_bin, config.timeout)
        .with_context(&proj.context_path());
    let pool = Pool::new(
        processor,
        PoolConfig {
            workers,
            ..PoolConfig::default()
        },
    )?;
    let summary = pool
        .run(&items, &proj.ledger_path(), &proj.sink_path())
        .await?;

    println!();
    println!(
        "Run finished: {} processed, {} remaining, {} errors",
        summary.processed, summary.remaining, summary.errors
    );
    if summary.errors > 0 {
        // Not a failing exit: re-running retries only the still-pending items.
        println!("Re-run `clutch run {}` to retry failed files", metadata.repo_name);
    } else {
        println!("Output: {}", proj.sink_path().display());
    }
    Ok(())
}

async fn resolve_project(config: &Config, name: Option<String>) -> anyhow::Result<Project> {
    let projects_dir = config.projects_dir();
    if let Some(name) = name {
        let proj = Project::new(&projects_dir, &name);
        if !proj.exists() {
            return Err(Error::ProjectNotFound(name).into());
        }
        return Ok(proj);
    }

    let mut projects = project::list_projects(&projects_dir).await?;
    match projects.len() {
        0 => anyhow::bail!("no projects found — initialize one first: clutch init <repo-url>"),
        1 => Ok(projects.remove(0)),
        _ => {
            let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
            anyhow::bail!(
                "multiple projects found, name one: clutch run <project>\n  candidates: {}",
                names.join(", ")
            )
        }
    }
}

async fn cmd_status(config: &Config) -> anyhow::Result<()> {
    let projects = project::list_projects(&config.projects_dir()).await?;

    if projects.is_empty() {
        println!("No projects initialized");
        println!("Initialize one: clutch init <repo-url>");
        return Ok(());
    }

    println!("Projects");
    for proj in &projects {
        let Ok(metadata) = proj.load_metadata().await else {
            continue;
        };
        let Ok(snap) = progress::observe(&proj.ledger_path(), metadata.total_files).await else {
            continue;
        };
        let icon = if snap.is_done() {
            '✓'
        } else if snap.completed == 0 {
            '○'
        } else {
            '⋯'
        };
        println!(
            " {icon} {:<30} {:>3}% complete ({}/{} files)",
            proj.name, snap.percentage, snap.completed, snap.total
        );
    }
    Ok(())
}

async fn cmd_uninstall(config: &Config, yes: bool) -> anyhow::Result<()> {
    let bin_path = dirs::home_dir()
        .map(|home| home.join(".local").join("bin").join("clutch"));

    if !yes {
        println!("Would remove:");
        if let Some(ref bin) = bin_path {
            println!("  {}", bin.display());
        }
        println!("  {}", config.base_dir.display());
        println!("Pass --yes to delete");
        return Ok(());
    }

    if let Some(bin) = bin_path {
        if let Err(e) = tokio::fs::remove_file(&bin).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("could not remove {}: {e}", bin.display());
            }
        }
    }
    if let Err(e) = tokio::fs::remove_dir_all(&config.base_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("could not remove {}: {e}", config.base_dir.display());
        }
    }

    println!("clutch uninstalled");
    Ok(())
}
