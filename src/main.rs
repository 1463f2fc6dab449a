use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser as ClapParser;
use color_eyre::eyre::{Result, WrapErr};
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use tracing::info;
use tracing_subscriber::EnvFilter;

use declmap::batch;
use declmap::config::Config;
use declmap::index::{DeclarationIndex, ProjectIndex};

#[derive(ClapParser, Debug)]
#[command(name = "declmap", about = "Outline the declarations in a JavaScript/TypeScript project")]
struct Cli {
    /// Path to the project root to index.
    root: PathBuf,

    /// Config file (defaults to <ROOT>/declmap.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the index as JSON instead of an outline.
    #[arg(long)]
    json: bool,

    /// Keep running and re-index files as they change.
    #[arg(long)]
    watch: bool,

    /// Override the maximum container nesting depth.
    #[arg(long)]
    max_depth: Option<usize>,

    /// Number of files indexed in parallel.
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Debug logging (RUST_LOG takes precedence).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = cli.root.canonicalize().unwrap_or(cli.root.clone());
    let mut config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::discover(&root),
    }
    .wrap_err("failed to load configuration")?;
    if let Some(depth) = cli.max_depth {
        config.max_depth = depth;
    }
    if cli.jobs.is_some() {
        config.jobs = cli.jobs;
    }
    config.validate().wrap_err("invalid command-line option")?;

    let runtime = tokio::runtime::Runtime::new()?;
    let mut project = runtime.block_on(batch::index_project(&root, &config))?;
    print_project(&project, cli.json)?;

    if cli.watch {
        watch(&root, &config, &mut project, cli.json)?;
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "declmap=debug" } else { "declmap=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_project(project: &ProjectIndex, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(project)?);
    } else {
        dump_project(project);
    }
    Ok(())
}

/// Re-index files as they change, replacing each file's index wholesale.
fn watch(root: &Path, config: &Config, project: &mut ProjectIndex, json: bool) -> Result<()> {
    let (tx, rx) = mpsc::channel::<PathBuf>();
    let mut watcher = notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
        if let Ok(event) = res {
            if matches!(
                event.kind,
                EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
            ) {
                for path in event.paths {
                    let _ = tx.send(path);
                }
            }
        }
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    info!(root = %root.display(), "watching for changes");

    loop {
        let Ok(first) = rx.recv() else {
            break;
        };
        // Editors tend to emit bursts; collect them before re-indexing.
        let mut changed = vec![first];
        while let Ok(path) = rx.recv_timeout(Duration::from_millis(100)) {
            changed.push(path);
        }
        changed.sort();
        changed.dedup();

        if batch::refresh(project, root, config, &changed)? {
            print_project(project, json)?;
        }
    }
    Ok(())
}

fn dump_project(project: &ProjectIndex) {
    println!(
        "Project: {} ({} files, {} declarations, {} diagnostics)",
        project.root.display(),
        project.total_files(),
        project.total_declarations(),
        project.total_diagnostics(),
    );
    println!();

    for file in &project.files {
        dump_file(file);
    }
}

fn dump_file(file: &DeclarationIndex) {
    println!(
        "  {} ({}, {} lines, ~{} tokens)",
        file.path().display(),
        file.dialect(),
        file.total_lines(),
        file.total_tokens()
    );
    for (depth, decl) in file.outline() {
        let pad = " ".repeat(4 + depth * 2);
        let modifiers = if decl.modifiers.is_empty() {
            String::new()
        } else {
            format!("{} ", decl.modifiers)
        };
        println!(
            "{}{}{} {} [L{}-{}] (~{} tokens)",
            pad,
            modifiers,
            decl.kind,
            decl.name,
            decl.span.start_line,
            decl.span.end_line,
            decl.estimated_tokens,
        );
    }
    for diagnostic in file.diagnostics() {
        println!("    ! {diagnostic}");
    }
}
