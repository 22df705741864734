//! tree-walk - list the entries of a git tree, optionally across submodules
//!
//! # Usage
//! ```bash
//! tree-walk                                   # HEAD of the current repository
//! tree-walk /path/to/repo --rev v1.0 -- src/  # one subtree at a tag
//! tree-walk --recurse-submodules --json       # everything, as JSON
//! ```

use std::process;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tree_walk::TreeError;
use tree_walk::git::{DepthMode, GitRepository, Listing, PathspecSet, RepoContext, read_tree};

/// List the entries of a git tree in stored order
#[derive(Parser)]
#[command(name = "tree-walk")]
#[command(about = "Pathspec-filtered listing of git trees", long_about = None)]
struct Cli {
    /// Path to the git repository
    #[arg(value_name = "REPO_PATH", default_value = ".")]
    repo_path: String,

    /// Revision whose tree is listed
    #[arg(long, default_value = "HEAD")]
    rev: String,

    /// Follow gitlinks into checked out submodules
    #[arg(long)]
    recurse_submodules: bool,

    /// Maximum tree depth (defaults to core.maxTreeDepth, then 2048)
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Count depth across nested trees instead of per call
    #[arg(long)]
    strict_depth: bool,

    /// Only list the top-level tree
    #[arg(long)]
    shallow: bool,

    /// Print JSON instead of ls-tree style lines
    #[arg(long)]
    json: bool,

    /// Limit the listing to these paths
    #[arg(last = true, value_name = "PATHSPEC")]
    pathspec: Vec<String>,
}

fn run(cli: &Cli) -> Result<(), TreeError> {
    let repo = GitRepository::open(&cli.repo_path)?;
    let start = repo.resolve_rev(&cli.rev)?;

    let mut context = RepoContext::new(Box::new(repo));
    let mut options = *context.options();
    if let Some(depth) = cli.max_depth {
        options.max_tree_depth = depth;
    }
    if cli.strict_depth {
        options.depth_mode = DepthMode::Cumulative;
    }
    context = context.with_options(options);
    if let Err(e) = context.read_index() {
        tracing::warn!("Failed to read index: {}", e);
    }

    let pathspec = PathspecSet::new(&cli.pathspec)?.with_recurse_submodules(cli.recurse_submodules);
    let tree = context.parse_tree_indirect(start)?;
    tracing::info!("Listing tree {} of {}", tree.borrow().id(), cli.rev);

    let mut listing = Listing::new(!cli.shallow);
    read_tree(&context, &tree, &pathspec, &mut listing)?;

    let entries = listing.into_entries();
    if cli.json {
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| TreeError::Internal(e.to_string()))?;
        println!("{}", json);
    } else {
        for entry in &entries {
            println!("{}", entry.to_line());
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli) {
        Ok(()) => Ok(()),
        Err(e) if e.is_fatal() => {
            eprintln!("fatal: {}", e);
            process::exit(128);
        }
        Err(e) => Err(e.into()),
    }
}
