mod domain;
mod repo;
mod usecase;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use domain::tree::ScopedOwnersTree;
use repo::CodeHost;
use repo::github::{GithubHost, auth};
use repo::memory::InMemoryHost;
use usecase::notify::OwnersNotifier;

#[derive(Parser, Debug)]
#[command(author, version, about = "ownerbot — owners review requests and notifications for a PR", long_about = None)]
struct Args {
    /// Repository owner (user or organization)
    #[arg(long)]
    owner: String,

    /// Repository name
    #[arg(long)]
    repo: String,

    /// Pull request number
    #[arg(long)]
    pr: u64,

    /// Path to the JSON ownership definition
    #[arg(long, default_value = "owners.json")]
    owners_file: std::path::PathBuf,

    /// Suggested reviewer username (repeatable), from the external
    /// reviewer-selection step
    #[arg(long = "reviewer")]
    reviewers: Vec<String>,

    /// Opt-out mode: request reviews unless the PR description opts out
    /// (default comes from env ADD_REVIEWERS_OPT_OUT)
    #[arg(long, default_value_t = false)]
    opt_out_mode: bool,

    /// Record effects in memory and log them instead of calling GitHub
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let opt_out_mode = args.opt_out_mode || opt_out_from_env();

    let token = auth::resolve_github_token()?;
    let tree = ScopedOwnersTree::from_path(&args.owners_file)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to build tokio runtime: {e}"))?;
    rt.block_on(run(args, tree, token, opt_out_mode))
}

async fn run(args: Args, tree: ScopedOwnersTree, token: String, opt_out_mode: bool) -> Result<()> {
    let github = GithubHost::new(
        token,
        api_base_from_env(),
        args.owner.clone(),
        args.repo.clone(),
    )?;

    let snapshot = github.pull_request_snapshot(args.pr).await?;
    info!(
        pr = args.pr,
        author = %snapshot.pr.author,
        files = snapshot.changed_files.len(),
        "loaded pull request snapshot"
    );

    let memory = InMemoryHost::default();
    let host: &dyn CodeHost = if args.dry_run { &memory } else { &github };

    let mut notifier = OwnersNotifier::new(
        snapshot.pr,
        snapshot.current_reviewers,
        &tree,
        &snapshot.changed_files,
        opt_out_mode,
    );
    let outcome = notifier.notify(host, &args.reviewers).await?;

    info!(
        requested = ?outcome.requested_reviewers,
        notified_owners = outcome.notified.len(),
        "notification cycle complete"
    );

    if args.dry_run {
        for (pr_number, usernames) in memory.review_requests() {
            info!(pr = pr_number, reviewers = ?usernames, "dry-run: would request reviews");
        }
        for comment in memory.comments(args.pr) {
            info!(comment = %comment.body, "dry-run: would post notification comment");
        }
    }
    Ok(())
}

fn opt_out_from_env() -> bool {
    std::env::var("ADD_REVIEWERS_OPT_OUT").is_ok_and(|v| !v.trim().is_empty())
}

fn api_base_from_env() -> Option<String> {
    std::env::var("GITHUB_API_URL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
