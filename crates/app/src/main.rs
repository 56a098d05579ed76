use anyhow::{bail, Result};
use clap::Parser;
use repofresh::adapters::discovery::FsDiscovery;
use repofresh::adapters::git::GitCommandClient;
use repofresh::cli::CliArgs;
use repofresh::config::Config;
use repofresh::services::engine::EngineService;
use repofresh_core::app::Command;
use repofresh_core::domain::{Event, OpKind, OpOutcome};
use repofresh_core::parse::{classify_pull_result, PullTone};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with env filter
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let op: Option<OpKind> = args.op.map(Into::into);
    let config = Config::from_cli_and_file(args, None)?;

    let git = GitCommandClient::new(&config);
    if !git.git_available().await {
        bail!("git binary not found on PATH");
    }

    let base = config.scan_dir.clone();
    info!("starting repofresh, scanning {}", base.display());

    let discovery = FsDiscovery::with_timeout(config.timeouts.default_timeout());
    let (mut engine, mut events, commands) =
        EngineService::new(Arc::new(git), Arc::new(discovery));

    // One-shot mode: print each repository as its snapshot lands, run
    // the requested operation everywhere, quit once everything is idle.
    let printer = tokio::spawn(async move {
        let mut repos = 0usize;
        let mut pending = 0usize;
        while let Some(event) = events.recv().await {
            match event {
                Event::SnapshotReplaced { repo, .. } => {
                    println!(
                        "{:<28} {:<24} {:<14} {}",
                        repo.name, repo.branch, repo.local, repo.remote
                    );
                }
                Event::ScanCompleted => match op {
                    Some(op) if repos > 0 => {
                        pending = repos;
                        let _ = commands.send(Command::DispatchAll { op });
                    }
                    _ => {
                        let _ = commands.send(Command::Quit);
                    }
                },
                Event::RepoDiscovered { .. } => repos += 1,
                Event::ProgressLine { id, line } => info!("{id}: {line}"),
                Event::OperationComplete { id, outcome, .. } => {
                    println!("{id}: {}", describe_outcome(&outcome));
                    pending = pending.saturating_sub(1);
                    if pending == 0 {
                        let _ = commands.send(Command::Quit);
                    }
                }
                Event::Error { id, message } => match id {
                    Some(id) => eprintln!("{id}: {message}"),
                    None => eprintln!("{message}"),
                },
                Event::OperationStarted { .. } => {}
            }
        }
    });

    engine.run(base).await?;
    printer.abort();
    Ok(())
}

fn describe_outcome(outcome: &OpOutcome) -> String {
    match outcome.op {
        OpKind::Pull => {
            let tone = classify_pull_result(
                outcome.last_line.as_deref().unwrap_or_default(),
                outcome.exit_code,
            );
            let label = match tone {
                PullTone::UpToDate => "already up to date",
                PullTone::Success => "pulled",
                PullTone::Warning => "pull finished with warnings",
                PullTone::Error => "pull failed",
            };
            match &outcome.last_line {
                Some(line) => format!("{label} ({line})"),
                None => label.to_string(),
            }
        }
        OpKind::Prune => {
            if outcome.succeeded() {
                format!("pruned {} branch(es)", outcome.deleted)
            } else {
                "prune failed".to_string()
            }
        }
        OpKind::Refresh => {
            if outcome.succeeded() {
                "refreshed".to_string()
            } else {
                match &outcome.last_line {
                    Some(line) => format!("refresh failed ({line})"),
                    None => "refresh failed".to_string(),
                }
            }
        }
    }
}
