use anyhow::{bail, Result};
use async_trait::async_trait;
use repofresh_core::domain::{
    Branch, LocalState, RemoteState, Repository, PRUNE_DELETED_PREFIX, PRUNE_FAILED_PREFIX,
};
use repofresh_core::parse;
use repofresh_core::ports::GitPort;
use std::path::Path;
use tokio::sync::mpsc;

use crate::adapters::process::ProcessRunner;
use crate::config::Config;

/// GitPort implementation that shells out to the git binary, one
/// subprocess per query, working directory set to the repository.
pub struct GitCommandClient {
    runner: ProcessRunner,
    fetch_runner: ProcessRunner,
    pull_runner: ProcessRunner,
    protected_branches: Vec<String>,
}

impl GitCommandClient {
    pub fn new(config: &Config) -> Self {
        Self {
            runner: ProcessRunner::git(config.timeouts.default_timeout()),
            fetch_runner: ProcessRunner::git(config.timeouts.fetch_timeout()),
            pull_runner: ProcessRunner::git(config.timeouts.pull_timeout()),
            protected_branches: config.protected_branches.clone(),
        }
    }

    /// Probe for a usable git binary. Checked once before the engine
    /// is constructed; a missing binary is the one fatal condition.
    pub async fn git_available(&self) -> bool {
        self.runner
            .run(Path::new("."), &["--version"])
            .await
            .map(|out| out.success())
            .unwrap_or(false)
    }

    async fn local_state(&self, path: &Path) -> LocalState {
        match self.runner.run(path, &["status", "--porcelain=v2"]).await {
            Ok(out) if out.success() => parse::local_state(&out.stdout),
            Ok(out) => LocalState::Error {
                message: first_error_line(&out.stderr),
            },
            Err(err) => LocalState::Error {
                message: err.to_string(),
            },
        }
    }

    async fn remote_state(&self, path: &Path) -> RemoteState {
        match self
            .runner
            .run(path, &["rev-list", "--left-right", "--count", "HEAD...@{u}"])
            .await
        {
            Ok(out) if out.success() => parse::remote_counts(&out.stdout),
            Ok(out) => parse::classify_remote_failure(&out.stderr),
            Err(err) => RemoteState::Error {
                message: err.to_string(),
            },
        }
    }

    async fn last_commit(&self, path: &Path) -> Option<i64> {
        let out = self.runner.run(path, &["log", "-1", "--format=%ct"]).await.ok()?;
        if !out.success() {
            return None;
        }
        parse::commit_time(&out.stdout)
    }

    async fn remote_url(&self, path: &Path) -> Option<String> {
        let out = self
            .runner
            .run(path, &["remote", "get-url", "origin"])
            .await
            .ok()?;
        if !out.success() {
            return None;
        }
        let url = out.stdout.trim();
        (!url.is_empty()).then(|| url.to_string())
    }

    async fn current_branch(&self, path: &Path) -> Branch {
        let out = match self
            .runner
            .run(path, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await
        {
            Ok(out) => out,
            Err(err) => {
                return Branch::NoBranch {
                    reason: err.to_string(),
                }
            }
        };
        if !out.success() {
            return Branch::NoBranch {
                reason: first_error_line(&out.stderr),
            };
        }
        match parse::head_ref(&out.stdout) {
            parse::HeadRef::Branch(name) => Branch::OnBranch { name },
            parse::HeadRef::Unborn => Branch::NoBranch {
                reason: "no branch".to_string(),
            },
            parse::HeadRef::Detached => {
                let commit_id = match self.runner.run(path, &["rev-parse", "--short", "HEAD"]).await
                {
                    Ok(out) if out.success() => out.stdout.trim().to_string(),
                    _ => String::new(),
                };
                Branch::Detached { commit_id }
            }
        }
    }

    /// Current branch plus the merged prune candidates: all local
    /// branches minus the current one and the protected set, filtered
    /// to those `branch --merged HEAD` lists as ancestors of HEAD.
    async fn branches(&self, path: &Path) -> (Branch, Vec<String>) {
        let branch = self.current_branch(path).await;

        let all = match self
            .runner
            .run(path, &["branch", "--format=%(refname:short)"])
            .await
        {
            Ok(out) if out.success() => parse::branch_list(&out.stdout),
            _ => return (branch, Vec::new()),
        };

        let candidates = parse::prune_candidates(&all, branch.name(), &self.protected_branches);
        if candidates.is_empty() {
            return (branch, Vec::new());
        }

        let merged = match self
            .runner
            .run(path, &["branch", "--merged", "HEAD", "--format=%(refname:short)"])
            .await
        {
            Ok(out) if out.success() => parse::merged_subset(&candidates, &out.stdout),
            _ => Vec::new(),
        };
        (branch, merged)
    }
}

#[async_trait]
impl GitPort for GitCommandClient {
    async fn build_snapshot(&self, path: &Path) -> Repository {
        // Five independent queries, one join point.
        let (local, remote, last_commit, remote_url, (branch, merged_branches)) = tokio::join!(
            self.local_state(path),
            self.remote_state(path),
            self.last_commit(path),
            self.remote_url(path),
            self.branches(path),
        );

        Repository {
            name: Repository::name_of(path),
            path: path.to_path_buf(),
            branch,
            local,
            remote,
            last_commit,
            remote_url,
            merged_branches,
        }
    }

    async fn fetch(&self, path: &Path) -> Result<()> {
        let out = self.fetch_runner.run(path, &["fetch", "--quiet"]).await?;
        if !out.success() {
            bail!("fetch failed: {}", first_error_line(&out.stderr));
        }
        Ok(())
    }

    async fn pull(&self, path: &Path, lines: mpsc::Sender<String>) -> i32 {
        self.pull_runner
            .run_streaming(path, &["pull", "--rebase", "--progress"], lines)
            .await
    }

    async fn delete_branches(
        &self,
        path: &Path,
        branches: &[String],
        lines: mpsc::Sender<String>,
    ) -> (i32, u32) {
        let mut deleted = 0u32;
        for branch in branches {
            match self.runner.run(path, &["branch", "-d", branch]).await {
                Ok(out) if out.success() => {
                    deleted += 1;
                    let _ = lines.send(format!("{PRUNE_DELETED_PREFIX}{branch}")).await;
                }
                Ok(out) => {
                    let _ = lines
                        .send(format!(
                            "{PRUNE_FAILED_PREFIX}{branch} ({})",
                            first_error_line(&out.stderr)
                        ))
                        .await;
                }
                Err(err) => {
                    let _ = lines
                        .send(format!("{PRUNE_FAILED_PREFIX}{branch} ({err})"))
                        .await;
                }
            }
        }
        (0, deleted)
    }
}

fn first_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("unknown error")
        .trim()
        .to_string()
}
