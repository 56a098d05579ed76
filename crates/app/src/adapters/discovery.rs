use anyhow::Result;
use crossbeam_channel as channel;
use repofresh_core::ports::{DiscoverReq, DiscoveryPort};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::debug;
use walkdir::WalkDir;

const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

/// Filesystem discovery: a single walker prunes the tree on the
/// `.git` marker while a fixed pool of workers confirms candidates
/// with git itself. Confirmed roots stream out as they are found.
pub struct FsDiscovery {
    workers: usize,
    program: String,
    confirm_timeout: Duration,
}

impl FsDiscovery {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_CONFIRM_TIMEOUT)
    }

    pub fn with_timeout(confirm_timeout: Duration) -> Self {
        Self {
            workers: thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            program: "git".to_string(),
            confirm_timeout,
        }
    }

    /// A candidate directory really is a repository when git agrees.
    /// This filters out stray `.git` markers that are not repos.
    ///
    /// The wait is bounded: a confirmation past its deadline is
    /// killed and treated as a non-repository, so one hung git (a
    /// dead network mount, say) cannot stall the scan.
    fn confirm_repository(&self, path: &Path) -> bool {
        let mut child = match Command::new(&self.program)
            .args(["rev-parse", "--is-inside-work-tree"])
            .current_dir(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(_) => return false,
        };

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return status.success(),
                Ok(None) => {
                    if started.elapsed() >= self.confirm_timeout {
                        debug!(
                            "confirmation of {} exceeded {}s, killing",
                            path.display(),
                            self.confirm_timeout.as_secs()
                        );
                        let _ = child.kill();
                        let _ = child.wait();
                        return false;
                    }
                    thread::sleep(Duration::from_millis(25));
                }
                Err(_) => return false,
            }
        }
    }
}

impl Default for FsDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryPort for FsDiscovery {
    fn scan(&self, req: DiscoverReq, found: mpsc::UnboundedSender<PathBuf>) -> Result<()> {
        let (candidate_tx, candidate_rx) = channel::unbounded::<PathBuf>();

        thread::scope(|scope| {
            for _ in 0..self.workers {
                let candidate_rx = candidate_rx.clone();
                let found = found.clone();
                scope.spawn(move || {
                    for path in candidate_rx {
                        if self.confirm_repository(&path) && found.send(path).is_err() {
                            // Receiver dropped, stop confirming.
                            return;
                        }
                    }
                });
            }
            drop(candidate_rx);

            let mut walk = WalkDir::new(&req.base).into_iter();
            loop {
                let entry = match walk.next() {
                    None => break,
                    Some(Ok(entry)) => entry,
                    Some(Err(err)) => {
                        // Unreadable directories are skipped, never fatal.
                        debug!("discovery skipping unreadable entry: {err}");
                        continue;
                    }
                };
                if !entry.file_type().is_dir() {
                    continue;
                }
                if entry.path().join(".git").exists() {
                    if candidate_tx.send(entry.path().to_path_buf()).is_err() {
                        break;
                    }
                    // Found a repository root: never descend into it.
                    walk.skip_current_dir();
                }
            }
            drop(candidate_tx);
        });

        Ok(())
    }
}
