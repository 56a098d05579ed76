//! End-to-end engine tests against real repositories created with the
//! system git binary. Every test bails out quietly when git is absent.

use repofresh::adapters::discovery::FsDiscovery;
use repofresh::adapters::git::GitCommandClient;
use repofresh::config::Config;
use repofresh::services::engine::EngineService;
use repofresh_core::app::Command;
use repofresh_core::domain::{Event, LocalState, OpKind, RemoteState, RepoId};
use std::fs;
use std::path::Path;
use std::process::{Command as Proc, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn git_available() -> bool {
    Proc::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let status = Proc::new("git")
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("failed to run git");
    assert!(status.success(), "git {args:?} failed in {}", dir.display());
}

fn init_repo(path: &Path) {
    fs::create_dir_all(path).unwrap();
    git(path, &["init", "--quiet"]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test"]);
}

fn commit_file(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "--quiet", "-m", name]);
}

fn engine_for(base: &Path) -> EngineService {
    let config = Config {
        scan_dir: base.to_path_buf(),
        ..Config::default()
    };
    let (engine, _events, _commands) = EngineService::new(
        Arc::new(GitCommandClient::new(&config)),
        Arc::new(FsDiscovery::new()),
    );
    engine
}

/// Step the engine until `stop` matches, with a hard deadline.
async fn drain_until(
    engine: &mut EngineService,
    stop: impl Fn(&Event) -> bool,
) -> Vec<Event> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(30), engine.step())
            .await
            .expect("engine stalled")
            .expect("event channel closed");
        let done = stop(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

#[tokio::test]
async fn scan_builds_snapshots_for_every_repository() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let clean = temp.path().join("clean");
    init_repo(&clean);
    commit_file(&clean, "a.txt", "a");

    let dirty = temp.path().join("group/dirty");
    init_repo(&dirty);
    commit_file(&dirty, "b.txt", "b");
    fs::write(dirty.join("stray.txt"), "untracked").unwrap();

    let mut engine = engine_for(temp.path());
    engine.handle_command(Command::Rescan {
        base: temp.path().to_path_buf(),
    });
    drain_until(&mut engine, |event| matches!(event, Event::ScanCompleted)).await;

    let projection = engine.projection();
    assert_eq!(projection.idle_ids().len(), 2);
    assert!(!projection.scanning);

    let clean_entry = projection.entry(&RepoId::from_path(&clean)).unwrap();
    assert_eq!(clean_entry.repo.local, LocalState::Clean);
    assert_eq!(clean_entry.repo.remote, RemoteState::NoUpstream);
    assert!(clean_entry.repo.last_commit.is_some());

    let dirty_entry = projection.entry(&RepoId::from_path(&dirty)).unwrap();
    match &dirty_entry.repo.local {
        LocalState::Dirty { untracked, .. } => assert_eq!(*untracked, 1),
        other => panic!("expected dirty working tree, got {other:?}"),
    }
}

#[tokio::test]
async fn prune_deletes_merged_branches_and_keeps_protected() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let repo = temp.path().join("repo");
    init_repo(&repo);
    commit_file(&repo, "a.txt", "a");
    // Both point at HEAD, so both are fully merged; only one is
    // eligible because `develop` is protected by default.
    git(&repo, &["branch", "feature/done"]);
    git(&repo, &["branch", "develop"]);

    let mut engine = engine_for(temp.path());
    engine.handle_command(Command::Rescan {
        base: temp.path().to_path_buf(),
    });
    drain_until(&mut engine, |event| matches!(event, Event::ScanCompleted)).await;

    let id = RepoId::from_path(&repo);
    let merged = &engine.projection().entry(&id).unwrap().repo.merged_branches;
    assert_eq!(merged, &["feature/done".to_string()]);

    engine.dispatch(id.clone(), OpKind::Prune);
    let events = drain_until(&mut engine, |event| {
        matches!(event, Event::OperationComplete { .. })
    })
    .await;

    let outcome = events
        .iter()
        .find_map(|event| match event {
            Event::OperationComplete { outcome, .. } => Some(outcome.clone()),
            _ => None,
        })
        .unwrap();
    assert!(outcome.succeeded());
    assert_eq!(outcome.deleted, 1);

    let entry = engine.projection().entry(&id).unwrap();
    assert!(engine.projection().is_idle(&id));
    // The post-operation snapshot already reflects the deletion.
    assert!(entry.repo.merged_branches.is_empty());
}

#[tokio::test]
async fn refresh_then_pull_converges_on_the_remote() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let origin = temp.path().join("origin");
    init_repo(&origin);
    commit_file(&origin, "a.txt", "v1");

    let work = temp.path().join("work");
    git(
        temp.path(),
        &["clone", "--quiet", origin.to_str().unwrap(), "work"],
    );
    git(&work, &["config", "user.email", "test@example.com"]);
    git(&work, &["config", "user.name", "Test"]);

    // Advance origin so the clone falls behind.
    commit_file(&origin, "a.txt", "v2");

    let mut engine = engine_for(&work);
    engine.handle_command(Command::Rescan {
        base: work.clone(),
    });
    drain_until(&mut engine, |event| matches!(event, Event::ScanCompleted)).await;

    let id = RepoId::from_path(&work);
    engine.dispatch(id.clone(), OpKind::Refresh);
    drain_until(&mut engine, |event| {
        matches!(event, Event::OperationComplete { .. })
    })
    .await;
    assert_eq!(
        engine.projection().entry(&id).unwrap().repo.remote,
        RemoteState::Behind { count: 1 }
    );

    engine.dispatch(id.clone(), OpKind::Pull);
    let events = drain_until(&mut engine, |event| {
        matches!(event, Event::OperationComplete { .. })
    })
    .await;

    let outcome = events
        .iter()
        .find_map(|event| match event {
            Event::OperationComplete { outcome, .. } => Some(outcome.clone()),
            _ => None,
        })
        .unwrap();
    assert!(outcome.succeeded());
    assert_eq!(
        engine.projection().entry(&id).unwrap().repo.remote,
        RemoteState::Synced
    );
    assert_eq!(fs::read_to_string(work.join("a.txt")).unwrap(), "v2");
}

#[tokio::test]
async fn operations_on_a_vanished_repository_surface_errors_not_panics() {
    if !git_available() {
        return;
    }
    let temp = TempDir::new().unwrap();
    let repo = temp.path().join("doomed");
    init_repo(&repo);
    commit_file(&repo, "a.txt", "a");

    let mut engine = engine_for(temp.path());
    engine.handle_command(Command::Rescan {
        base: temp.path().to_path_buf(),
    });
    drain_until(&mut engine, |event| matches!(event, Event::ScanCompleted)).await;

    fs::remove_dir_all(&repo).unwrap();

    let id = RepoId::from_path(&repo);
    engine.dispatch(id.clone(), OpKind::Refresh);
    let events = drain_until(&mut engine, |event| {
        matches!(event, Event::OperationComplete { .. })
    })
    .await;

    let outcome = events
        .iter()
        .find_map(|event| match event {
            Event::OperationComplete { outcome, .. } => Some(outcome.clone()),
            _ => None,
        })
        .unwrap();
    assert!(!outcome.succeeded());
    // The repository stays in the table with error states until the
    // next rescan; it is never silently dropped.
    let entry = engine.projection().entry(&id).unwrap();
    assert!(matches!(entry.repo.local, LocalState::Error { .. }));
    assert!(engine.projection().is_idle(&id));
}
