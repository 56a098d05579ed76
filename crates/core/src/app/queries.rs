use std::collections::BTreeMap;

use crate::domain::{Activity, Event, OpOutcome, RepoId, Repository};

/// One row of the projection: the repository snapshot, its activity
/// state machine, and the outcome of the last finished operation.
#[derive(Debug, Clone)]
pub struct RepoEntry {
    pub repo: Repository,
    pub activity: Activity,
    pub last_outcome: Option<OpOutcome>,
}

/// Read-only projection of engine state for presentation consumption.
///
/// The projection is owned by the engine's reducer loop: all mutation
/// happens through [`ReadProjection::apply`] on event receipt, which
/// keeps the table effectively single-threaded without locks.
#[derive(Debug, Default)]
pub struct ReadProjection {
    pub repos: BTreeMap<RepoId, RepoEntry>,
    pub scanning: bool,
}

impl ReadProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, id: &RepoId) -> Option<&RepoEntry> {
        self.repos.get(id)
    }

    pub fn is_idle(&self, id: &RepoId) -> bool {
        self.repos
            .get(id)
            .is_some_and(|entry| !entry.activity.is_busy())
    }

    /// Ids of every repository currently idle, in table order.
    pub fn idle_ids(&self) -> Vec<RepoId> {
        self.repos
            .iter()
            .filter(|(_, entry)| !entry.activity.is_busy())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Mark a discovery pass as running. Cleared by `ScanCompleted`.
    pub fn begin_scan(&mut self) {
        self.scanning = true;
    }

    /// Fold one event into the table.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::RepoDiscovered { .. } => {
                // The entry appears once its first snapshot lands, so
                // observers never see a half-populated repository.
            }

            Event::ScanCompleted => {
                self.scanning = false;
            }

            Event::SnapshotReplaced { id, repo } => {
                self.repos
                    .entry(id.clone())
                    .and_modify(|entry| entry.repo = repo.clone())
                    .or_insert_with(|| RepoEntry {
                        repo: repo.clone(),
                        activity: Activity::Idle,
                        last_outcome: None,
                    });
            }

            Event::OperationStarted { id, op } => {
                if let Some(entry) = self.repos.get_mut(id) {
                    if !entry.activity.is_busy() {
                        entry.activity = op.activity();
                        entry.last_outcome = None;
                    }
                }
            }

            Event::ProgressLine { id, line } => {
                if let Some(entry) = self.repos.get_mut(id) {
                    entry.activity.push_line(line.clone());
                }
            }

            Event::OperationComplete { id, outcome, repo } => {
                if let Some(entry) = self.repos.get_mut(id) {
                    entry.repo = repo.clone();
                    entry.activity = Activity::Idle;
                    entry.last_outcome = Some(outcome.clone());
                }
            }

            Event::Error { .. } => {
                // Surfaced to subscribers; no table change.
            }
        }
    }
}
