use anyhow::Result;
use repofresh_core::app::{Command, ReadProjection};
use repofresh_core::domain::{Event, OpKind, OpOutcome, RepoId};
use repofresh_core::ports::{DiscoverReq, DiscoveryPort, GitPort};
use repofresh_core::EngineError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Capacity of the per-operation progress-line channel. A producer
/// blocks once the reducer falls this many lines behind, so the event
/// loop must keep draining while any operation is busy.
const PROGRESS_BUFFER: usize = 10;

/// The engine service: owns the {Repository, Activity} table and is
/// the only thing that mutates it. All subprocess work runs on
/// background tasks that communicate back purely through events.
///
/// Dispatch is gated on the repository being idle, which serializes
/// operations per repository while leaving unrelated repositories
/// free to run in parallel.
pub struct EngineService {
    git: Arc<dyn GitPort>,
    discovery: Arc<dyn DiscoveryPort>,

    // Internal event bus: background tasks -> reducer.
    event_tx: mpsc::UnboundedSender<Event>,
    event_rx: mpsc::UnboundedReceiver<Event>,

    // Applied events forwarded to the presentation layer.
    external_tx: mpsc::UnboundedSender<Event>,

    command_rx: mpsc::UnboundedReceiver<Command>,

    projection: ReadProjection,

    tasks: JoinSet<()>,
}

impl EngineService {
    pub fn new(
        git: Arc<dyn GitPort>,
        discovery: Arc<dyn DiscoveryPort>,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<Event>,
        mpsc::UnboundedSender<Command>,
    ) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (external_tx, external_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let service = Self {
            git,
            discovery,
            event_tx,
            event_rx,
            external_tx,
            command_rx,
            projection: ReadProjection::new(),
            tasks: JoinSet::new(),
        };

        (service, external_rx, command_tx)
    }

    /// Read-only view of the current table.
    pub fn projection(&self) -> &ReadProjection {
        &self.projection
    }

    /// Scan `base`, then process commands and events until quit.
    pub async fn run(&mut self, base: PathBuf) -> Result<()> {
        self.start_discovery(base);
        self.event_loop().await
    }

    async fn event_loop(&mut self) -> Result<()> {
        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(Command::Quit) | None => {
                            info!("engine stopping");
                            break;
                        }
                        Some(command) => self.handle_command(command),
                    }
                }

                event = self.event_rx.recv() => {
                    match event {
                        Some(event) => self.apply_and_forward(event),
                        None => break,
                    }
                }

                Some(result) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(err) = result {
                        error!("background task panicked: {err}");
                    }
                }
            }
        }

        self.tasks.abort_all();
        Ok(())
    }

    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::Rescan { base } => self.start_discovery(base),
            Command::Dispatch { id, op } => self.dispatch(id, op),
            Command::DispatchAll { op } => {
                // Busy repositories are skipped, never queued.
                for id in self.projection.idle_ids() {
                    self.dispatch(id, op);
                }
            }
            Command::Quit => {}
        }
    }

    /// Start `op` on one repository. Silently ignored while the
    /// repository is busy; this gate is what guarantees at most one
    /// running operation per repository.
    pub fn dispatch(&mut self, id: RepoId, op: OpKind) {
        let Some(entry) = self.projection.entry(&id) else {
            let err = EngineError::RepositoryNotFound { id: id.to_string() };
            self.apply_and_forward(Event::Error {
                id: Some(id),
                message: err.to_string(),
            });
            return;
        };
        if entry.activity.is_busy() {
            debug!("{id}: {op} ignored, repository busy");
            return;
        }

        let path = entry.repo.path.clone();
        let merged = entry.repo.merged_branches.clone();
        self.apply_and_forward(Event::OperationStarted { id: id.clone(), op });

        let git = self.git.clone();
        let event_tx = self.event_tx.clone();
        self.tasks.spawn(async move {
            run_operation(git, id, op, path, merged, event_tx).await;
        });
    }

    /// Receive and fold exactly one engine event. The main loop does
    /// this continuously; tests use it for deterministic stepping.
    pub async fn step(&mut self) -> Option<Event> {
        let event = self.event_rx.recv().await?;
        self.apply_and_forward(event.clone());
        Some(event)
    }

    fn apply_and_forward(&mut self, event: Event) {
        match &event {
            Event::ScanCompleted => info!("repository scan completed"),
            Event::OperationComplete { id, outcome, .. } => {
                info!(
                    "{id}: {} finished with exit {}",
                    outcome.op, outcome.exit_code
                );
            }
            Event::Error { id, message } => match id {
                Some(id) => error!("{id}: {message}"),
                None => error!("{message}"),
            },
            _ => {}
        }
        self.projection.apply(&event);
        let _ = self.external_tx.send(event);
    }

    fn start_discovery(&mut self, base: PathBuf) {
        info!("scanning {} for repositories", base.display());
        self.projection.begin_scan();

        let discovery = self.discovery.clone();
        let git = self.git.clone();
        let event_tx = self.event_tx.clone();

        self.tasks.spawn(async move {
            let (found_tx, mut found_rx) = mpsc::unbounded_channel();
            let walker = tokio::task::spawn_blocking(move || {
                discovery.scan(DiscoverReq { base }, found_tx)
            });

            // Initial snapshots fan out as roots stream in; the scan
            // only reads as completed once every snapshot has landed.
            let mut snapshots = JoinSet::new();
            while let Some(path) = found_rx.recv().await {
                let id = RepoId::from_path(&path);
                let _ = event_tx.send(Event::RepoDiscovered {
                    id: id.clone(),
                    path: path.clone(),
                });

                let git = git.clone();
                let event_tx = event_tx.clone();
                snapshots.spawn(async move {
                    let repo = git.build_snapshot(&path).await;
                    let _ = event_tx.send(Event::SnapshotReplaced { id, repo });
                });
            }
            while snapshots.join_next().await.is_some() {}

            match walker.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    let err = EngineError::Discovery { source: err };
                    let _ = event_tx.send(Event::Error {
                        id: None,
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    let _ = event_tx.send(Event::Error {
                        id: None,
                        message: format!("discovery task failed: {err}"),
                    });
                }
            }
            let _ = event_tx.send(Event::ScanCompleted);
        });
    }
}

impl Drop for EngineService {
    fn drop(&mut self) {
        self.tasks.abort_all();
    }
}

/// Run one dispatched operation to completion on a background task.
///
/// Line events are forwarded in emission order and are all delivered
/// before the single completion event, which carries a snapshot built
/// after the operation finished so counts are never stale.
async fn run_operation(
    git: Arc<dyn GitPort>,
    id: RepoId,
    op: OpKind,
    path: PathBuf,
    merged_branches: Vec<String>,
    event_tx: mpsc::UnboundedSender<Event>,
) {
    let (exit_code, deleted, last_line) = match op {
        OpKind::Refresh => match git.fetch(&path).await {
            Ok(()) => (0, 0, None),
            Err(err) => (1, 0, Some(err.to_string())),
        },

        OpKind::Pull => {
            let (line_tx, line_rx) = mpsc::channel(PROGRESS_BUFFER);
            let (exit_code, last_line) = tokio::join!(
                git.pull(&path, line_tx),
                forward_progress(id.clone(), line_rx, event_tx.clone()),
            );
            (exit_code, 0, last_line)
        }

        OpKind::Prune => {
            let (line_tx, line_rx) = mpsc::channel(PROGRESS_BUFFER);
            let ((exit_code, deleted), last_line) = tokio::join!(
                git.delete_branches(&path, &merged_branches, line_tx),
                forward_progress(id.clone(), line_rx, event_tx.clone()),
            );
            (exit_code, deleted, last_line)
        }
    };

    let repo = git.build_snapshot(&path).await;
    let _ = event_tx.send(Event::OperationComplete {
        id,
        outcome: OpOutcome {
            op,
            exit_code,
            deleted,
            last_line,
        },
        repo,
    });
}

/// Drain the bounded line channel into discrete ordered events,
/// returning the final line once the producer closes the channel.
async fn forward_progress(
    id: RepoId,
    mut line_rx: mpsc::Receiver<String>,
    event_tx: mpsc::UnboundedSender<Event>,
) -> Option<String> {
    let mut last = None;
    while let Some(line) = line_rx.recv().await {
        last = Some(line.clone());
        let _ = event_tx.send(Event::ProgressLine {
            id: id.clone(),
            line,
        });
    }
    last
}
