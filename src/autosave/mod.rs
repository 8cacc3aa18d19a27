//! Autosave coordination
//!
//! Watches a form configuration as it is edited and persists it once edits
//! settle. The coordinator runs as a single tokio task:
//!
//! - the first observed configuration is the baseline and is never saved;
//! - a change (by structural equality) that passes the `should_autosave`
//!   predicate (re)arms a trailing debounce timer;
//! - when the timer elapses the latest snapshot is saved. If a save is
//!   already in flight the request waits in a single slot and runs once the
//!   current save settles (or, if a newer change re-armed the timer, leaves
//!   the save to that timer), so at most one save is ever in flight;
//! - failures are reported through the state and events and are never
//!   retried automatically; the next qualifying change starts a new cycle.
//!
//! Dropping (or shutting down) the coordinator cancels a pending timer. A
//! save already in flight is allowed to finish, but its outcome is no
//! longer published.

pub mod config;

pub use config::AutosaveConfig;

use crate::model::FormStore;
use crate::models::FormConfiguration;
use crate::storage::StorageError;
use crate::validation::is_form_renderable;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Message reported when a failed save carries no message of its own
pub const SAVE_FAILED_FALLBACK: &str = "Failed to save";

/// Predicate deciding whether a changed configuration may be saved
pub type ShouldAutoSave = Arc<dyn Fn(&FormConfiguration) -> bool + Send + Sync>;

type SaveFuture = Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send>>;
type Reply = oneshot::Sender<Result<(), StorageError>>;

/// Observable autosave status
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutosaveState {
    /// A save is in flight
    pub saving: bool,
    /// A save is scheduled (debounce running or queued behind a save)
    pub pending: bool,
    /// Completion time of the last successful save
    pub last_saved: Option<DateTime<Utc>>,
    /// Message of the last failed save; cleared when the next save starts
    pub error: Option<String>,
}

/// Save notifications
#[derive(Debug, Clone, PartialEq)]
pub enum AutosaveEvent {
    Saved { at: DateTime<Utc> },
    Failed { message: String },
}

enum Command {
    Observe(FormConfiguration),
    Flush {
        configuration: FormConfiguration,
        reply: Reply,
    },
}

/// Handle to a running autosave task
pub struct AutosaveCoordinator {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<AutosaveState>,
    events: broadcast::Sender<AutosaveEvent>,
    task: JoinHandle<()>,
}

impl AutosaveCoordinator {
    /// Spawn a coordinator that saves only renderable forms.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<dyn FormStore>, config: AutosaveConfig) -> Self {
        Self::spawn_with_predicate(store, config, |c: &FormConfiguration| {
            is_form_renderable(&c.fields)
        })
    }

    /// Spawn a coordinator with a custom `should_autosave` predicate
    pub fn spawn_with_predicate<P>(store: Arc<dyn FormStore>, config: AutosaveConfig, should_autosave: P) -> Self
    where
        P: Fn(&FormConfiguration) -> bool + Send + Sync + 'static,
    {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(AutosaveState::default());
        let (events, _) = broadcast::channel(16);

        let worker = Worker {
            store,
            delay: config.delay(),
            should_autosave: Arc::new(should_autosave),
            state: state_tx,
            events: events.clone(),
            baseline: None,
            latest: None,
            deadline: None,
            in_flight: None,
            queued: false,
            in_flight_waiters: Vec::new(),
            queued_waiters: Vec::new(),
            last_saved: None,
            error: None,
        };
        let task = tokio::spawn(worker.run(receiver));

        Self {
            commands,
            state,
            events,
            task,
        }
    }

    /// Report the current configuration. The first call sets the baseline.
    pub fn observe(&self, configuration: &FormConfiguration) {
        if self
            .commands
            .send(Command::Observe(configuration.clone()))
            .is_err()
        {
            warn!("Autosave task is no longer running; change ignored");
        }
    }

    /// Save immediately, bypassing the debounce.
    ///
    /// Still honours the single in-flight save rule: if a save is running,
    /// this one starts after it settles. Resolves with the outcome of the
    /// save carrying `configuration`.
    pub async fn flush(&self, configuration: &FormConfiguration) -> Result<(), StorageError> {
        let (reply, outcome) = oneshot::channel();
        self.commands
            .send(Command::Flush {
                configuration: configuration.clone(),
                reply,
            })
            .map_err(|_| stopped())?;
        outcome.await.map_err(|_| stopped())?
    }

    /// Snapshot of the current status
    pub fn state(&self) -> AutosaveState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn watch(&self) -> watch::Receiver<AutosaveState> {
        self.state.clone()
    }

    /// Subscribe to save notifications
    pub fn subscribe(&self) -> broadcast::Receiver<AutosaveEvent> {
        self.events.subscribe()
    }

    /// Stop the coordinator and wait for the task to exit.
    ///
    /// A pending debounce is cancelled; an in-flight save is awaited but its
    /// outcome is discarded.
    pub async fn shutdown(self) {
        let AutosaveCoordinator { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            warn!("Autosave task ended abnormally: {}", e);
        }
    }
}

fn stopped() -> StorageError {
    StorageError::BackendError("Autosave coordinator has shut down".to_string())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn settle(in_flight: &mut Option<SaveFuture>) -> Result<(), StorageError> {
    match in_flight {
        Some(save) => save.await,
        None => std::future::pending().await,
    }
}

struct Worker {
    store: Arc<dyn FormStore>,
    delay: std::time::Duration,
    should_autosave: ShouldAutoSave,
    state: watch::Sender<AutosaveState>,
    events: broadcast::Sender<AutosaveEvent>,
    /// Last snapshot compared against for change detection
    baseline: Option<FormConfiguration>,
    /// Snapshot the next save will write
    latest: Option<FormConfiguration>,
    deadline: Option<Instant>,
    in_flight: Option<SaveFuture>,
    /// A save was requested while another was in flight
    queued: bool,
    in_flight_waiters: Vec<Reply>,
    queued_waiters: Vec<Reply>,
    last_saved: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = wait_until(self.deadline) => {
                    self.deadline = None;
                    self.request_save();
                }
                result = settle(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.finish(result);
                }
            }
        }

        self.teardown().await;
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Observe(configuration) => self.observe(configuration),
            Command::Flush {
                configuration,
                reply,
            } => {
                debug!("Immediate save requested");
                self.baseline = Some(configuration.clone());
                self.latest = Some(configuration);
                self.deadline = None;
                self.queued_waiters.push(reply);
                self.request_save();
            }
        }
    }

    fn observe(&mut self, configuration: FormConfiguration) {
        match &self.baseline {
            None => {
                debug!("Autosave baseline captured");
                self.baseline = Some(configuration);
                return;
            }
            Some(previous) if *previous == configuration => return,
            Some(_) => {}
        }

        if !(self.should_autosave)(&configuration) {
            debug!("Change observed but form is not eligible for autosave");
            return;
        }

        self.baseline = Some(configuration.clone());
        self.latest = Some(configuration);
        self.deadline = Some(Instant::now() + self.delay);
        debug!("Autosave scheduled in {:?}", self.delay);
        self.publish();
    }

    fn request_save(&mut self) {
        if self.in_flight.is_some() {
            debug!("Save requested while another is in flight; queued");
            self.queued = true;
            self.publish();
            return;
        }
        self.start_save();
    }

    fn start_save(&mut self) {
        let Some(configuration) = self.latest.clone() else {
            return;
        };

        // This save writes the latest snapshot, so no timer is left for it
        self.deadline = None;
        let store = Arc::clone(&self.store);
        self.in_flight = Some(Box::pin(async move { store.save(&configuration).await }));
        self.in_flight_waiters.append(&mut self.queued_waiters);
        self.error = None;
        self.publish();
    }

    fn finish(&mut self, result: Result<(), StorageError>) {
        match &result {
            Ok(()) => {
                let at = Utc::now();
                self.last_saved = Some(at);
                self.error = None;
                info!("Autosave completed");
                let _ = self.events.send(AutosaveEvent::Saved { at });
            }
            Err(e) => {
                let message = match e.to_string() {
                    m if m.trim().is_empty() => SAVE_FAILED_FALLBACK.to_string(),
                    m => m,
                };
                warn!("Autosave failed: {}", message);
                self.error = Some(message.clone());
                let _ = self.events.send(AutosaveEvent::Failed { message });
            }
        }

        for waiter in self.in_flight_waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }

        if !self.queued {
            self.publish();
            return;
        }
        self.queued = false;

        // A change observed while queued re-armed the debounce; the timer
        // saves that snapshot once its quiet period ends. Immediate saves
        // never wait.
        if self.deadline.is_some() && self.queued_waiters.is_empty() {
            debug!("Queued save deferred to the running debounce");
            self.publish();
        } else {
            self.start_save();
        }
    }

    fn publish(&self) {
        self.state.send_replace(AutosaveState {
            saving: self.in_flight.is_some(),
            pending: self.deadline.is_some() || self.queued,
            last_saved: self.last_saved,
            error: self.error.clone(),
        });
    }

    async fn teardown(mut self) {
        self.deadline = None;
        if let Some(save) = self.in_flight.take() {
            debug!("Autosave stopping; letting the in-flight save finish");
            let _ = save.await;
        }
        debug!("Autosave stopped");
    }
}
