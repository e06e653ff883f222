//! Direct-Push scheduler.
//!
//! One long-lived task per account holds a Ping request open and
//! reacts to its outcome. The heartbeat adapts to success/failure
//! history and to explicit server corrections, always staying inside
//! the configured bounds; accounts whose servers cannot sustain
//! long-poll semantics are demoted to periodic polling instead of
//! failing loudly forever.

use crate::error::EasResult;
use crate::session::ExecuteOptions;
use crate::store::StateStore;
use crate::sync::SyncEngine;
use crate::transport::HttpClient;
use easync_protocol::{parse_ping, ping_request, Command, PingFolder, PingResponse, PingStatus, SyncDiff};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Configuration for the Direct-Push scheduler.
///
/// Serializable so embedders can persist it next to the heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Lower heartbeat bound, seconds.
    pub min_heartbeat: u32,
    /// Upper heartbeat bound, seconds.
    pub max_heartbeat: u32,
    /// Step by which the heartbeat adapts, seconds.
    pub heartbeat_step: u32,
    /// Heartbeat used when no persisted value exists, seconds.
    pub initial_heartbeat: u32,
    /// Consecutive successes required before the heartbeat grows.
    pub successes_per_increase: u32,
    /// Consecutive failures after which push is abandoned for polling.
    pub max_consecutive_failures: u32,
    /// Suspiciously fast expirations tolerated before falling back.
    pub fast_expiry_strikes: u32,
    /// Sync interval of the periodic-poll fallback.
    pub poll_interval: Duration,
    /// Delay before re-pinging after a failure.
    pub failure_delay: Duration,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            min_heartbeat: 120,
            max_heartbeat: 1680,
            heartbeat_step: 120,
            initial_heartbeat: 480,
            successes_per_increase: 5,
            max_consecutive_failures: 3,
            fast_expiry_strikes: 3,
            poll_interval: Duration::from_secs(15 * 60),
            failure_delay: Duration::from_secs(60),
        }
    }
}

impl PushConfig {
    /// Sets the heartbeat bounds.
    pub fn with_heartbeat_bounds(mut self, min: u32, max: u32) -> Self {
        self.min_heartbeat = min;
        self.max_heartbeat = max;
        self
    }

    /// Sets the initial heartbeat.
    pub fn with_initial_heartbeat(mut self, secs: u32) -> Self {
        self.initial_heartbeat = secs;
        self
    }

    /// Sets the adaptation step.
    pub fn with_heartbeat_step(mut self, secs: u32) -> Self {
        self.heartbeat_step = secs;
        self
    }

    /// Sets the poll fallback interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the post-failure delay.
    pub fn with_failure_delay(mut self, delay: Duration) -> Self {
        self.failure_delay = delay;
        self
    }
}

/// Notifications emitted by the push task.
#[derive(Debug)]
pub enum PushEvent {
    /// A monitored collection changed and was synchronized.
    Synced {
        /// The collection that changed.
        collection_id: String,
        /// The merged diff of the triggered sync.
        diff: SyncDiff,
    },
    /// A triggered sync failed.
    SyncFailed {
        /// The collection whose sync failed.
        collection_id: String,
        /// Error description.
        message: String,
    },
    /// Push was abandoned in favor of periodic polling.
    FellBackToPolling {
        /// Why push was abandoned.
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PushCommand {
    Run,
    Pause,
    Stop,
}

/// Handle to a running push task.
pub struct PushHandle {
    control: watch::Sender<PushCommand>,
    task: JoinHandle<()>,
}

impl PushHandle {
    /// Stops the task promptly, abandoning any in-flight ping.
    pub fn stop(self) {
        let _ = self.control.send(PushCommand::Stop);
        self.task.abort();
    }

    /// Pauses the loop (e.g. on network loss). Heartbeat state is
    /// retained for [`resume`](Self::resume).
    pub fn pause(&self) {
        let _ = self.control.send(PushCommand::Pause);
    }

    /// Resumes a paused loop without resetting heartbeat state.
    pub fn resume(&self) {
        let _ = self.control.send(PushCommand::Run);
    }

    /// True once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Starts the push task for an account.
pub fn start_push<C: HttpClient, S: StateStore>(
    engine: Arc<SyncEngine<C, S>>,
    folders: Vec<PingFolder>,
    config: PushConfig,
    events: mpsc::UnboundedSender<PushEvent>,
) -> PushHandle {
    let (control, commands) = watch::channel(PushCommand::Run);
    let task = tokio::spawn(run_loop(engine, folders, config, events, commands));
    PushHandle { control, task }
}

async fn run_loop<C: HttpClient, S: StateStore>(
    engine: Arc<SyncEngine<C, S>>,
    folders: Vec<PingFolder>,
    config: PushConfig,
    events: mpsc::UnboundedSender<PushEvent>,
    mut commands: watch::Receiver<PushCommand>,
) {
    let persisted = engine.session().store().heartbeat().ok().flatten();
    let mut adaptation = Adaptation::new(config.clone(), persisted);
    let mut polling = false;

    loop {
        let command = *commands.borrow();
        match command {
            PushCommand::Stop => break,
            PushCommand::Pause => {
                if commands.changed().await.is_err() {
                    break;
                }
                continue;
            }
            PushCommand::Run => {}
        }

        if polling {
            tokio::select! {
                changed = commands.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                () = tokio::time::sleep(config.poll_interval) => {}
            }
            for folder in &folders {
                sync_and_notify(&engine, &folder.server_id, &events).await;
            }
            continue;
        }

        let heartbeat = adaptation.heartbeat();
        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            changed = commands.changed() => {
                // The in-flight ping is dropped, not awaited.
                if changed.is_err() {
                    break;
                }
                continue;
            }
            outcome = ping_once(&engine, &folders, heartbeat) => outcome,
        };

        match outcome {
            Ok(response) => match response.status {
                PingStatus::Expired => {
                    if adaptation.record_expiry_elapsed(started.elapsed()) {
                        fall_back(&mut polling, &events, "server does not hold long-poll requests");
                    } else {
                        adaptation.record_success();
                    }
                }
                PingStatus::ChangesFound => {
                    debug!(folders = ?response.changed_folders, "ping reported changes");
                    for collection_id in &response.changed_folders {
                        sync_and_notify(&engine, collection_id, &events).await;
                    }
                    adaptation.record_success();
                }
                PingStatus::HeartbeatOutOfBounds => {
                    let abandoned = adaptation.record_out_of_bounds(response.heartbeat_interval);
                    info!(
                        heartbeat = adaptation.heartbeat(),
                        "server rejected heartbeat, adjusted"
                    );
                    if abandoned {
                        fall_back(&mut polling, &events, "heartbeat rejected repeatedly");
                    }
                    // Retry immediately with the corrected heartbeat.
                }
                PingStatus::FolderSyncRequired => {
                    if let Err(error) = engine.folder_sync().await {
                        warn!(%error, "folder refresh requested by ping failed");
                    }
                }
                status => {
                    warn!(%status, "ping failed");
                    if adaptation.record_failure() {
                        fall_back(&mut polling, &events, "repeated ping failures");
                    } else {
                        wait_or_break(&mut commands, config.failure_delay).await;
                    }
                }
            },
            Err(error) => {
                debug!(%error, "ping transport failure");
                if adaptation.record_failure() {
                    fall_back(&mut polling, &events, "repeated ping failures");
                } else {
                    wait_or_break(&mut commands, config.failure_delay).await;
                }
            }
        }

        adaptation.persist(engine.session().store().as_ref());
    }
}

async fn ping_once<C: HttpClient, S: StateStore>(
    engine: &SyncEngine<C, S>,
    folders: &[PingFolder],
    heartbeat: u32,
) -> EasResult<PingResponse> {
    let session = engine.session();
    let timeout =
        Duration::from_secs(u64::from(heartbeat)) + session.config().timeouts.ping_margin;
    let options = ExecuteOptions {
        timeout: Some(timeout),
        ..ExecuteOptions::default()
    };
    let document = session
        .execute_with(Command::Ping, &ping_request(heartbeat, folders), &options)
        .await?;
    match document {
        // Some servers answer an expired ping with an empty body.
        None => Ok(PingResponse {
            status: PingStatus::Expired,
            changed_folders: Vec::new(),
            heartbeat_interval: None,
            max_folders: None,
        }),
        Some(document) => Ok(parse_ping(&document)?),
    }
}

async fn sync_and_notify<C: HttpClient, S: StateStore>(
    engine: &SyncEngine<C, S>,
    collection_id: &str,
    events: &mpsc::UnboundedSender<PushEvent>,
) {
    match engine.sync_collection_complete(collection_id).await {
        Ok(diff) => {
            let _ = events.send(PushEvent::Synced {
                collection_id: collection_id.to_string(),
                diff,
            });
        }
        Err(error) => {
            warn!(collection_id, %error, "push-triggered sync failed");
            let _ = events.send(PushEvent::SyncFailed {
                collection_id: collection_id.to_string(),
                message: error.to_string(),
            });
        }
    }
}

fn fall_back(polling: &mut bool, events: &mpsc::UnboundedSender<PushEvent>, reason: &str) {
    if !*polling {
        warn!(reason, "abandoning push for periodic polling");
        *polling = true;
        let _ = events.send(PushEvent::FellBackToPolling {
            reason: reason.to_string(),
        });
    }
}

async fn wait_or_break(commands: &mut watch::Receiver<PushCommand>, delay: Duration) {
    tokio::select! {
        _ = commands.changed() => {}
        () = tokio::time::sleep(delay) => {}
    }
}

/// Heartbeat adaptation state machine.
///
/// Pure so its invariants are testable without the loop: the heartbeat
/// stays within `[min, max]` and moves by at most one step (or a
/// clamped server correction) per recorded event.
struct Adaptation {
    config: PushConfig,
    heartbeat: u32,
    successes: u32,
    failures: u32,
    fast_expiries: u32,
    dirty: bool,
}

impl Adaptation {
    fn new(config: PushConfig, persisted: Option<u32>) -> Self {
        let heartbeat = persisted
            .unwrap_or(config.initial_heartbeat)
            .clamp(config.min_heartbeat, config.max_heartbeat);
        Self {
            config,
            heartbeat,
            successes: 0,
            failures: 0,
            fast_expiries: 0,
            dirty: false,
        }
    }

    fn heartbeat(&self) -> u32 {
        self.heartbeat
    }

    fn set_heartbeat(&mut self, value: u32) {
        let clamped = value.clamp(self.config.min_heartbeat, self.config.max_heartbeat);
        if clamped != self.heartbeat {
            self.heartbeat = clamped;
            self.dirty = true;
        }
    }

    fn record_success(&mut self) {
        self.failures = 0;
        self.successes += 1;
        if self.successes >= self.config.successes_per_increase {
            self.successes = 0;
            self.set_heartbeat(self.heartbeat.saturating_add(self.config.heartbeat_step));
        }
    }

    /// Returns true when push should be abandoned.
    fn record_failure(&mut self) -> bool {
        self.successes = 0;
        self.failures += 1;
        self.set_heartbeat(self.heartbeat.saturating_sub(self.config.heartbeat_step));
        self.failures >= self.config.max_consecutive_failures
    }

    /// Returns true when push should be abandoned.
    fn record_out_of_bounds(&mut self, server_hint: Option<u32>) -> bool {
        self.successes = 0;
        self.failures += 1;
        match server_hint {
            Some(hint) => self.set_heartbeat(hint),
            None => self.set_heartbeat(self.heartbeat / 2),
        }
        self.failures >= self.config.max_consecutive_failures
    }

    /// Returns true when expirations keep arriving far below the
    /// requested heartbeat, a sign the server answers immediately
    /// instead of holding the request open.
    fn record_expiry_elapsed(&mut self, elapsed: Duration) -> bool {
        let requested = Duration::from_secs(u64::from(self.heartbeat));
        if elapsed * 2 < requested {
            self.fast_expiries += 1;
        } else {
            self.fast_expiries = 0;
        }
        self.fast_expiries >= self.config.fast_expiry_strikes
    }

    fn persist<S: StateStore + ?Sized>(&mut self, store: &S) {
        if self.dirty {
            if let Err(error) = store.set_heartbeat(self.heartbeat) {
                warn!(%error, "failed to persist heartbeat");
            }
            self.dirty = false;
        }
    }
}
