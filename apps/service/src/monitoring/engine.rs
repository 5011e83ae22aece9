use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::alert::AlertBatch;
use super::checker::{Checker, HttpChecker};
use super::history::HistoryTracker;
use super::types::{EngineState, Notifier, Observation, StatusSink};
use crate::config::{ConfigError, EngineConfig, MonitorSettings};

/// State shared between the engine handle and its background tasks
struct Shared {
    config: EngineConfig,
    history: HistoryTracker,
    checker: Arc<dyn Checker>,
    sink: Arc<dyn StatusSink>,
    notifier: Arc<dyn Notifier>,
}

struct Lifecycle {
    state: EngineState,
    shutdown_tx: Option<watch::Sender<bool>>,
    /// Tasks of the current run
    task_handles: Vec<JoinHandle<()>>,
    /// Tasks signalled by `stop` that `join` has not reaped yet
    stopped_handles: Vec<JoinHandle<()>>,
}

/// Monitoring engine - polls every target and sweeps for down alerts
///
/// One polling task runs per target plus a single alert sweep task, all
/// cancelled together by [`Engine::stop`].
pub struct Engine {
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

impl Engine {
    /// Validate `settings` and build an engine checking over HTTP
    pub fn new(
        settings: MonitorSettings,
        sink: Arc<dyn StatusSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ConfigError> {
        let config = EngineConfig::try_from(settings)?;
        let checker = Arc::new(HttpChecker::new(config.request_timeout, config.check_method)?);

        Ok(Self::with_checker(config, checker, sink, notifier))
    }

    /// Build an engine from an already validated config and any checker
    pub fn with_checker(
        config: EngineConfig,
        checker: Arc<dyn Checker>,
        sink: Arc<dyn StatusSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        info!(
            interval_secs = config.interval.as_secs_f64(),
            threshold = config.alert_threshold,
            "Creating monitor for websites {:?}, alerting {:?}",
            config.targets,
            config.recipients
        );

        let history = HistoryTracker::new(&config.targets, config.alert_threshold);

        Self {
            shared: Arc::new(Shared { config, history, checker, sink, notifier }),
            lifecycle: Mutex::new(Lifecycle {
                state: EngineState::NotStarted,
                shutdown_tx: None,
                task_handles: Vec::new(),
                stopped_handles: Vec::new(),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    pub fn state(&self) -> EngineState {
        self.lifecycle.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    /// Targets in configured order
    pub fn targets(&self) -> &[String] {
        &self.shared.config.targets
    }

    /// Snapshot of a target's recent outcome codes, oldest first
    pub fn history(&self, target: &str) -> Option<Vec<u16>> {
        self.shared.history.snapshot(target)
    }

    /// Spawn the polling tasks and the alert sweep task.
    ///
    /// Must be called from within a tokio runtime. Calling it while already
    /// running is a no-op.
    pub fn start(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()?;
        let mut lifecycle = self.lifecycle.lock();

        if lifecycle.state == EngineState::Running {
            warn!("Monitor is already running, ignoring start");
            return Ok(());
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        lifecycle.stopped_handles.retain(|handle| !handle.is_finished());

        for target in &self.shared.config.targets {
            let shared = Arc::clone(&self.shared);
            let target = target.clone();
            let shutdown = shutdown_rx.clone();
            lifecycle.task_handles.push(runtime.spawn(poll_loop(shared, target, shutdown)));
        }

        let shared = Arc::clone(&self.shared);
        lifecycle.task_handles.push(runtime.spawn(sweep_loop(shared, shutdown_rx)));

        lifecycle.shutdown_tx = Some(shutdown_tx);
        lifecycle.state = EngineState::Running;

        info!(
            targets = self.shared.config.targets.len(),
            "Monitor started with interval {:?}",
            self.shared.config.interval
        );
        Ok(())
    }

    /// Signal every task to stop. Does not wait for in-flight requests.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state != EngineState::Running {
            return;
        }

        if let Some(shutdown_tx) = lifecycle.shutdown_tx.take() {
            // Receivers may already be gone if every task exited
            let _ = shutdown_tx.send(true);
        }
        let current = std::mem::take(&mut lifecycle.task_handles);
        lifecycle.stopped_handles.extend(current);
        lifecycle.state = EngineState::Stopped;

        info!("Monitor stopped");
    }

    /// Wait up to `grace` for stopped tasks to exit, aborting the rest.
    ///
    /// Tasks of a run started after the last `stop` are left alone.
    pub async fn join(&self, grace: Duration) {
        let handles = std::mem::take(&mut self.lifecycle.lock().stopped_handles);
        let deadline = tokio::time::Instant::now() + grace;

        for mut handle in handles {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if tokio::time::timeout(remaining, &mut handle).await.is_err() {
                warn!("Monitor task did not finish within {:?}, aborting", grace);
                handle.abort();
            }
        }
    }

    /// One polling iteration for `target`: check, record, forward to the sink
    pub async fn tick(&self, target: &str) -> Observation {
        let observation = self.shared.checker.check(target).await;
        self.shared.record(target, observation).await;
        observation
    }

    /// One alert sweep over every target
    pub async fn sweep(&self) -> AlertBatch {
        self.shared.sweep().await
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    async fn record(&self, target: &str, observation: Observation) {
        self.history.append(target, observation.status_code);

        if let Err(e) = self.sink.record(target, observation.status_code, observation.latency).await {
            error!(website = %target, "Error storing website status: {:#}", e);
        }
    }

    async fn sweep(&self) -> AlertBatch {
        let mut batch = AlertBatch::new();

        for target in self.history.targets() {
            // Evaluation and reset happen under the target's lock
            if self.history.take_alert(target) {
                warn!(website = %target, threshold = self.config.alert_threshold, "Website is down");
                batch.push(target);
            }
        }

        if !batch.is_empty() {
            info!(count = batch.len(), "Sending down alert");
            if let Err(e) = self
                .notifier
                .send(&self.config.recipients, &batch.subject(), &batch.body())
                .await
            {
                error!("Error sending down alert: {:#}", e);
            }
        }

        batch
    }
}

async fn poll_loop(shared: Arc<Shared>, target: String, mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let observation = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            observation = shared.checker.check(&target) => observation,
        };

        // A check that finished after stop is dropped
        if *shutdown.borrow() {
            break;
        }
        shared.record(&target, observation).await;

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(shared.config.interval) => {}
        }
    }

    debug!(website = %target, "Stopping monitor for website");
}

async fn sweep_loop(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    // Coarser than polling so near-simultaneous failures share one notification
    let period = shared.config.interval.saturating_mul(2);

    loop {
        if *shutdown.borrow() {
            break;
        }

        shared.sweep().await;

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(period) => {}
        }
    }

    debug!("Stopping alert sweep");
}
