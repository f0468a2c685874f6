//! Periodic polling of one installation's printers.
//!
//! A [Coordinator] owns the latest good [Snapshot] for its installation. It
//! refreshes on a fixed interval, never runs two refreshes at once, and on
//! failure keeps serving the previous snapshot while flagging itself as
//! stale.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{Mutex, RwLock},
    time::{Instant, MissedTickBehavior},
};

use crate::{metrics::CoordinatorMetrics, snapshot::Snapshot, traits::PrinterSource};

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// A refresh failed. The previous snapshot is still being served.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("error fetching printers: {message}")]
pub struct UpdateFailed {
    message: String,
}

impl UpdateFailed {
    fn from_error(error: &anyhow::Error) -> Self {
        Self {
            message: format!("{:#}", error),
        }
    }

    /// The full error chain of the underlying failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The very first refresh of an installation failed, so it never became
/// usable.
#[derive(Clone, Debug, thiserror::Error)]
#[error("installation {installation} is not ready")]
pub struct NotReady {
    /// Installation name.
    pub installation: String,

    /// Why the first refresh failed.
    #[source]
    pub source: UpdateFailed,
}

/// Health of a coordinator, as reported to presentation adapters.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct CoordinatorStatus {
    /// Installation name.
    pub installation: String,

    /// Seconds between refreshes.
    pub poll_interval_secs: u64,

    /// False until the first good refresh, and after any failed one.
    pub last_update_success: bool,

    /// When the last refresh finished, good or bad.
    pub last_refreshed: Option<DateTime<Utc>>,

    /// When the last good refresh finished.
    pub last_success: Option<DateTime<Utc>>,

    /// Message of the last failure, cleared by the next good refresh.
    pub last_error: Option<String>,

    /// Printers in the snapshot being served.
    pub printers: usize,

    /// True while a refresh is in flight.
    pub refreshing: bool,
}

#[derive(Debug, Default)]
struct State {
    snapshot: Arc<Snapshot>,
    last_update_success: bool,
    last_refreshed: Option<DateTime<Utc>>,
    last_success: Option<DateTime<Utc>>,
    last_error: Option<UpdateFailed>,
}

/// Polls a [PrinterSource] and publishes what it returns.
pub struct Coordinator {
    name: String,
    source: Arc<dyn PrinterSource>,
    interval: Duration,
    state: RwLock<State>,
    refresh_guard: Mutex<()>,
    metrics: CoordinatorMetrics,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Create a coordinator. Nothing is fetched until [Coordinator::refresh]
    /// or [Coordinator::spawn] is called. A zero interval falls back to
    /// [DEFAULT_POLL_INTERVAL].
    pub fn new(name: impl Into<String>, source: Arc<dyn PrinterSource>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            source,
            interval: if interval.is_zero() {
                DEFAULT_POLL_INTERVAL
            } else {
                interval
            },
            state: RwLock::new(State::default()),
            refresh_guard: Mutex::new(()),
            metrics: CoordinatorMetrics::default(),
        }
    }

    /// Installation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time between scheduled refreshes.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Metrics recorded by this coordinator.
    pub fn metrics(&self) -> &CoordinatorMetrics {
        &self.metrics
    }

    /// The snapshot currently being served.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.state.read().await.snapshot.clone()
    }

    /// The served snapshot, paired with whether the last refresh succeeded.
    /// Both come from a single read of the state.
    pub async fn snapshot_with_health(&self) -> (Arc<Snapshot>, bool) {
        let state = self.state.read().await;
        (state.snapshot.clone(), state.last_update_success)
    }

    /// True while a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refresh_guard.try_lock().is_err()
    }

    /// Current health.
    pub async fn status(&self) -> CoordinatorStatus {
        let refreshing = self.is_refreshing();
        let state = self.state.read().await;

        CoordinatorStatus {
            installation: self.name.clone(),
            poll_interval_secs: self.interval.as_secs(),
            last_update_success: state.last_update_success,
            last_refreshed: state.last_refreshed,
            last_success: state.last_success,
            last_error: state.last_error.as_ref().map(|error| error.message().to_owned()),
            printers: state.snapshot.len(),
            refreshing,
        }
    }

    /// Fetch printers once and publish the result.
    ///
    /// Waits for any refresh already in flight, so refreshes never overlap.
    /// On failure the previous snapshot stays in place.
    #[tracing::instrument(skip_all, fields(installation = %self.name))]
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, UpdateFailed> {
        let _guard = self.refresh_guard.lock().await;
        self.metrics.record_attempt();

        tracing::debug!("refreshing printers");
        let result = self.source.list_printers().await;
        let now = Utc::now();

        let mut state = self.state.write().await;
        state.last_refreshed = Some(now);

        match result {
            Ok(printers) => {
                let snapshot = Arc::new(Snapshot::from_printers(printers));

                if let Some(previous) = state.last_error.take() {
                    tracing::info!(previous = previous.message(), "printer updates recovered");
                }
                tracing::debug!(printers = snapshot.len(), "published snapshot");

                state.snapshot = snapshot.clone();
                state.last_update_success = true;
                state.last_success = Some(now);
                self.metrics.record_success(snapshot.len(), now);

                Ok(snapshot)
            }
            Err(error) => {
                let failed = UpdateFailed::from_error(&error);
                self.metrics.record_failure();

                if state.last_error.is_none() {
                    tracing::warn!(error = format!("{:?}", error), "printer updates failing");
                } else {
                    tracing::debug!(error = format!("{:?}", error), "printer updates still failing");
                }

                state.last_update_success = false;
                state.last_error = Some(failed.clone());

                Err(failed)
            }
        }
    }

    /// Run the first refresh. A failure here means the installation never
    /// became usable.
    pub async fn first_refresh(&self) -> Result<Arc<Snapshot>, NotReady> {
        self.refresh().await.map_err(|source| NotReady {
            installation: self.name.clone(),
            source,
        })
    }

    /// Refresh forever at the configured interval, starting one interval
    /// from now. Failures are logged by [Coordinator::refresh] and the loop
    /// keeps going.
    pub async fn run(self: Arc<Self>) {
        let mut ticks = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;
            let _ = self.refresh().await;
        }
    }

    /// Spawn [Coordinator::run] onto the runtime.
    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.clone().run())
    }
}
