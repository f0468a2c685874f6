//! Prometheus counters and gauges kept by each [crate::Coordinator].

use std::sync::atomic::AtomicU64;

use chrono::{DateTime, Utc};
use prometheus_client::{
    metrics::{counter::Counter, gauge::Gauge},
    registry::{Registry, Unit},
};

/// Metrics for a single installation. Cloning shares the underlying
/// values, so a registered clone keeps reporting what the coordinator
/// records.
#[derive(Clone, Debug, Default)]
pub struct CoordinatorMetrics {
    refreshes: Counter,
    refresh_failures: Counter,
    printers: Gauge,
    last_success: Gauge<f64, AtomicU64>,
}

impl CoordinatorMetrics {
    /// Register every metric under a sub-registry labelled with the
    /// installation name.
    pub fn register(&self, registry: &mut Registry, installation: &str) {
        let registry = registry.sub_registry_with_label(("installation".into(), installation.to_owned().into()));

        registry.register("refreshes", "Printer list refreshes attempted", self.refreshes.clone());
        registry.register(
            "refresh_failures",
            "Printer list refreshes that failed",
            self.refresh_failures.clone(),
        );
        registry.register(
            "printers",
            "Printers in the last good snapshot",
            self.printers.clone(),
        );
        registry.register_with_unit(
            "last_success_timestamp",
            "Unix time of the last good refresh",
            Unit::Seconds,
            self.last_success.clone(),
        );
    }

    pub(crate) fn record_attempt(&self) {
        self.refreshes.inc();
    }

    pub(crate) fn record_failure(&self) {
        self.refresh_failures.inc();
    }

    pub(crate) fn record_success(&self, printers: usize, at: DateTime<Utc>) {
        self.printers.set(i64::try_from(printers).unwrap_or(i64::MAX));
        self.last_success.set(at.timestamp_millis() as f64 / 1000.0);
    }

    /// Refreshes attempted so far.
    pub fn refreshes(&self) -> u64 {
        self.refreshes.get()
    }

    /// Refreshes that failed so far.
    pub fn refresh_failures(&self) -> u64 {
        self.refresh_failures.get()
    }
}
