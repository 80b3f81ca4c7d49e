use crate::slurm::{self, SlurmProvider};
use serde::Serialize;
use std::io;
use tracing::{debug, warn};

/// Gauge names with their Prometheus help text, in export order.
pub const GAUGES: [(&str, &str); 7] = [
    ("alloc", "Allocated GPUs"),
    ("idle", "Idle GPUs"),
    ("total", "Total GPUs"),
    ("running", "Running GPUs"),
    ("unused", "Idle running GPUs"),
    ("utilization", "Total GPU utilization"),
    ("node_utilization", "Total running GPU nodes utilization"),
];

/// GPU gauges from one collection.
///
/// A gauge is `None` when the Slurm query it depends on failed. Ratios over a
/// zero denominator are kept as NaN/inf rather than hidden.
#[derive(Serialize, Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alloc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unused: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_utilization: Option<f64>,
}

impl MetricsSnapshot {
    pub fn derive(alloc: Option<f64>, running: Option<f64>, total: Option<f64>) -> Self {
        MetricsSnapshot {
            alloc,
            idle: combine(total, alloc, |total, alloc| total - alloc),
            total,
            running,
            unused: combine(running, alloc, |running, alloc| running - alloc),
            utilization: combine(alloc, total, |alloc, total| alloc / total),
            node_utilization: combine(alloc, running, |alloc, running| alloc / running),
        }
    }

    /// Values in the same order as [`GAUGES`].
    fn values(&self) -> [Option<f64>; 7] {
        [
            self.alloc,
            self.idle,
            self.total,
            self.running,
            self.unused,
            self.utilization,
            self.node_utilization,
        ]
    }

    /// `(name, help, value)` for every gauge that has a value.
    pub fn present_gauges(&self) -> Vec<(&'static str, &'static str, f64)> {
        GAUGES
            .into_iter()
            .zip(self.values())
            .filter_map(|((name, help), value)| value.map(|value| (name, help, value)))
            .collect()
    }
}

fn combine(a: Option<f64>, b: Option<f64>, f: impl Fn(f64, f64) -> f64) -> Option<f64> {
    a.zip(b).map(|(a, b)| f(a, b))
}

/// Query Slurm and derive all GPU gauges.
///
/// The three queries are independent, so they run side by side.
pub async fn collect_metrics<P: SlurmProvider + ?Sized>(provider: &P) -> MetricsSnapshot {
    let (alloc, running, total) = tokio::join!(
        slurm::get_allocated_gpus(provider),
        slurm::get_running_gpus(provider),
        slurm::get_total_gpus(provider),
    );

    let snapshot = MetricsSnapshot::derive(
        ok_or_warn(alloc, "allocated"),
        ok_or_warn(running, "running"),
        ok_or_warn(total, "total"),
    );
    debug!("Collected GPU metrics: {:?}", snapshot);
    snapshot
}

fn ok_or_warn(result: io::Result<f64>, what: &str) -> Option<f64> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to get {} GPUs: {}", what, e);
            None
        }
    }
}
