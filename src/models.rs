// Domain models: samples as captured/persisted, and the derived analysis.

use serde::{Deserialize, Serialize};

/// One process observation attached to exactly one [`Sample`].
///
/// `pid` is the identifier at capture time only; the OS may reuse it across
/// samples, so it is not a stable process identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub mem_rss: u64,
}

/// One timestamped observation of host resource usage plus its process list.
///
/// `net_sent`/`net_recv` are cumulative counters since boot/interface reset;
/// the per-tick deltas are filled in by the runner (never by the collector)
/// and are `None` on the first tick of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// RFC 3339 capture timestamp; primary ordering key.
    pub ts: String,
    pub hostname: String,
    pub os_name: String,
    pub os_release: String,
    pub cpu_percent: f64,
    pub mem_total: u64,
    pub mem_used: u64,
    pub mem_percent: f64,
    pub disk_path: String,
    pub disk_total: u64,
    pub disk_used: u64,
    pub disk_percent: f64,
    pub net_sent: u64,
    pub net_recv: u64,
    pub net_sent_delta: Option<u64>,
    pub net_recv_delta: Option<u64>,
    pub top_processes: Vec<ProcessSample>,
}

/// Outcome of one sampling run; echoed parameters plus counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub samples_saved: u64,
    pub interval_secs: u64,
    pub duration_secs: u64,
    pub elapsed_secs: f64,
}

/// Why a sample was flagged; serializes to snake_case (e.g. "cpu_percent_high").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyReason {
    CpuPercentHigh,
    MemPercentHigh,
    NetSentDeltaHigh,
    NetRecvDeltaHigh,
}

impl std::fmt::Display for AnomalyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnomalyReason::CpuPercentHigh => "cpu_percent_high",
            AnomalyReason::MemPercentHigh => "mem_percent_high",
            AnomalyReason::NetSentDeltaHigh => "net_sent_delta_high",
            AnomalyReason::NetRecvDeltaHigh => "net_recv_delta_high",
        };
        f.write_str(s)
    }
}

/// A flagged sample: every threshold reason it met, plus its metric values
/// at that instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub ts: String,
    pub reasons: Vec<AnomalyReason>,
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub disk_percent: f64,
    pub net_sent_delta: Option<u64>,
    pub net_recv_delta: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Min/avg/max over one metric series; all `None` for an empty window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub cpu_percent: MetricSummary,
    pub mem_percent: MetricSummary,
    pub disk_percent: MetricSummary,
}

/// Disk state taken from the last sample in the window only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskReport {
    pub path: Option<String>,
    pub last_percent: Option<f64>,
}

/// Network byte totals summed from non-null deltas; samples missing a delta
/// in either direction are counted in `deltas_ignored`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetTotals {
    pub sent_total: u64,
    pub recv_total: u64,
    pub deltas_ignored: u32,
}

/// Raw per-sample series aligned with the window order, for charting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub cpu_percent: Vec<f64>,
    pub mem_percent: Vec<f64>,
    pub disk_percent: Vec<f64>,
}

/// Derived, non-persisted summary of a window of samples.
///
/// Well-typed even for an empty window: count 0, null aggregates, empty
/// anomaly list, no last sample. Downstream rendering never needs to guess.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub time_range: TimeRange,
    pub count: usize,
    pub metrics: MetricsSummary,
    pub disk: DiskReport,
    pub net: NetTotals,
    pub anomalies: Vec<Anomaly>,
    pub last_sample: Option<Sample>,
    pub series: Series,
}
