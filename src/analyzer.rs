// Pure analysis of an ordered window of samples: per-metric aggregates,
// network totals from deltas, threshold anomalies, and raw series for
// rendering. No state across calls; nothing here touches the store.

use crate::config::AnomalyConfig;
use crate::models::{
    Analysis, Anomaly, AnomalyReason, DiskReport, MetricSummary, MetricsSummary, NetTotals, Sample,
    Series, TimeRange,
};

/// Analyze `samples` (assumed ascending by capture time, the store's
/// contract) against the configured thresholds.
///
/// An empty window yields a fully-formed empty Analysis: null range and
/// aggregates, zero totals, no anomalies, no last sample.
pub fn analyze(samples: &[Sample], thresholds: &AnomalyConfig) -> Analysis {
    if samples.is_empty() {
        return Analysis::default();
    }

    let mut series = Series::default();
    let mut net = NetTotals::default();
    let mut anomalies = Vec::new();

    for sample in samples {
        let cpu = finite_or_zero(sample.cpu_percent);
        let mem = finite_or_zero(sample.mem_percent);
        let disk = finite_or_zero(sample.disk_percent);
        series.cpu_percent.push(cpu);
        series.mem_percent.push(mem);
        series.disk_percent.push(disk);

        let mut reasons = Vec::new();
        if cpu >= thresholds.cpu_percent_high {
            reasons.push(AnomalyReason::CpuPercentHigh);
        }
        if mem >= thresholds.mem_percent_high {
            reasons.push(AnomalyReason::MemPercentHigh);
        }

        // A null delta never contributes to totals or triggers a network
        // anomaly; each missing direction counts once as ignored.
        match sample.net_sent_delta {
            Some(delta) => {
                net.sent_total += delta;
                if thresholds.net_delta_high.is_some_and(|t| delta >= t) {
                    reasons.push(AnomalyReason::NetSentDeltaHigh);
                }
            }
            None => net.deltas_ignored += 1,
        }
        match sample.net_recv_delta {
            Some(delta) => {
                net.recv_total += delta;
                if thresholds.net_delta_high.is_some_and(|t| delta >= t) {
                    reasons.push(AnomalyReason::NetRecvDeltaHigh);
                }
            }
            None => net.deltas_ignored += 1,
        }

        if !reasons.is_empty() {
            anomalies.push(Anomaly {
                ts: sample.ts.clone(),
                reasons,
                cpu_percent: cpu,
                mem_percent: mem,
                disk_percent: disk,
                net_sent_delta: sample.net_sent_delta,
                net_recv_delta: sample.net_recv_delta,
            });
        }
    }

    let last = &samples[samples.len() - 1];
    Analysis {
        time_range: TimeRange {
            start: Some(samples[0].ts.clone()),
            end: Some(last.ts.clone()),
        },
        count: samples.len(),
        metrics: MetricsSummary {
            cpu_percent: min_avg_max(&series.cpu_percent),
            mem_percent: min_avg_max(&series.mem_percent),
            disk_percent: min_avg_max(&series.disk_percent),
        },
        disk: DiskReport {
            path: Some(last.disk_path.clone()),
            last_percent: Some(finite_or_zero(last.disk_percent)),
        },
        net,
        anomalies,
        last_sample: Some(last.clone()),
        series,
    }
}

fn min_avg_max(vals: &[f64]) -> MetricSummary {
    if vals.is_empty() {
        return MetricSummary::default();
    }
    let mut min = vals[0];
    let mut max = vals[0];
    let mut sum = 0.0;
    for &v in vals {
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }
    MetricSummary {
        min: Some(min),
        avg: Some(sum / vals.len() as f64),
        max: Some(max),
    }
}

/// Malformed input (NaN/inf from a corrupt row) coerces to 0.0 rather than
/// poisoning the whole window.
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}
