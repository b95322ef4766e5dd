// Analyzer tests: empty-window contract, aggregates, network totals,
// anomaly reasons, series alignment.

mod common;

use sysnap::analyzer::analyze;
use sysnap::config::AnomalyConfig;
use sysnap::models::AnomalyReason;

fn thresholds() -> AnomalyConfig {
    AnomalyConfig::default()
}

#[test]
fn empty_window_yields_fully_formed_empty_analysis() {
    let analysis = analyze(&[], &thresholds());

    assert_eq!(analysis.time_range.start, None);
    assert_eq!(analysis.time_range.end, None);
    assert_eq!(analysis.count, 0);
    assert_eq!(analysis.metrics.cpu_percent.min, None);
    assert_eq!(analysis.metrics.cpu_percent.avg, None);
    assert_eq!(analysis.metrics.cpu_percent.max, None);
    assert_eq!(analysis.metrics.mem_percent.avg, None);
    assert_eq!(analysis.metrics.disk_percent.max, None);
    assert_eq!(analysis.disk.path, None);
    assert_eq!(analysis.disk.last_percent, None);
    assert_eq!(analysis.net.sent_total, 0);
    assert_eq!(analysis.net.recv_total, 0);
    assert_eq!(analysis.net.deltas_ignored, 0);
    assert!(analysis.anomalies.is_empty());
    assert_eq!(analysis.last_sample, None);
    assert!(analysis.series.cpu_percent.is_empty());
    assert!(analysis.series.mem_percent.is_empty());
    assert!(analysis.series.disk_percent.is_empty());
}

#[test]
fn aggregates_min_avg_max() {
    let samples: Vec<_> = [10.0, 20.0, 30.0]
        .iter()
        .enumerate()
        .map(|(i, &cpu)| {
            let mut s = common::sample(&format!("t{i}"));
            s.cpu_percent = cpu;
            s.mem_percent = cpu + 1.0;
            s.disk_percent = cpu + 2.0;
            s
        })
        .collect();

    let analysis = analyze(&samples, &thresholds());
    assert_eq!(analysis.count, 3);
    assert_eq!(analysis.time_range.start.as_deref(), Some("t0"));
    assert_eq!(analysis.time_range.end.as_deref(), Some("t2"));
    assert_eq!(analysis.metrics.cpu_percent.min, Some(10.0));
    assert_eq!(analysis.metrics.cpu_percent.avg, Some(20.0));
    assert_eq!(analysis.metrics.cpu_percent.max, Some(30.0));
    assert_eq!(analysis.metrics.mem_percent.avg, Some(21.0));
    assert_eq!(analysis.metrics.disk_percent.avg, Some(22.0));

    // Series aligned with the window order
    assert_eq!(analysis.series.cpu_percent, vec![10.0, 20.0, 30.0]);
    assert_eq!(analysis.series.mem_percent, vec![11.0, 21.0, 31.0]);
    assert_eq!(analysis.series.disk_percent, vec![12.0, 22.0, 32.0]);
}

#[test]
fn network_totals_skip_null_deltas() {
    let mut first = common::sample("t0"); // deltas None
    let mut second = common::sample("t1");
    second.net_sent_delta = Some(100);
    second.net_recv_delta = Some(200);
    let mut third = common::sample("t2");
    third.net_sent_delta = Some(50);
    third.net_recv_delta = None;
    first.net_sent = 1;
    second.net_sent = 2;
    third.net_sent = 3;

    let analysis = analyze(&[first, second, third], &thresholds());
    assert_eq!(analysis.net.sent_total, 150);
    assert_eq!(analysis.net.recv_total, 200);
    // t0 misses both directions, t2 misses one
    assert_eq!(analysis.net.deltas_ignored, 3);
}

#[test]
fn cpu_over_threshold_yields_single_anomaly_with_one_reason() {
    let mut s = common::sample("t0");
    s.cpu_percent = 95.0;

    let analysis = analyze(&[s], &thresholds());
    assert_eq!(analysis.anomalies.len(), 1);
    let anomaly = &analysis.anomalies[0];
    assert_eq!(anomaly.ts, "t0");
    assert_eq!(anomaly.reasons, vec![AnomalyReason::CpuPercentHigh]);
    assert_eq!(anomaly.cpu_percent, 95.0);
}

#[test]
fn cpu_and_mem_over_threshold_yield_one_entry_with_two_reasons() {
    let mut s = common::sample("t0");
    s.cpu_percent = 95.0;
    s.mem_percent = 91.0;

    let analysis = analyze(&[s], &thresholds());
    assert_eq!(analysis.anomalies.len(), 1);
    assert_eq!(
        analysis.anomalies[0].reasons,
        vec![AnomalyReason::CpuPercentHigh, AnomalyReason::MemPercentHigh]
    );
}

#[test]
fn threshold_is_inclusive() {
    let mut s = common::sample("t0");
    s.cpu_percent = 90.0;
    let analysis = analyze(&[s], &thresholds());
    assert_eq!(analysis.anomalies.len(), 1);

    let mut s = common::sample("t0");
    s.cpu_percent = 89.99;
    let analysis = analyze(&[s], &thresholds());
    assert!(analysis.anomalies.is_empty());
}

#[test]
fn network_anomalies_require_configured_threshold_and_non_null_delta() {
    let mut over = common::sample("t0");
    over.net_sent_delta = Some(2_000_000);
    over.net_recv_delta = None;

    // Disabled by default: no network anomaly however large the delta
    let analysis = analyze(std::slice::from_ref(&over), &thresholds());
    assert!(analysis.anomalies.is_empty());

    let cfg = AnomalyConfig {
        net_delta_high: Some(1_000_000),
        ..AnomalyConfig::default()
    };
    let analysis = analyze(std::slice::from_ref(&over), &cfg);
    assert_eq!(analysis.anomalies.len(), 1);
    // Null recv delta never triggers, only the sent direction fired
    assert_eq!(
        analysis.anomalies[0].reasons,
        vec![AnomalyReason::NetSentDeltaHigh]
    );
}

#[test]
fn disk_report_and_last_sample_come_from_last_window_entry() {
    let mut first = common::sample("t0");
    first.disk_percent = 10.0;
    let mut last = common::sample("t1");
    last.disk_percent = 77.0;
    last.disk_path = "/data".into();

    let analysis = analyze(&[first, last.clone()], &thresholds());
    assert_eq!(analysis.disk.path.as_deref(), Some("/data"));
    assert_eq!(analysis.disk.last_percent, Some(77.0));
    assert_eq!(analysis.last_sample, Some(last));
}

#[test]
fn non_finite_metric_values_coerce_to_zero() {
    let mut s = common::sample("t0");
    s.cpu_percent = f64::NAN;
    s.mem_percent = f64::INFINITY;

    let analysis = analyze(&[s], &thresholds());
    assert_eq!(analysis.metrics.cpu_percent.avg, Some(0.0));
    assert_eq!(analysis.metrics.mem_percent.avg, Some(0.0));
    assert!(analysis.anomalies.is_empty());
}
