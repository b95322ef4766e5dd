// Report rendering tests: section presence, byte formatting, file output

mod common;

use sysnap::analyzer::analyze;
use sysnap::config::AnomalyConfig;
use sysnap::models::Analysis;
use sysnap::report::{fmt_bytes, render_markdown, write_report};
use tempfile::TempDir;

#[test]
fn fmt_bytes_units() {
    assert_eq!(fmt_bytes(0), "0 B");
    assert_eq!(fmt_bytes(1023), "1023 B");
    assert_eq!(fmt_bytes(1024), "1.00 KB");
    assert_eq!(fmt_bytes(1536), "1.50 KB");
    assert_eq!(fmt_bytes(5 * 1024 * 1024), "5.00 MB");
    assert_eq!(fmt_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
}

#[test]
fn render_empty_analysis_has_all_sections() {
    let md = render_markdown(&Analysis::default());
    assert!(md.contains("# System snapshots report"));
    assert!(md.contains("- Snapshots analyzed: **0**"));
    assert!(md.contains("## Metrics summary"));
    assert!(md.contains("| CPU (%) | - | - | - |"));
    assert!(md.contains("## Network totals (from deltas)"));
    assert!(md.contains("## Anomalies\n\n- None"));
    assert!(md.contains("## Last snapshot (raw)\n\n- None"));
}

#[test]
fn render_populated_analysis() {
    let mut hot = common::sample("t1");
    hot.cpu_percent = 95.0;
    hot.net_sent_delta = Some(2048);
    hot.net_recv_delta = Some(1024);
    hot.top_processes = vec![common::process(7, "builder", 88.5)];

    let analysis = analyze(&[common::sample("t0"), hot], &AnomalyConfig::default());
    let md = render_markdown(&analysis);

    assert!(md.contains("- Time range: `t0` -> `t1`"));
    assert!(md.contains("- Snapshots analyzed: **2**"));
    assert!(md.contains("cpu_percent_high"));
    assert!(md.contains("sent_delta=2.00 KB"));
    assert!(md.contains("- hostname: `testhost`"));
    assert!(md.contains("| 7 | builder | 88.50 |"));
}

#[test]
fn write_report_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("out").join("report.md");

    write_report(&Analysis::default(), &path).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("# System snapshots report"));
}
