// End-to-end pipeline: scripted source -> runner -> store -> analyzer -> report

mod common;

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use sysnap::analyzer::analyze;
use sysnap::collector::MetricsSource;
use sysnap::config::AnomalyConfig;
use sysnap::models::{AnomalyReason, Sample};
use sysnap::report::render_markdown;
use sysnap::runner;
use sysnap::store::SnapshotRepo;
use tempfile::TempDir;
use tokio::sync::oneshot;

/// Emits samples with steadily growing counters and a CPU spike on the third
/// tick; signals shutdown after `limit` collects.
struct RampSource {
    tick: AtomicU64,
    limit: u64,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl MetricsSource for RampSource {
    fn collect(&self) -> impl Future<Output = anyhow::Result<Sample>> + Send {
        let tick = self.tick.fetch_add(1, Ordering::SeqCst) + 1;
        if tick >= self.limit
            && let Some(tx) = self.shutdown_tx.lock().unwrap().take()
        {
            let _ = tx.send(());
        }
        let mut s = common::sample(&format!("2026-08-26T10:00:0{tick}+00:00"));
        s.cpu_percent = if tick == 3 { 97.0 } else { 20.0 };
        s.net_sent = tick * 1000;
        s.net_recv = tick * 4000;
        async move { Ok(s) }
    }
}

#[tokio::test]
async fn pipeline_run_store_analyze_report() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("snapshots.db");
    let repo = SnapshotRepo::connect(db_path.to_str().unwrap(), 5)
        .await
        .unwrap();
    repo.init().await.unwrap();

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let source = RampSource {
        tick: AtomicU64::new(0),
        limit: 4,
        shutdown_tx: Mutex::new(Some(shutdown_tx)),
    };

    let summary = runner::run(&source, &repo, 1, 0, shutdown_rx).await;
    assert_eq!(summary.ticks, 4);
    assert_eq!(summary.samples_saved, 4);

    let samples = repo.get_samples(50).await.unwrap();
    assert_eq!(samples.len(), 4);

    let cfg = AnomalyConfig {
        net_delta_high: Some(3500),
        ..AnomalyConfig::default()
    };
    let analysis = analyze(&samples, &cfg);
    assert_eq!(analysis.count, 4);
    // First tick contributes no deltas; ticks 2-4 add 1000 sent / 4000 recv each
    assert_eq!(analysis.net.sent_total, 3000);
    assert_eq!(analysis.net.recv_total, 12000);
    assert_eq!(analysis.net.deltas_ignored, 2);

    // Tick 3 trips CPU and (recv) network thresholds together; ticks 2 and 4
    // trip only the recv threshold.
    let spike = analysis
        .anomalies
        .iter()
        .find(|a| a.reasons.contains(&AnomalyReason::CpuPercentHigh))
        .expect("cpu spike anomaly");
    assert!(spike.reasons.contains(&AnomalyReason::NetRecvDeltaHigh));
    assert_eq!(analysis.anomalies.len(), 3);

    let md = render_markdown(&analysis);
    assert!(md.contains("- Snapshots analyzed: **4**"));
    assert!(md.contains("cpu_percent_high"));
}
