// Timed sampling loop: collect -> enrich with network deltas -> persist.
// A failing tick logs and the loop continues; only duration expiry or the
// shutdown signal ends a run, and both yield a valid RunSummary.

use crate::collector::MetricsSource;
use crate::models::RunSummary;
use crate::store::SnapshotRepo;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant, sleep};

/// Previous-tick network counters, scoped to one run. A fresh run always
/// starts empty, so the first delta pair is None even when persisted history
/// exists.
#[derive(Debug, Default)]
pub struct DeltaTracker {
    prev_sent: Option<u64>,
    prev_recv: Option<u64>,
}

impl DeltaTracker {
    /// Compute deltas against the previous tick and advance to the current
    /// counters. Counter resets (current < previous) clamp to a zero delta;
    /// the stored counters always move to the current readings so resets
    /// self-correct on the next tick.
    pub fn advance(&mut self, sent: u64, recv: u64) -> (Option<u64>, Option<u64>) {
        let deltas = match (self.prev_sent, self.prev_recv) {
            (Some(prev_sent), Some(prev_recv)) => {
                if sent < prev_sent {
                    tracing::warn!(prev = prev_sent, current = sent, "net sent counter reset; sent_delta=0");
                }
                if recv < prev_recv {
                    tracing::warn!(prev = prev_recv, current = recv, "net recv counter reset; recv_delta=0");
                }
                (
                    Some(sent.saturating_sub(prev_sent)),
                    Some(recv.saturating_sub(prev_recv)),
                )
            }
            _ => (None, None),
        };
        self.prev_sent = Some(sent);
        self.prev_recv = Some(recv);
        deltas
    }
}

/// Execute a sampling run against `source` and `repo`.
///
/// `interval_secs <= 0` is coerced to 1; `duration_secs == 0` runs until the
/// shutdown signal fires. The shutdown signal is checked at the top of each
/// tick and interrupts the inter-tick wait.
///
/// Precondition: one runner per store target. Delta state is local to this
/// invocation and two concurrent writers against the same DB are undefined.
pub async fn run<S: MetricsSource>(
    source: &S,
    repo: &SnapshotRepo,
    interval_secs: i64,
    duration_secs: i64,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> RunSummary {
    let interval_secs = if interval_secs <= 0 { 1 } else { interval_secs as u64 };
    let duration_secs = duration_secs.max(0) as u64;
    let period = Duration::from_secs(interval_secs);
    let deadline = (duration_secs > 0).then(|| Duration::from_secs(duration_secs));

    let mut tracker = DeltaTracker::default();
    let mut ticks: u64 = 0;
    let mut samples_saved: u64 = 0;
    let start = Instant::now();

    tracing::info!(interval_secs, duration_secs, "run start");

    loop {
        if deadline.is_some_and(|d| start.elapsed() >= d) {
            break;
        }
        // Honor a pending stop before starting another tick.
        match shutdown_rx.try_recv() {
            Err(oneshot::error::TryRecvError::Empty) => {}
            _ => {
                tracing::info!(tick = ticks, "run cancelled");
                break;
            }
        }

        let tick_start = Instant::now();
        ticks += 1;

        match source.collect().await {
            Ok(mut sample) => {
                let (sent_delta, recv_delta) = tracker.advance(sample.net_sent, sample.net_recv);
                sample.net_sent_delta = sent_delta;
                sample.net_recv_delta = recv_delta;

                match repo.save_sample(&sample).await {
                    Ok(snapshot_id) => {
                        samples_saved += 1;
                        tracing::info!(tick = ticks, snapshot_id, ts = %sample.ts, "sample saved");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, tick = ticks, operation = "save_sample", "tick failed");
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, tick = ticks, operation = "collect", "tick failed");
            }
        }

        // Damp scheduling drift: sleep only for what remains of the period.
        // An over-long tick proceeds immediately.
        let elapsed = tick_start.elapsed();
        if elapsed < period {
            tokio::select! {
                _ = sleep(period - elapsed) => {}
                _ = &mut shutdown_rx => {
                    tracing::info!(tick = ticks, "run cancelled");
                    break;
                }
            }
        }
    }

    let summary = RunSummary {
        ticks,
        samples_saved,
        interval_secs,
        duration_secs,
        elapsed_secs: start.elapsed().as_secs_f64(),
    };
    tracing::info!(
        ticks = summary.ticks,
        samples_saved = summary.samples_saved,
        elapsed_secs = summary.elapsed_secs,
        "run end"
    );
    summary
}
