// Host metrics via sysinfo. Produces one Sample per call; each metric family
// degrades independently to safe defaults so one bad reading never blocks the
// rest of the capture. Network deltas are filled in by the runner, not here.

use crate::config::CollectorConfig;
use crate::models::{ProcessSample, Sample};
use std::sync::Arc;
use sysinfo::{Disks, Networks, ProcessesToUpdate, System};

/// Source of point-in-time samples. Implemented by [`SysinfoCollector`] for
/// the real host and by scripted fakes in tests.
pub trait MetricsSource: Send + Sync {
    fn collect(&self) -> impl Future<Output = anyhow::Result<Sample>> + Send;
}

pub struct SysinfoCollector {
    sys: Arc<std::sync::Mutex<System>>,
    disks: Arc<std::sync::Mutex<Disks>>,
    networks: Arc<std::sync::Mutex<Networks>>,
    disk_path: String,
    top_n: usize,
}

impl SysinfoCollector {
    pub fn new(config: &CollectorConfig) -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();
        Self {
            sys: Arc::new(std::sync::Mutex::new(sys)),
            disks: Arc::new(std::sync::Mutex::new(disks)),
            networks: Arc::new(std::sync::Mutex::new(networks)),
            disk_path: config.disk_path.clone(),
            top_n: config.top_n_processes,
        }
    }
}

impl MetricsSource for SysinfoCollector {
    fn collect(&self) -> impl Future<Output = anyhow::Result<Sample>> + Send {
        let sys = self.sys.clone();
        let disks = self.disks.clone();
        let networks = self.networks.clone();
        let disk_path = self.disk_path.clone();
        let top_n = self.top_n;
        async move {
            tokio::task::spawn_blocking(move || {
                collect_blocking(&sys, &disks, &networks, &disk_path, top_n)
            })
            .await
            .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))
        }
    }
}

fn collect_blocking(
    sys: &std::sync::Mutex<System>,
    disks: &std::sync::Mutex<Disks>,
    networks: &std::sync::Mutex<Networks>,
    disk_path: &str,
    top_n: usize,
) -> Sample {
    let mut sample = Sample {
        ts: chrono::Local::now().to_rfc3339(),
        hostname: System::host_name().unwrap_or_else(|| "unknown".into()),
        os_name: System::name().unwrap_or_else(|| std::env::consts::OS.into()),
        os_release: System::os_version().unwrap_or_else(|| "unknown".into()),
        cpu_percent: 0.0,
        mem_total: 0,
        mem_used: 0,
        mem_percent: 0.0,
        disk_path: disk_path.to_string(),
        disk_total: 0,
        disk_used: 0,
        disk_percent: 0.0,
        net_sent: 0,
        net_recv: 0,
        net_sent_delta: None,
        net_recv_delta: None,
        top_processes: vec![],
    };

    match sys.lock() {
        Ok(mut sys) => {
            sys.refresh_cpu_all();
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            sys.refresh_cpu_all();
            sample.cpu_percent = (sys.global_cpu_usage() as f64).clamp(0.0, 100.0);

            sys.refresh_memory();
            let total = sys.total_memory();
            let used = total.saturating_sub(sys.available_memory());
            sample.mem_total = total;
            sample.mem_used = used;
            sample.mem_percent = percent_of(used, total);

            sys.refresh_processes(ProcessesToUpdate::All, true);
            let mut procs: Vec<ProcessSample> = sys
                .processes()
                .values()
                .map(|p| ProcessSample {
                    pid: p.pid().as_u32(),
                    name: p.name().to_string_lossy().into_owned(),
                    cpu_percent: (p.cpu_usage() as f64).max(0.0),
                    mem_rss: p.memory(),
                })
                .collect();
            procs.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
            procs.truncate(top_n);
            sample.top_processes = procs;
        }
        Err(e) => {
            tracing::warn!(error = %e, operation = "collect_cpu_mem_procs", "sysinfo lock poisoned");
        }
    }

    match disks.lock() {
        Ok(mut disks) => {
            disks.refresh(false);
            let disk = disks
                .list()
                .iter()
                .find(|d| d.mount_point().to_string_lossy() == disk_path)
                .or_else(|| {
                    let first = disks.list().first();
                    if first.is_some() {
                        tracing::warn!(
                            disk_path,
                            operation = "collect_disk",
                            "configured mount not found; falling back to first disk"
                        );
                    }
                    first
                });
            if let Some(d) = disk {
                let total = d.total_space();
                let used = total.saturating_sub(d.available_space());
                sample.disk_path = d.mount_point().to_string_lossy().into_owned();
                sample.disk_total = total;
                sample.disk_used = used;
                sample.disk_percent = percent_of(used, total);
            } else {
                tracing::warn!(operation = "collect_disk", "no disks listed");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, operation = "collect_disk", "sysinfo disks lock poisoned");
        }
    }

    match networks.lock() {
        Ok(mut networks) => {
            networks.refresh(true);
            // Cumulative counters summed over all interfaces.
            for (_name, data) in networks.list() {
                sample.net_sent = sample.net_sent.saturating_add(data.total_transmitted());
                sample.net_recv = sample.net_recv.saturating_add(data.total_received());
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, operation = "collect_network", "sysinfo networks lock poisoned");
        }
    }

    sample
}

fn percent_of(used: u64, total: u64) -> f64 {
    if total > 0 {
        (used as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
