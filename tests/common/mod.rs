// Shared test fixtures: sample builders with sane defaults.

#![allow(dead_code)]

use sysnap::models::{ProcessSample, Sample};

pub fn sample(ts: &str) -> Sample {
    Sample {
        ts: ts.into(),
        hostname: "testhost".into(),
        os_name: "Linux".into(),
        os_release: "6.1.0".into(),
        cpu_percent: 10.0,
        mem_total: 8 * 1024 * 1024 * 1024,
        mem_used: 4 * 1024 * 1024 * 1024,
        mem_percent: 50.0,
        disk_path: "/".into(),
        disk_total: 100_000_000_000,
        disk_used: 50_000_000_000,
        disk_percent: 50.0,
        net_sent: 0,
        net_recv: 0,
        net_sent_delta: None,
        net_recv_delta: None,
        top_processes: vec![],
    }
}

pub fn process(pid: u32, name: &str, cpu_percent: f64) -> ProcessSample {
    ProcessSample {
        pid,
        name: name.into(),
        cpu_percent,
        mem_rss: 64 * 1024 * 1024,
    }
}
