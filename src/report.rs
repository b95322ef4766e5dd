// Markdown rendering of an Analysis. Pure string building plus one file
// write; never reads the store or recomputes anything.

use crate::models::Analysis;
use std::fmt::Write as _;
use std::path::Path;

/// Render `analysis` to Markdown and write it to `path`, creating parent
/// directories as needed.
pub fn write_report(analysis: &Analysis, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_markdown(analysis))?;
    Ok(())
}

pub fn render_markdown(analysis: &Analysis) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# System snapshots report");
    let _ = writeln!(md);
    let _ = writeln!(
        md,
        "- Time range: `{}` -> `{}`",
        opt_str(&analysis.time_range.start),
        opt_str(&analysis.time_range.end)
    );
    let _ = writeln!(md, "- Snapshots analyzed: **{}**", analysis.count);
    let _ = writeln!(md);

    let _ = writeln!(md, "## Metrics summary");
    let _ = writeln!(md);
    let _ = writeln!(md, "| Metric | Min | Avg | Max |");
    let _ = writeln!(md, "|---|---:|---:|---:|");
    for (label, m) in [
        ("CPU (%)", &analysis.metrics.cpu_percent),
        ("MEM (%)", &analysis.metrics.mem_percent),
        ("DISK (%)", &analysis.metrics.disk_percent),
    ] {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} |",
            label,
            fmt_num(m.min),
            fmt_num(m.avg),
            fmt_num(m.max)
        );
    }
    let _ = writeln!(md);

    let _ = writeln!(md, "## Disk (last snapshot)");
    let _ = writeln!(md);
    let _ = writeln!(md, "- Path: `{}`", opt_str(&analysis.disk.path));
    let _ = writeln!(md, "- Used: **{}%**", fmt_num(analysis.disk.last_percent));
    let _ = writeln!(md);

    let _ = writeln!(md, "## Network totals (from deltas)");
    let _ = writeln!(md);
    let _ = writeln!(md, "- Sent total: **{}**", fmt_bytes(analysis.net.sent_total));
    let _ = writeln!(md, "- Recv total: **{}**", fmt_bytes(analysis.net.recv_total));
    let _ = writeln!(md, "- Deltas ignored (null): **{}**", analysis.net.deltas_ignored);
    let _ = writeln!(md);

    let _ = writeln!(md, "## Anomalies");
    let _ = writeln!(md);
    if analysis.anomalies.is_empty() {
        let _ = writeln!(md, "- None");
    } else {
        for a in &analysis.anomalies {
            let reasons = a
                .reasons
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                md,
                "- `{}` - {} (cpu={}%, mem={}%, sent_delta={}, recv_delta={})",
                a.ts,
                reasons,
                fmt_num(Some(a.cpu_percent)),
                fmt_num(Some(a.mem_percent)),
                fmt_opt_bytes(a.net_sent_delta),
                fmt_opt_bytes(a.net_recv_delta)
            );
        }
    }
    let _ = writeln!(md);

    let _ = writeln!(md, "## Last snapshot (raw)");
    let _ = writeln!(md);
    let Some(last) = &analysis.last_sample else {
        let _ = writeln!(md, "- None");
        return md;
    };

    let _ = writeln!(md, "- ts: `{}`", last.ts);
    let _ = writeln!(md, "- hostname: `{}`", last.hostname);
    let _ = writeln!(md, "- os: `{} {}`", last.os_name, last.os_release);
    let _ = writeln!(md, "- cpu: **{}%**", fmt_num(Some(last.cpu_percent)));
    let _ = writeln!(
        md,
        "- mem: **{}%** ({} / {})",
        fmt_num(Some(last.mem_percent)),
        fmt_bytes(last.mem_used),
        fmt_bytes(last.mem_total)
    );
    let _ = writeln!(
        md,
        "- disk: **{}%** ({} / {}) at `{}`",
        fmt_num(Some(last.disk_percent)),
        fmt_bytes(last.disk_used),
        fmt_bytes(last.disk_total),
        last.disk_path
    );
    let _ = writeln!(
        md,
        "- net: sent={}, recv={}, sent_delta={}, recv_delta={}",
        fmt_bytes(last.net_sent),
        fmt_bytes(last.net_recv),
        fmt_opt_bytes(last.net_sent_delta),
        fmt_opt_bytes(last.net_recv_delta)
    );
    let _ = writeln!(md);

    let _ = writeln!(md, "### Top processes (last snapshot)");
    let _ = writeln!(md);
    if last.top_processes.is_empty() {
        let _ = writeln!(md, "- None");
    } else {
        let _ = writeln!(md, "| PID | Name | CPU (%) | RSS |");
        let _ = writeln!(md, "|---:|---|---:|---:|");
        for p in &last.top_processes {
            let _ = writeln!(
                md,
                "| {} | {} | {} | {} |",
                p.pid,
                safe_name(&p.name),
                fmt_num(Some(p.cpu_percent)),
                fmt_bytes(p.mem_rss)
            );
        }
    }
    let _ = writeln!(md);

    md
}

fn opt_str(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("-")
}

/// Two-decimal number or "-" when absent.
pub fn fmt_num(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{:.2}", v),
        None => "-".into(),
    }
}

/// Human-readable byte count (B through PB, two decimals above bytes).
pub fn fmt_bytes(n: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    let mut v = n as f64;
    let mut i = 0;
    while v >= 1024.0 && i < UNITS.len() - 1 {
        v /= 1024.0;
        i += 1;
    }
    if i == 0 {
        format!("{} {}", n, UNITS[i])
    } else {
        format!("{:.2} {}", v, UNITS[i])
    }
}

fn fmt_opt_bytes(v: Option<u64>) -> String {
    match v {
        Some(n) => fmt_bytes(n),
        None => "None".into(),
    }
}

/// Process names come from the OS; strip newlines so table rows stay intact.
fn safe_name(name: &str) -> String {
    let cleaned = name.replace('\n', " ");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "unknown".into()
    } else {
        trimmed.to_string()
    }
}
