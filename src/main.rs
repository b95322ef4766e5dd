// Entry point: arg parsing, logging setup, path resolution, and wiring of
// the collector/runner/store/analyzer/report modules behind three
// subcommands (init-db, run, report).

use anyhow::Result;
use serde_json::json;
use std::env;
use std::path::PathBuf;
use sysnap::collector::SysinfoCollector;
use sysnap::config::{AppConfig, ReportsConfig};
use sysnap::store::SnapshotRepo;
use sysnap::{analyzer, report, runner};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    InitDb,
    Run {
        interval: Option<i64>,
        duration: Option<i64>,
    },
    Report {
        last: i64,
        out: Option<String>,
    },
}

#[derive(Debug, PartialEq)]
struct ParsedArgs {
    verbose: bool,
    db: Option<String>,
    command: Command,
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--verbose] <command> [options]\n\
         \n\
         Commands:\n\
         \x20 init-db [--db PATH]                                Initialize the SQLite database\n\
         \x20 run     [--interval N] [--duration N] [--db PATH]  Run the sampling loop (duration 0 = until Ctrl+C)\n\
         \x20 report  [--last N] [--db PATH] [--out PATH]        Write a Markdown report from the last N samples"
    )
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "sysnap".into());

    let mut verbose = false;
    let mut db: Option<String> = None;
    let mut command: Option<String> = None;
    let mut interval: Option<i64> = None;
    let mut duration: Option<i64> = None;
    let mut last: i64 = 20;
    let mut out: Option<String> = None;

    let int_flag = |it: &mut I::IntoIter, flag: &str| -> Result<i64, String> {
        it.next()
            .ok_or_else(|| format!("{flag} requires a value"))?
            .parse::<i64>()
            .map_err(|_| format!("{flag} requires an integer value"))
    };

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "-V" | "--version" => {
                return Err(format!(
                    "{} {}",
                    env!("CARGO_PKG_NAME"),
                    env!("CARGO_PKG_VERSION")
                ));
            }
            "--verbose" => verbose = true,
            "--db" => db = Some(it.next().ok_or("--db requires a value")?),
            "--out" => out = Some(it.next().ok_or("--out requires a value")?),
            "--interval" => interval = Some(int_flag(&mut it, "--interval")?),
            "--duration" => duration = Some(int_flag(&mut it, "--duration")?),
            "--last" => last = int_flag(&mut it, "--last")?,
            "init-db" | "run" | "report" if command.is_none() => {
                command = Some(arg);
            }
            _ => return Err(format!("Unexpected argument: {arg}\n{}", usage(&prog))),
        }
    }

    let command = match command.as_deref() {
        Some("init-db") => Command::InitDb,
        Some("run") => Command::Run { interval, duration },
        Some("report") => Command::Report { last, out },
        _ => return Err(usage(&prog)),
    };
    Ok(ParsedArgs {
        verbose,
        db,
        command,
    })
}

fn resolve_report_path(cli_out: Option<&str>, reports: &ReportsConfig) -> PathBuf {
    if let Some(out) = cli_out {
        return PathBuf::from(out);
    }
    let name = if reports.timestamped {
        format!(
            "report-{}.md",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        )
    } else {
        reports.default_name.clone()
    };
    PathBuf::from(&reports.dir).join(name)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    let default_level = if parsed.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let config = AppConfig::load()?;
    let db_path = parsed.db.unwrap_or_else(|| config.database.path.clone());

    let repo = SnapshotRepo::connect(&db_path, config.database.max_pool_size).await?;
    repo.init().await?;

    match parsed.command {
        Command::InitDb => {
            println!("{}", json!({ "db_path": db_path, "status": "initialized" }));
        }
        Command::Run { interval, duration } => {
            let collector = SysinfoCollector::new(&config.collector);
            let interval = interval.unwrap_or(config.sampler.interval_secs as i64);
            let duration = duration.unwrap_or(config.sampler.duration_secs as i64);

            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
            tokio::spawn(async move {
                shutdown_signal().await;
                tracing::info!("Received shutdown signal");
                let _ = shutdown_tx.send(());
            });

            let summary = runner::run(&collector, &repo, interval, duration, shutdown_rx).await;
            println!("{}", serde_json::to_string(&summary)?);
        }
        Command::Report { last, out } => {
            let samples = repo.get_samples(last).await?;
            let analysis = analyzer::analyze(&samples, &config.anomalies);
            let out_path = resolve_report_path(out.as_deref(), &config.reports);
            report::write_report(&analysis, &out_path)?;
            println!(
                "{}",
                json!({
                    "db_path": db_path,
                    "snapshots_used": samples.len(),
                    "report_path": out_path,
                })
            );
        }
    }

    Ok(())
}
