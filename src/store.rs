// SQLite persistence for samples. Two tables: one row per sample in
// `snapshots`, N rows per sample in `process_samples` (FK + index, cascade
// delete). A sample and its process rows commit in one transaction; readers
// never see a partial sample.

use crate::models::{ProcessSample, Sample};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Persistence failure surfaced to the runner as a single-tick failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

pub struct SnapshotRepo {
    pool: SqlitePool,
}

impl SnapshotRepo {
    /// Connect to SQLite at `path`, create parent dir and DB if missing,
    /// enable WAL + foreign keys.
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    /// Create tables if they don't exist. Safe to call on every startup.
    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts TEXT NOT NULL,
                hostname TEXT NOT NULL,
                os_name TEXT NOT NULL,
                os_release TEXT NOT NULL,
                cpu_percent REAL NOT NULL,
                mem_total INTEGER NOT NULL,
                mem_used INTEGER NOT NULL,
                mem_percent REAL NOT NULL,
                disk_path TEXT NOT NULL,
                disk_total INTEGER NOT NULL,
                disk_used INTEGER NOT NULL,
                disk_percent REAL NOT NULL,
                net_sent INTEGER NOT NULL,
                net_recv INTEGER NOT NULL,
                net_sent_delta INTEGER NULL,
                net_recv_delta INTEGER NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS process_samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                snapshot_id INTEGER NOT NULL,
                pid INTEGER NOT NULL,
                name TEXT NOT NULL,
                cpu_percent REAL NOT NULL,
                mem_rss INTEGER NOT NULL,
                FOREIGN KEY (snapshot_id) REFERENCES snapshots(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_process_samples_snapshot_id
             ON process_samples(snapshot_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a sample and all its process rows as one transaction.
    /// On any failure the whole transaction rolls back; no partial state
    /// survives. Returns the new snapshot id.
    pub async fn save_sample(&self, sample: &Sample) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO snapshots (
                ts, hostname, os_name, os_release,
                cpu_percent, mem_total, mem_used, mem_percent,
                disk_path, disk_total, disk_used, disk_percent,
                net_sent, net_recv, net_sent_delta, net_recv_delta
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sample.ts)
        .bind(&sample.hostname)
        .bind(&sample.os_name)
        .bind(&sample.os_release)
        .bind(sample.cpu_percent)
        .bind(sample.mem_total as i64)
        .bind(sample.mem_used as i64)
        .bind(sample.mem_percent)
        .bind(&sample.disk_path)
        .bind(sample.disk_total as i64)
        .bind(sample.disk_used as i64)
        .bind(sample.disk_percent)
        .bind(sample.net_sent as i64)
        .bind(sample.net_recv as i64)
        .bind(sample.net_sent_delta.map(|v| v as i64))
        .bind(sample.net_recv_delta.map(|v| v as i64))
        .execute(&mut *tx)
        .await?;

        let snapshot_id = result.last_insert_rowid();

        for proc in &sample.top_processes {
            sqlx::query(
                "INSERT INTO process_samples (snapshot_id, pid, name, cpu_percent, mem_rss)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(snapshot_id)
            .bind(proc.pid as i64)
            .bind(&proc.name)
            .bind(proc.cpu_percent)
            .bind(proc.mem_rss as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(snapshot_id)
    }

    /// Fetch the last `n` samples by insertion order, oldest first, each
    /// rehydrated with its process list. Empty for `n <= 0` or an empty
    /// store. Process rows are fetched only for the selected snapshot ids.
    pub async fn get_samples(&self, n: i64) -> Result<Vec<Sample>, StoreError> {
        if n <= 0 {
            return Ok(vec![]);
        }

        let mut snap_rows = sqlx::query("SELECT * FROM snapshots ORDER BY id DESC LIMIT ?")
            .bind(n)
            .fetch_all(&self.pool)
            .await?;
        if snap_rows.is_empty() {
            return Ok(vec![]);
        }
        snap_rows.reverse();

        let ids: Vec<i64> = snap_rows
            .iter()
            .map(|r| r.try_get::<i64, _>("id"))
            .collect::<Result<_, _>>()?;

        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!(
            "SELECT snapshot_id, pid, name, cpu_percent, mem_rss
             FROM process_samples WHERE snapshot_id IN ({placeholders})
             ORDER BY snapshot_id, id"
        );
        let mut query = sqlx::query(&sql);
        for id in &ids {
            query = query.bind(id);
        }
        let proc_rows = query.fetch_all(&self.pool).await?;

        let mut procs_by_id: HashMap<i64, Vec<ProcessSample>> = HashMap::new();
        for row in proc_rows {
            let sid: i64 = row.try_get("snapshot_id")?;
            procs_by_id.entry(sid).or_default().push(ProcessSample {
                pid: row.try_get::<i64, _>("pid")? as u32,
                name: row.try_get("name")?,
                cpu_percent: row.try_get("cpu_percent")?,
                mem_rss: row.try_get::<i64, _>("mem_rss")? as u64,
            });
        }

        let mut out = Vec::with_capacity(snap_rows.len());
        for row in snap_rows {
            let id: i64 = row.try_get("id")?;
            out.push(sample_from_row(
                &row,
                procs_by_id.remove(&id).unwrap_or_default(),
            )?);
        }
        Ok(out)
    }
}

/// Single row-to-model mapping at the store boundary; null delta columns
/// rehydrate as None, never 0.
fn sample_from_row(row: &SqliteRow, top_processes: Vec<ProcessSample>) -> Result<Sample, StoreError> {
    Ok(Sample {
        ts: row.try_get("ts")?,
        hostname: row.try_get("hostname")?,
        os_name: row.try_get("os_name")?,
        os_release: row.try_get("os_release")?,
        cpu_percent: row.try_get("cpu_percent")?,
        mem_total: row.try_get::<i64, _>("mem_total")? as u64,
        mem_used: row.try_get::<i64, _>("mem_used")? as u64,
        mem_percent: row.try_get("mem_percent")?,
        disk_path: row.try_get("disk_path")?,
        disk_total: row.try_get::<i64, _>("disk_total")? as u64,
        disk_used: row.try_get::<i64, _>("disk_used")? as u64,
        disk_percent: row.try_get("disk_percent")?,
        net_sent: row.try_get::<i64, _>("net_sent")? as u64,
        net_recv: row.try_get::<i64, _>("net_recv")? as u64,
        net_sent_delta: row.try_get::<Option<i64>, _>("net_sent_delta")?.map(|v| v as u64),
        net_recv_delta: row.try_get::<Option<i64>, _>("net_recv_delta")?.map(|v| v as u64),
        top_processes,
    })
}
