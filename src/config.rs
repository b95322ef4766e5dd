use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub collector: CollectorConfig,
    pub sampler: SamplerConfig,
    pub anomalies: AnomalyConfig,
    pub reports: ReportsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "snapshots.db".into(),
            max_pool_size: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Mount point whose usage is reported as the disk metric.
    pub disk_path: String,
    /// Number of top-CPU processes captured per sample.
    pub top_n_processes: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            disk_path: "/".into(),
            top_n_processes: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub interval_secs: u64,
    /// Total run length; 0 means run until interrupted.
    pub duration_secs: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 2,
            duration_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub cpu_percent_high: f64,
    pub mem_percent_high: f64,
    /// Network delta threshold in bytes; absent disables network anomalies.
    pub net_delta_high: Option<u64>,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            cpu_percent_high: 90.0,
            mem_percent_high: 90.0,
            net_delta_high: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    pub dir: String,
    pub default_name: String,
    /// If true, reports get unique report-YYYYMMDD-HHMMSS.md names instead
    /// of overwriting `default_name`.
    pub timestamped: bool,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            dir: "reports".into(),
            default_name: "report.md".into(),
            timestamped: false,
        }
    }
}

impl AppConfig {
    /// Load from the file named by CONFIG_FILE (default "sysnap.toml").
    /// A missing file yields the built-in defaults; a malformed one is an error.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "sysnap.toml".into());
        match std::fs::read_to_string(&path) {
            Ok(s) => Self::load_from_str(&s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
            Err(e) => Err(anyhow::anyhow!("read {}: {}", path, e)),
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            !self.collector.disk_path.is_empty(),
            "collector.disk_path must be non-empty"
        );
        anyhow::ensure!(
            self.collector.top_n_processes > 0,
            "collector.top_n_processes must be > 0, got {}",
            self.collector.top_n_processes
        );
        anyhow::ensure!(
            self.sampler.interval_secs > 0,
            "sampler.interval_secs must be > 0, got {}",
            self.sampler.interval_secs
        );
        anyhow::ensure!(
            self.anomalies.cpu_percent_high.is_finite()
                && (0.0..=100.0).contains(&self.anomalies.cpu_percent_high),
            "anomalies.cpu_percent_high must be within [0, 100], got {}",
            self.anomalies.cpu_percent_high
        );
        anyhow::ensure!(
            self.anomalies.mem_percent_high.is_finite()
                && (0.0..=100.0).contains(&self.anomalies.mem_percent_high),
            "anomalies.mem_percent_high must be within [0, 100], got {}",
            self.anomalies.mem_percent_high
        );
        anyhow::ensure!(
            !self.reports.dir.is_empty(),
            "reports.dir must be non-empty"
        );
        anyhow::ensure!(
            !self.reports.default_name.is_empty(),
            "reports.default_name must be non-empty"
        );
        Ok(())
    }
}
