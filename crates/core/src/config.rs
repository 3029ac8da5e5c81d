use std::time::Duration;

use clap::Parser;

use crate::duration::{format_duration, parse_compact, parse_interval};
use crate::error::ConfigError;

const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ── Raw options ───────────────────────────────────────────────

/// Cron monitor: alerts when Fleet crons go stale or report errors.
///
/// Every flag can also be supplied through its environment variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "cron-monitor", version, about, args_override_self = true)]
pub struct Options {
    /// Set by the Lambda runtime; its presence selects the Lambda handler loop.
    #[arg(long, env = "AWS_LAMBDA_RUNTIME_API")]
    pub lambda_runtime_api: Option<String>,

    /// Comma-separated SNS topic ARNs for cron system alerts.
    #[arg(long = "sns-cron-system-topic-arn", env = "CRON_SYSTEM_MONITOR_SNS_TOPIC_ARNS")]
    pub sns_cron_system_topic_arns: String,

    /// Comma-separated SNS topic ARNs for cron job failures.
    /// Defaults to the system topics.
    #[arg(
        long = "sns-cron-job-failure-topic-arn",
        env = "CRON_JOB_FAILURE_MONITOR_SNS_TOPIC_ARNS"
    )]
    pub sns_cron_job_failure_topic_arns: Option<String>,

    /// MySQL address, `host` or `host:port`.
    #[arg(long, env = "MYSQL_HOST")]
    pub mysql_host: String,

    #[arg(long, env = "MYSQL_USER")]
    pub mysql_user: String,

    /// Secrets Manager secret holding the MySQL password.
    #[arg(long = "mysql-secretsmanager-secret", env = "MYSQL_SECRETSMANAGER_SECRET")]
    pub mysql_secret: String,

    #[arg(long, env = "MYSQL_DATABASE")]
    pub mysql_database: String,

    /// Environment label prepended to every alert.
    #[arg(long = "fleet-environment", env = "FLEET_ENV")]
    pub fleet_env: String,

    #[arg(long, env = "AWS_REGION")]
    pub aws_region: String,

    /// How long a cron may go without a completed run.
    #[arg(long, env = "CRON_DELAY_TOLERANCE", default_value = "2h")]
    pub cron_delay_tolerance: String,

    /// Lookback window for the error digest, e.g. `1 hour`.
    #[arg(
        long = "monitor-run-interval",
        env = "CRON_MONITOR_RUN_INTERVAL",
        default_value = "1 hour"
    )]
    pub cron_monitor_interval: String,

    /// Endpoint override for local AWS emulators.
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub aws_endpoint_url: Option<String>,

    /// Comma-separated cron names that must report a completed run.
    #[arg(
        long,
        env = "CRON_MONITOR_EXPECTED_JOBS",
        default_value = "vulnerabilities,cleanups_then_aggregation"
    )]
    pub expected_jobs: String,
}

// ── Validated config ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub lambda_runtime_api: Option<String>,
    pub system_topic_arns: Vec<String>,
    /// Empty when not configured; routing falls back to `system_topic_arns`.
    pub job_failure_topic_arns: Vec<String>,
    pub mysql: MySqlConfig,
    pub environment: String,
    pub aws: AwsConfig,
    pub delay_tolerance: Duration,
    /// `delay_tolerance` as configured, quoted verbatim in staleness alerts.
    pub delay_tolerance_text: String,
    pub monitor_interval: Duration,
    pub expected_jobs: Vec<String>,
}

impl MonitorConfig {
    /// Parse command line and environment (call `load_dotenv()` first).
    pub fn from_args() -> Result<Self, ConfigError> {
        Self::from_options(Options::parse())
    }

    pub fn from_options(opts: Options) -> Result<Self, ConfigError> {
        let system_topic_arns = split_list(&opts.sns_cron_system_topic_arns);
        if system_topic_arns.is_empty() {
            return Err(ConfigError::Invalid(
                "CRON_SYSTEM_MONITOR_SNS_TOPIC_ARNS must name at least one topic".into(),
            ));
        }

        let expected_jobs = split_list(&opts.expected_jobs);
        if expected_jobs.is_empty() {
            return Err(ConfigError::Invalid(
                "CRON_MONITOR_EXPECTED_JOBS must name at least one cron".into(),
            ));
        }

        let delay_tolerance = parse_compact(&opts.cron_delay_tolerance)?;
        let monitor_interval = parse_interval(&opts.cron_monitor_interval)?;

        Ok(Self {
            lambda_runtime_api: opts.lambda_runtime_api.filter(|s| !s.is_empty()),
            system_topic_arns,
            job_failure_topic_arns: opts
                .sns_cron_job_failure_topic_arns
                .as_deref()
                .map(split_list)
                .unwrap_or_default(),
            mysql: MySqlConfig::new(
                &opts.mysql_host,
                opts.mysql_user,
                opts.mysql_secret,
                opts.mysql_database,
            )?,
            environment: opts.fleet_env,
            aws: AwsConfig {
                region: opts.aws_region,
                endpoint_url: opts.aws_endpoint_url.filter(|s| !s.is_empty()),
            },
            delay_tolerance,
            delay_tolerance_text: opts.cron_delay_tolerance.trim().to_string(),
            monitor_interval,
            expected_jobs,
        })
    }

    /// Whether the process was started by the Lambda runtime.
    pub fn is_lambda(&self) -> bool {
        self.lambda_runtime_api.is_some()
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        let mode = if self.is_lambda() { "lambda" } else { "local" };
        let endpoint = self.aws.endpoint_url.as_deref().unwrap_or("(default)");

        tracing::info!("Config loaded (environment: {}):", self.environment);
        tracing::info!("  mode:        {}", mode);
        tracing::info!(
            "  mysql:       host={}:{}, db={}",
            self.mysql.host,
            self.mysql.port,
            self.mysql.database
        );
        tracing::info!("  aws:         region={}, endpoint={}", self.aws.region, endpoint);
        tracing::info!(
            "  topics:      system={}, job_failure={}",
            self.system_topic_arns.len(),
            self.job_failure_topic_arns.len()
        );
        tracing::info!(
            "  tolerance:   {} ({})",
            self.delay_tolerance_text,
            format_duration(self.delay_tolerance)
        );
        tracing::info!("  interval:    {}", format_duration(self.monitor_interval));
        tracing::info!("  crons:       {}", self.expected_jobs.join(", "));
    }
}

// ── MySQL ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Secrets Manager id of the password, never the password itself.
    pub secret_id: String,
    pub database: String,
}

impl MySqlConfig {
    fn new(
        addr: &str,
        user: String,
        secret_id: String,
        database: String,
    ) -> Result<Self, ConfigError> {
        let (host, port) = match addr.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse().map_err(|_| {
                    ConfigError::Invalid(format!("invalid MYSQL_HOST port in '{addr}'"))
                })?;
                (host.to_string(), port)
            }
            None => (addr.to_string(), DEFAULT_MYSQL_PORT),
        };
        if host.is_empty() {
            return Err(ConfigError::Invalid("MYSQL_HOST is empty".into()));
        }

        Ok(Self {
            host,
            port,
            user,
            secret_id,
            database,
        })
    }
}

// ── AWS ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub endpoint_url: Option<String>,
}

// ── Tests ────────────────────────────────────────────────────────
