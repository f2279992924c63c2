use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use eesa_api_types::BatchQuery;

/// Command-line arguments for the eesa-catalog binary.
#[derive(Debug, Parser)]
#[command(
    name = "eesa-catalog",
    version,
    about = "Academic catalog batch snapshot service"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "EESA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Print one batch snapshot as JSON.
    Snapshot(SnapshotArgs),
    /// Bump the entity-set version so every cached snapshot goes stale.
    Invalidate(DatabaseArgs),
    /// Apply pending database migrations.
    Migrate(DatabaseArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Toggle migrations at startup.
    #[arg(
        long = "database-run-migrations",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub database_run_migrations: Option<bool>,

    /// Enable the snapshot cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the cache backend (memory|redis).
    #[arg(long = "cache-backend", value_name = "BACKEND")]
    pub cache_backend: Option<String>,

    /// Override the redis URL used by the redis backend.
    #[arg(long = "cache-redis-url", value_name = "URL")]
    pub cache_redis_url: Option<String>,

    /// Override the cache entry time-to-live.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the memory backend capacity.
    #[arg(long = "cache-capacity", value_name = "COUNT")]
    pub cache_capacity: Option<usize>,

    /// Override the per-operation cache timeout.
    #[arg(long = "cache-operation-timeout-ms", value_name = "MS")]
    pub cache_operation_timeout_ms: Option<u64>,

    /// Warm the unfiltered snapshot at startup.
    #[arg(
        long = "cache-warm-on-startup",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_warm_on_startup: Option<bool>,

    /// Override the miss-path timeout.
    #[arg(long = "snapshot-miss-timeout-ms", value_name = "MS")]
    pub snapshot_miss_timeout_ms: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Scheme identifier.
    #[arg(long, value_name = "ID")]
    pub scheme: Option<String>,

    /// Subject identifier.
    #[arg(long, value_name = "ID")]
    pub subject: Option<String>,

    /// Semester number (1-8).
    #[arg(long, value_name = "N")]
    pub semester: Option<String>,

    /// Department code.
    #[arg(long, value_name = "CODE")]
    pub department: Option<String>,

    /// Resource category.
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Free-text search.
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Resource ordering (recency|popularity).
    #[arg(long, value_name = "ORDER")]
    pub sort: Option<String>,

    /// Pretty-print the JSON output.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub pretty: bool,
}

impl SnapshotArgs {
    pub fn query(&self) -> BatchQuery {
        BatchQuery {
            scheme: self.scheme.clone(),
            subject: self.subject.clone(),
            semester: self.semester.clone(),
            department: self.department.clone(),
            category: self.category.clone(),
            search: self.search.clone(),
            sort: self.sort.clone(),
        }
    }
}
