//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

/// probe-mux - shares one telemetry stream between many viewers
#[derive(Parser, Debug)]
#[command(
    name = "probe-mux",
    author,
    version,
    about = "Telemetry fan-out multiplexer for programmable-switch and NIC probes",
    long_about = "Keeps a single server-sent-event subscription to the telemetry server \n\
                  and fans every normalized batch out to all attached viewers.\n\n\
                  Viewers attach over TCP and exchange newline-delimited JSON."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PROBE_MUX_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PROBE_MUX_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the multiplexer and the TCP viewer gateway
    Run(RunArgs),

    /// Attach one local viewer and print what it receives
    Watch(WatchArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// Show endpoints, chart registry and dashboard layout
    Info(InfoArgs),
}

/// Options shared by commands that start the service
#[derive(Parser, Debug, Clone)]
pub struct ServiceArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when absent
    #[arg(short, long, env = "PROBE_MUX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the runtime mode (production / development)
    #[arg(long, value_enum, env = "PROBE_MUX_MODE")]
    pub mode: Option<ModeArg>,

    /// Override the development origin
    #[arg(long, env = "PROBE_MUX_DEV_ORIGIN")]
    pub dev_origin: Option<String>,

    /// Override the same-origin base used in production mode
    #[arg(long, env = "PROBE_MUX_ORIGIN")]
    pub origin: Option<String>,

    /// Serve synthetic telemetry instead of contacting the telemetry server
    #[arg(long, env = "PROBE_MUX_MOCK")]
    pub mock: bool,

    /// Interval between synthetic batches in milliseconds (with --mock)
    #[arg(long, default_value = "500", env = "PROBE_MUX_MOCK_INTERVAL_MS")]
    pub mock_interval_ms: u64,
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub service: ServiceArgs,

    /// Override the gateway listen address
    #[arg(long, env = "PROBE_MUX_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "PROBE_MUX_METRICS_PORT")]
    pub metrics_port: u16,

    /// Interval between service statistics logs in seconds (0 = disabled)
    #[arg(long, default_value = "30", env = "PROBE_MUX_STATS_INTERVAL")]
    pub stats_interval: u64,
}

/// Arguments for the `watch` command
#[derive(Parser, Debug, Clone)]
pub struct WatchArgs {
    #[command(flatten)]
    pub service: ServiceArgs,

    /// Probe group to subscribe to
    #[arg(short, long, env = "PROBE_MUX_GROUP")]
    pub group: String,

    /// Stop after this many messages (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub max_messages: u64,

    /// Stop after this many seconds (0 = no timeout)
    #[arg(long, default_value = "0")]
    pub timeout: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "probe-mux.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; defaults apply when absent
    #[arg(short, long, env = "PROBE_MUX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show the endpoint for this probe group
    #[arg(short, long)]
    pub group: Option<String>,

    /// Show chart registry entries
    #[arg(long)]
    pub charts: bool,

    /// Show the dashboard layout
    #[arg(long)]
    pub dashboard: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Runtime mode flag
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    #[value(alias = "prod")]
    Production,
    #[value(alias = "dev")]
    Development,
}

impl From<ModeArg> for contracts::RuntimeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Production => Self::Production,
            ModeArg::Development => Self::Development,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::try_parse_from([
            "probe-mux",
            "run",
            "--mode",
            "prod",
            "--origin",
            "https://probe.local:8655",
            "--listen",
            "0.0.0.0:9100",
            "--mock",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.service.mode, Some(ModeArg::Production));
        assert_eq!(args.listen.map(|l| l.port()), Some(9100));
        assert!(args.service.mock);
    }

    #[test]
    fn test_watch_requires_group() {
        assert!(Cli::try_parse_from(["probe-mux", "watch"]).is_err());
        assert!(Cli::try_parse_from(["probe-mux", "watch", "--group", "3"]).is_ok());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["probe-mux", "-q", "-v", "info"]).is_err());
    }
}
