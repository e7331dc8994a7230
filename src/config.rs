use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::bench::config::{
    BenchmarkConfig, DEFAULT_MIN_REPEAT_WIDTH, DEFAULT_SAMPLE_COUNT, DEFAULT_SAMPLE_TIMEOUT_MS,
    DEFAULT_WARMUP_SAMPLES,
};

/// SSR Bench - in-process SSR benchmarks for web framework handlers
#[derive(Parser, Debug)]
#[command(name = "ssr-bench", version, about, long_about = None)]
pub struct CliArgs {
    /// Measured samples per framework
    #[arg(short = 'n', long, env = "SSR_BENCH_SAMPLES", default_value_t = DEFAULT_SAMPLE_COUNT, global = true)]
    pub samples: usize,

    /// Discarded warm-up samples per framework
    #[arg(short = 'w', long, env = "SSR_BENCH_WARMUP", default_value_t = DEFAULT_WARMUP_SAMPLES, global = true)]
    pub warmup: usize,

    /// Per-sample timeout in milliseconds
    #[arg(long, env = "SSR_BENCH_TIMEOUT_MS", default_value_t = DEFAULT_SAMPLE_TIMEOUT_MS, global = true)]
    pub timeout_ms: u64,

    /// Minimum repeated-unit width (bytes) for duplication detection
    #[arg(long, env = "SSR_BENCH_MIN_REPEAT_WIDTH", default_value_t = DEFAULT_MIN_REPEAT_WIDTH, global = true)]
    pub min_repeat_width: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Runner label recorded in CI stats
    #[arg(long, env = "RUNNER_LABEL", default_value = "local", global = true)]
    pub runner: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List registered frameworks
    List,

    /// Benchmark one or more packages
    Run {
        /// Package identifiers (e.g. app-axum-static)
        packages: Vec<String>,

        /// Benchmark every registered package
        #[arg(long, conflicts_with = "packages")]
        all: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Print a CI stats record per package
        #[arg(long)]
        ci: bool,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    // Engine settings
    pub bench: BenchmarkConfig,

    // Logging
    pub log_level: String,

    // CI metadata
    pub runner_label: String,
}

impl Config {
    /// Load configuration with priority: CLI > ENV > defaults
    pub fn load() -> Result<(Self, Command)> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        Ok(Self::from_args(args))
    }

    /// Split parsed arguments into configuration and the command to run
    pub fn from_args(args: CliArgs) -> (Self, Command) {
        let config = Config {
            bench: BenchmarkConfig {
                sample_count: args.samples,
                warmup_samples: args.warmup,
                sample_timeout_ms: args.timeout_ms,
                min_repeat_width: args.min_repeat_width,
            },
            log_level: args.log_level,
            runner_label: args.runner,
        };

        (config, args.command)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.bench
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid benchmark configuration")?;

        if self.runner_label.trim().is_empty() {
            anyhow::bail!("RUNNER_LABEL cannot be empty");
        }

        Ok(())
    }
}
