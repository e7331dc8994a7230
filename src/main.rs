use anyhow::Result;

use ssr_bench::bench::BenchmarkReport;
use ssr_bench::config::{Command, Config};
use ssr_bench::registry::FrameworkRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let (config, command) = Config::load()?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    let registry = FrameworkRegistry::with_builtin();

    match command {
        Command::List => {
            for entry in registry.entries() {
                println!(
                    "{:<20} {:<22} {}",
                    entry.package, entry.display_name, entry.name
                );
            }
        }

        Command::Run {
            packages,
            all,
            json,
            ci,
        } => {
            let packages = if all { registry.packages() } else { packages };
            if packages.is_empty() {
                anyhow::bail!(
                    "No packages given. Available: {}",
                    registry.packages().join(", ")
                );
            }

            tracing::debug!("Benchmark config: {:?}", config.bench);
            let report = run_packages(&registry, &config, &packages, ci).await;

            if json {
                println!("{}", report.to_json());
            } else {
                report.print_table();
                for stats in &report.ci_stats {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(stats).unwrap_or_default()
                    );
                }
            }

            if report.has_failures() {
                anyhow::bail!(
                    "{} of {} packages failed",
                    report.failures.len(),
                    packages.len()
                );
            }
        }
    }

    Ok(())
}

/// Benchmark each package in turn; a failed package is reported and skipped
async fn run_packages(
    registry: &FrameworkRegistry,
    config: &Config,
    packages: &[String],
    ci: bool,
) -> BenchmarkReport {
    let mut report = BenchmarkReport::new();

    for package in packages {
        match registry.run_package(package, &config.bench).await {
            Ok(outcome) => {
                if let Some(latency) = outcome.latency {
                    tracing::info!(
                        "{} latency min {:.3}ms / p50 {:.3}ms / p99 {:.3}ms / max {:.3}ms",
                        package,
                        latency.min_ms,
                        latency.p50_ms,
                        latency.p99_ms,
                        latency.max_ms
                    );
                }

                if ci {
                    let version = registry
                        .get(package)
                        .ok()
                        .and_then(|entry| entry.framework_version.clone());
                    report.push_ci_stats(
                        outcome.result.to_ci_stats(&config.runner_label, version),
                    );
                }

                report.push_result(outcome.result);
            }
            Err(e) => {
                tracing::error!("❌ SSR benchmark for {} failed: {}", package, e);
                report.push_failure(package, e);
            }
        }
    }

    report
}
