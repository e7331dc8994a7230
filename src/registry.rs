// Framework registry
// Maps package identifiers to adapters and runs benchmarks by package name

use crate::adapters::{demo, RouterAdapter};
use crate::bench::handler::{Adapter, BenchmarkTarget};
use crate::bench::runner::{BenchmarkLoop, RunOutcome};
use crate::bench::BenchmarkConfig;
use crate::error::{BenchError, Result};

/// A registered SSR framework
pub struct FrameworkEntry {
    pub name: String,
    pub display_name: String,
    pub package: String,
    pub framework_version: Option<String>,
    adapter: Box<dyn Adapter>,
}

impl FrameworkEntry {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        package: impl Into<String>,
        adapter: impl Adapter + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            package: package.into(),
            framework_version: None,
            adapter: Box::new(adapter),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.framework_version = Some(version.into());
        self
    }

    /// Build the handler and wrap it as a benchmark target
    pub async fn target(&self) -> Result<BenchmarkTarget> {
        let handler = self.adapter.build().await?;
        Ok(BenchmarkTarget::new(
            self.name.clone(),
            self.display_name.clone(),
            self.package.clone(),
            handler,
        ))
    }
}

/// Registered frameworks in insertion order
#[derive(Default)]
pub struct FrameworkRegistry {
    entries: Vec<FrameworkEntry>,
}

impl FrameworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the in-process demo apps
    pub fn with_builtin() -> Self {
        let axum_version = "0.7";
        let mut registry = Self::new();
        registry.register(
            FrameworkEntry::new(
                "axum-static-ssr",
                "Axum Static SSR",
                "app-axum-static",
                RouterAdapter::new(demo::static_app),
            )
            .with_version(axum_version),
        );
        registry.register(
            FrameworkEntry::new(
                "axum-stream-ssr",
                "Axum Streaming SSR",
                "app-axum-stream",
                RouterAdapter::new(demo::streaming_app),
            )
            .with_version(axum_version),
        );
        registry.register(
            FrameworkEntry::new(
                "axum-double-ssr",
                "Axum Double Render",
                "app-axum-double",
                RouterAdapter::new(demo::double_render_app),
            )
            .with_version(axum_version),
        );
        registry
    }

    /// Add an entry, replacing any existing entry for the same package
    pub fn register(&mut self, entry: FrameworkEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.package == entry.package) {
            tracing::debug!("Replacing registered package {}", entry.package);
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    pub fn packages(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.package.clone()).collect()
    }

    pub fn entries(&self) -> &[FrameworkEntry] {
        &self.entries
    }

    /// Look up an entry by package identifier
    pub fn get(&self, package: &str) -> Result<&FrameworkEntry> {
        self.entries
            .iter()
            .find(|e| e.package == package)
            .ok_or_else(|| BenchError::UnknownPackage {
                package: package.to_string(),
                available: self.packages(),
            })
    }

    /// Build the package's handler and benchmark it
    pub async fn run_package(&self, package: &str, config: &BenchmarkConfig) -> Result<RunOutcome> {
        let entry = self.get(package)?;
        tracing::info!("Running SSR benchmark for {}...", entry.package);
        let target = entry.target().await?;
        let outcome = BenchmarkLoop::new(config.clone()).run(&target).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::handler::{handler_fn, StaticAdapter};

    fn quick_config() -> BenchmarkConfig {
        BenchmarkConfig {
            sample_count: 3,
            warmup_samples: 1,
            sample_timeout_ms: 1_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_builtin_packages() {
        let registry = FrameworkRegistry::with_builtin();
        assert_eq!(
            registry.packages(),
            vec!["app-axum-static", "app-axum-stream", "app-axum-double"]
        );
        let entry = registry.get("app-axum-stream").unwrap();
        assert_eq!(entry.display_name, "Axum Streaming SSR");
        assert_eq!(entry.framework_version.as_deref(), Some("0.7"));
    }

    #[test]
    fn test_unknown_package() {
        let registry = FrameworkRegistry::with_builtin();
        match registry.get("app-missing") {
            Err(BenchError::UnknownPackage { package, available }) => {
                assert_eq!(package, "app-missing");
                assert_eq!(available.len(), 3);
            }
            _ => panic!("expected UnknownPackage"),
        }
    }

    #[test]
    fn test_register_replaces_same_package() {
        let mut registry = FrameworkRegistry::new();
        let handler = handler_fn(|_req, res| async move {
            res.end_with("x")?;
            Ok(())
        });
        registry.register(FrameworkEntry::new(
            "a",
            "A",
            "app-a",
            StaticAdapter::new(handler.clone()),
        ));
        registry.register(FrameworkEntry::new(
            "a2",
            "A2",
            "app-a",
            StaticAdapter::new(handler),
        ));

        assert_eq!(registry.entries().len(), 1);
        assert_eq!(registry.get("app-a").unwrap().name, "a2");
    }

    #[tokio::test]
    async fn test_run_builtin_static() {
        let registry = FrameworkRegistry::with_builtin();
        let outcome = registry
            .run_package("app-axum-static", &quick_config())
            .await
            .unwrap();

        assert_eq!(outcome.result.package, "app-axum-static");
        assert_eq!(outcome.result.ssr_samples, 3);
        assert_eq!(outcome.result.ssr_duplication_factor, 1.0);
    }

    #[tokio::test]
    async fn test_run_builtin_double_render_flagged() {
        let registry = FrameworkRegistry::with_builtin();
        let outcome = registry
            .run_package("app-axum-double", &quick_config())
            .await
            .unwrap();

        assert!((outcome.result.ssr_duplication_factor - 2.0).abs() < 1e-9);
        assert!(outcome.result.is_duplicated());
    }
}
