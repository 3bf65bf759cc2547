//! Runner that ties the server, a verifier backend and one scenario together

use std::path::PathBuf;
use std::str::FromStr;
use tracing::{error, info};

use crate::error::{E2eError, E2eResult};
use crate::http::{HttpConfig, HttpVerifier};
use crate::playwright::{PlaywrightConfig, PlaywrightVerifier};
use crate::scenario::Scenario;
use crate::server::{ServerConfig, ServerHandle};
use crate::verifier::{VerificationReport, Verifier};

/// Which verifier implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    Playwright,
    Http,
}

impl FromStr for Backend {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "playwright" => Ok(Backend::Playwright),
            "http" => Ok(Backend::Http),
            other => Err(E2eError::ScenarioParse(format!("unknown backend '{}'", other))),
        }
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Verify an already running server instead of spawning one
    pub base_url: Option<String>,
    pub server: ServerConfig,
    pub backend: Backend,
    pub playwright: PlaywrightConfig,
    pub http: HttpConfig,
    pub scenario: Scenario,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            server: ServerConfig::default(),
            backend: Backend::default(),
            playwright: PlaywrightConfig::default(),
            http: HttpConfig::default(),
            scenario: Scenario::home(),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Main E2E test runner
pub struct TestRunner {
    config: RunnerConfig,

    /// Running server handle (if we spawned one)
    server: Option<ServerHandle>,
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            config,
            server: None,
        }
    }

    /// Resolve the base URL, spawning the server if none was given
    pub async fn start_server(&mut self) -> E2eResult<String> {
        if let Some(url) = &self.config.base_url {
            return Ok(url.clone());
        }

        if let Some(server) = &self.server {
            return Ok(server.base_url().to_string());
        }

        let server = ServerHandle::spawn(self.config.server.clone()).await?;
        let url = server.base_url().to_string();
        self.server = Some(server);
        Ok(url)
    }

    /// Stop the server
    pub fn stop_server(&mut self) -> E2eResult<()> {
        if let Some(mut server) = self.server.take() {
            server.stop()?;
        }
        Ok(())
    }

    async fn build_verifier(&self) -> E2eResult<Box<dyn Verifier>> {
        let verifier: Box<dyn Verifier> = match self.config.backend {
            Backend::Playwright => {
                Box::new(PlaywrightVerifier::new(self.config.playwright.clone()).await?)
            }
            Backend::Http => Box::new(HttpVerifier::new(self.config.http.clone())?),
        };
        Ok(verifier)
    }

    /// Run the configured scenario with the configured backend
    pub async fn run(&mut self) -> E2eResult<VerificationReport> {
        let verifier = self.build_verifier().await?;
        self.run_with(verifier.as_ref()).await
    }

    /// Run the configured scenario with an explicit verifier
    pub async fn run_with(&mut self, verifier: &dyn Verifier) -> E2eResult<VerificationReport> {
        let base_url = self.start_server().await?;
        let scenario = self.config.scenario.clone();

        let report = verifier.verify(&base_url, &scenario).await?;

        for check in &report.checks {
            if check.success {
                info!("✓ {} ({} ms)", check.check, check.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    check.check,
                    check.error.as_deref().unwrap_or("unknown error")
                );
            }
        }

        match &report.failure {
            None => info!(
                "'{}' passed: {} check(s) ({} ms, {})",
                report.scenario,
                report.checks.len(),
                report.duration_ms,
                report.backend
            ),
            Some(failure) => error!("'{}' failed: {}", report.scenario, failure),
        }

        Ok(report)
    }

    /// Write the report to `test-results.json` in the output directory
    pub fn write_results(&self, report: &VerificationReport) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestRunner {
    fn drop(&mut self) {
        let _ = self.stop_server();
    }
}
