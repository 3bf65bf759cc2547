//! Playwright browser automation
//!
//! A scenario is compiled into a single Node script that drives Playwright
//! and its `expect` assertions. The script prints one JSON line per stage
//! (navigation, then each check) which is parsed back into a report.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::error::{E2eError, E2eResult, VerificationFailure};
use crate::scenario::{Expectation, Scenario};
use crate::verifier::{VerificationReport, Verifier};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(E2eError::Playwright(format!("unknown browser '{}'", other))),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Directory whose `node_modules` holds `playwright` and `@playwright/test`
    pub project_dir: PathBuf,
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Timeout for `page.goto`
    pub navigation_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            navigation_timeout: Duration::from_secs(30),
        }
    }
}

/// Verifier backed by a real browser through Playwright
pub struct PlaywrightVerifier {
    config: PlaywrightConfig,
}

/// One JSON line printed by the generated script
#[derive(Debug, Clone, Deserialize)]
struct ScriptEvent {
    stage: String,
    #[serde(default)]
    check: Option<String>,
    success: bool,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    error: Option<String>,
}

impl PlaywrightVerifier {
    /// Create a verifier, checking that Node and Playwright are available
    pub async fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config).await?;
        Ok(Self::without_check(config))
    }

    /// Create a verifier without checking the Node installation
    pub fn without_check(config: PlaywrightConfig) -> Self {
        Self { config }
    }

    async fn check_playwright_installed(config: &PlaywrightConfig) -> E2eResult<()> {
        let status = Command::new("node")
            .args([
                "-e",
                "require.resolve('playwright'); require.resolve('@playwright/test')",
            ])
            .current_dir(&config.project_dir)
            .env("NODE_PATH", config.project_dir.join("node_modules"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build the Playwright script for a scenario
    pub fn build_script(&self, url: &str, scenario: &Scenario) -> E2eResult<String> {
        let mut script = String::new();

        script.push_str(&format!(
            r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const {{ expect }} = require('@playwright/test');

function emit(event) {{
  console.log(JSON.stringify(event));
}}

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  try {{
    const context = await browser.newContext({{
      viewport: {{ width: {width}, height: {height} }}
    }});
    const page = await context.newPage();

    try {{
      const response = await page.goto({url}, {{ timeout: {nav_timeout} }});
      if (!response || !response.ok()) {{
        const status = response ? response.status() : 'no response';
        emit({{ stage: 'navigate', success: false, error: 'HTTP ' + status }});
        process.exitCode = 1;
        return;
      }}
      emit({{ stage: 'navigate', success: true }});
    }} catch (error) {{
      emit({{ stage: 'navigate', success: false, error: error.message }});
      process.exitCode = 1;
      return;
    }}
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            url = js_string(url)?,
            nav_timeout = self.config.navigation_timeout.as_millis(),
        ));

        for (i, expectation) in scenario.expectations.iter().enumerate() {
            let check = js_string(&expectation.check_name())?;
            script.push_str(&format!(
                r#"
    // Check {index}: {label}
    {{
      const started = Date.now();
      try {{
{body}
        emit({{ stage: 'check', check: {check}, success: true, duration_ms: Date.now() - started }});
      }} catch (error) {{
        emit({{ stage: 'check', check: {check}, success: false, duration_ms: Date.now() - started, error: error.message }});
        process.exitCode = 1;
        return;
      }}
    }}
"#,
                index = i + 1,
                label = expectation.check_name().replace('\n', " "),
                body = expectation_to_js(expectation, scenario.timeout_ms)?,
                check = check,
            ));
        }

        script.push_str(
            r#"
  } finally {
    await browser.close();
  }
})().catch((error) => {
  emit({ stage: 'harness', success: false, error: error.message });
  process.exit(2);
});
"#,
        );

        Ok(script)
    }

    /// Execute a script with node and return its stdout
    async fn run_script(&self, script: &str, budget: Duration) -> E2eResult<String> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("verify.cjs");
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let child = Command::new("node")
            .arg(&script_path)
            .current_dir(&self.config.project_dir)
            .env("NODE_PATH", self.config.project_dir.join("node_modules"))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(budget, child.wait_with_output())
            .await
            .map_err(|_| {
                E2eError::Playwright(format!("script did not finish within {:?}", budget))
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !stderr.trim().is_empty() {
            debug!("Playwright stderr: {}", stderr.trim());
        }

        // Exit code 1 is a failed check, reported through stdout events
        match output.status.code() {
            Some(0) | Some(1) => Ok(stdout),
            _ => Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            ))),
        }
    }
}

#[async_trait]
impl Verifier for PlaywrightVerifier {
    fn name(&self) -> &'static str {
        "playwright"
    }

    async fn verify(&self, base_url: &str, scenario: &Scenario) -> E2eResult<VerificationReport> {
        let start = Instant::now();
        let url = scenario.url(base_url);

        info!(
            "Verifying '{}' at {} ({})",
            scenario.name,
            url,
            self.config.browser.as_str()
        );

        let script = self.build_script(&url, scenario)?;
        let budget = script_budget(self.config.navigation_timeout, scenario);
        let stdout = self.run_script(&script, budget).await?;

        let mut report = report_from_events(scenario, self.name(), &url, parse_events(&stdout))?;
        report.finish(start.elapsed().as_millis() as u64);
        Ok(report)
    }
}

/// Upper bound on how long the whole script may run
fn script_budget(navigation_timeout: Duration, scenario: &Scenario) -> Duration {
    let checks = scenario
        .timeout_ms
        .saturating_mul(scenario.expectations.len() as u64);

    navigation_timeout
        .saturating_add(Duration::from_millis(checks))
        .saturating_add(Duration::from_secs(30))
}

/// Fold the script's stage events into a report
///
/// Stops at the first failed stage. A `harness` event, or a stream that
/// ends before every check reported, is a harness error.
fn report_from_events(
    scenario: &Scenario,
    backend: &str,
    url: &str,
    events: Vec<ScriptEvent>,
) -> E2eResult<VerificationReport> {
    let mut report = VerificationReport::new(scenario, backend, url);

    for event in events {
        match (event.stage.as_str(), event.success) {
            ("navigate", true) => debug!("Navigated to {}", url),
            ("navigate", false) => {
                let failure = VerificationFailure::Navigation {
                    url: url.to_string(),
                    reason: first_line(&strip_ansi(event.error.as_deref().unwrap_or(""))),
                };
                error!("✗ {}", failure);
                report.fail(failure, event.duration_ms);
                break;
            }
            ("check", true) => {
                let check = event.check.unwrap_or_default();
                debug!("✓ {} ({} ms)", check, event.duration_ms);
                report.record_pass(check, event.duration_ms);
            }
            ("check", false) => {
                let check = event.check.unwrap_or_default();
                let expectation = scenario
                    .expectations
                    .iter()
                    .find(|e| e.check_name() == check);
                let failure = classify_failure(
                    &check,
                    expectation,
                    event.error.as_deref().unwrap_or(""),
                    scenario.timeout_ms,
                );
                error!("✗ {}", failure);
                report.fail(failure, event.duration_ms);
                break;
            }
            ("harness", _) => {
                return Err(E2eError::Playwright(
                    event.error.unwrap_or_else(|| "unknown harness error".to_string()),
                ));
            }
            (stage, _) => warn!("Ignoring unknown script stage '{}'", stage),
        }
    }

    let ran = report.checks.len();
    if report.failure.is_none() && ran != scenario.expectations.len() {
        return Err(E2eError::Playwright(format!(
            "script reported {} of {} checks",
            ran,
            scenario.expectations.len()
        )));
    }

    Ok(report)
}

/// Encode a value as a JavaScript string literal
fn js_string(value: &str) -> E2eResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn expectation_to_js(expectation: &Expectation, timeout_ms: u64) -> E2eResult<String> {
    let js = match expectation {
        Expectation::Title { pattern } => format!(
            "        await expect(page).toHaveTitle(new RegExp({}), {{ timeout: {} }});",
            js_string(pattern)?,
            timeout_ms
        ),
        Expectation::Heading { level, text } => format!(
            "        await expect(page.getByRole('heading', {{ level: {} }})).toHaveText({}, {{ timeout: {} }});",
            level,
            js_string(text)?,
            timeout_ms
        ),
        Expectation::RoleVisible { role, name } => format!(
            "        const locator = page.getByRole({}, {{ name: {}, exact: true }});\n        await expect(locator).toBeVisible({{ timeout: {t} }});\n        await expect(locator).toBeEnabled({{ timeout: {t} }});",
            js_string(role)?,
            js_string(name)?,
            t = timeout_ms
        ),
    };
    Ok(js)
}

fn parse_events(stdout: &str) -> Vec<ScriptEvent> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .filter_map(|line| match serde_json::from_str::<ScriptEvent>(line) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("Skipping non-event line ({}): {}", e, line);
                None
            }
        })
        .collect()
}

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI escape pattern"));

static STRICT_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"resolved to (\d+) elements").expect("valid strict-mode pattern"));

static RECEIVED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*Received(?: string| pattern)?:\s*(.+?)\s*$")
        .expect("valid received-value pattern")
});

fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").to_string()
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("unknown error")
        .to_string()
}

/// Turn a Playwright assertion error message into a typed failure
fn classify_failure(
    check: &str,
    expectation: Option<&Expectation>,
    message: &str,
    timeout_ms: u64,
) -> VerificationFailure {
    let message = strip_ansi(message);
    let expected = expectation
        .map(Expectation::expected)
        .unwrap_or_else(|| "<unknown>".to_string());

    if message.contains("element(s) not found") {
        return VerificationFailure::Timeout {
            check: check.to_string(),
            timeout_ms,
        };
    }

    if message.contains("strict mode violation") {
        let count = STRICT_COUNT
            .captures(&message)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| "multiple".to_string());
        return VerificationFailure::Mismatch {
            check: check.to_string(),
            expected: "exactly one element".to_string(),
            actual: format!("{} elements", count),
        };
    }

    let received = RECEIVED.captures(&message).map(|c| c[1].to_string());

    match received {
        Some(actual) => VerificationFailure::Mismatch {
            check: check.to_string(),
            expected,
            actual,
        },
        None if message.contains("Timed out") || message.contains("Timeout") => {
            VerificationFailure::Timeout {
                check: check.to_string(),
                timeout_ms,
            }
        }
        None => VerificationFailure::Mismatch {
            check: check.to_string(),
            expected,
            actual: first_line(&message),
        },
    }
}
