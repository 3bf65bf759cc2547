//! Verifier backends and their reports

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{E2eResult, VerificationFailure};
use crate::scenario::Scenario;

/// Loads a page and checks a scenario's expectations against it
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Short backend name for logs and reports
    fn name(&self) -> &'static str;

    /// Run `scenario` against the server at `base_url`
    ///
    /// Returns `Ok` for both passing and failing runs; the report carries
    /// the failure. `Err` means the harness itself could not run.
    async fn verify(&self, base_url: &str, scenario: &Scenario) -> E2eResult<VerificationReport>;
}

/// Outcome of one check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Outcome of one verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub scenario: String,
    pub backend: String,
    pub url: String,
    pub success: bool,
    pub duration_ms: u64,
    pub checks: Vec<CheckResult>,
    pub failure: Option<VerificationFailure>,
}

impl VerificationReport {
    pub(crate) fn new(scenario: &Scenario, backend: &str, url: &str) -> Self {
        Self {
            scenario: scenario.name.clone(),
            backend: backend.to_string(),
            url: url.to_string(),
            success: false,
            duration_ms: 0,
            checks: Vec::new(),
            failure: None,
        }
    }

    pub(crate) fn record_pass(&mut self, check: String, duration_ms: u64) {
        self.checks.push(CheckResult {
            check,
            success: true,
            duration_ms,
            error: None,
        });
    }

    /// Record a failure and close the report
    pub(crate) fn fail(&mut self, failure: VerificationFailure, duration_ms: u64) {
        if let Some(check) = failure.check() {
            self.checks.push(CheckResult {
                check: check.to_string(),
                success: false,
                duration_ms,
                error: Some(failure.to_string()),
            });
        }
        self.success = false;
        self.failure = Some(failure);
    }

    /// Close the report as passed if nothing failed
    pub(crate) fn finish(&mut self, total_ms: u64) {
        self.duration_ms = total_ms;
        self.success = self.failure.is_none();
    }

    /// Convert into a `Result`, surfacing the failure as an error
    pub fn into_result(self) -> E2eResult<Self> {
        match self.failure {
            Some(failure) => Err(failure.into()),
            None => Ok(self),
        }
    }
}
