//! Error types for E2E verification

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a verification run failed
///
/// These are outcomes of the page under test, not of the harness, so
/// they are carried inside a [`VerificationReport`](crate::verifier::VerificationReport)
/// and serialized into the results file.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationFailure {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Assertion '{check}' failed: expected {expected}, received {actual}")]
    Mismatch {
        check: String,
        expected: String,
        actual: String,
    },

    #[error("Timed out after {timeout_ms}ms waiting for '{check}'")]
    Timeout { check: String, timeout_ms: u64 },
}

impl VerificationFailure {
    /// Name of the failed check, if the failure belongs to one
    pub fn check(&self) -> Option<&str> {
        match self {
            Self::Navigation { .. } => None,
            Self::Mismatch { check, .. } | Self::Timeout { check, .. } => Some(check),
        }
    }
}

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Server health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("Playwright not found. Install with: npm i -D @playwright/test && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("HTML query error: {0}")]
    Query(String),

    #[error(transparent)]
    Verification(#[from] VerificationFailure),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
