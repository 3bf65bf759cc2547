//! Browserless verifier: fetch the page over HTTP and query its markup
//!
//! Waits the way Playwright's `expect` does: each expectation is re-checked
//! against a freshly fetched document until it holds or the scenario's
//! timeout elapses.

use async_trait::async_trait;
use regex::Regex;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::accessibility::Document;
use crate::error::{E2eError, E2eResult, VerificationFailure};
use crate::scenario::{Expectation, Scenario};
use crate::verifier::{VerificationReport, Verifier};

/// Configuration for the HTTP backend
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Delay between re-fetches while an expectation is unmet
    pub poll_interval: Duration,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            request_timeout: Duration::from_secs(5),
        }
    }
}

pub struct HttpVerifier {
    client: reqwest::Client,
    poll_interval: Duration,
}

/// What one look at the document showed for one expectation
#[derive(Debug, Clone, PartialEq, Eq)]
enum Observation {
    Pass,
    Mismatch { expected: String, actual: String },
    NotFound,
}

impl HttpVerifier {
    pub fn new(config: HttpConfig) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            poll_interval: config.poll_interval,
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, VerificationFailure> {
        let navigation = |reason: String| VerificationFailure::Navigation {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| navigation(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(navigation(format!("HTTP {}", status)));
        }

        let body = resp.text().await.map_err(|e| navigation(e.to_string()))?;
        if body.trim().is_empty() {
            return Err(navigation("empty document".to_string()));
        }

        Ok(body)
    }
}

#[async_trait]
impl Verifier for HttpVerifier {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn verify(&self, base_url: &str, scenario: &Scenario) -> E2eResult<VerificationReport> {
        let start = Instant::now();
        let url = scenario.url(base_url);
        let timeout = Duration::from_millis(scenario.timeout_ms);
        let mut report = VerificationReport::new(scenario, self.name(), &url);

        info!("Verifying '{}' at {} (http)", scenario.name, url);

        let mut body = match self.fetch(&url).await {
            Ok(body) => body,
            Err(failure) => {
                error!("✗ {}", failure);
                report.fail(failure, elapsed_ms(start));
                report.finish(elapsed_ms(start));
                return Ok(report);
            }
        };

        for expectation in &scenario.expectations {
            let check = expectation.check_name();
            let check_start = Instant::now();

            loop {
                let observation = observe(&body, expectation)?;

                if observation == Observation::Pass {
                    debug!("✓ {} ({} ms)", check, elapsed_ms(check_start));
                    report.record_pass(check, elapsed_ms(check_start));
                    break;
                }

                if check_start.elapsed() >= timeout {
                    let failure = match observation {
                        Observation::Mismatch { expected, actual } => VerificationFailure::Mismatch {
                            check,
                            expected,
                            actual,
                        },
                        _ => VerificationFailure::Timeout {
                            check,
                            timeout_ms: scenario.timeout_ms,
                        },
                    };
                    error!("✗ {}", failure);
                    report.fail(failure, elapsed_ms(check_start));
                    report.finish(elapsed_ms(start));
                    return Ok(report);
                }

                sleep(self.poll_interval).await;

                body = match self.fetch(&url).await {
                    Ok(body) => body,
                    Err(failure) => {
                        error!("✗ {}", failure);
                        report.fail(failure, elapsed_ms(check_start));
                        report.finish(elapsed_ms(start));
                        return Ok(report);
                    }
                };
            }
        }

        report.finish(elapsed_ms(start));
        Ok(report)
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

fn strict_mismatch(count: usize) -> Observation {
    Observation::Mismatch {
        expected: "exactly one element".to_string(),
        actual: format!("{} elements", count),
    }
}

/// Check one expectation against a document snapshot
fn observe(source: &str, expectation: &Expectation) -> E2eResult<Observation> {
    let doc = Document::parse(source);

    match expectation {
        Expectation::Title { pattern } => {
            let re = Regex::new(pattern)
                .map_err(|e| E2eError::ScenarioParse(format!("invalid title pattern: {}", e)))?;
            let title = doc.title()?;

            if re.is_match(&title) {
                Ok(Observation::Pass)
            } else {
                Ok(Observation::Mismatch {
                    expected: expectation.expected(),
                    actual: format!("{:?}", title),
                })
            }
        }

        Expectation::Heading { level, text } => {
            let headings: Vec<_> = doc
                .by_role("heading")?
                .into_iter()
                .filter(|h| !h.hidden && h.level == Some(*level))
                .collect();

            match headings.as_slice() {
                [] => Ok(Observation::NotFound),
                [heading] if heading.text == crate::accessibility::normalize(text) => {
                    Ok(Observation::Pass)
                }
                [heading] => Ok(Observation::Mismatch {
                    expected: expectation.expected(),
                    actual: format!("{:?}", heading.text),
                }),
                many => Ok(strict_mismatch(many.len())),
            }
        }

        Expectation::RoleVisible { role, name } => {
            let name = crate::accessibility::normalize(name);
            // Hidden nodes are not exposed to role queries, as in Playwright
            let shown: Vec<_> = doc
                .by_role(role)?
                .into_iter()
                .filter(|node| !node.hidden && node.name == name)
                .collect();

            match shown.as_slice() {
                [] => Ok(Observation::NotFound),
                [node] if node.disabled => Ok(Observation::Mismatch {
                    expected: expectation.expected(),
                    actual: "disabled".to_string(),
                }),
                [_] => Ok(Observation::Pass),
                many => Ok(strict_mismatch(many.len())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>最初のページ</title></head><body>
<h1>Playwrightハンズオン</h1><p><button>操作ボタン</button></p></body></html>"#;

    fn home(i: usize) -> Expectation {
        Scenario::home().expectations[i].clone()
    }

    #[test]
    fn test_home_page_passes_all() {
        for i in 0..3 {
            assert_eq!(observe(PAGE, &home(i)).unwrap(), Observation::Pass);
        }
    }

    #[test]
    fn test_title_pattern_is_substring_match() {
        let page = PAGE.replace("<title>最初のページ</title>", "<title>最初のページ | Handson</title>");
        assert_eq!(observe(&page, &home(0)).unwrap(), Observation::Pass);
    }

    #[test]
    fn test_title_mismatch_reports_actual() {
        let page = PAGE.replace("最初のページ", "二番目");
        assert_eq!(
            observe(&page, &home(0)).unwrap(),
            Observation::Mismatch {
                expected: "/最初のページ/".to_string(),
                actual: "\"二番目\"".to_string(),
            }
        );
    }

    #[test]
    fn test_heading_must_be_exact() {
        let page = PAGE.replace("<h1>Playwrightハンズオン</h1>", "<h1>Playwrightハンズオン!</h1>");
        assert!(matches!(
            observe(&page, &home(1)).unwrap(),
            Observation::Mismatch { .. }
        ));
    }

    #[test]
    fn test_heading_case_variant_fails() {
        let page = PAGE.replace("Playwright", "playwright");
        assert!(matches!(
            observe(&page, &home(1)).unwrap(),
            Observation::Mismatch { .. }
        ));
    }

    #[test]
    fn test_two_level_one_headings_violate_strictness() {
        let page = PAGE.replace("<p>", "<h1>Other</h1><p>");
        assert_eq!(observe(&page, &home(1)).unwrap(), strict_mismatch(2));
    }

    #[test]
    fn test_missing_heading_is_not_found() {
        let page = PAGE.replace("<h1>Playwrightハンズオン</h1>", "<h2>Playwrightハンズオン</h2>");
        assert_eq!(observe(&page, &home(1)).unwrap(), Observation::NotFound);
    }

    #[test]
    fn test_hidden_button_is_not_found() {
        let page = PAGE.replace("<button>", "<button hidden>");
        assert_eq!(observe(&page, &home(2)).unwrap(), Observation::NotFound);

        let page = PAGE.replace("<button>", "<button style=\"display: none\">");
        assert_eq!(observe(&page, &home(2)).unwrap(), Observation::NotFound);
    }

    #[test]
    fn test_hidden_duplicate_does_not_break_strictness() {
        let page = PAGE.replace("<button>", "<button hidden>操作ボタン</button><button>");
        assert_eq!(observe(&page, &home(2)).unwrap(), Observation::Pass);
    }

    #[test]
    fn test_disabled_button_is_mismatch() {
        let page = PAGE.replace("<button>", "<button disabled>");
        assert!(matches!(
            observe(&page, &home(2)).unwrap(),
            Observation::Mismatch { actual, .. } if actual == "disabled"
        ));
    }

    #[test]
    fn test_renamed_button_is_not_found() {
        let page = PAGE.replace("操作ボタン", "送信");
        assert_eq!(observe(&page, &home(2)).unwrap(), Observation::NotFound);
    }
}
