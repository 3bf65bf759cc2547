//! Declarative YAML verification scenario

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// One page load and the facts asserted about it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Path loaded relative to the base URL
    #[serde(default = "default_path")]
    pub path: String,

    /// How long each expectation may wait before failing
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Checked in order; the first failure ends the run
    pub expectations: Vec<Expectation>,
}

fn default_path() -> String {
    "/".to_string()
}

fn default_timeout() -> u64 {
    5000 // Playwright's default expect timeout
}

/// Longest wait a single expectation may ask for (10 minutes)
pub const MAX_TIMEOUT_MS: u64 = 600_000;

fn default_heading_level() -> u8 {
    1
}

/// A single observable fact about the loaded document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expectation {
    /// Document title matches a regular expression
    Title { pattern: String },

    /// The heading at `level` has exactly this text
    Heading {
        #[serde(default = "default_heading_level")]
        level: u8,
        text: String,
    },

    /// An element with this role and accessible name is visible
    RoleVisible { role: String, name: String },
}

impl Expectation {
    /// Name used in logs, reports and failures
    pub fn check_name(&self) -> String {
        match self {
            Expectation::Title { .. } => "title".to_string(),
            Expectation::Heading { level, .. } => format!("heading level {}", level),
            Expectation::RoleVisible { role, name } => format!("{} '{}'", role, name),
        }
    }

    /// Expected value as shown in a mismatch
    pub fn expected(&self) -> String {
        match self {
            Expectation::Title { pattern } => format!("/{}/", pattern),
            Expectation::Heading { text, .. } => format!("{:?}", text),
            Expectation::RoleVisible { .. } => "visible".to_string(),
        }
    }
}

impl Scenario {
    /// The hands-on page: title, level-1 heading and the button
    pub fn home() -> Self {
        Self {
            name: "home-page".to_string(),
            description: "ページの表示テスト".to_string(),
            path: default_path(),
            timeout_ms: default_timeout(),
            expectations: vec![
                Expectation::Title {
                    pattern: "最初のページ".to_string(),
                },
                Expectation::Heading {
                    level: 1,
                    text: "Playwrightハンズオン".to_string(),
                },
                Expectation::RoleVisible {
                    role: "button".to_string(),
                    name: "操作ボタン".to_string(),
                },
            ],
        }
    }

    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.expectations.is_empty() {
            return Err(E2eError::ScenarioParse(format!(
                "scenario '{}' has no expectations",
                self.name
            )));
        }

        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(E2eError::ScenarioParse(format!(
                "timeout_ms must be 1-{}, got {}",
                MAX_TIMEOUT_MS, self.timeout_ms
            )));
        }

        if !self.path.starts_with('/') {
            return Err(E2eError::ScenarioParse(format!(
                "path must start with '/': {}",
                self.path
            )));
        }

        for expectation in &self.expectations {
            match expectation {
                Expectation::Title { pattern } => {
                    Regex::new(pattern).map_err(|e| {
                        E2eError::ScenarioParse(format!("invalid title pattern '{}': {}", pattern, e))
                    })?;
                }
                Expectation::Heading { level, .. } => {
                    if !(1..=6).contains(level) {
                        return Err(E2eError::ScenarioParse(format!(
                            "heading level must be 1-6, got {}",
                            level
                        )));
                    }
                }
                Expectation::RoleVisible { role, .. } => {
                    if role.trim().is_empty() {
                        return Err(E2eError::ScenarioParse("role must not be empty".to_string()));
                    }
                }
            }
        }

        Ok(())
    }

    /// Absolute URL of the page under `base_url`
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_home_yaml() {
        let yaml = r#"
name: home-page
description: ページの表示テスト
expectations:
  - kind: title
    pattern: 最初のページ
  - kind: heading
    text: Playwrightハンズオン
  - kind: role_visible
    role: button
    name: 操作ボタン
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.name, "home-page");
        assert_eq!(scenario.path, "/");
        assert_eq!(scenario.timeout_ms, 5000);
        assert_eq!(scenario.expectations, Scenario::home().expectations);
    }

    #[test]
    fn test_rejects_empty_expectations() {
        let yaml = "name: empty\nexpectations: []\n";
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(E2eError::ScenarioParse(_))
        ));
    }

    #[test]
    fn test_rejects_bad_heading_level() {
        let yaml = r#"
name: bad-level
expectations:
  - kind: heading
    level: 7
    text: x
"#;
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(E2eError::ScenarioParse(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_title_pattern() {
        let yaml = r#"
name: bad-pattern
expectations:
  - kind: title
    pattern: "("
"#;
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(E2eError::ScenarioParse(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_timeout() {
        let yaml = "name: slow\ntimeout_ms: 9223372036854775807\nexpectations:\n  - kind: title\n    pattern: x\n";
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(E2eError::ScenarioParse(_))
        ));

        let zero = Scenario {
            timeout_ms: 0,
            ..Scenario::home()
        };
        assert!(zero.validate().is_err());

        let longest = Scenario {
            timeout_ms: MAX_TIMEOUT_MS,
            ..Scenario::home()
        };
        assert!(longest.validate().is_ok());
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let scenario = Scenario::home();
        assert_eq!(scenario.url("http://127.0.0.1:3000/"), "http://127.0.0.1:3000/");
        assert_eq!(scenario.url("http://127.0.0.1:3000"), "http://127.0.0.1:3000/");
    }

    #[test]
    fn test_check_names() {
        let names: Vec<String> = Scenario::home()
            .expectations
            .iter()
            .map(Expectation::check_name)
            .collect();
        assert_eq!(names, vec!["title", "heading level 1", "button '操作ボタン'"]);
    }
}
