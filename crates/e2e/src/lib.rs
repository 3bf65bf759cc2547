//! Hands-on page E2E verifier
//!
//! This crate provides a Rust-controlled E2E check that:
//! - Spawns the web server as a subprocess (or targets a running one)
//! - Drives Playwright through a generated Node script, or fetches the
//!   page over HTTP and queries its markup directly
//! - Asserts a declarative scenario: title, heading and a visible control
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  handson-verify (Rust)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── start_server() -> base_url                           │
//! │    ├── build_verifier() -> Box<dyn Verifier>                │
//! │    │     ├── PlaywrightVerifier (node + @playwright/test)   │
//! │    │     └── HttpVerifier (reqwest + scraper)               │
//! │    └── write_results(report)                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)                                            │
//! │    ├── name, description, path, timeout_ms                  │
//! │    └── expectations: [Expectation]                          │
//! │          ├── title { pattern }                              │
//! │          ├── heading { level, text }                        │
//! │          └── role_visible { role, name }                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod accessibility;
pub mod error;
pub mod http;
pub mod playwright;
pub mod runner;
pub mod scenario;
pub mod server;
pub mod verifier;

pub use error::{E2eError, E2eResult, VerificationFailure};
pub use runner::TestRunner;
pub use scenario::{Expectation, Scenario};
pub use verifier::{VerificationReport, Verifier};
