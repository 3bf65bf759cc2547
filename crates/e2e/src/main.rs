//! Verifier entry point
//!
//! Checks the hands-on page against a scenario and exits with 0 when every
//! check passes, 1 when a check fails and 2 when the harness itself fails.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use handson_e2e::playwright::{Browser, PlaywrightConfig};
use handson_e2e::runner::{Backend, RunnerConfig};
use handson_e2e::server::ServerConfig;
use handson_e2e::{E2eResult, Scenario, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "handson-verify")]
#[command(about = "Verify the hands-on page title, heading and button")]
struct Args {
    /// Verify a server already running here instead of spawning one
    #[arg(long, env = "HANDSON_E2E_BASE_URL")]
    base_url: Option<String>,

    /// Path to web server binary (used when --base-url is not given)
    #[arg(long, default_value = "target/debug/handson-web")]
    server_binary: PathBuf,

    /// Port for the spawned server (0 = auto)
    #[arg(long, default_value = "0")]
    port: u16,

    /// Scenario YAML file (defaults to the built-in home page scenario)
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Verifier backend (playwright, http)
    #[arg(long, default_value = "playwright")]
    backend: String,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: String,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Directory containing node_modules with Playwright
    #[arg(long, default_value = ".")]
    node_project: PathBuf,

    /// Per-check wait timeout in milliseconds (overrides the scenario)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = async_main(args).await;
    if let Err(e) = &result {
        eprintln!("Error: {}", e);
    }
    ExitCode::from(exit_code(&result))
}

/// 0 passed, 1 a check failed, 2 the harness itself failed
fn exit_code(result: &E2eResult<bool>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => 2,
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let mut scenario = match &args.scenario {
        Some(path) => Scenario::from_file(path)?,
        None => Scenario::home(),
    };
    if let Some(timeout_ms) = args.timeout_ms {
        scenario.timeout_ms = timeout_ms;
        scenario.validate()?;
    }

    let browser: Browser = args.browser.parse()?;
    let backend: Backend = args.backend.parse()?;

    let config = RunnerConfig {
        base_url: args.base_url,
        server: ServerConfig {
            binary_path: args.server_binary,
            port: if args.port == 0 { None } else { Some(args.port) },
            startup_timeout: Duration::from_secs(30),
            show_logs: false,
        },
        backend,
        playwright: PlaywrightConfig {
            project_dir: args.node_project,
            browser,
            headless: !args.headed,
            ..Default::default()
        },
        scenario,
        output_dir: args.output,
        ..Default::default()
    };

    let mut runner = TestRunner::with_config(config);

    let report = runner.run().await?;
    runner.write_results(&report)?;

    Ok(report.success)
}
