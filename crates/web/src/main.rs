use tracing::info;

use handson_web::server::{self, WebServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = WebServerConfig::from_env()?;

    info!("Starting hands-on page on http://{}", cfg.addr);

    server::serve(cfg).await
}
