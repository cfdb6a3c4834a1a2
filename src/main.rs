use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let opts = advocase::server::ServerOptions::from_env();
    info!(
        target: "advocase",
        "Advocase starting: RUST_LOG='{}', http_port={}, state_root='{}', splash={:?}, backend={:?}",
        rust_log, opts.http_port, opts.state_root, opts.splash, opts.backend_url
    );

    advocase::server::run_with_options(opts).await
}
