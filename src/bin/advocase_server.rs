//!
//! advocase server binary
//! ----------------------
//! Command-line entry point for starting the portal. Supports configuration
//! via CLI flags and environment variables; flags win over the environment.

use anyhow::Result;
use std::env;
use std::time::Duration;

use advocase::server::{run_with_options, ServerOptions};

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return args[i + 1].parse::<u16>().ok();
        }
        i += 1;
    }
    None
}

fn parse_string_arg(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn parse_splash_arg(args: &[String]) -> Option<Option<Duration>> {
    let mut i = 0;
    while i < args.len() {
        let a = &args[i];
        if a == "--no-splash" {
            return Some(None);
        }
        if a == "--splash-ms" && i + 1 < args.len() {
            return args[i + 1].parse::<u64>().ok().map(|ms| {
                if ms == 0 { None } else { Some(Duration::from_millis(ms)) }
            });
        }
        i += 1;
    }
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut opts = ServerOptions::from_env();
    if let Some(port) = parse_port_arg(&args, "--port") {
        opts.http_port = port;
    }
    if let Some(state) = parse_string_arg(&args, "--state") {
        opts.state_root = state;
    }
    if let Some(backend) = parse_string_arg(&args, "--backend") {
        opts.backend_url = Some(backend);
    }
    if let Some(splash) = parse_splash_arg(&args) {
        opts.splash = splash;
    }

    run_with_options(opts).await
}
