//! LogiChain Gateway - admission-controlled front door for the route engine
//!
//! Serves the HTTP API by default; `optimize --input <file>` runs the engine
//! once without starting the server.

mod cli;
mod config;
mod defaults;
mod error;
mod handlers;
mod services;
mod types;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::services::vrp::{VrpEngine, ALGORITHM};
use crate::types::{OptimizeRequest, OptimizeResponse};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs directory - use LOGS_DIR env var or default to ../logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "gateway.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,logichain_gateway=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let config = Config::from_env()?;
    info!("Configuration loaded");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            info!("Starting LogiChain Gateway...");
            if let Err(e) = handlers::serve(config).await {
                error!("Gateway error: {:#}", e);
                return Err(e);
            }
        }
        Command::Optimize { input } => {
            let response = optimize_file(&config, &input)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Run the engine once on a request file
fn optimize_file(config: &Config, input: &Path) -> Result<OptimizeResponse> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let request: OptimizeRequest = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    let problem = handlers::route::build_problem(request, &config.request_limits())?;
    let plan = VrpEngine::new(config.solver()).solve(&problem, &CancellationToken::new())?;

    Ok(OptimizeResponse::from_plan(&plan, ALGORITHM))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_input(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("logichain-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_optimize_file_solves_request() {
        let config = Config::from_source(|_| None).unwrap();
        let path = write_input(
            "solve",
            r#"{"start_lat": 50.0755, "start_lng": 14.4378,
                "stops": [[50.08, 14.42], [50.09, 14.45, 2]], "vehicle_capacity": 10}"#,
        );

        let response = optimize_file(&config, &path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(response.vehicles_used, 1);
        assert_eq!(response.routes[0].first(), Some(&0));
        assert_eq!(response.routes[0].last(), Some(&0));
        assert_eq!(response.route_details[0].load, 3.0);
    }

    #[test]
    fn test_optimize_file_reports_invalid_input() {
        let config = Config::from_source(|_| None).unwrap();
        let path = write_input("invalid", r#"{"start_lat": 50.0, "start_lng": 14.0, "stops": []}"#);

        let err = optimize_file(&config, &path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(err.to_string().contains("No stops provided"));
    }
}
