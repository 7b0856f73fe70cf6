// ABOUTME: Gateway binary: loads configuration, installs logging and serves until shutdown
// ABOUTME: Environment-driven with a command-line port override
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Assistant Gateway Binary

use anyhow::Result;
use assistant_gateway::{config::ServerConfig, logging, server::GatewayServer};
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(name = "assistant-gateway")]
#[command(about = "Bearer-token auth gate for A2A agents with credential forwarding")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
        if std::env::var("APP_URL").is_err() {
            config.app_url = format!("http://localhost:{http_port}");
        }
    }

    info!(bind = %config.bind_address(), "Starting assistant gateway");
    GatewayServer::new(config)?.run().await?;
    Ok(())
}
