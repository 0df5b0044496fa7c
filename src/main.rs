use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use asc_mcp::archives::ArchiveScanner;
use asc_mcp::asc::AscClient;
use asc_mcp::config::Config;
use asc_mcp::process::firebase::FirebaseCli;
use asc_mcp::process::transporter::{TransporterAuth, TransporterCli};
use asc_mcp::server::AscServer;
use asc_mcp::tools::{Dispatcher, ToolContext};

#[derive(Debug, Parser)]
#[command(name = "asc-mcp", version, about = "App Store Connect MCP server over stdio")]
struct Cli {
    /// Log level: debug, info, warn or error. RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_logging(&cli.log_level);

    let config = Config::from_env().context("cannot load configuration")?;
    tracing::info!(
        key_id = %config.key_id_redacted(),
        archives_dir = %config.archives_dir.display(),
        "starting {}",
        asc_mcp::server::SERVER_NAME
    );

    let credential = config.load_credential()?;
    let gateway = AscClient::new(&config.api_base_url, &credential)?;
    let transporter = TransporterCli::new(TransporterAuth {
        key_id: config.key_id.clone(),
        issuer_id: config.issuer_id.clone(),
    });

    let ctx = ToolContext::new(
        Arc::new(gateway),
        FirebaseCli::new(),
        transporter,
        ArchiveScanner::new(config.archives_dir.clone()),
    );
    let server = AscServer::new(Dispatcher::new(ctx));

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("cannot start MCP service")?;
    service.waiting().await?;

    tracing::info!("server stopped");
    Ok(())
}
