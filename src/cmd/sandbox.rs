//! Local stand-in backend: `refer-earn sandbox`.

use anyhow::{Context, Result};
use refer_earn::config::ReferConfig;
use refer_earn::sandbox::SandboxServer;
use tracing::info;

pub async fn cmd_sandbox(
    config: &ReferConfig,
    host: Option<&str>,
    port: Option<u16>,
    cors: bool,
) -> Result<()> {
    let host = host.unwrap_or(&config.toml.sandbox.host);
    let port = port.unwrap_or(config.toml.sandbox.port);
    let bind = format!("{}:{}", host, port);

    let mut server = SandboxServer::new();
    let base_url = server.start(&bind, cors).await?;

    println!("Sandbox backend running at {}", base_url);
    println!("One-time codes are printed to the log instead of being mailed.");
    println!("Press Ctrl+C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    let stored = server.referrals().await.len();
    server.stop().await;
    info!(referrals = stored, "Sandbox stopped");
    println!();
    println!("Stopped. {} referral(s) received.", stored);
    Ok(())
}
