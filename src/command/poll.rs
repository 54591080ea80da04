use anyhow::{Context, Result};
use tracing::warn;

use cursor_client::api::{CallOptions, ConnectTransport};
use cursor_client::config::ClientConfig;
use cursor_client::login::{extract_login_uuid, LoginPoller, POLL_INTERVAL};

pub async fn run_poll(config: &ClientConfig, login_url: &str, attempts: u32) -> Result<()> {
    warn!("`poll` is experimental: it only reports poll statuses and never stores credentials");

    let uuid = extract_login_uuid(login_url).context("Failed to read the login URL")?;
    println!("Login uuid: {}", uuid);

    let poller = LoginPoller::new(ConnectTransport::new(config.timeout)?, &config.ai_base_url)?;

    for attempt in 1..=attempts {
        tokio::time::sleep(POLL_INTERVAL).await;
        let status = poller.poll_once(&uuid, CallOptions::default()).await?;
        println!("[{}/{}] {}", attempt, attempts, status);
    }

    warn!("Stopped polling after {} attempt(s)", attempts);
    Ok(())
}
