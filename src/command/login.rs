use anyhow::Result;
use tracing::warn;

use cursor_client::api::CallOptions;
use cursor_client::config::ClientConfig;

pub async fn run_login(config: &ClientConfig) -> Result<()> {
    warn!("`login` is experimental: the challenge/response step is unknown, so no credentials are produced");

    let client = config
        .factory()?
        .repository(Some(&config.repository_base_url))?;

    let login = client.login_user(CallOptions::default()).await?;
    let poll = client.poll_logged_in(CallOptions::default()).await?;

    println!(
        "Login status: {}",
        poll.status.as_deref().unwrap_or("unknown")
    );
    println!("Login URL: {}", login.login_url);

    Ok(())
}
