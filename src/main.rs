use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use cursor_client::api::ClientError;

mod cli;
mod command;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.client_config();

    let result = match cli.command {
        Commands::Models => command::run_models(&config).await,
        Commands::Chat { prompt, model } => command::run_chat(&config, prompt, model).await,
        Commands::Login => command::run_login(&config).await,
        Commands::Poll {
            login_url,
            attempts,
        } => command::run_poll(&config, &login_url, attempts).await,
    };

    if let Err(err) = &result {
        if let Some(hint) = err
            .downcast_ref::<ClientError>()
            .and_then(ClientError::rpc_status)
            .and_then(|status| status.user_hint())
        {
            eprintln!("   {}", hint);
        }
    }

    result
}
