use anyhow::Result;

use cursor_client::api::CallOptions;
use cursor_client::config::ClientConfig;

pub async fn run_models(config: &ClientConfig) -> Result<()> {
    let client = config.factory()?.ai(Some(&config.ai_base_url))?;
    let models = client.available_models(CallOptions::default()).await?;

    if models.is_empty() {
        eprintln!("No models available.");
        return Ok(());
    }

    for name in models {
        println!("{}", name);
    }

    Ok(())
}
