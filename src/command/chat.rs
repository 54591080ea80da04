use anyhow::Result;
use std::io::{self, Write};

use cursor_client::api::{CallOptions, GetChatRequest};
use cursor_client::config::ClientConfig;

pub async fn run_chat(config: &ClientConfig, prompt: String, model: Option<String>) -> Result<()> {
    let client = config.factory()?.ai(Some(&config.ai_base_url))?;

    let model = model.filter(|m| !m.is_empty());
    let request = GetChatRequest::single_turn(prompt, model);
    let mut stream = client.stream_chat(request, CallOptions::default()).await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stdout = io::stdout();
    loop {
        let advanced = tokio::select! {
            more = stream.advance() => Some(more),
            _ = &mut ctrl_c => None,
        };

        match advanced {
            Some(true) => {
                if let Some(fragment) = stream.current() {
                    write!(stdout, "{}", fragment.text)?;
                    stdout.flush()?;
                }
            }
            Some(false) => break,
            None => {
                stream.close();
                writeln!(stdout)?;
                anyhow::bail!("Interrupted");
            }
        }
    }
    writeln!(stdout)?;

    // Output already printed stays on screen; the error follows it
    if let Some(err) = stream.err() {
        return Err(err.clone().into());
    }

    Ok(())
}
