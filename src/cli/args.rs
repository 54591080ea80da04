use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use cursor_client::api::{
    ClientIdentity, DEFAULT_AI_BASE_URL, DEFAULT_CLIENT_VERSION, DEFAULT_MACHINE_ID,
    DEFAULT_REPOSITORY_BASE_URL,
};
use cursor_client::config::ClientConfig;
use cursor_client::login::DEFAULT_POLL_ATTEMPTS;

/// crs - command-line client for the Cursor AI backend
#[derive(Parser)]
#[command(name = "crs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Credential file (defaults to <config dir>/cursor_client/auth.json)
    #[arg(long, env = "CURSOR_CLIENT_AUTH_FILE", global = true)]
    pub auth_file: Option<PathBuf>,

    /// Base URL of the AI service
    #[arg(long, env = "CURSOR_API_URL", default_value = DEFAULT_AI_BASE_URL, global = true)]
    pub api_url: String,

    /// Base URL of the repository (login) service
    #[arg(long, env = "CURSOR_REPO_URL", default_value = DEFAULT_REPOSITORY_BASE_URL, hide = true, global = true)]
    pub repo_url: String,

    /// Client version reported to the backend
    #[arg(long, env = "CURSOR_CLIENT_VERSION", default_value = DEFAULT_CLIENT_VERSION, hide = true, global = true)]
    pub client_version: String,

    /// Machine identifier appended to the checksum
    #[arg(long, env = "CURSOR_MACHINE_ID", default_value = DEFAULT_MACHINE_ID, hide = true, global = true)]
    pub machine_id: String,

    /// Give up on a call after this many seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the models available to this account
    Models,
    /// Send a single prompt and print the streamed reply
    #[command(alias = "llm")]
    Chat {
        /// Prompt text
        prompt: String,

        /// Select model to use
        #[arg(short = 'm', long)]
        model: Option<String>,
    },
    /// Request a login URL (experimental, does not log in)
    #[command(hide = true)]
    Login,
    /// Poll a pending browser login (experimental, does not log in)
    #[command(hide = true)]
    Poll {
        /// Login URL shown by the browser
        login_url: String,

        /// Number of polls before giving up
        #[arg(long, default_value_t = DEFAULT_POLL_ATTEMPTS)]
        attempts: u32,
    },
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            auth_file: self.auth_file.clone(),
            ai_base_url: self.api_url.clone(),
            repository_base_url: self.repo_url.clone(),
            identity: ClientIdentity {
                client_version: self.client_version.clone(),
                machine_id: self.machine_id.clone(),
            },
            timeout: self.timeout.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_with_model() {
        let cli = Cli::try_parse_from(["crs", "chat", "hello world", "-m", "gpt-x"]).unwrap();
        match cli.command {
            Commands::Chat { prompt, model } => {
                assert_eq!(prompt, "hello world");
                assert_eq!(model.as_deref(), Some("gpt-x"));
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn test_llm_alias() {
        let cli = Cli::try_parse_from(["crs", "llm", "hi"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { model: None, .. }));
    }

    #[test]
    fn test_global_options_map_to_config() {
        let cli = Cli::try_parse_from([
            "crs",
            "models",
            "--auth-file",
            "/tmp/auth.json",
            "--timeout",
            "30",
            "--client-version",
            "1.2.3",
        ])
        .unwrap();
        let config = cli.client_config();
        assert_eq!(config.auth_file, Some(PathBuf::from("/tmp/auth.json")));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.identity.client_version, "1.2.3");
    }

    #[test]
    fn test_poll_default_attempts() {
        let cli = Cli::try_parse_from(["crs", "poll", "https://x/?state=1"]).unwrap();
        match cli.command {
            Commands::Poll { attempts, .. } => assert_eq!(attempts, DEFAULT_POLL_ATTEMPTS),
            _ => panic!("expected poll command"),
        }
    }

    #[test]
    fn test_command_required() {
        assert!(Cli::try_parse_from(["crs"]).is_err());
    }
}
