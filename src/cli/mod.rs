//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod say;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::cli::say::run_say;
use crate::core::chat_stream::{GeminiTransport, TransportSettings};
use crate::core::config::data::path_display;
use crate::core::config::Config;
use crate::core::constants::QUICK_ACTIONS;
use crate::core::credentials::{
    base_url_override_with, resolve_api_key, ApiKey, CredentialError,
};
use crate::core::session::ChatSession;
use crate::ui::chat_loop::{run_chat, ChatUi};
use crate::utils::diagnostics::init_tracing;
use crate::utils::logging::TranscriptLog;

#[derive(Parser)]
#[command(name = "bankchat")]
#[command(about = "A terminal banking assistant backed by the Gemini API")]
#[command(
    long_about = "bankchat is a full-screen terminal chat with a simulated multi-agent banking \
assistant. Replies stream in live; the header badge shows which specialist the model is \
speaking as.\n\n\
Environment Variables:\n\
  API_KEY, GEMINI_API_KEY, GOOGLE_API_KEY   Gemini API key (first non-empty wins)\n\
  GEMINI_BASE_URL                           Custom API base URL (optional)\n\
  RUST_LOG                                  Diagnostic log filter (default bankchat=info)\n\n\
Controls:\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a new line\n\
  F1-F5             Send a quick action (before the first exchange)\n\
  Up/Down/PgUp/PgDn Scroll through chat history\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this run, overriding the configured one
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Append a transcript of the conversation to the specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send a single prompt and stream the reply to stdout
    Say {
        /// Prompt text (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set (model, base-url, temperature, markdown)
        key: String,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Show the current configuration
    Config,
    /// List the quick actions offered in the chat screen
    Actions,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match init_tracing() {
        Ok(Some(path)) => info!(log = %path.display(), "diagnostics enabled"),
        Ok(None) => {}
        Err(e) => eprintln!("⚠️  Diagnostics logging disabled: {e}"),
    }

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let config = Config::load()?;
            let transport = build_transport(&config, args.model, resolve_api_key());
            let model_label = transport.settings().model.clone();
            let session = build_session(args.log.as_deref())?;
            let chat = ChatUi::new(session, model_label, config.markdown_enabled());
            run_chat(chat, Arc::new(transport)).await
        }
        Commands::Say { prompt } => {
            let config = Config::load()?;
            let credential = resolve_api_key();
            let credential_error = credential.as_ref().err().cloned();
            let transport = build_transport(&config, args.model, credential);
            let session = build_session(args.log.as_deref())?;
            run_say(prompt, transport, credential_error, session).await
        }
        Commands::Set { key, value } => {
            if value.is_empty() {
                Config::load()?.print_all();
                return Ok(());
            }
            let value = value.join(" ");
            let config_path = Config::get_config_path()?;
            set_in_file(&config_path, &key, &value)?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let config_path = Config::get_config_path()?;
            unset_in_file(&config_path, &key)?;
            println!("✅ Unset {key}");
            Ok(())
        }
        Commands::Config => {
            let config_path = Config::get_config_path()?;
            let config = Config::load_from_path(&config_path)?;
            println!("Config file: {}", path_display(&config_path));
            config.print_all();
            Ok(())
        }
        Commands::Actions => {
            for line in quick_action_listing() {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn quick_action_listing() -> Vec<String> {
    QUICK_ACTIONS
        .iter()
        .enumerate()
        .flat_map(|(i, action)| {
            [
                format!("F{}  {} [{}]", i + 1, action.label, action.category.label()),
                format!("    {}", action.prompt),
            ]
        })
        .collect()
}

fn build_transport(
    config: &Config,
    model: Option<String>,
    credential: Result<ApiKey, CredentialError>,
) -> GeminiTransport {
    let base_url = base_url_override_with(|name| std::env::var(name).ok());
    let mut settings = TransportSettings::from_config(config, base_url);
    if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
        settings = settings.with_model(model.trim());
    }

    if let Err(err) = &credential {
        warn!("{err}");
    }
    GeminiTransport::new(settings, credential)
}

fn build_session(log: Option<&str>) -> Result<ChatSession, Box<dyn Error>> {
    let session = ChatSession::new();
    match log {
        Some(path) => Ok(session.with_transcript(TranscriptLog::new(path)?)),
        None => Ok(session),
    }
}

fn set_in_file(config_path: &Path, key: &str, value: &str) -> Result<Config, Box<dyn Error>> {
    let mut config = Config::load_from_path(config_path)?;
    config.set_value(key, value)?;
    config.save_to_path(config_path)?;
    Ok(config)
}

fn unset_in_file(config_path: &Path, key: &str) -> Result<Config, Box<dyn Error>> {
    let mut config = Config::load_from_path(config_path)?;
    config.unset_value(key)?;
    config.save_to_path(config_path)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigError;
    use tempfile::TempDir;

    #[test]
    fn chat_is_the_default_command() {
        let args = Args::try_parse_from(["bankchat"]).unwrap();
        assert!(args.command.is_none());
        assert!(args.model.is_none());
    }

    #[test]
    fn say_collects_prompt_words() {
        let args =
            Args::try_parse_from(["bankchat", "say", "Transfer", "100", "-to", "555"]).unwrap();
        match args.command {
            Some(Commands::Say { prompt }) => {
                assert_eq!(prompt.join(" "), "Transfer 100 -to 555");
            }
            _ => panic!("expected say"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let args =
            Args::try_parse_from(["bankchat", "chat", "-m", "gemini-pro", "--log", "chat.log"])
                .unwrap();
        assert!(matches!(args.command, Some(Commands::Chat)));
        assert_eq!(args.model.as_deref(), Some("gemini-pro"));
        assert_eq!(args.log.as_deref(), Some("chat.log"));
    }

    #[test]
    fn set_then_unset_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = set_in_file(&path, "model", "gemini-2.5-pro").unwrap();
        assert_eq!(config.effective_model(), "gemini-2.5-pro");
        let reloaded = Config::load_from_path(&path).unwrap();
        assert_eq!(reloaded.model.as_deref(), Some("gemini-2.5-pro"));

        let config = unset_in_file(&path, "model").unwrap();
        assert!(config.model.is_none());
        assert!(Config::load_from_path(&path).unwrap().model.is_none());
    }

    #[test]
    fn set_rejects_unknown_key_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let err = set_in_file(&path, "colour", "blue").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::UnknownKey(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn actions_listing_shows_key_label_and_category() {
        let listing = quick_action_listing();
        assert_eq!(listing.len(), QUICK_ACTIONS.len() * 2);
        assert_eq!(listing[2], "F2  Transfer Dana [transaction]");
        assert!(listing[3].starts_with("    Tolong transfer"));
    }

    #[test]
    fn model_flag_overrides_config() {
        let config = Config {
            model: Some("from-config".into()),
            ..Config::default()
        };
        let transport =
            build_transport(&config, Some(" flag-model ".into()), Ok(ApiKey::new("k")));
        assert_eq!(transport.settings().model, "flag-model");

        let transport = build_transport(&config, Some("  ".into()), Ok(ApiKey::new("k")));
        assert_eq!(transport.settings().model, "from-config");
    }

    #[test]
    fn transcript_flag_attaches_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.log");
        assert!(build_session(path.to_str()).is_ok());
        assert!(path.exists());
    }
}
