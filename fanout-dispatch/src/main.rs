use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fanout_dispatch::credentials::prepare_store;
use fanout_dispatch::sink::MarkdownRenderer;
use fanout_dispatch::{CredentialStore, Dispatcher, JsonFileCredentialStore, Settings, TerminalSink};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fanout", about = "Send one prompt to several LLM providers at once")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config file if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prompt to every configured provider
    Ask {
        /// Prompt text; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Manage stored provider keys
    Keys {
        #[command(subcommand)]
        command: KeysCommand,
    },
    /// List configured providers
    Providers,
}

#[derive(Subcommand)]
enum KeysCommand {
    /// Store a key
    Set { key: String, secret: String },
    /// Delete a key
    Remove { key: String },
    /// Show stored keys (redacted)
    List,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    let store = JsonFileCredentialStore::new(settings.credentials_path());
    prepare_store(&store, settings.seed_credential(), settings.legacy_credential_keys())
        .context("failed to prepare credential store")?;

    match cli.command {
        Commands::Ask { prompt } => ask(&settings, &store, &prompt.join(" ")).await,
        Commands::Keys { command } => keys(&store, command),
        Commands::Providers => providers(&settings, &store),
    }
}

async fn ask(settings: &Settings, store: &JsonFileCredentialStore, prompt: &str) -> Result<()> {
    let client = fanout_llmproxy::build_client().context("failed to build HTTP client")?;
    let sink = Arc::new(TerminalSink::stdout(MarkdownRenderer));
    let dispatcher = Dispatcher::from_settings(settings, client, sink)?;

    let credentials = store.snapshot().context("failed to read credentials")?;
    let handle = dispatcher.dispatch(prompt, &credentials)?;
    handle.join().await;
    Ok(())
}

fn keys(store: &JsonFileCredentialStore, command: KeysCommand) -> Result<()> {
    match command {
        KeysCommand::Set { key, secret } => {
            store.set(&key, &secret)?;
            println!("Key saved: {key}");
        }
        KeysCommand::Remove { key } => {
            store.remove(&key)?;
            println!("Key removed: {key}");
        }
        KeysCommand::List => {
            let mut entries: Vec<_> = store.snapshot()?.into_values().collect();
            entries.sort_by(|a, b| a.key().cmp(b.key()));
            if entries.is_empty() {
                println!("No keys stored in {}", store.path().display());
            }
            for credential in entries {
                println!("{:<12} {}", credential.key(), credential.redacted());
            }
        }
    }
    Ok(())
}

fn providers(settings: &Settings, store: &JsonFileCredentialStore) -> Result<()> {
    let stored = store.snapshot().context("failed to read credentials")?;
    for config in settings.providers() {
        let status = if !config.requires_credential() {
            "no key needed".to_string()
        } else if stored.contains_key(config.credential_key()) {
            format!("key '{}' set", config.credential_key())
        } else {
            format!("key '{}' missing", config.credential_key())
        };
        println!(
            "{:<14} {:<28} {:<26} {}",
            config.id, config.display_name, config.model, status
        );
    }
    Ok(())
}
