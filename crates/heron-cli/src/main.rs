use anyhow::{Context, Result};
use clap::Parser;
use std::env;

use heron::agent::Agent;
use heron::providers::anthropic::AnthropicProvider;
use heron::providers::configs::{AnthropicConfig, DEFAULT_HOST, DEFAULT_MODEL};
use heron::workspace::WorkspaceSystem;

mod prompt;
mod session;

use prompt::rustyline::RustylinePrompt;
use session::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Model to use (can also be set via ANTHROPIC_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// API host (can also be set via ANTHROPIC_HOST)
    #[arg(long)]
    host: Option<String>,

    /// API key (can also be set via ANTHROPIC_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Send a single message, print the reply, and exit
    #[arg(short = 's', long)]
    send: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file is optional; a missing one is not an error
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    let config = create_config(&cli)?;
    let provider = AnthropicProvider::new(config)?;

    let mut agent = Agent::new(Box::new(provider));
    agent.add_system(Box::new(WorkspaceSystem::new()));

    let prompt = Box::new(RustylinePrompt::new()?);
    let mut session = Session::new(agent, prompt);

    match cli.send {
        Some(message) => session.headless_start(&message).await,
        None => session.start().await,
    }
}

fn create_config(cli: &Cli) -> Result<AnthropicConfig> {
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| env::var("ANTHROPIC_API_KEY").ok())
        .context("API key must be provided via --api-key or ANTHROPIC_API_KEY")?;

    let host = cli
        .host
        .clone()
        .or_else(|| env::var("ANTHROPIC_HOST").ok())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let model = cli
        .model
        .clone()
        .or_else(|| env::var("ANTHROPIC_MODEL").ok())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    Ok(AnthropicConfig::new(host, api_key, model))
}
