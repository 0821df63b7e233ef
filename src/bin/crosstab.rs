#![forbid(unsafe_code)]

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crosstab_agent::agent::Agent;
use crosstab_agent::data;
use crosstab_agent::gateway::OpenRouterAdapter;

#[derive(Parser)]
#[command(name = "crosstab", version, about = "Conversational survey tabulation agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a continuous chat session (type 'quit' to exit)
    Chat {
        /// Path to the data directory (questions.json, responses.csv, scope.md)
        #[arg(long, short, default_value = "data/demo")]
        data: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chat { data } => chat(data).await,
    }
}

async fn chat(data_dir: PathBuf) -> anyhow::Result<()> {
    anyhow::ensure!(
        data_dir.exists(),
        "Data directory not found: {}",
        data_dir.display()
    );

    let provider = OpenRouterAdapter::from_env()
        .context("LLM provider not configured. Set OPENROUTER_API_KEY or a .env equivalent")?;

    let questions = data::load_questions(&data_dir.join("questions.json"))
        .context("failed to load questions.json")?;
    let table = data::load_responses(&data_dir.join("responses.csv"))
        .context("failed to load responses.csv")?;
    let scope = data::load_scope(&data_dir.join("scope.md"))?;

    let mut agent = Agent::new(questions, table, scope, Arc::new(provider));

    println!("crosstab chat. Type 'quit' to exit.");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("You: ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }

        let resp = agent.handle_message(input).await;
        match resp.message {
            Some(message) => println!("{message}"),
            None if !resp.errors.is_empty() => println!("{}", resp.errors.join("\n")),
            None => println!("Error"),
        }
    }

    Ok(())
}
