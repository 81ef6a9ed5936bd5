use chrono::Local;
use clap::Parser;
use rolling_chat::{
    config::{ChatConfig, MODEL_CATALOGUE},
    conversational::{render_exchange, ChatSession},
    openrouter::OpenRouterClient,
    prompts::HISTORIAN_PROMPT,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chatbot")]
#[command(version, about = "Chat with a storyteller that remembers a sliding window of the conversation")]
struct Cli {
    /// Model id, e.g. openai/gpt-4o-mini
    #[arg(short, long)]
    model: Option<String>,

    /// Where the conversation history is kept
    #[arg(long)]
    history_file: Option<PathBuf>,

    /// Turns kept before older ones are summarized
    #[arg(long)]
    max_messages: Option<usize>,
}

const HELP: &str = "Commands: /clear  /history  /status  /model <id>  /models  /quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = ChatConfig::from_env()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(path) = cli.history_file {
        config.history.path = path;
    }
    if let Some(max) = cli.max_messages {
        config.history.max_messages = max;
    }

    let api_key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(e) => {
            eprintln!("[ERROR: {}]", e);
            return Ok(());
        }
    };

    let client = Arc::new(OpenRouterClient::new(api_key, config.endpoint.clone())?);
    let mut session = ChatSession::new(client, &config, HISTORIAN_PROMPT);

    info!(
        "Chatbot ready (model {}, history {})",
        session.model(),
        config.history.path.display()
    );
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.split_once(' ').unwrap_or((input, "")) {
            ("/quit" | "/exit", _) => break,
            ("/help", _) => println!("{}", HELP),
            ("/clear", _) => match session.clear() {
                Ok(()) => println!("[Conversation history cleared]"),
                Err(e) => eprintln!("[ERROR: {}]", e),
            },
            ("/history", _) => {
                for turn in session.history() {
                    println!("{}: {}", turn.role.as_str(), turn.content);
                }
            }
            ("/status", _) => println!("{} | model {}", session.usage(), session.model()),
            ("/models", _) => {
                for model in MODEL_CATALOGUE {
                    let marker = if *model == session.model() { "*" } else { " " };
                    println!("{} {}", marker, model);
                }
            }
            ("/model", id) if !id.trim().is_empty() => {
                session.set_model(id.trim());
                println!("[Selected LLM: {}]", session.model());
            }
            (cmd, _) if cmd.starts_with('/') => println!("Unknown command. {}", HELP),
            _ => {
                let reply = match session.ask(input).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        eprintln!("[ERROR: {}]", e);
                        continue;
                    }
                };

                println!(
                    "{}",
                    render_exchange(&Local::now(), input, session.model(), &reply.text)
                );

                if let Some(overflow) = reply.overflow {
                    println!("[Summarizing older messages...]");
                    match session.compact(overflow).await {
                        Ok(_) => println!("[Summarization complete]"),
                        Err(e) => eprintln!("[ERROR: {}]", e),
                    }
                }
            }
        }
    }

    Ok(())
}
