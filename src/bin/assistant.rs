use chrono::Local;
use clap::Parser;
use rolling_chat::{
    config::ChatConfig,
    conversational::{render_exchange, AssistantSession},
    openrouter::OpenRouterClient,
    prompts::TUTOR_PROMPT,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "assistant")]
#[command(version, about = "Python tutor that keeps a short plain-text context log")]
struct Cli {
    #[arg(short, long)]
    model: Option<String>,

    #[arg(long)]
    context_file: Option<PathBuf>,

    /// Maximum context log size in bytes
    #[arg(long)]
    context_limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = ChatConfig::from_env()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(path) = cli.context_file {
        config.context_log.path = path;
    }
    if let Some(limit) = cli.context_limit {
        config.context_log.limit = limit;
    }

    let api_key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(e) => {
            eprintln!("[ERROR: {}]", e);
            return Ok(());
        }
    };

    let client = Arc::new(OpenRouterClient::new(api_key, config.endpoint.clone())?);
    let mut session = AssistantSession::new(client, &config, TUTOR_PROMPT)?;
    println!("Ask a question. /model <id> switches models, /quit exits.");

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
        if input == "/quit" || input == "/exit" {
            break;
        }
        if let Some(model) = input.strip_prefix("/model ") {
            session.set_model(model.trim());
            println!("[Selected LLM: {}]", session.model());
            continue;
        }

        match session.ask(input).await {
            Ok(reply) => println!(
                "{}",
                render_exchange(&Local::now(), input, session.model(), &reply.text)
            ),
            Err(e) => eprintln!("[ERROR: {}]", e),
        }
    }

    Ok(())
}
