use rolling_chat::{
    api::start_server, config::ChatConfig, conversational::ChatSession,
    openrouter::OpenRouterClient, prompts::HISTORIAN_PROMPT,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables
    dotenv::dotenv().ok();
    let config = ChatConfig::from_env()?;

    let session = match config.require_api_key() {
        Ok(key) => {
            let client = Arc::new(OpenRouterClient::new(key, config.endpoint.clone())?);
            Some(ChatSession::new(client, &config, HISTORIAN_PROMPT))
        }
        Err(e) => {
            warn!("{}; chat requests will be refused", e);
            None
        }
    };

    info!("Rolling Chat - API Server");
    info!("Port: {}", config.port);
    info!("History: {}", config.history.path.display());

    start_server(session, config.port).await?;

    Ok(())
}
