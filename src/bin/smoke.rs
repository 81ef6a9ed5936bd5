use rolling_chat::diagnostics::{run_smoke_check, DEFAULT_PROBE_URL};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let api_key = std::env::var("API_KEY").ok();
    let client = reqwest::Client::new();

    let report = run_smoke_check(&client, api_key.as_deref(), DEFAULT_PROBE_URL).await?;
    println!("{}", report);

    Ok(())
}
