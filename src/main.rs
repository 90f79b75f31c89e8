use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use travel_assistant::{AssistantConfig, VERSION, logging, web};

#[tokio::main]
async fn main() -> Result<()> {
    // optional first argument: path to a config.toml
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AssistantConfig::load_from_path(config_path)?;

    logging::init(&config.logging)?;
    info!("Starting travel-assistant {}", VERSION);

    if config.model.api_key.is_none() {
        info!("No model API key configured, clients must send one per request");
    }

    web::run(config).await
}
