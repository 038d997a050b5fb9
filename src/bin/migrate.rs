use anyhow::{Context, Result};
use person_registry::{config::AppConfig, store};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load();

    store::open(&config)
        .await
        .context("failed to apply person schema")?;

    println!("Schema applied to {}", config.database_url);
    Ok(())
}
