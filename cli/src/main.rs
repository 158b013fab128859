//! Stickies CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use stickies_cli::{run, Cli};
use stickies_memory::NoteManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stickies_cli=info,stickies_memory=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let data_dir = cli.resolve_data_dir();
    tracing::debug!("Data directory: {:?}", data_dir);

    let engine = cli.build_engine();
    let manager = NoteManager::open(&data_dir, engine)
        .with_context(|| format!("Failed to open note store at {}", data_dir.display()))?;

    let output = run(&manager, cli.command).await?;
    manager.wait_for_indexing().await;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
