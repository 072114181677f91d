use std::{env, sync::Arc};

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use redis_stream_browser::{
    config::BrowserConfig,
    pagination::{DeleteOutcome, StreamPaginator},
    store::RemoteStore,
    stream::{StreamError, StreamService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = BrowserConfig::new(env::args()).context("invalid command line arguments")?;

    if let Err(e) = run(&config).await {
        if let Some(stream_error) = e.downcast_ref::<StreamError>() {
            error!(
                key = %config.key_name,
                status = stream_error.status_code(),
                error = %stream_error,
                "Stream browser request failed."
            );
        }
        return Err(e);
    }

    Ok(())
}

async fn run(config: &BrowserConfig) -> anyhow::Result<()> {
    info!(address = %config.address(), key = %config.key_name, "Connecting to Redis.");

    let store = RemoteStore::connect(config.address())
        .await
        .with_context(|| format!("failed to connect to {}", config.address()))?;
    let service = Arc::new(StreamService::new(store));
    let mut paginator = StreamPaginator::new(service, config.key_name.clone(), config.count);

    paginator.load_entries().await?;

    if !config.delete.is_empty() {
        match paginator.delete_entries(config.delete.clone()).await? {
            DeleteOutcome::KeyDeleted => {
                info!(key = %config.key_name, "Every entry was deleted, key removed.");
                return Ok(());
            }
            DeleteOutcome::EntriesDeleted(affected) => {
                info!(key = %config.key_name, affected, "Entries deleted.");
            }
        }
    }

    if paginator.state().sort_order != config.sort_order {
        paginator.change_sort_order(config.sort_order).await?;
    }
    if let Some(start) = config.start {
        paginator.update_start(start).await?;
    }
    if let Some(end) = config.end {
        paginator.update_end(end).await?;
    }
    if config.all {
        paginator.load_all().await?;
    }

    let output = serde_json::to_string_pretty(&paginator.state().data)?;
    println!("{}", output);

    Ok(())
}
