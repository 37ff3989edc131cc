use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use freshet::cli::{commands, Cli, Commands};
use freshet::fetcher::HttpFetcher;
use freshet::store::JsonStore;
use freshet::sync::SyncHandle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let store = match &cli.data_dir {
        Some(dir) => JsonStore::new(dir),
        None => JsonStore::open_default()?,
    };
    let sync = SyncHandle::spawn(Arc::new(store), Arc::new(HttpFetcher::new()));

    match cli.command {
        Commands::Add { name, url } => {
            commands::add_source(&sync, &name, &url).await?;
        }
        Commands::Remove { url } => {
            commands::remove_source(&sync, &url).await?;
        }
        Commands::Edit { url, name, new_url } => {
            commands::edit_source(&sync, &url, name.as_deref(), new_url.as_deref()).await?;
        }
        Commands::List => {
            commands::list_sources(&sync)?;
        }
        Commands::Items { url } => {
            commands::show_items(&sync, &url).await?;
        }
        Commands::Refresh => {
            commands::refresh(&sync).await?;
        }
        Commands::Read { link } => {
            commands::mark_read(&sync, &link).await?;
        }
        Commands::Unread { link } => {
            commands::mark_unread(&sync, &link).await?;
        }
        Commands::ReadAll => {
            commands::mark_all_read(&sync).await?;
        }
        Commands::Watch => {
            commands::watch(&sync).await?;
        }
    }

    sync.shutdown().await;
    Ok(())
}
