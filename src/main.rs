mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use log::error;
use polygon_dml_indexer::{
    api, config::Config, indexer::Indexer, models::SyncReport, query::QueryService,
};
use reqwest::Url;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let sync_config = config.clone();
            tokio::spawn(async move {
                if let Err(e) = sync_once(&sync_config).await {
                    error!("Sync failed: {:#}", e);
                }
            });

            let addr: SocketAddr = format!("{}:{}", config.bind_host, config.port)
                .parse()
                .with_context(|| format!("invalid listen address {}:{}", config.bind_host, config.port))?;
            let service = Arc::new(QueryService::from_config(&config));
            api::serve(service, addr, config.public_authority()).await;
        }
        Commands::Sync => {
            let report = sync_once(&config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Query { page } => {
            let service = QueryService::from_config(&config);
            let url = Url::parse(&format!("http://{}/data", config.public_authority()))?;
            let result = service.get_page(page, &url).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

async fn sync_once(config: &Config) -> Result<SyncReport> {
    Indexer::from_config(config)?.run().await
}
