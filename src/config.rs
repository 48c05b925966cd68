use anyhow::{Context, Result};
use serde::Deserialize;

use crate::query::DEFAULT_PAGE_SIZE;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub subgraph_url: String,
    pub rpc_url: String,
    pub explorer_api_url: String,
    pub explorer_api_key: Option<String>,
    pub explorer_tx_url: String,
    pub database_url: String,
    pub bind_host: String,
    pub port: u16,
    pub page_size: i64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .set_default(
                "subgraph_url",
                "https://api.studio.thegraph.com/query/46682/subgraph_demark/2",
            )?
            .set_default("rpc_url", "https://rpc.ankr.com/polygon_mumbai")?
            .set_default("explorer_api_url", "https://api-testnet.polygonscan.com/api")?
            .set_default("explorer_tx_url", "https://mumbai.polygonscan.com/tx/")?
            .set_default("database_url", "sqlite:./transactions.db")?
            .set_default("bind_host", "0.0.0.0")?
            .set_default("port", 4000)?
            .set_default("page_size", DEFAULT_PAGE_SIZE)?
            .add_source(config::Environment::default())
            .build()
            .context("failed to read configuration")?;

        let config: Config = config
            .try_deserialize()
            .context("invalid configuration")?;

        if config.page_size < 1 {
            anyhow::bail!("PAGE_SIZE must be at least 1, got {}", config.page_size);
        }

        Ok(config)
    }

    /// `host:port` as seen by clients when no `Host` header is available.
    pub fn public_authority(&self) -> String {
        let host = if self.bind_host == "0.0.0.0" {
            "localhost"
        } else {
            self.bind_host.as_str()
        };
        format!("{}:{}", host, self.port)
    }
}
