use anyhow::Result;
use async_trait::async_trait;
use ethers::abi::{Abi, Detokenize};
use ethers::contract::Contract;
use ethers_core::types::Address;
use ethers_providers::{Http, Provider};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ResolveError;
use crate::models::{AssetNames, Resolution};

const TOKEN_ERC_ACCESSOR: &str = "tokenerc";
const TOKEN_NFT_ACCESSOR: &str = "tokennft";
const NAME_METHOD: &str = "name";

/// Looks up the token and collectible names behind a marketplace contract.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Never fails: any lookup problem comes back as [`Resolution::Unresolved`].
    async fn resolve(&self, contract_address: &str) -> Resolution;
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: Value,
}

pub struct EthereumClient {
    provider: Arc<Provider<Http>>,
    http: reqwest::Client,
    explorer_api_url: String,
    explorer_api_key: Option<String>,
}

impl EthereumClient {
    pub fn new(
        rpc_url: &str,
        explorer_api_url: &str,
        explorer_api_key: Option<String>,
    ) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)?;
        let provider = Arc::new(provider);

        Ok(Self {
            provider,
            http: reqwest::Client::new(),
            explorer_api_url: explorer_api_url.to_string(),
            explorer_api_key,
        })
    }

    pub async fn fetch_abi(&self, address: Address) -> Result<Abi, ResolveError> {
        let address = format!("{:#x}", address);
        let mut query = vec![
            ("module", "contract"),
            ("action", "getabi"),
            ("address", address.as_str()),
        ];
        if let Some(key) = self.explorer_api_key.as_deref().filter(|k| !k.is_empty()) {
            query.push(("apikey", key));
        }

        let response: ExplorerResponse = self
            .http
            .get(&self.explorer_api_url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_abi_response(response)
    }

    async fn lookup(&self, contract_address: &str) -> Result<AssetNames, ResolveError> {
        let address: Address = contract_address
            .trim()
            .parse()
            .map_err(|_| ResolveError::InvalidAddress(contract_address.to_string()))?;

        let abi = self.fetch_abi(address).await?;
        let contract = Contract::new(address, abi.clone(), self.provider.clone());

        let token_address: Address = call_method(&contract, TOKEN_ERC_ACCESSOR).await?;
        let nft_address: Address = call_method(&contract, TOKEN_NFT_ACCESSOR).await?;

        // Both sub-contracts are bound with the marketplace ABI, so `name()`
        // is only attempted when the marketplace itself declares it.
        let token_name = self.display_name(token_address, &abi).await?;
        let nft_name = self.display_name(nft_address, &abi).await?;

        Ok(AssetNames {
            token_name,
            nft_name,
        })
    }

    async fn display_name(&self, address: Address, abi: &Abi) -> Result<String, ResolveError> {
        if abi.function(NAME_METHOD).is_err() {
            return Ok(String::new());
        }

        let contract = Contract::new(address, abi.clone(), self.provider.clone());
        call_method(&contract, NAME_METHOD).await
    }
}

#[async_trait]
impl NameResolver for EthereumClient {
    async fn resolve(&self, contract_address: &str) -> Resolution {
        match self.lookup(contract_address).await {
            Ok(names) => {
                debug!("Token Name: {}", names.token_name);
                debug!("NFT Name: {}", names.nft_name);
                Resolution::Resolved(names)
            }
            Err(e) => {
                warn!("Could not resolve names for {}: {}", contract_address, e);
                Resolution::Unresolved
            }
        }
    }
}

async fn call_method<D: Detokenize>(
    contract: &Contract<Provider<Http>>,
    method: &str,
) -> Result<D, ResolveError> {
    let call = contract
        .method::<_, D>(method, ())
        .map_err(|_| ResolveError::MissingMethod(method.to_string()))?;

    call.call().await.map_err(|e| ResolveError::Call {
        method: method.to_string(),
        reason: e.to_string(),
    })
}

fn parse_abi_response(response: ExplorerResponse) -> Result<Abi, ResolveError> {
    let result = match response.result {
        Value::String(s) => s,
        other => other.to_string(),
    };

    if response.status != "1" {
        let reason = if result.is_empty() {
            response.message
        } else {
            result
        };
        return Err(ResolveError::AbiUnavailable(reason));
    }

    Ok(serde_json::from_str(&result)?)
}
