use thiserror::Error;

/// Everything that can go wrong while looking up asset names for a contract.
/// None of these leave the resolver; they are logged and turned into
/// [`Resolution::Unresolved`](crate::models::Resolution::Unresolved).
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid contract address {0:?}")]
    InvalidAddress(String),

    #[error("ABI lookup failed: {0}")]
    Lookup(#[from] reqwest::Error),

    #[error("explorer returned no ABI: {0}")]
    AbiUnavailable(String),

    #[error("malformed ABI: {0}")]
    MalformedAbi(#[from] serde_json::Error),

    #[error("contract ABI has no {0}() method")]
    MissingMethod(String),

    #[error("call to {method}() failed: {reason}")]
    Call { method: String, reason: String },
}
