use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("response body could not be decoded: {0}")]
    Decoding(#[from] serde_json::Error),

    #[error("marketplace rejected the request: {0}")]
    ServerRejection(String),

    #[error("rate-limited, retry after {0}s")]
    RateLimited(u64),
}
