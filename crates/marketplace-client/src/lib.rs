pub mod client;
pub mod dto;
pub mod errors;
pub mod limiter;

pub use client::{MarketplaceClient, MarketplaceEndpoints, MarketplaceResponse};
pub use errors::ClientError;
pub use limiter::RequestLimiter;
