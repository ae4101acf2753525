//! The cart aggregator (C9): product enrichment fan-out behind a rate
//! limiter and a TTL cache, volatile per-process cart storage, and the
//! HTTP clients for the product catalog and OSS.

pub mod cache;
pub mod error;
pub mod limiter;
pub mod loms_client;
pub mod model;
pub mod product_client;
pub mod service;
pub mod store;

pub use cache::ProductCache;
pub use error::Error;
pub use limiter::RateLimiter;
pub use loms_client::{OssClient, OssProvider};
pub use model::{CartItem, ProductInfo};
pub use product_client::{ProductClient, ProductProvider};
pub use service::CartAggregator;
pub use store::CartStore;
