//! Startup configuration (spec.md §6 "Config"), matching
//! `cart/config/config.go`'s field set, restyled as a `clap::Parser`
//! the way the teacher's binaries take their args
//! (`crates/agent/src/main.rs`).

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about = "cart service")]
pub struct Args {
    /// Port the cart HTTP API listens on.
    #[clap(long, env = "CART_HTTP_PORT", default_value = "8081")]
    pub http_port: u16,

    /// Base URL of the OSS JSON RPC surface.
    #[clap(long, env = "CART_OSS_API", default_value = "http://127.0.0.1:8080")]
    pub oss_api: String,

    /// Base URL of the third-party product catalog.
    #[clap(long, env = "CART_PRODUCT_API")]
    pub product_api: String,

    /// Auth token sent with every product-catalog request.
    #[clap(long, env = "CART_PRODUCT_TOKEN", default_value = "testtoken")]
    pub product_token: String,

    /// TTL of a cached product lookup.
    #[clap(
        long,
        env = "CART_PRODUCT_CACHE_TTL",
        default_value = "5m",
        value_parser = humantime::parse_duration
    )]
    pub product_cache_ttl: std::time::Duration,

    /// Refill interval of the product-lookup rate limiter.
    #[clap(
        long,
        env = "CART_RATE_LIMIT_INTERVAL",
        default_value = "1s",
        value_parser = humantime::parse_duration
    )]
    pub rate_limit_interval: std::time::Duration,

    /// Tokens refilled into the rate limiter every interval.
    #[clap(long, env = "CART_RATE_LIMIT_MAX_REQUESTS", default_value = "10")]
    pub rate_limit_max_requests: usize,
}
