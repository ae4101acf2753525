mod config;
mod http;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use cart_core::{CartAggregator, CartStore, OssClient, ProductCache, ProductClient, RateLimiter};
use clap::Parser;
use config::Args;

const PRODUCT_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting tracing default failed");

    let args = Args::parse();
    tracing::info!(?args, "starting cart-service");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async_main(args));
    tracing::info!(?result, "cart-service shutting down");
    result
}

async fn async_main(args: Args) -> Result<(), anyhow::Error> {
    let cache = ProductCache::new(args.product_cache_ttl);
    let products = ProductClient::new(
        args.product_api.clone(),
        args.product_token.clone(),
        cache,
        PRODUCT_CLIENT_TIMEOUT,
    );
    let oss = OssClient::new(args.oss_api.clone());
    let limiter = RateLimiter::new(args.rate_limit_interval, args.rate_limit_max_requests);

    let aggregator = Arc::new(CartAggregator::new(
        Arc::new(products),
        Arc::new(oss),
        CartStore::new(),
        limiter,
    ));

    let state = http::AppState { aggregator };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.http_port))
        .await
        .context("binding http port")?;
    tracing::info!(port = args.http_port, "cart-service listening");

    let app = http::router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl_c handler");
    tracing::info!("received shutdown signal");
}
