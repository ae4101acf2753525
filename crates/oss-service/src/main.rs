mod config;
mod http;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use config::Args;
use oss_core::{OrderServiceImpl, ShardSet};
use tokio_util::sync::CancellationToken;

fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting tracing default failed");

    let args = Args::parse();
    tracing::info!(?args, "starting oss-service");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async_main(args));
    tracing::info!(?result, "oss-service shutting down");
    result
}

async fn async_main(args: Args) -> Result<(), anyhow::Error> {
    if args.order_shard_dsns.is_empty() {
        anyhow::bail!("at least one --order-shard-dsns entry is required");
    }

    let mut order_shards = Vec::with_capacity(args.order_shard_dsns.len());
    for entry in &args.order_shard_dsns {
        let dsns = config::parse_shard_dsns(entry);
        apply_common_migrations(&dsns.primary).await?;

        let replicas: Vec<&str> = dsns.replicas.iter().map(String::as_str).collect();
        let pool = db::Pool::connect(&[dsns.primary.as_str()], &replicas)
            .await
            .context("connecting to order shard")?;
        order_shards.push(pool);
    }

    apply_stocks_migrations(&args.stocks_dsn).await?;
    let stocks_pool = db::Pool::connect(&[args.stocks_dsn.as_str()], &[])
        .await
        .context("connecting to stocks database")?;

    // The outbox publisher needs its own handle to each shard's
    // connections, distinct from the request-serving `ShardSet`: both
    // draw from the same Postgres pools but are independent consumers.
    // One `db::Pool` per shard, not a single pool round-robinning across
    // every shard's primary, or a tick would drain at most one shard's
    // worth of rows per call into `tick`'s per-pool loop.
    let mut publisher_pools = Vec::with_capacity(args.order_shard_dsns.len());
    for entry in &args.order_shard_dsns {
        let primary = config::parse_shard_dsns(entry).primary;
        publisher_pools.push(
            db::Pool::connect(&[primary.as_str()], &[])
                .await
                .context("connecting outbox publisher to order shard")?,
        );
    }

    let shards = ShardSet::new(order_shards, stocks_pool);
    let service: Arc<dyn oss_core::OrderService> = Arc::new(OrderServiceImpl::new(shards));
    let state = http::AppState { service };

    let publisher = outbox_publisher::Publisher::new(
        publisher_pools,
        &args.kafka_brokers,
        args.kafka_topic.clone(),
        args.publisher_interval,
    )
    .context("configuring outbox publisher")?;

    let cancel = CancellationToken::new();
    let publisher_cancel = cancel.clone();
    let publisher_task = tokio::spawn(async move { publisher.run(publisher_cancel).await });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.http_port))
        .await
        .context("binding http port")?;
    tracing::info!(port = args.http_port, "oss-service listening");

    let app = http::router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    cancel.cancel();
    publisher_task.await.ok();
    Ok(())
}

/// Applies this service's own embedded migrations against an order-shard
/// primary. `sqlx::migrate!` embeds the SQL files into the binary at
/// compile time, standing in for the original's `goose`-based
/// `migrations.ApplyMigrations` (`loms/migrations/migrations.go`); each
/// binary applies its own schema at startup rather than via a standalone
/// runner (see SPEC_FULL.md §7).
async fn apply_common_migrations(dsn: &str) -> Result<(), anyhow::Error> {
    let mut conn = <sqlx::PgConnection as sqlx::Connection>::connect(dsn)
        .await
        .context("connecting to apply order-shard migrations")?;
    sqlx::migrate!("./migrations/common")
        .run(&mut conn)
        .await
        .context("running order-shard migrations")?;
    Ok(())
}

async fn apply_stocks_migrations(dsn: &str) -> Result<(), anyhow::Error> {
    let mut conn = <sqlx::PgConnection as sqlx::Connection>::connect(dsn)
        .await
        .context("connecting to apply stocks migrations")?;
    sqlx::migrate!("./migrations/stocks")
        .run(&mut conn)
        .await
        .context("running stocks migrations")?;
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl_c handler");
    tracing::info!("received shutdown signal");
}
