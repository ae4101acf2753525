mod config;
mod consumer;

use clap::Parser;
use config::Args;
use tokio_util::sync::CancellationToken;

fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting tracing default failed");

    let args = Args::parse();
    tracing::info!(?args, "starting notifier");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async_main(args));
    tracing::info!(?result, "notifier shutting down");
    result
}

async fn async_main(args: Args) -> Result<(), anyhow::Error> {
    let kafka_consumer = consumer::build_consumer(
        &args.kafka_brokers,
        &args.kafka_consumer_group_name,
        &args.kafka_topic,
    )?;

    let cancel = CancellationToken::new();
    let consume_cancel = cancel.clone();
    let consume_task =
        tokio::spawn(async move { consumer::run(&kafka_consumer, consume_cancel).await });

    shutdown_signal().await;
    cancel.cancel();
    consume_task.await.ok();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl_c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("received shutdown signal");
}
