//! Kafka consumer group draining order-status events published by
//! `outbox-publisher`, grounded on `notifier/internal/infra/kafka/consumer.go`
//! and `notifier/internal/transport/handler.go`. Sarama's `ConsumerGroup`
//! + hand-rolled `ConsumerGroupHandler` is replaced by rdkafka's
//! `StreamConsumer`, which gives the same consumer-group rebalancing and
//! offset auto-commit behind a `Stream` instead of a callback interface.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to configure the consumer group")]
    Init(#[from] rdkafka::error::KafkaError),
}

pub fn build_consumer(
    brokers: &str,
    group_id: &str,
    topic: &str,
) -> Result<StreamConsumer, Error> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .set("group.id", group_id)
        .set("enable.auto.commit", "true")
        .set("auto.commit.interval.ms", "5000")
        .set("auto.offset.reset", "earliest")
        .set("session.timeout.ms", "60000")
        .create()?;

    consumer.subscribe(&[topic])?;
    Ok(consumer)
}

/// Runs the consume loop until `cancel` fires. A message that fails to
/// decode is logged and skipped rather than treated as fatal, matching
/// the source's `log.Println("Error unmarshalling message", err)` followed
/// by continuing to the next message.
pub async fn run(consumer: &StreamConsumer, cancel: CancellationToken) {
    let mut stream = consumer.stream();
    tracing::info!("notifier consumer started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("notifier consumer stopping");
                return;
            }
            message = stream.next() => {
                let Some(message) = message else {
                    tracing::info!("notifier consumer stream closed");
                    return;
                };
                match message {
                    Ok(message) => handle(&message),
                    Err(err) => tracing::warn!(error = %err, "error from consumer"),
                }
            }
        }
    }
}

fn handle(message: &rdkafka::message::BorrowedMessage<'_>) {
    let Some(payload) = message.payload() else {
        return;
    };

    let event: WirePayload = match serde_json::from_slice(payload) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, "error unmarshalling message");
            return;
        }
    };

    let key = message
        .key()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default();

    tracing::info!(
        "Message claimed: {}",
        MessageEvent {
            topic: message.topic(),
            partition: message.partition(),
            offset: message.offset(),
            key: &key,
            payload: &event,
        }
    );
}

/// Decodes the same `{"OrderId", "Time", "Message"}` shape
/// `outbox_publisher::WireEvent` encodes, keeping both ends of the bus
/// wire-compatible.
#[derive(Deserialize)]
struct WirePayload {
    #[serde(rename = "OrderId")]
    order_id: i64,
    #[serde(rename = "Time")]
    time: DateTime<Utc>,
    #[serde(rename = "Message")]
    message: String,
}

struct MessageEvent<'a> {
    topic: &'a str,
    partition: i32,
    offset: i64,
    key: &'a str,
    payload: &'a WirePayload,
}

impl std::fmt::Display for MessageEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Topic: {}, Partition: {}, Offset: {}, Key: {}, Message: order {} at {}: {}",
            self.topic,
            self.partition,
            self.offset,
            self.key,
            self.payload.order_id,
            self.payload.time,
            self.payload.message.trim_end()
        )
    }
}
