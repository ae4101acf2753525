//! Startup configuration (spec.md §6 "Config"), matching
//! `notifier/config/config.go`'s `KafkaConfig`/`ConsumerConfig`,
//! restyled as a `clap::Parser` the way the teacher's binaries take
//! their args (`crates/agent/src/main.rs`).

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about = "order status notifier")]
pub struct Args {
    /// Kafka bootstrap servers, comma-delimited.
    #[clap(long, env = "KAFKA_BOOTSTRAP_SERVER")]
    pub kafka_brokers: String,

    /// Topic the outbox publisher writes order-status events to.
    #[clap(long, env = "KAFKA_TOPIC")]
    pub kafka_topic: String,

    /// Consumer group id; multiple notifier instances sharing this id
    /// split the topic's partitions between them.
    #[clap(long, env = "KAFKA_CONSUMER_GROUP_NAME")]
    pub kafka_consumer_group_name: String,
}
