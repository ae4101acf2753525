//! Startup configuration (spec.md §6 "Config"), loaded from CLI flags or
//! environment variables, matching the teacher's `clap::Parser` +
//! `env = "..."` convention (`crates/agent/src/main.rs`). `.env` loading
//! stands in for the original's `godotenv.Load` (`loms/config/config.go`).

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about = "order/stock service (OSS)")]
pub struct Args {
    /// Port the JSON RPC surface listens on.
    #[clap(long, env = "OSS_HTTP_PORT", default_value = "8080")]
    pub http_port: u16,

    /// One entry per order shard, comma-separated. Within an entry,
    /// connection strings are semicolon-separated: the first is the
    /// shard's primary (writer), the rest are read replicas.
    #[clap(long, env = "OSS_ORDER_SHARD_DSNS", value_delimiter = ',')]
    pub order_shard_dsns: Vec<String>,

    /// Connection string for the single, non-sharded stocks database.
    #[clap(long, env = "OSS_STOCKS_DSN")]
    pub stocks_dsn: String,

    /// Message-bus brokers, comma-separated (`rdkafka`'s
    /// `bootstrap.servers` format).
    #[clap(long, env = "OSS_KAFKA_BROKERS")]
    pub kafka_brokers: String,

    /// Topic the outbox publisher emits order-status events to.
    #[clap(long, env = "OSS_KAFKA_TOPIC", default_value = "order-status")]
    pub kafka_topic: String,

    /// How often the outbox publisher drains awaiting-send rows.
    #[clap(
        long,
        env = "OSS_PUBLISHER_INTERVAL",
        default_value = "2s",
        value_parser = humantime::parse_duration
    )]
    pub publisher_interval: std::time::Duration,
}

/// One order shard's connection strings, split into `(primary, replicas)`.
pub struct ShardDsns {
    pub primary: String,
    pub replicas: Vec<String>,
}

pub fn parse_shard_dsns(entry: &str) -> ShardDsns {
    let mut parts = entry.split(';').map(str::to_string);
    let primary = parts.next().unwrap_or_default();
    let replicas = parts.collect();
    ShardDsns { primary, replicas }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primary_only() {
        let dsns = parse_shard_dsns("postgres://a");
        assert_eq!(dsns.primary, "postgres://a");
        assert!(dsns.replicas.is_empty());
    }

    #[test]
    fn parses_primary_and_replicas() {
        let dsns = parse_shard_dsns("postgres://a;postgres://b;postgres://c");
        assert_eq!(dsns.primary, "postgres://a");
        assert_eq!(dsns.replicas, vec!["postgres://b", "postgres://c"]);
    }
}
