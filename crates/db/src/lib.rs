//! Pool Router (round-robin writer/reader connection sets per shard) and
//! Transaction Coordinator (single- and multi-pool transaction scopes).
//!
//! There is deliberately no two-phase commit: [`with_transactions`] commits
//! each transaction in the order its pool was supplied, and a failure
//! partway through leaves the system briefly inconsistent. Compensating
//! logic belongs in the caller (see `oss-core`'s order state machine).

use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to connect to database")]
    Connect(#[source] sqlx::Error),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// Selects which side of a [`Pool`] a transaction is opened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// A primary connection: required for any statement that writes.
    WriteOrRead,
    /// A replica connection, falling back to a primary if none exist.
    ReadOnly,
}

/// One shard's connection set: a list of writer (primary) pools and a list
/// of reader (replica) pools, each round-robinned independently.
///
/// The round-robin counters are plain atomics, not guarded by a lock: the
/// design assumes a single request dispatcher per process and accepts
/// benign skew under contention, matching the source this was distilled
/// from. Do not share a `Pool` across independently-scheduled producer
/// threads without additional synchronization if strict fairness matters.
pub struct Pool {
    primaries: Vec<PgPool>,
    replicas: Vec<PgPool>,
    next_writer: AtomicUsize,
    next_reader: AtomicUsize,
}

impl Pool {
    /// Dials and pings every connection string eagerly; a single failure
    /// aborts construction so a misconfigured shard never serves traffic.
    pub async fn connect<S: AsRef<str>>(primary_dsns: &[S], replica_dsns: &[S]) -> Result<Self, Error> {
        let mut primaries = Vec::with_capacity(primary_dsns.len());
        for dsn in primary_dsns {
            primaries.push(connect_and_ping(dsn.as_ref()).await?);
        }

        let mut replicas = Vec::with_capacity(replica_dsns.len());
        for dsn in replica_dsns {
            replicas.push(connect_and_ping(dsn.as_ref()).await?);
        }

        Ok(Self::from_pools(primaries, replicas))
    }

    pub fn from_pools(primaries: Vec<PgPool>, replicas: Vec<PgPool>) -> Self {
        Self {
            primaries,
            replicas,
            next_writer: AtomicUsize::new(0),
            next_reader: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, mode: TxMode) -> &PgPool {
        match mode {
            TxMode::WriteOrRead => self.writer(),
            TxMode::ReadOnly => self.reader(),
        }
    }

    fn writer(&self) -> &PgPool {
        debug_assert!(!self.primaries.is_empty(), "pool has no primary connections");
        let idx = self.next_writer.fetch_add(1, Ordering::Relaxed) % self.primaries.len();
        &self.primaries[idx]
    }

    fn reader(&self) -> &PgPool {
        if self.replicas.is_empty() {
            return self.writer();
        }
        let idx = self.next_reader.fetch_add(1, Ordering::Relaxed) % self.replicas.len();
        &self.replicas[idx]
    }
}

async fn connect_and_ping(dsn: &str) -> Result<PgPool, Error> {
    let pool = PgPoolOptions::new()
        .connect(dsn)
        .await
        .map_err(Error::Connect)?;
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(Error::Connect)?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // `connect_lazy` parses the DSN without dialing, so the round-robin
    // counters can be exercised without a live Postgres instance.
    fn lazy_pool(dsn: &str) -> PgPool {
        PgPoolOptions::new()
            .connect_lazy(dsn)
            .expect("valid dsn")
    }

    fn pool_of(n_primaries: usize, n_replicas: usize) -> Pool {
        let primaries = (0..n_primaries)
            .map(|i| lazy_pool(&format!("postgres://p{i}/db")))
            .collect();
        let replicas = (0..n_replicas)
            .map(|i| lazy_pool(&format!("postgres://r{i}/db")))
            .collect();
        Pool::from_pools(primaries, replicas)
    }

    #[test]
    fn write_or_read_round_robins_over_primaries() {
        let pool = pool_of(3, 0);
        let addrs: Vec<_> = (0..6)
            .map(|_| pool.get(TxMode::WriteOrRead).connect_options().get_host().to_string())
            .collect();
        assert_eq!(addrs, vec!["p0", "p1", "p2", "p0", "p1", "p2"]);
    }

    #[test]
    fn read_only_round_robins_over_replicas() {
        let pool = pool_of(1, 2);
        let addrs: Vec<_> = (0..4)
            .map(|_| pool.get(TxMode::ReadOnly).connect_options().get_host().to_string())
            .collect();
        assert_eq!(addrs, vec!["r0", "r1", "r0", "r1"]);
    }

    #[test]
    fn read_only_falls_back_to_primaries_without_replicas() {
        let pool = pool_of(2, 0);
        let addrs: Vec<_> = (0..4)
            .map(|_| pool.get(TxMode::ReadOnly).connect_options().get_host().to_string())
            .collect();
        assert_eq!(addrs, vec!["p0", "p1", "p0", "p1"]);
    }
}

/// Opens one transaction on `pool`, runs `f`, commits on success, rolls
/// back on failure. Rollback errors are logged but never mask the
/// original error.
pub async fn with_transaction<T, E, F>(pool: &Pool, mode: TxMode, f: F) -> Result<T, E>
where
    E: From<sqlx::Error>,
    F: for<'c> FnOnce(&'c mut Transaction<'static, Postgres>) -> BoxFuture<'c, Result<T, E>>,
{
    let mut tx = pool.get(mode).begin().await.map_err(E::from)?;

    match f(&mut tx).await {
        Ok(value) => {
            tx.commit().await.map_err(E::from)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

/// Opens one transaction on each pool in `pools`, runs `f` with the
/// ordered list of transactions, and commits each in the order the pools
/// were supplied. There is no two-phase commit: if an earlier commit
/// succeeds and a later one fails, the error propagates but already-
/// committed transactions stay committed.
pub async fn with_transactions<T, E, F>(pools: &[&Pool], mode: TxMode, f: F) -> Result<T, E>
where
    E: From<sqlx::Error>,
    F: for<'c> FnOnce(&'c mut [Transaction<'static, Postgres>]) -> BoxFuture<'c, Result<T, E>>,
{
    let mut txs = Vec::with_capacity(pools.len());
    for pool in pools {
        txs.push(pool.get(mode).begin().await.map_err(E::from)?);
    }

    match f(&mut txs).await {
        Ok(value) => {
            for tx in txs {
                tx.commit().await.map_err(E::from)?;
            }
            Ok(value)
        }
        Err(err) => {
            for tx in txs {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
            }
            Err(err)
        }
    }
}
