//! The order state machine (C7): creation, payment, cancellation, and
//! reads, each wired through the pool router and transaction coordinator
//! in `db`, and the repositories in `oss-repo`.

use async_trait::async_trait;
use oss_domain::{Error, Order, OrderItem, OrderStatus};
use sharding::ShardIndex;

/// The set of order-shard pools plus the single, non-sharded stocks pool.
/// Resolves a user id or an order id to the pool(s) that own it.
pub struct ShardSet {
    order_shards: Vec<db::Pool>,
    stocks: db::Pool,
}

impl ShardSet {
    pub fn new(order_shards: Vec<db::Pool>, stocks: db::Pool) -> Self {
        Self {
            order_shards,
            stocks,
        }
    }

    /// Routes a user id to its shard via [`sharding::shard_of`], hashing
    /// the decimal string form of the id.
    fn route_user(&self, user_id: i64) -> Result<(&db::Pool, ShardIndex), Error> {
        let key = user_id.to_string();
        let index = sharding::shard_of(&key, self.order_shards.len())?;
        Ok((&self.order_shards[index.as_usize()], index))
    }

    /// Recovers the shard that owns `order_id` directly from the id.
    fn route_order(&self, order_id: i64) -> Result<&db::Pool, Error> {
        let index = sharding::shard_of_order(order_id);
        sharding::check_index(index, self.order_shards.len())?;
        Ok(&self.order_shards[index.as_usize()])
    }

    pub fn stocks(&self) -> &db::Pool {
        &self.stocks
    }
}

/// Transport-agnostic order operations. Both the HTTP/RPC surface and
/// tests depend on this trait rather than the concrete implementation.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(&self, user_id: i64, items: Vec<OrderItem>) -> Result<i64, Error>;
    async fn get_order(&self, order_id: i64) -> Result<Order, Error>;
    async fn pay_order(&self, order_id: i64) -> Result<(), Error>;
    async fn cancel_order(&self, order_id: i64) -> Result<(), Error>;
    async fn get_orders(&self, order_ids: &[i64]) -> Result<Vec<Order>, Error>;
    async fn available_stocks(&self, sku_id: i64) -> Result<i64, Error>;
}

pub struct OrderServiceImpl {
    shards: ShardSet,
}

impl OrderServiceImpl {
    pub fn new(shards: ShardSet) -> Self {
        Self { shards }
    }
}

#[async_trait]
impl OrderService for OrderServiceImpl {
    /// `orders.insert(NEW)` then `outbox.publish(NEW)` on the order shard,
    /// followed by `stocks.reserve` on the stocks pool. On a reservation
    /// failure the order is marked FAILED and that failure is published
    /// too, then the original stock error is returned to the caller.
    async fn create_order(&self, user_id: i64, items: Vec<OrderItem>) -> Result<i64, Error> {
        let (shard_pool, shard_index) = self.shards.route_user(user_id)?;
        let stocks_pool = self.shards.stocks();

        db::with_transactions(
            &[shard_pool, stocks_pool],
            db::TxMode::WriteOrRead,
            move |txs| {
                Box::pin(async move {
                    let (shard_tx, stocks_tx) = txs.split_at_mut(1);
                    let shard_tx = &mut shard_tx[0];
                    let stocks_tx = &mut stocks_tx[0];

                    let order_id =
                        oss_repo::orders::create(shard_tx, shard_index, user_id, &items).await?;
                    oss_repo::outbox::publish(shard_tx, order_id, OrderStatus::New).await?;

                    match oss_repo::stocks::reserve(stocks_tx, &items).await {
                        Ok(()) => {
                            oss_repo::outbox::publish(shard_tx, order_id, OrderStatus::Awaiting)
                                .await?;
                            oss_repo::orders::set_status(shard_tx, order_id, OrderStatus::Awaiting)
                                .await?;
                            Ok(order_id)
                        }
                        Err(reserve_err) => {
                            oss_repo::orders::set_status(shard_tx, order_id, OrderStatus::Failed)
                                .await?;
                            oss_repo::outbox::publish(shard_tx, order_id, OrderStatus::Failed)
                                .await?;
                            Err(reserve_err)
                        }
                    }
                })
            },
        )
        .await
    }

    async fn get_order(&self, order_id: i64) -> Result<Order, Error> {
        let shard_pool = self.shards.route_order(order_id)?;
        db::with_transaction(shard_pool, db::TxMode::ReadOnly, move |tx| {
            Box::pin(async move { oss_repo::orders::get(tx, order_id).await })
        })
        .await
    }

    /// Requires the order to be AWAITING; any other status is rejected
    /// with [`Error::IncorrectStatus`] before any stock mutation runs.
    async fn pay_order(&self, order_id: i64) -> Result<(), Error> {
        let shard_pool = self.shards.route_order(order_id)?;
        let stocks_pool = self.shards.stocks();

        db::with_transactions(
            &[shard_pool, stocks_pool],
            db::TxMode::WriteOrRead,
            move |txs| {
                Box::pin(async move {
                    let (shard_tx, stocks_tx) = txs.split_at_mut(1);
                    let shard_tx = &mut shard_tx[0];
                    let stocks_tx = &mut stocks_tx[0];

                    let order = oss_repo::orders::get(shard_tx, order_id).await?;
                    if order.status != OrderStatus::Awaiting {
                        return Err(Error::IncorrectStatus("order is not in status awaiting"));
                    }

                    oss_repo::stocks::remove(stocks_tx, &order.items).await?;
                    oss_repo::orders::set_status(shard_tx, order_id, OrderStatus::Paid).await?;
                    oss_repo::outbox::publish(shard_tx, order_id, OrderStatus::Paid).await?;
                    Ok(())
                })
            },
        )
        .await
    }

    /// Requires the order to be AWAITING. Stock is returned to
    /// `available` based on what's `reserved`, not on any stale
    /// `available` reading (see `oss-repo::stocks::cancel`).
    async fn cancel_order(&self, order_id: i64) -> Result<(), Error> {
        let shard_pool = self.shards.route_order(order_id)?;
        let stocks_pool = self.shards.stocks();

        db::with_transactions(
            &[shard_pool, stocks_pool],
            db::TxMode::WriteOrRead,
            move |txs| {
                Box::pin(async move {
                    let (shard_tx, stocks_tx) = txs.split_at_mut(1);
                    let shard_tx = &mut shard_tx[0];
                    let stocks_tx = &mut stocks_tx[0];

                    let order = oss_repo::orders::get(shard_tx, order_id).await?;
                    if order.status != OrderStatus::Awaiting {
                        return Err(Error::IncorrectStatus("order is not in status awaiting"));
                    }

                    oss_repo::stocks::cancel(stocks_tx, &order.items).await?;
                    oss_repo::orders::set_status(shard_tx, order_id, OrderStatus::Canceled).await?;
                    oss_repo::outbox::publish(shard_tx, order_id, OrderStatus::Canceled).await?;
                    Ok(())
                })
            },
        )
        .await
    }

    /// Reads each order on its own shard transaction; any single failure
    /// fails the whole call with [`Error::ErrGetOrders`], matching the
    /// source's coarse-grained error reporting for batch reads.
    async fn get_orders(&self, order_ids: &[i64]) -> Result<Vec<Order>, Error> {
        let mut orders = Vec::with_capacity(order_ids.len());
        for &order_id in order_ids {
            let order = self
                .get_order(order_id)
                .await
                .map_err(|_| Error::ErrGetOrders)?;
            orders.push(order);
        }
        Ok(orders)
    }

    async fn available_stocks(&self, sku_id: i64) -> Result<i64, Error> {
        let stocks_pool = self.shards.stocks();
        db::with_transaction(stocks_pool, db::TxMode::ReadOnly, move |tx| {
            Box::pin(async move { oss_repo::stocks::get_by_id(tx, sku_id).await })
        })
        .await
    }
}
