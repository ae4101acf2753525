use oss_domain::{Error, Order, OrderItem, OrderStatus};
use sharding::ShardIndex;
use sqlx::{Postgres, Transaction};

use crate::is_unique_violation;

/// Derives a fresh `order_id` for `shard_index`, inserts the order header
/// with status `NEW`, then inserts one row per item. All statements run on
/// `tx`, so a failure partway through rolls back with the caller's
/// transaction.
///
/// A unique index on `orders.order_id` is assumed (see spec's open
/// question on the id-generation race): a collision on insert is reported
/// as [`Error::IdCollision`], which callers may retry.
pub async fn create(
    tx: &mut Transaction<'static, Postgres>,
    shard_index: ShardIndex,
    user_id: i64,
    items: &[OrderItem],
) -> Result<i64, Error> {
    let order_id = generate_id(tx, shard_index).await?;

    let insert = sqlx::query(
        "insert into orders (order_id, user_id, status) values ($1, $2, $3)",
    )
    .bind(order_id)
    .bind(user_id)
    .bind(OrderStatus::New.as_i16())
    .execute(&mut **tx)
    .await;

    match insert {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => return Err(Error::IdCollision),
        Err(err) => return Err(err.into()),
    }

    for item in items {
        sqlx::query(
            "insert into order_items (order_id, item_id, count) values ($1, $2, $3)",
        )
        .bind(order_id)
        .bind(item.sku_id)
        .bind(item.count)
        .execute(&mut **tx)
        .await?;
    }

    Ok(order_id)
}

/// Rounds the highest order id observed on this shard's database down to
/// its shard-0 boundary and steps forward into `shard_index`. An empty
/// table starts from `prev_id = 0`.
async fn generate_id(
    tx: &mut Transaction<'static, Postgres>,
    shard_index: ShardIndex,
) -> Result<i64, Error> {
    let prev_id: Option<i64> = sqlx::query_scalar("select max(order_id) from orders")
        .fetch_one(&mut **tx)
        .await?;

    Ok(sharding::next_order_id(prev_id.unwrap_or(0), shard_index))
}

pub async fn set_status(
    tx: &mut Transaction<'static, Postgres>,
    order_id: i64,
    status: OrderStatus,
) -> Result<(), Error> {
    let result = sqlx::query("update orders set status = $1 where order_id = $2")
        .bind(status.as_i16())
        .bind(order_id)
        .execute(&mut **tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::OrderNotFound);
    }
    Ok(())
}

/// Reads the order header and its items. A missing header is reported as
/// [`Error::OrderNotFound`] regardless of whether any item rows exist.
pub async fn get(
    tx: &mut Transaction<'static, Postgres>,
    order_id: i64,
) -> Result<Order, Error> {
    let header: Option<(i64, i16)> =
        sqlx::query_as("select user_id, status from orders where order_id = $1")
            .bind(order_id)
            .fetch_optional(&mut **tx)
            .await?;

    let (user_id, status) = header.ok_or(Error::OrderNotFound)?;
    let status = OrderStatus::from_i16(status).ok_or(Error::OrderNotFound)?;

    let rows: Vec<(i64, i64)> =
        sqlx::query_as("select item_id, count from order_items where order_id = $1")
            .bind(order_id)
            .fetch_all(&mut **tx)
            .await?;

    let items = rows
        .into_iter()
        .map(|(sku_id, count)| OrderItem { sku_id, count })
        .collect();

    Ok(Order {
        order_id,
        user_id,
        status,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_id_rounds_down_to_shard_boundary() {
        // pure function behind generate_id; exercised directly through
        // sharding's own test suite. Kept here as a reminder that this
        // module must not re-derive the formula locally.
        assert_eq!(
            sharding::next_order_id(0, ShardIndex(3)),
            sharding::MAX_SHARDS + 3
        );
    }
}
