use oss_domain::{Error, OrderItem, Stock};
use sqlx::{Postgres, Transaction};

/// Moves `count` units of each item from `available` to `reserved`.
/// Fails the whole batch with [`Error::ExceedsReservedAmount`] if any item
/// doesn't have enough `available` stock; no partial reservation is left
/// behind because the caller's transaction rolls back on error.
pub async fn reserve(
    tx: &mut Transaction<'static, Postgres>,
    items: &[OrderItem],
) -> Result<(), Error> {
    for item in items {
        let stock = get(tx, item.sku_id).await?;
        if stock.available < item.count {
            return Err(Error::ExceedsReservedAmount);
        }
    }

    for item in items {
        let stock = get(tx, item.sku_id).await?;
        update(
            tx,
            item.sku_id,
            stock.available - item.count,
            stock.reserved + item.count,
        )
        .await?;
    }

    Ok(())
}

/// Permanently removes `count` reserved units of each item (order paid).
pub async fn remove(
    tx: &mut Transaction<'static, Postgres>,
    items: &[OrderItem],
) -> Result<(), Error> {
    for item in items {
        let stock = get(tx, item.sku_id).await?;
        if stock.reserved < item.count {
            return Err(Error::ExceedsReservedAmount);
        }
    }

    for item in items {
        let stock = get(tx, item.sku_id).await?;
        update(tx, item.sku_id, stock.available, stock.reserved - item.count).await?;
    }

    Ok(())
}

/// Returns `count` reserved units of each item back to `available` (order
/// canceled). Checked against `reserved`, not `available`: canceling an
/// order can never be blocked by how much stock happens to be available.
pub async fn cancel(
    tx: &mut Transaction<'static, Postgres>,
    items: &[OrderItem],
) -> Result<(), Error> {
    for item in items {
        let stock = get(tx, item.sku_id).await?;
        if stock.reserved < item.count {
            return Err(Error::ExceedsReservedAmount);
        }
    }

    for item in items {
        let stock = get(tx, item.sku_id).await?;
        update(
            tx,
            item.sku_id,
            stock.available + item.count,
            stock.reserved - item.count,
        )
        .await?;
    }

    Ok(())
}

pub async fn get_by_id(
    tx: &mut Transaction<'static, Postgres>,
    sku_id: i64,
) -> Result<i64, Error> {
    Ok(get(tx, sku_id).await?.available)
}

async fn get(tx: &mut Transaction<'static, Postgres>, sku_id: i64) -> Result<Stock, Error> {
    let row: Option<(i64, i64)> =
        sqlx::query_as("select available, reserved from stocks where sku_id = $1")
            .bind(sku_id)
            .fetch_optional(&mut **tx)
            .await?;

    let (available, reserved) = row.ok_or(Error::UnknownProductId)?;
    Ok(Stock {
        sku_id,
        available,
        reserved,
    })
}

async fn update(
    tx: &mut Transaction<'static, Postgres>,
    sku_id: i64,
    available: i64,
    reserved: i64,
) -> Result<(), Error> {
    sqlx::query("update stocks set available = $1, reserved = $2 where sku_id = $3")
        .bind(available)
        .bind(reserved)
        .bind(sku_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
