use chrono::Utc;
use oss_domain::{Error, OrderStatus, OutboxEvent, SendStatus};
use sqlx::{Postgres, Transaction};

/// Inserts an `AWAITING_SEND` outbox row. Always called from inside the
/// same transaction as the order-state mutation it describes, so the two
/// are committed or rolled back together.
pub async fn publish(
    tx: &mut Transaction<'static, Postgres>,
    order_id: i64,
    order_status: OrderStatus,
) -> Result<(), Error> {
    sqlx::query(
        "insert into outbox (order_id, order_status, send_status, created_at) \
         values ($1, $2, $3, $4)",
    )
    .bind(order_id)
    .bind(order_status.as_i16())
    .bind(SendStatus::AwaitingSend.as_i16())
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Returns every row still awaiting a bus publish, oldest first.
pub async fn retrieve(
    tx: &mut Transaction<'static, Postgres>,
) -> Result<Vec<OutboxEvent>, Error> {
    let rows: Vec<(i64, i64, i16, chrono::DateTime<Utc>)> = sqlx::query_as(
        "select id, order_id, order_status, created_at from outbox \
         where send_status = $1 order by created_at asc",
    )
    .bind(SendStatus::AwaitingSend.as_i16())
    .fetch_all(&mut **tx)
    .await?;

    rows.into_iter()
        .map(|(id, order_id, status, created_at)| {
            let order_status = OrderStatus::from_i16(status).ok_or(Error::OrderNotFound)?;
            Ok(OutboxEvent {
                id,
                order_id,
                order_status,
                send_status: SendStatus::AwaitingSend,
                created_at,
                sent_at: None,
            })
        })
        .collect()
}

pub async fn mark_sent(tx: &mut Transaction<'static, Postgres>, id: i64) -> Result<(), Error> {
    sqlx::query("update outbox set send_status = $1, sent_at = $2 where id = $3")
        .bind(SendStatus::Completed.as_i16())
        .bind(Utc::now())
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn mark_all_sent(
    tx: &mut Transaction<'static, Postgres>,
    events: &[OutboxEvent],
) -> Result<(), Error> {
    for event in events {
        mark_sent(tx, event.id).await?;
    }
    Ok(())
}
