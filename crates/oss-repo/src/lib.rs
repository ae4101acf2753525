//! Sqlx-backed repositories for orders, stocks, and the transactional
//! outbox (C4, C5, C6). Every function takes an already-open transaction
//! from `db::with_transaction`/`with_transactions`; none of them open or
//! close a transaction themselves.

pub mod orders;
pub mod outbox;
pub mod stocks;

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().and_then(|e| e.code()),
        Some(code) if code == "23505"
    )
}
