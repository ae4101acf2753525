//! Shared types and error kinds for the order/stock service (OSS): the
//! data model of spec.md §3, and the error taxonomy of spec.md §7.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An order's position in its state machine. Transitions only move
/// forward, except for the self-corrective `New -> Failed` path inside
/// order creation (see `oss-core`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "smallint")]
#[repr(i16)]
pub enum OrderStatus {
    New = 1,
    Awaiting = 2,
    Failed = 3,
    Paid = 4,
    Canceled = 5,
}

impl OrderStatus {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::New),
            2 => Some(Self::Awaiting),
            3 => Some(Self::Failed),
            4 => Some(Self::Paid),
            5 => Some(Self::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::New => "new",
            OrderStatus::Awaiting => "awaiting",
            OrderStatus::Failed => "failed",
            OrderStatus::Paid => "paid",
            OrderStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// A single line item of an order: a SKU and the quantity ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub sku_id: i64,
    pub count: i64,
}

/// An order as owned by the Orders Repository. `order_id % MAX_SHARDS`
/// always equals the index of the shard it is stored on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
}

/// Per-SKU inventory counters. `available` and `reserved` are both
/// non-negative at every commit boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub sku_id: i64,
    pub available: i64,
    pub reserved: i64,
}

/// Whether an outbox row still needs to be published to the message bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "smallint")]
#[repr(i16)]
pub enum SendStatus {
    AwaitingSend = 1,
    Completed = 2,
}

impl SendStatus {
    pub fn as_i16(self) -> i16 {
        self as i16
    }
}

/// A not-yet-published (or already-published) order status change,
/// co-resident on the same shard as the order it describes. `id` is a
/// per-row surrogate key: an order passes through several statuses over
/// its lifetime, each appending its own outbox row, so `order_id` alone
/// cannot address a single event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: i64,
    pub order_id: i64,
    pub order_status: OrderStatus,
    pub send_status: SendStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// The single error taxonomy shared by every OSS-facing crate. Repository
/// implementations translate driver errors into these kinds; the service
/// layer passes them through unchanged; transports map them to
/// HTTP/RPC status codes.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("order is not found")]
    OrderNotFound,

    #[error("couldn't process the order due to the incorrect status: {0}")]
    IncorrectStatus(&'static str),

    #[error("product id is unknown")]
    UnknownProductId,

    #[error("product is out of stock")]
    ProductsOutOfStock,

    #[error("product amount exceeds the reserved quantity")]
    ExceedsReservedAmount,

    #[error("shard index is out of range")]
    ShardIndexOutOfRange(#[from] sharding::Error),

    #[error("couldn't get all orders")]
    ErrGetOrders,

    #[error("order id collision on shard, retry")]
    IdCollision,

    #[error(transparent)]
    Sql(#[from] sqlx::Error),

    #[error(transparent)]
    Db(#[from] db::Error),
}
